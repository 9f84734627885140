#![doc = include_str!("../README.md")]
//!
//! ---
//!
//! ## API Reference
//!
//! # Compiling
//!
//! - [`parse`]: Tokenize and parse a template into a [`ParsedTemplate`]
//! - [`ParsedTemplate::compile`]: Flatten the segment tree into a [`Template`]
//! - [`compile`]: Both steps at once
//!
//! # Validating
//!
//! - [`ValidatorConfig`]: Explicit routing-safety policy
//! - [`UrlPatternValidator`]: The rule engine behind it
//! - [`validate_template`] / [`is_valid_url_pattern`]: Process-wide default policy

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod descriptor;
mod template;
mod validate;

pub use template::{
    compile, parse, InvalidTemplateError, OpCode, ParsedTemplate, Segment, Template,
    TemplateErrorKind, OPCODE_VERSION,
};
pub use validate::{
    is_valid_url_pattern, set_max_static_segments, set_url_validation_enabled,
    validate_template, validation_config, UrlPatternValidator, ValidationError, ValidatorConfig,
    DEFAULT_MAX_STATIC_SEGMENTS,
};

#![doc = include_str!("../README.md")]
//!
//! ---
//!
//! ## API Reference
//!
//! - [`extract_bindings`]: descriptor set to validated, compiled [`Binding`]s
//! - [`generate`]: descriptor set to route-table source code
//! - [`BindingConfig`]: package filter, runtime path, validation policy,
//!   selector-keyed HTTP rules
//! - [`ProjectConfig`]: the same settings, loaded from YAML
//! - [`FieldPathError`]: why a path variable or body selector does not resolve

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod codegen;
mod config;
mod error;

pub use codegen::{extract_bindings, generate, Binding, BindingConfig};
pub use config::{CustomPatternConfig, HttpConfig, HttpRuleConfig, ProjectConfig};
pub use error::{Error, FieldPathError, Result};

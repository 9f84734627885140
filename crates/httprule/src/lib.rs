#![doc = include_str!("../README.md")]
//!
//! ---
//!
//! ## API Reference
//!
//! # Types
//!
//! - [`Pattern`]: validated op-code program; matches request paths
//! - [`PathParams`]: variables captured by a match, in declaration order
//! - [`ServeMux`]: per-method route table returning a [`Dispatch`] outcome
//! - [`RouteSpec`]: static route description emitted by `httprule-build`
//!
//! # Usage
//!
//! ```toml
//! [dependencies]
//! httprule = "0.1"
//!
//! [build-dependencies]
//! httprule-build = "0.1"
//! ```
//!
//! # Companion Crates
//!
//! | Crate              | Purpose                       | Cargo section          |
//! |--------------------|-------------------------------|------------------------|
//! | `httprule` (this)  | Matching and dispatch         | `[dependencies]`       |
//! | `httprule-core`    | Template compiler, validator  | `[dependencies]`       |
//! | `httprule-build`   | Route-table codegen, CLI      | `[build-dependencies]` |

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod runtime;

pub use runtime::*;

pub use httprule_core::{Template, ValidatorConfig};

//! Request-time matching of compiled templates.
//!
//! - [`Pattern`]: checks a raw op-code program once, then matches paths
//! - [`ServeMux`]: first-match dispatch per HTTP method, with 404/405 detection
//! - [`RouteSpec`]: the static form generated ahead of time

mod error;
mod mux;
mod params;
mod pattern;
mod route;

pub use error::{PatternError, RegisterError};
pub use mux::{Dispatch, ServeMux};
pub use params::PathParams;
pub use pattern::Pattern;
pub use route::RouteSpec;

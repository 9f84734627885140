//! Build-time route-table generator.
//!
//! Reads a proto file descriptor set, extracts `google.api.http` bindings,
//! validates and compiles each path template, and emits the compiled
//! programs as `const` route descriptions for the runtime multiplexer.
//!
//! Templates are parsed once, at build time. The service only loads the
//! op-codes into a [`Pattern`](https://docs.rs/httprule/latest/httprule/struct.Pattern.html)
//! on start-up.

mod config;
mod emit;
mod extract;
mod fields;
mod types;

pub use config::BindingConfig;
pub use types::Binding;

use httprule_core::descriptor::FileDescriptorSet;
use prost::Message as _;

use crate::error::Result;

/// Extract every HTTP binding from a compiled proto file descriptor set.
///
/// Bindings come out in descriptor order: file, service, method, then the
/// primary rule followed by its `additional_bindings`. Rules registered with
/// [`BindingConfig::http_rule`] precede the method's annotation. Rules without
/// a pattern are skipped.
///
/// # Errors
///
/// Returns [`Error`](crate::Error) if:
/// - `descriptor_bytes` is not a valid protobuf `FileDescriptorSet`
/// - a `GET` binding (or a `DELETE` binding, unless allowed) has a body
/// - an additional binding nests further `additional_bindings`
/// - a template fails validation or does not parse
/// - a client-streaming method binds path parameters
/// - a path variable or body selector does not resolve to a field of the
///   request message
/// - a configured rule selector is not a single method name
pub fn extract_bindings(descriptor_bytes: &[u8], config: &BindingConfig) -> Result<Vec<Binding>> {
    let fdset = FileDescriptorSet::decode(descriptor_bytes)?;
    extract::extract_bindings(&fdset, config)
}

/// Generate the route table for a compiled proto file descriptor set.
///
/// Returns Rust source declaring one `RouteSpec` constant per binding and a
/// `ROUTES` slice, to be written to `OUT_DIR` and `include!`d.
///
/// # Errors
///
/// Same as [`extract_bindings`].
pub fn generate(descriptor_bytes: &[u8], config: &BindingConfig) -> Result<String> {
    let bindings = extract_bindings(descriptor_bytes, config)?;
    tracing::debug!(routes = bindings.len(), "generating route table");
    Ok(emit::generate_code(&bindings, config))
}

/// Convert `CamelCase` to `snake_case` (matches tonic-build output).
pub(crate) fn to_snake_case(s: &str) -> String {
    let mut result = String::with_capacity(s.len() + 4);
    let mut chars = s.chars().peekable();

    while let Some(c) = chars.next() {
        if c.is_uppercase() {
            if !result.is_empty() {
                let next_is_lower = chars.peek().is_some_and(|n| n.is_lowercase());
                let prev_is_lower = result.chars().last().is_some_and(char::is_lowercase);
                if prev_is_lower || next_is_lower {
                    result.push('_');
                }
            }
            result.push(c.to_ascii_lowercase());
        } else {
            result.push(c);
        }
    }

    result
}

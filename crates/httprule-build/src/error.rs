//! Typed error enum for the `httprule-build` library API.
//!
//! Library consumers can match on specific variants. The CLI (`main.rs`)
//! converts these to `anyhow::Error` at the binary boundary.

use httprule_core::{InvalidTemplateError, ValidationError};

/// Errors produced by `httprule-build` library operations.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// File I/O failure (reading config or descriptor files).
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// YAML parsing or serialization failure.
    #[error(transparent)]
    Yaml(#[from] serde_yaml_ng::Error),

    /// Proto `FileDescriptorSet` decoding failure.
    #[error("failed to decode proto descriptor: {0}")]
    ProtoDecode(#[from] prost::DecodeError),

    /// A binding carries a request body under a method that forbids one.
    ///
    /// `GET` never takes a body; `DELETE` does only with
    /// [`BindingConfig::allow_delete_body`](crate::BindingConfig::allow_delete_body).
    #[error("needs request body even though http method is {http_method}: {rpc}")]
    BodyNotAllowed {
        /// Fully qualified RPC path.
        rpc: String,
        /// The offending HTTP method.
        http_method: String,
    },

    /// An entry of `additional_bindings` has its own `additional_bindings`.
    #[error("additional_binding in additional_binding not allowed: {rpc}")]
    NestedAdditionalBindings {
        /// Fully qualified RPC path.
        rpc: String,
    },

    /// A client-streaming method binds path parameters.
    #[error("cannot use path parameter in client streaming: {rpc}")]
    StreamingPathParams {
        /// Fully qualified RPC path.
        rpc: String,
    },

    /// The template was rejected by the URL pattern validator.
    #[error("{rpc}: {source}")]
    Validation {
        /// Fully qualified RPC path.
        rpc: String,
        /// The validator's verdict.
        #[source]
        source: ValidationError,
    },

    /// The template does not follow the path template grammar.
    #[error("{rpc}: {source}")]
    Template {
        /// Fully qualified RPC path.
        rpc: String,
        /// The parser's verdict.
        #[source]
        source: InvalidTemplateError,
    },

    /// A path variable or the body selector names no usable request field.
    #[error("{rpc}: {source}")]
    FieldPath {
        /// Fully qualified RPC path.
        rpc: String,
        /// Why the field path does not resolve.
        #[source]
        source: FieldPathError,
    },

    /// A configured HTTP rule selector is not a single method name.
    #[error("selector {selector:?} must specify a single service method without wildcards")]
    InvalidSelector {
        /// The selector as written.
        selector: String,
    },
}

/// Why a dotted field path does not resolve against a request message.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum FieldPathError {
    /// The request message (or an intermediate message) is not in the descriptor set.
    #[error("no message found: {0}")]
    UnknownMessage(String),

    /// A path component names no field of its message.
    #[error("no field {path:?} found in {message}")]
    UnknownField {
        /// The full field path.
        path: String,
        /// Simple name of the request message.
        message: String,
    },

    /// A path descends into a scalar field.
    #[error("not an aggregate type: {field} in {path}")]
    NotAggregate {
        /// The scalar field.
        field: String,
        /// The full field path.
        path: String,
    },

    /// A path goes through a repeated field.
    #[error("repeated field not allowed in field path: {field} in {path}")]
    Repeated {
        /// The repeated field.
        field: String,
        /// The full field path.
        path: String,
    },

    /// A path variable binds a whole message.
    #[error("aggregate type {type_name} in parameter: {path}")]
    AggregateParameter {
        /// Type of the bound field.
        type_name: String,
        /// The full field path.
        path: String,
    },
}

/// Convenience alias used throughout the library's public API.
pub type Result<T> = std::result::Result<T, Error>;

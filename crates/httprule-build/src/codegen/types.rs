//! Extracted bindings.

use httprule_core::Template;
use serde::Serialize;

/// One HTTP binding of an RPC method, validated and compiled.
///
/// A method yields one binding per pattern-carrying rule: the primary
/// `google.api.http` rule at index 0, then each of its
/// `additional_bindings` at index 1, 2, ...
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Binding {
    /// Proto package (e.g. `library.v1`).
    pub package: String,
    /// Proto service name (e.g. `LibraryService`).
    pub service: String,
    /// Proto method name (e.g. `GetBook`).
    pub method: String,
    /// gRPC path (e.g. `/library.v1.LibraryService/GetBook`).
    pub rpc: String,
    /// Position among the method's bindings; 0 is the primary rule.
    pub index: usize,
    /// `GET`, `PUT`, `POST`, `DELETE`, `PATCH`, or a custom kind.
    pub http_method: String,
    /// Path template as written in the proto.
    pub path: String,
    /// Request body selector: `""`, `"*"`, or a field path.
    pub body: String,
    /// Response body selector, empty for the whole message.
    pub response_body: String,
    /// The method takes a stream of requests.
    pub client_streaming: bool,
    /// The method returns a stream of responses.
    pub server_streaming: bool,
    /// The compiled path template.
    pub template: Template,
}

impl Binding {
    /// Fields bound from the path, in declaration order.
    #[must_use]
    pub fn path_params(&self) -> Vec<&str> {
        self.template.fields()
    }
}

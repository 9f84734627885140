//! Static route descriptions emitted by the build crate.

use super::error::PatternError;
use super::pattern::Pattern;

/// One HTTP binding of an RPC, compiled ahead of time.
///
/// `httprule-build` generates these as `const` items so that a service can
/// register its routes without parsing templates at start-up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteSpec {
    /// HTTP method, e.g. `"GET"` or a custom kind such as `"HEAD"`.
    pub method: &'static str,
    /// Fully qualified RPC path, e.g. `"/library.v1.LibraryService/GetBook"`.
    pub rpc: &'static str,
    /// Source template, for diagnostics.
    pub template: &'static str,
    /// Op-code encoding revision.
    pub version: u32,
    /// Flat `(opcode, operand)` pairs.
    pub opcodes: &'static [i32],
    /// String pool referenced by the op-codes.
    pub pool: &'static [&'static str],
    /// Custom verb, empty when absent.
    pub verb: &'static str,
}

impl RouteSpec {
    /// Load the compiled program.
    ///
    /// # Errors
    ///
    /// Returns [`PatternError`] when the generated program is malformed.
    pub fn pattern(&self) -> Result<Pattern, PatternError> {
        Pattern::new(self.version, self.opcodes, self.pool, self.verb)
    }
}

//! Errors raised while building patterns and registering routes.

use httprule_core::{InvalidTemplateError, ValidationError};

/// A raw op-code program that cannot be executed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum PatternError {
    /// The program targets another op-code revision.
    #[error("unsupported op-code version {0}")]
    UnsupportedVersion(u32),

    /// Op-codes come in `(code, operand)` pairs.
    #[error("odd number of op-code words: {0}")]
    OddOpCodes(usize),

    /// Unknown op-code value.
    #[error("invalid op-code {0}")]
    InvalidOpCode(i32),

    /// A literal or capture operand points outside the pool.
    #[error("pool index {index} out of range for a pool of {len}")]
    PoolIndexOutOfRange {
        /// Offending operand.
        index: i32,
        /// Pool length.
        len: usize,
    },

    /// `ConcatN` with a zero or negative count.
    #[error("non-positive concat size {0}")]
    NonPositiveConcat(i32),

    /// An op pops more entries than were pushed.
    #[error("stack underflow")]
    StackUnderflow,
}

/// Failure to add a route to a [`ServeMux`](crate::ServeMux).
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum RegisterError {
    /// The template breaks a routing-safety rule.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The template does not parse.
    #[error(transparent)]
    Template(#[from] InvalidTemplateError),

    /// The compiled program is malformed.
    #[error("{template}: {source}")]
    Pattern {
        /// Template the program was compiled from.
        template: String,
        /// What is wrong with it.
        #[source]
        source: PatternError,
    },

    /// The HTTP method is not a valid token.
    #[error("invalid HTTP method {0:?}")]
    Method(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pattern_error_messages() {
        assert_eq!(
            PatternError::UnsupportedVersion(2).to_string(),
            "unsupported op-code version 2"
        );
        assert_eq!(
            PatternError::PoolIndexOutOfRange { index: 3, len: 1 }.to_string(),
            "pool index 3 out of range for a pool of 1"
        );
    }

    #[test]
    fn register_error_is_transparent_for_template_errors() {
        let err: RegisterError = httprule_core::parse("v1").unwrap_err().into();
        assert_eq!(err.to_string(), "no leading /: v1");
    }

    #[test]
    fn register_error_names_the_template() {
        let err = RegisterError::Pattern {
            template: "/v1/x".into(),
            source: PatternError::StackUnderflow,
        };
        assert_eq!(err.to_string(), "/v1/x: stack underflow");
    }

    const _: () = {
        const fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<PatternError>();
        assert_send_sync::<RegisterError>();
    };
}

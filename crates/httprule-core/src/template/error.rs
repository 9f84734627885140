//! Grammar errors raised while parsing a path template.

use std::fmt;

/// Category of an [`InvalidTemplateError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum TemplateErrorKind {
    /// The template does not start with `/`.
    NoLeadingSlash,
    /// Two consecutive `/`, or a trailing `/`.
    EmptySegment,
    /// A literal contains a character outside the RFC 3986 `pchar` set.
    InvalidLiteral,
    /// A `%` not followed by two hex digits.
    InvalidPercentEncoding,
    /// A `{` without its closing `}`.
    UnterminatedVariable,
    /// An empty component in a dotted field path (`name.`, `a..b`).
    EmptyFieldPathComponent,
    /// A field path identifier outside `[A-Za-z][A-Za-z0-9_]*`.
    InvalidIdentifier,
    /// A `{` inside another variable.
    NestedVariable,
    /// A `**` that is not the final segment.
    MisplacedDeepWildcard,
    /// Two segments without a `/` between them.
    MissingSeparator,
    /// Any other token where it cannot appear.
    UnexpectedToken,
}

impl fmt::Display for TemplateErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::NoLeadingSlash => "no leading slash",
            Self::EmptySegment => "empty segment",
            Self::InvalidLiteral => "invalid literal",
            Self::InvalidPercentEncoding => "invalid percent-encoding",
            Self::UnterminatedVariable => "unterminated variable",
            Self::EmptyFieldPathComponent => "empty field path component",
            Self::InvalidIdentifier => "invalid identifier",
            Self::NestedVariable => "nested variable",
            Self::MisplacedDeepWildcard => "misplaced deep wildcard",
            Self::MissingSeparator => "missing separator",
            Self::UnexpectedToken => "unexpected token",
        };
        f.write_str(name)
    }
}

/// A path template that does not conform to the HTTP-binding grammar.
///
/// Carries the offending template, a human-readable message and a
/// [`TemplateErrorKind`] for callers that branch on the failure.
///
/// # Examples
///
/// ```
/// use httprule_core::{parse, TemplateErrorKind};
///
/// let err = parse("v1/{name}").unwrap_err();
/// assert_eq!(err.kind(), TemplateErrorKind::NoLeadingSlash);
/// assert_eq!(err.message(), "no leading /");
/// assert_eq!(err.template(), "v1/{name}");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}: {template}")]
pub struct InvalidTemplateError {
    template: String,
    message: String,
    kind: TemplateErrorKind,
}

impl InvalidTemplateError {
    pub(crate) fn new(template: &str, syntax: SyntaxError) -> Self {
        Self {
            template: template.to_string(),
            message: syntax.message,
            kind: syntax.kind,
        }
    }

    pub(crate) fn no_leading_slash(template: &str) -> Self {
        Self::new(
            template,
            SyntaxError::new(TemplateErrorKind::NoLeadingSlash, "no leading /"),
        )
    }

    /// The rejected template, verbatim.
    #[must_use]
    pub fn template(&self) -> &str {
        &self.template
    }

    /// What is wrong with it.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Failure category.
    #[must_use]
    pub const fn kind(&self) -> TemplateErrorKind {
        self.kind
    }
}

/// Parser-level failure, before the template text is attached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SyntaxError {
    pub(crate) kind: TemplateErrorKind,
    pub(crate) message: String,
}

impl SyntaxError {
    pub(crate) fn new(kind: TemplateErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_joins_message_and_template() {
        let err = InvalidTemplateError::new(
            "/v1//x",
            SyntaxError::new(TemplateErrorKind::EmptySegment, "empty segment"),
        );
        assert_eq!(err.to_string(), "empty segment: /v1//x");
    }

    #[test]
    fn equality_covers_template_and_message() {
        let a = InvalidTemplateError::no_leading_slash("v1");
        let b = InvalidTemplateError::no_leading_slash("v1");
        let c = InvalidTemplateError::no_leading_slash("v2");
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    const _: () = {
        const fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<InvalidTemplateError>();
    };
}

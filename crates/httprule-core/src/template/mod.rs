//! Path template front end: tokenize, parse, compile.

mod compile;
mod error;
mod parse;
mod tokenize;

use std::fmt;

pub use compile::{OpCode, Template, OPCODE_VERSION};
pub use error::{InvalidTemplateError, TemplateErrorKind};

use parse::Parser;
use tokenize::tokenize;

/// One `/`-separated piece of a parsed template.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    /// Fixed text, possibly percent-encoded. The root template `/` is the
    /// empty literal.
    Literal(String),
    /// `*`: exactly one path component.
    Wildcard,
    /// `**`: one or more trailing path components.
    DeepWildcard,
    /// `{field_path=segments}`: binds the matched span to a request field.
    Variable {
        /// Dotted field path, e.g. `book.name`.
        field_path: String,
        /// Inner pattern; `[Wildcard]` when the template omits `=pattern`.
        segments: Vec<Segment>,
    },
}

impl Segment {
    pub(crate) const fn root() -> Self {
        Self::Literal(String::new())
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(lit) => f.write_str(lit),
            Self::Wildcard => f.write_str("*"),
            Self::DeepWildcard => f.write_str("**"),
            Self::Variable {
                field_path,
                segments,
            } => {
                write!(f, "{{{field_path}=")?;
                write_joined(f, segments)?;
                f.write_str("}")
            }
        }
    }
}

fn write_joined(f: &mut fmt::Formatter<'_>, segments: &[Segment]) -> fmt::Result {
    for (i, segment) in segments.iter().enumerate() {
        if i > 0 {
            f.write_str("/")?;
        }
        write!(f, "{segment}")?;
    }
    Ok(())
}

/// A template that passed the grammar, before compilation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedTemplate {
    segments: Vec<Segment>,
    verb: Option<String>,
    template: String,
}

impl ParsedTemplate {
    /// Top-level segments; never empty.
    #[must_use]
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// `None` without a trailing colon, `Some("")` for a bare trailing colon.
    #[must_use]
    pub fn verb(&self) -> Option<&str> {
        self.verb.as_deref()
    }

    /// Source text as passed to [`parse`].
    #[must_use]
    pub fn template(&self) -> &str {
        &self.template
    }

    /// Flatten into the op-code artifact. Deterministic.
    #[must_use]
    pub fn compile(&self) -> Template {
        compile::compile_segments(&self.segments, self.verb(), &self.template)
    }
}

impl fmt::Display for ParsedTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("/")?;
        write_joined(f, &self.segments)?;
        if let Some(verb) = &self.verb {
            write!(f, ":{verb}")?;
        }
        Ok(())
    }
}

/// Parse a template such as `/v1/{name=shelves/*}:get`.
///
/// # Errors
///
/// Returns [`InvalidTemplateError`] when the template does not start with `/`
/// or violates the grammar.
pub fn parse(template: &str) -> Result<ParsedTemplate, InvalidTemplateError> {
    let Some(path) = template.strip_prefix('/') else {
        return Err(InvalidTemplateError::no_leading_slash(template));
    };

    let (tokens, verb) = tokenize(path);
    let segments = Parser::new(&tokens)
        .top_level_segments()
        .map_err(|e| {
            tracing::debug!(template, kind = %e.kind, "rejected path template");
            InvalidTemplateError::new(template, e)
        })?;
    tracing::trace!(template, ?segments, ?verb, "parsed path template");

    Ok(ParsedTemplate {
        segments,
        verb: verb.map(str::to_string),
        template: template.to_string(),
    })
}

/// [`parse`] then [`ParsedTemplate::compile`].
///
/// # Errors
///
/// Same as [`parse`].
pub fn compile(template: &str) -> Result<Template, InvalidTemplateError> {
    parse(template).map(|parsed| parsed.compile())
}

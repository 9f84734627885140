//! Recursive-descent parser over the token stream.
//!
//! ```text
//! Segments      := Segment ("/" Segment)* EOF
//! Segment       := Literal | "*" | "**" | Variable
//! Variable      := "{" FieldPath ["=" InnerSegments] "}"
//! FieldPath     := Ident ("." Ident)*
//! InnerSegments := Segment ("/" Segment)*
//! ```

use super::error::{SyntaxError, TemplateErrorKind as Kind};
use super::tokenize::Token;
use super::Segment;

/// Cursor over a token slice with one token of lookahead.
pub(crate) struct Parser<'t, 'a> {
    tokens: &'t [Token<'a>],
    pos: usize,
}

impl<'t, 'a> Parser<'t, 'a> {
    pub(crate) const fn new(tokens: &'t [Token<'a>]) -> Self {
        Self { tokens, pos: 0 }
    }

    /// Tokens not consumed yet.
    #[cfg(test)]
    pub(crate) fn remaining(&self) -> &'t [Token<'a>] {
        &self.tokens[self.pos.min(self.tokens.len())..]
    }

    /// Parse the whole token stream into top-level segments.
    ///
    /// A stream starting with end-of-input is the root template; anything
    /// after that marker is discarded. A lone `/` parses as a wildcard.
    pub(crate) fn top_level_segments(&mut self) -> Result<Vec<Segment>, SyntaxError> {
        match self.tokens {
            [] | [Token::Eof, ..] => {
                self.pos = self.tokens.len();
                return Ok(vec![Segment::root()]);
            }
            [Token::Slash, Token::Eof] => {
                self.pos = self.tokens.len();
                return Ok(vec![Segment::Wildcard]);
            }
            _ => {}
        }

        let segments = self.segments(false)?;
        match self.peek() {
            Token::Eof => self.bump(),
            tok @ (Token::Literal(_) | Token::LBrace) => {
                return Err(SyntaxError::new(
                    Kind::MissingSeparator,
                    format!("missing '/' before {tok}"),
                ));
            }
            tok => {
                return Err(SyntaxError::new(
                    Kind::UnexpectedToken,
                    format!("unexpected {tok} after segments"),
                ));
            }
        }
        if self.pos < self.tokens.len() {
            return Err(SyntaxError::new(
                Kind::UnexpectedToken,
                "tokens after end of template",
            ));
        }

        check_deep_wildcards(&segments)?;
        Ok(segments)
    }

    fn segments(&mut self, in_variable: bool) -> Result<Vec<Segment>, SyntaxError> {
        let mut segments = vec![self.segment(in_variable)?];
        while self.eat(Token::Slash) {
            segments.push(self.segment(in_variable)?);
        }
        Ok(segments)
    }

    fn segment(&mut self, in_variable: bool) -> Result<Segment, SyntaxError> {
        match self.peek() {
            Token::Literal("*") => {
                self.bump();
                Ok(Segment::Wildcard)
            }
            Token::Literal("**") => {
                self.bump();
                Ok(Segment::DeepWildcard)
            }
            Token::Literal(lit) => {
                if in_variable && lit.contains('{') {
                    return Err(nested_variable());
                }
                validate_literal(lit)?;
                self.bump();
                Ok(Segment::Literal(lit.to_string()))
            }
            Token::LBrace if in_variable => Err(nested_variable()),
            Token::LBrace => self.variable(),
            Token::Slash => Err(SyntaxError::new(
                Kind::EmptySegment,
                "empty segment (consecutive '/')",
            )),
            Token::Eof if in_variable => Err(SyntaxError::new(
                Kind::UnterminatedVariable,
                "unterminated variable segment",
            )),
            Token::Eof => Err(SyntaxError::new(
                Kind::EmptySegment,
                "empty segment at end of template",
            )),
            tok => Err(SyntaxError::new(
                Kind::UnexpectedToken,
                format!("expected a segment, found {tok}"),
            )),
        }
    }

    fn variable(&mut self) -> Result<Segment, SyntaxError> {
        self.bump();
        let field_path = self.field_path()?;
        let segments = if self.eat(Token::Eq) {
            self.segments(true)?
        } else {
            vec![Segment::Wildcard]
        };

        match self.peek() {
            Token::RBrace => {
                self.bump();
                Ok(Segment::Variable {
                    field_path,
                    segments,
                })
            }
            Token::Eof => Err(SyntaxError::new(
                Kind::UnterminatedVariable,
                format!("unterminated variable segment: {field_path}"),
            )),
            tok => Err(SyntaxError::new(
                Kind::UnexpectedToken,
                format!("expected '}}' to close variable {field_path}, found {tok}"),
            )),
        }
    }

    fn field_path(&mut self) -> Result<String, SyntaxError> {
        let mut path = self.identifier()?.to_string();
        while self.eat(Token::Dot) {
            path.push('.');
            path.push_str(self.identifier()?);
        }
        Ok(path)
    }

    fn identifier(&mut self) -> Result<&'a str, SyntaxError> {
        match self.peek() {
            Token::Literal(ident) => {
                validate_identifier(ident)?;
                self.bump();
                Ok(ident)
            }
            Token::Eof => Err(SyntaxError::new(
                Kind::UnterminatedVariable,
                "unterminated variable segment",
            )),
            tok => Err(SyntaxError::new(
                Kind::EmptyFieldPathComponent,
                format!("empty field path component before {tok}"),
            )),
        }
    }

    fn peek(&self) -> Token<'a> {
        self.tokens.get(self.pos).copied().unwrap_or(Token::Eof)
    }

    fn bump(&mut self) {
        self.pos += 1;
    }

    fn eat(&mut self, expected: Token<'_>) -> bool {
        let hit = self.peek() == expected;
        if hit {
            self.bump();
        }
        hit
    }
}

fn nested_variable() -> SyntaxError {
    SyntaxError::new(Kind::NestedVariable, "variables cannot be nested")
}

/// `**` may only close the template, either on its own or as the last inner
/// segment of the last variable.
fn check_deep_wildcards(segments: &[Segment]) -> Result<(), SyntaxError> {
    let last = segments.len().saturating_sub(1);
    for (i, segment) in segments.iter().enumerate() {
        let misplaced = match segment {
            Segment::DeepWildcard => i != last,
            Segment::Variable {
                segments: inner, ..
            } => {
                let inner_last = inner.len().saturating_sub(1);
                inner
                    .iter()
                    .enumerate()
                    .any(|(j, s)| *s == Segment::DeepWildcard && (i != last || j != inner_last))
            }
            Segment::Literal(_) | Segment::Wildcard => false,
        };
        if misplaced {
            return Err(SyntaxError::new(
                Kind::MisplacedDeepWildcard,
                "'**' must be the last segment of the template",
            ));
        }
    }
    Ok(())
}

/// RFC 3986 `pchar` minus `%`, which is checked as part of an escape.
const fn is_pchar(b: u8) -> bool {
    b.is_ascii_alphanumeric()
        || matches!(
            b,
            b'-' | b'.'
                | b'_'
                | b'~'
                | b'!'
                | b'$'
                | b'&'
                | b'\''
                | b'('
                | b')'
                | b'*'
                | b'+'
                | b','
                | b';'
                | b'='
                | b':'
                | b'@'
        )
}

fn validate_literal(lit: &str) -> Result<(), SyntaxError> {
    let bytes = lit.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let escaped = bytes.get(i + 1).is_some_and(u8::is_ascii_hexdigit)
                && bytes.get(i + 2).is_some_and(u8::is_ascii_hexdigit);
            if !escaped {
                return Err(SyntaxError::new(
                    Kind::InvalidPercentEncoding,
                    format!("invalid percent-encoding in {lit:?}"),
                ));
            }
            i += 3;
            continue;
        }
        if !is_pchar(bytes[i]) {
            // every byte before `i` was ASCII, so `i` is a char boundary
            let c = lit[i..].chars().next().unwrap_or_default();
            return Err(SyntaxError::new(
                Kind::InvalidLiteral,
                format!("invalid character {c:?} in path segment {lit:?}"),
            ));
        }
        i += 1;
    }
    Ok(())
}

fn validate_identifier(ident: &str) -> Result<(), SyntaxError> {
    let mut chars = ident.chars();
    let valid = chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
    if valid {
        Ok(())
    } else {
        Err(SyntaxError::new(
            Kind::InvalidIdentifier,
            format!("invalid identifier {ident:?} in field path"),
        ))
    }
}

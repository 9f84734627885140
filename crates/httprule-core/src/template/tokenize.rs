//! Lexer for path templates.

use std::fmt;

/// One lexical unit of a path template.
///
/// `*` and `**` are not structural: they arrive as [`Token::Literal`] and the
/// parser recognizes them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Token<'a> {
    Literal(&'a str),
    Slash,
    LBrace,
    RBrace,
    Eq,
    Dot,
    Eof,
}

impl fmt::Display for Token<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(s) => write!(f, "{s:?}"),
            Self::Slash => f.write_str("'/'"),
            Self::LBrace => f.write_str("'{'"),
            Self::RBrace => f.write_str("'}'"),
            Self::Eq => f.write_str("'='"),
            Self::Dot => f.write_str("'.'"),
            Self::Eof => f.write_str("end of template"),
        }
    }
}

#[derive(Clone, Copy)]
enum State {
    /// Outside any variable.
    Init,
    /// Between `{` and `=`/`}`.
    Field,
    /// Between `=` and `}`.
    Nested,
}

impl State {
    const fn delimiters(self) -> &'static [char] {
        match self {
            Self::Init => &['/', '{'],
            Self::Field => &['.', '=', '}'],
            Self::Nested => &['/', '}'],
        }
    }
}

/// Split a template (without its leading `/`) into tokens and a verb.
///
/// The verb is `None` when the template has no trailing colon, `Some("")`
/// for `path:` and `Some("VERB")` for `path:VERB`. The token stream always
/// ends with exactly one [`Token::Eof`].
pub(crate) fn tokenize(path: &str) -> (Vec<Token<'_>>, Option<&str>) {
    let mut tokens = Vec::new();
    let mut state = State::Init;
    let mut rest = path;

    while !rest.is_empty() {
        let Some(idx) = rest.find(state.delimiters()) else {
            tokens.push(Token::Literal(rest));
            break;
        };
        if idx > 0 {
            tokens.push(Token::Literal(&rest[..idx]));
        }
        let token = match rest.as_bytes()[idx] {
            b'/' => Token::Slash,
            b'.' => Token::Dot,
            b'{' => {
                state = State::Field;
                Token::LBrace
            }
            b'=' => {
                state = State::Nested;
                Token::Eq
            }
            // only `}` is left among the delimiters
            _ => {
                state = State::Init;
                Token::RBrace
            }
        };
        tokens.push(token);
        rest = &rest[idx + 1..];
    }

    let verb = split_verb(&mut tokens);
    tokens.push(Token::Eof);
    (tokens, verb)
}

/// Detach a trailing `:verb` from the final literal token.
///
/// A colon right after a closing `}` always starts the verb, so the first
/// colon is used there; otherwise the last colon wins, which lets literals
/// such as `a:b:verb` keep their inner colons.
fn split_verb<'a>(tokens: &mut Vec<Token<'a>>) -> Option<&'a str> {
    let Some(&Token::Literal(last)) = tokens.last() else {
        return None;
    };
    let after_variable = tokens.len() >= 2 && tokens[tokens.len() - 2] == Token::RBrace;
    let idx = if after_variable {
        last.find(':')
    } else {
        last.rfind(':')
    }?;

    let verb = &last[idx + 1..];
    if idx == 0 {
        tokens.pop();
    } else if let Some(slot) = tokens.last_mut() {
        *slot = Token::Literal(&last[..idx]);
    }
    Some(verb)
}

//! Validated op-code programs and the matcher that runs them.

use std::fmt;
use std::ops::Range;

use httprule_core::{OpCode, Template, OPCODE_VERSION};

use super::error::PatternError;
use super::params::PathParams;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Op {
    code: OpCode,
    /// `LitPush`: pool index. `ConcatN`: entry count. `Capture`: index into
    /// `vars`. `PushM`: number of component-consuming ops after it.
    operand: usize,
}

/// A path template ready for matching.
///
/// Built from a raw `(version, opcodes, pool, verb)` program, which is checked
/// once up front so that matching never fails on a malformed program.
/// Immutable and cheap to share across threads.
///
/// # Examples
///
/// ```
/// use httprule::Pattern;
///
/// let template = httprule_core::compile("/v1/{name=messages/*}:get")?;
/// let pattern = Pattern::from_template(&template)?;
///
/// let params = pattern.match_path("/v1/messages/abc:get").unwrap();
/// assert_eq!(params.get("name"), Some("messages/abc"));
/// assert!(pattern.match_path("/v1/messages/abc").is_none());
/// assert_eq!(pattern.to_string(), "/v1/{name=messages/*}:get");
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern {
    ops: Vec<Op>,
    pool: Vec<String>,
    /// Pool entries decoded the same way as request components.
    literals: Vec<String>,
    vars: Vec<String>,
    stack_size: usize,
    verb: String,
}

impl Pattern {
    /// Check and load a raw program.
    ///
    /// # Errors
    ///
    /// Returns [`PatternError`] for an unknown version, an odd number of
    /// op-code words, unknown op-codes, pool indices out of range, a
    /// non-positive `ConcatN` count, or stack underflow.
    pub fn new<S: AsRef<str>>(
        version: u32,
        opcodes: &[i32],
        pool: &[S],
        verb: &str,
    ) -> Result<Self, PatternError> {
        let result = Self::build(version, opcodes, pool, verb);
        match &result {
            Ok(pattern) => tracing::trace!(%pattern, "pattern built"),
            Err(e) => tracing::debug!(error = %e, ?opcodes, "invalid pattern"),
        }
        result
    }

    /// Load a program produced by [`httprule_core::compile`].
    ///
    /// # Errors
    ///
    /// Same as [`Pattern::new`].
    pub fn from_template(template: &Template) -> Result<Self, PatternError> {
        Self::new(
            template.version,
            &template.opcodes,
            &template.pool,
            &template.verb,
        )
    }

    fn build<S: AsRef<str>>(
        version: u32,
        opcodes: &[i32],
        pool: &[S],
        verb: &str,
    ) -> Result<Self, PatternError> {
        if version != OPCODE_VERSION {
            return Err(PatternError::UnsupportedVersion(version));
        }
        if opcodes.len() % 2 != 0 {
            return Err(PatternError::OddOpCodes(opcodes.len()));
        }

        let pool_index = |operand: i32| {
            usize::try_from(operand)
                .ok()
                .filter(|&idx| idx < pool.len())
                .ok_or(PatternError::PoolIndexOutOfRange {
                    index: operand,
                    len: pool.len(),
                })
        };

        let mut ops = Vec::with_capacity(opcodes.len() / 2);
        let mut vars = Vec::new();
        let mut stack = 0_usize;
        let mut stack_size = 0;
        for pair in opcodes.chunks_exact(2) {
            let (code, raw) = (pair[0], pair[1]);
            let code = OpCode::try_from(code).map_err(PatternError::InvalidOpCode)?;
            let operand = match code {
                OpCode::Nop => continue,
                OpCode::Push | OpCode::PushM => {
                    stack += 1;
                    0
                }
                OpCode::LitPush => {
                    stack += 1;
                    pool_index(raw)?
                }
                OpCode::ConcatN => {
                    let n = usize::try_from(raw)
                        .ok()
                        .filter(|&n| n > 0)
                        .ok_or(PatternError::NonPositiveConcat(raw))?;
                    stack = stack.checked_sub(n).ok_or(PatternError::StackUnderflow)? + 1;
                    n
                }
                OpCode::Capture => {
                    let name = pool[pool_index(raw)?].as_ref();
                    stack = stack.checked_sub(1).ok_or(PatternError::StackUnderflow)?;
                    vars.push(name.to_string());
                    vars.len() - 1
                }
            };
            stack_size = stack_size.max(stack);
            ops.push(Op { code, operand });
        }

        let mut consumers_after = 0;
        for op in ops.iter_mut().rev() {
            if op.code == OpCode::PushM {
                op.operand = consumers_after;
            }
            if op.code.consumes_component() {
                consumers_after += 1;
            }
        }

        let pool: Vec<String> = pool.iter().map(|s| s.as_ref().to_string()).collect();
        let literals = pool
            .iter()
            .map(|lit| decode_component(lit).unwrap_or_else(|| lit.clone()))
            .collect();

        Ok(Self {
            ops,
            pool,
            literals,
            vars,
            stack_size,
            verb: verb.to_string(),
        })
    }

    /// Custom verb, empty when the pattern has none.
    #[must_use]
    pub fn verb(&self) -> &str {
        &self.verb
    }

    /// Captured field paths in capture order; repeats are kept.
    #[must_use]
    pub fn vars(&self) -> &[String] {
        &self.vars
    }

    /// Match a request path such as `/v1/shelves/1:get`.
    ///
    /// The path must start with `/`. When the pattern has a verb, the last
    /// component must end with `:verb` after a non-empty prefix. Components
    /// are percent-decoded, except `%2F`, which stays encoded so a captured
    /// value never gains a separator the client did not send.
    #[must_use]
    pub fn match_path(&self, path: &str) -> Option<PathParams> {
        let Some(rest) = path.strip_prefix('/') else {
            tracing::trace!(path, "path without leading slash");
            return None;
        };

        let mut raw: Vec<&str> = rest.split('/').collect();
        if !self.verb.is_empty() {
            let last = raw.len() - 1;
            let Some(stem) = raw[last]
                .strip_suffix(self.verb.as_str())
                .and_then(|s| s.strip_suffix(':'))
                .filter(|s| !s.is_empty())
            else {
                tracing::trace!(path, verb = %self.verb, "verb mismatch");
                return None;
            };
            raw[last] = stem;
        }

        let components = raw
            .iter()
            .map(|c| decode_component(c))
            .collect::<Option<Vec<_>>>()?;
        self.match_components(&components, &self.verb)
    }

    /// Match already split and decoded components against the program.
    ///
    /// `verb` must equal the pattern's verb. `LitPush` compares one component
    /// exactly, `Push` takes any one, and `PushM` takes one or more while
    /// leaving a component for each op that follows it. Every component must
    /// be consumed.
    #[must_use]
    pub fn match_components<S: AsRef<str>>(
        &self,
        components: &[S],
        verb: &str,
    ) -> Option<PathParams> {
        if self.verb != verb {
            return None;
        }

        let len = components.len();
        let mut pos = 0;
        let mut stack: Vec<Range<usize>> = Vec::with_capacity(self.stack_size);
        let mut captured: Vec<Option<Range<usize>>> = vec![None; self.vars.len()];
        for op in &self.ops {
            match op.code {
                OpCode::Nop => {}
                OpCode::Push | OpCode::LitPush => {
                    let Some(component) = components.get(pos) else {
                        tracing::trace!("insufficient number of components");
                        return None;
                    };
                    if op.code == OpCode::LitPush {
                        let lit = &self.literals[op.operand];
                        if component.as_ref() != lit {
                            tracing::trace!(
                                got = component.as_ref(),
                                want = %lit,
                                "literal mismatch"
                            );
                            return None;
                        }
                    }
                    stack.push(pos..pos + 1);
                    pos += 1;
                }
                OpCode::PushM => {
                    let end = len.checked_sub(op.operand).filter(|&end| end > pos)?;
                    stack.push(pos..end);
                    pos = end;
                }
                OpCode::ConcatN => {
                    let at = stack.len() - op.operand;
                    let joined = stack[at].start..stack[stack.len() - 1].end;
                    stack.truncate(at);
                    stack.push(joined);
                }
                OpCode::Capture => {
                    captured[op.operand] = stack.pop();
                }
            }
        }
        if pos < len {
            tracing::trace!(remaining = len - pos, "unconsumed components");
            return None;
        }

        let mut params = PathParams::with_capacity(self.vars.len());
        for (name, span) in self.vars.iter().zip(captured) {
            if let Some(span) = span {
                params.insert(name, join(&components[span]));
            }
        }
        Some(params)
    }
}

fn join<S: AsRef<str>>(components: &[S]) -> String {
    let mut joined = String::new();
    for (i, c) in components.iter().enumerate() {
        if i > 0 {
            joined.push('/');
        }
        joined.push_str(c.as_ref());
    }
    joined
}

/// Percent-decode one path component, keeping `%2F` encoded.
///
/// `None` when the decoded bytes are not UTF-8.
fn decode_component(raw: &str) -> Option<String> {
    if !raw.contains('%') {
        return Some(raw.to_string());
    }
    let mut decoded = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(idx) = find_encoded_slash(rest) {
        decoded.push_str(&urlencoding::decode(&rest[..idx]).ok()?);
        decoded.push_str("%2F");
        rest = &rest[idx + 3..];
    }
    decoded.push_str(&urlencoding::decode(rest).ok()?);
    Some(decoded)
}

fn find_encoded_slash(s: &str) -> Option<usize> {
    s.as_bytes()
        .windows(3)
        .position(|w| w[0] == b'%' && w[1] == b'2' && w[2].eq_ignore_ascii_case(&b'f'))
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut stack: Vec<String> = Vec::with_capacity(self.stack_size);
        for op in &self.ops {
            match op.code {
                OpCode::Nop => {}
                OpCode::Push => stack.push("*".into()),
                OpCode::PushM => stack.push("**".into()),
                OpCode::LitPush => stack.push(self.pool[op.operand].clone()),
                OpCode::ConcatN => {
                    let at = stack.len() - op.operand;
                    let joined = stack.split_off(at).join("/");
                    stack.push(joined);
                }
                OpCode::Capture => {
                    if let Some(top) = stack.last_mut() {
                        *top = format!("{{{}={top}}}", self.vars[op.operand]);
                    }
                }
            }
        }
        write!(f, "/{}", stack.join("/"))?;
        if !self.verb.is_empty() {
            write!(f, ":{}", self.verb)?;
        }
        Ok(())
    }
}

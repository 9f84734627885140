//! Flattening of a segment tree into the op-code artifact.

use serde::{Deserialize, Serialize};

use super::Segment;

/// Revision of the op-code encoding emitted by this crate.
pub const OPCODE_VERSION: u32 = 1;

/// Instruction of a compiled [`Template`].
///
/// Every instruction is stored as an `(opcode, operand)` pair of `i32`s.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum OpCode {
    /// Does nothing.
    Nop = 0,
    /// Consume one path component (`*`).
    Push = 1,
    /// Consume one component equal to the pool entry named by the operand.
    LitPush = 2,
    /// Consume one or more components (`**`).
    PushM = 3,
    /// Join the top `operand` stack entries with `/`.
    ConcatN = 4,
    /// Pop the top entry and bind it to the field path at pool index `operand`.
    Capture = 5,
}

impl OpCode {
    /// Wire value of this op-code.
    #[must_use]
    pub const fn as_i32(self) -> i32 {
        self as i32
    }

    /// Whether executing this op-code consumes a path component.
    #[must_use]
    pub const fn consumes_component(self) -> bool {
        matches!(self, Self::Push | Self::LitPush | Self::PushM)
    }
}

impl TryFrom<i32> for OpCode {
    type Error = i32;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        Ok(match value {
            0 => Self::Nop,
            1 => Self::Push,
            2 => Self::LitPush,
            3 => Self::PushM,
            4 => Self::ConcatN,
            5 => Self::Capture,
            other => return Err(other),
        })
    }
}

/// Compiled path template.
///
/// The persisted shape is the `version`, `opcodes`, `pool` and `verb`
/// 4-tuple. The source text in `template` is kept for diagnostics only: it
/// is not serialized and does not take part in equality.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Template {
    /// Op-code encoding revision, see [`OPCODE_VERSION`].
    pub version: u32,
    /// Flat `(opcode, operand)` pairs.
    pub opcodes: Vec<i32>,
    /// Literals and field paths referenced by operands, in first-use order.
    pub pool: Vec<String>,
    /// Custom verb, empty when the template has none.
    pub verb: String,
    /// Source template text.
    #[serde(skip)]
    pub template: String,
}

impl PartialEq for Template {
    fn eq(&self, other: &Self) -> bool {
        self.version == other.version
            && self.opcodes == other.opcodes
            && self.pool == other.pool
            && self.verb == other.verb
    }
}

impl Eq for Template {}

impl Template {
    /// Field paths captured by the template, deduplicated, in declaration order.
    #[must_use]
    pub fn fields(&self) -> Vec<&str> {
        let mut fields: Vec<&str> = Vec::new();
        for pair in self.opcodes.chunks_exact(2) {
            if pair[0] != OpCode::Capture.as_i32() {
                continue;
            }
            let Some(field) = usize::try_from(pair[1])
                .ok()
                .and_then(|idx| self.pool.get(idx))
            else {
                continue;
            };
            if !fields.contains(&field.as_str()) {
                fields.push(field);
            }
        }
        fields
    }
}

/// Build the artifact for an already parsed segment list.
pub(crate) fn compile_segments(
    segments: &[Segment],
    verb: Option<&str>,
    template: &str,
) -> Template {
    let mut compiler = Compiler::default();
    for segment in segments {
        compiler.segment(segment);
    }
    Template {
        version: OPCODE_VERSION,
        opcodes: compiler.opcodes,
        pool: compiler.pool,
        verb: verb.unwrap_or_default().to_string(),
        template: template.to_string(),
    }
}

#[derive(Default)]
struct Compiler {
    opcodes: Vec<i32>,
    pool: Vec<String>,
}

impl Compiler {
    fn segment(&mut self, segment: &Segment) {
        match segment {
            Segment::Literal(lit) => {
                let idx = self.intern(lit);
                self.emit(OpCode::LitPush, idx);
            }
            Segment::Wildcard => self.emit(OpCode::Push, 0),
            Segment::DeepWildcard => self.emit(OpCode::PushM, 0),
            Segment::Variable {
                field_path,
                segments,
            } => {
                for inner in segments {
                    self.segment(inner);
                }
                self.emit(OpCode::ConcatN, operand(segments.len()));
                let idx = self.intern(field_path);
                self.emit(OpCode::Capture, idx);
            }
        }
    }

    fn intern(&mut self, value: &str) -> i32 {
        if let Some(idx) = self.pool.iter().position(|p| p == value) {
            return operand(idx);
        }
        self.pool.push(value.to_string());
        operand(self.pool.len() - 1)
    }

    fn emit(&mut self, op: OpCode, operand: i32) {
        self.opcodes.extend([op.as_i32(), operand]);
    }
}

fn operand(n: usize) -> i32 {
    i32::try_from(n).unwrap_or(i32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn lit(s: &str) -> Segment {
        Segment::Literal(s.to_string())
    }

    #[test]
    fn literals_only() {
        let tmpl = compile_segments(&[lit("a"), lit("b"), lit("c")], None, "/a/b/c");
        assert_eq!(tmpl.opcodes, vec![2, 0, 2, 1, 2, 2]);
        assert_eq!(tmpl.pool, vec!["a", "b", "c"]);
        assert!(tmpl.fields().is_empty());
        assert_eq!(tmpl.version, OPCODE_VERSION);
    }

    #[test]
    fn repeated_literals_share_a_pool_slot() {
        let tmpl = compile_segments(&[lit("a"), Segment::Wildcard, lit("a")], None, "/a/*/a");
        assert_eq!(tmpl.opcodes, vec![2, 0, 1, 0, 2, 0]);
        assert_eq!(tmpl.pool, vec!["a"]);
    }

    #[test]
    fn variable_emits_inner_ops_then_concat_and_capture() {
        let segments = [
            lit("v1"),
            Segment::Variable {
                field_path: "name".into(),
                segments: vec![lit("shelves"), Segment::Wildcard],
            },
            Segment::DeepWildcard,
        ];
        let tmpl = compile_segments(&segments, Some("get"), "/v1/{name=shelves/*}/**:get");
        assert_eq!(tmpl.opcodes, vec![2, 0, 2, 1, 1, 0, 4, 2, 5, 2, 3, 0]);
        assert_eq!(tmpl.pool, vec!["v1", "shelves", "name"]);
        assert_eq!(tmpl.verb, "get");
        assert_eq!(tmpl.fields(), vec!["name"]);
    }

    #[test]
    fn fields_are_deduplicated_in_order() {
        let var = |path: &str| Segment::Variable {
            field_path: path.into(),
            segments: vec![Segment::Wildcard],
        };
        let tmpl = compile_segments(&[var("b"), var("a"), var("b")], None, "/{b}/{a}/{b}");
        assert_eq!(tmpl.fields(), vec!["b", "a"]);
    }

    #[test]
    fn root_sentinel_interns_empty_string() {
        let tmpl = compile_segments(&[Segment::root()], None, "/");
        assert_eq!(tmpl.opcodes, vec![2, 0]);
        assert_eq!(tmpl.pool, vec![""]);
    }

    #[test]
    fn opcode_wire_values() {
        for (op, value) in [
            (OpCode::Nop, 0),
            (OpCode::Push, 1),
            (OpCode::LitPush, 2),
            (OpCode::PushM, 3),
            (OpCode::ConcatN, 4),
            (OpCode::Capture, 5),
        ] {
            assert_eq!(op.as_i32(), value);
            assert_eq!(OpCode::try_from(value), Ok(op));
        }
        assert_eq!(OpCode::try_from(6), Err(6));
        assert_eq!(OpCode::try_from(-1), Err(-1));
    }

    #[test]
    fn serialized_shape_omits_source_text() {
        let tmpl = compile_segments(&[lit("v1")], Some("watch"), "/v1:watch");
        let json = serde_json::to_value(&tmpl).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "version": 1,
                "opcodes": [2, 0],
                "pool": ["v1"],
                "verb": "watch",
            })
        );

        let back: Template = serde_json::from_value(json).unwrap();
        assert_eq!(back, tmpl);
        assert_eq!(back.template, "");
    }

    const _: () = {
        const fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Template>();
    };
}

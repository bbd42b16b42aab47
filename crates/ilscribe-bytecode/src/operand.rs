//! Instruction operands: sizing and trace rendering.
//!
//! `Operand` is a closed set decided at the call site. Both the size rule and
//! the formatting rule match on it exhaustively, so adding a variant forces
//! both tables to be revisited.

use std::fmt;

use crate::ids::{Label, LocalVar};
use crate::metadata::{CallConv, FieldRef, MethodRef, Signature, TypeRef, describe_types};
use crate::opcode::{OpCode, OperandType};

/// The operand attached to one emitted instruction.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Operand<'a> {
    /// Missing operand where one was expected. Renders as `NULL`.
    None,
    Label(Label),
    /// `switch` jump table.
    Labels(&'a [Label]),
    Local(&'a LocalVar),
    Str(&'a str),
    U8(u8),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    F32(f32),
    F64(f64),
    /// Method or constructor token.
    Method(&'a MethodRef),
    Field(&'a FieldRef),
    Type(&'a TypeRef),
    Signature(&'a Signature),
    /// `calli` call-site convention.
    CallConv(CallConv),
    /// Marker for an instruction the writer inserts on its own.
    Autogenerated,
}

impl Operand<'_> {
    /// Bytes this operand adds to `opcode`'s base size.
    ///
    /// Precedence matters: locals first, then jump tables, then single
    /// labels, then the narrow immediates. Everything else is a 4-byte
    /// token or immediate.
    pub fn size(&self, opcode: OpCode) -> usize {
        let single_byte = opcode.takes_single_byte_argument();
        match self {
            Self::Local(_) => {
                if opcode.operand_type() == OperandType::InlineNone {
                    0
                } else if single_byte {
                    1
                } else {
                    2
                }
            }
            Self::Labels(labels) => 4 + labels.len() * 4,
            Self::Label(_) => {
                if single_byte {
                    1
                } else {
                    4
                }
            }
            Self::U8(_) | Self::I8(_) => 1,
            Self::I16(_) => 2,
            Self::I64(_) | Self::F64(_) => 8,
            Self::None
            | Self::Str(_)
            | Self::I32(_)
            | Self::F32(_)
            | Self::Method(_)
            | Self::Field(_)
            | Self::Type(_)
            | Self::Signature(_)
            | Self::CallConv(_)
            | Self::Autogenerated => 4,
        }
    }
}

/// Total encoded size of `opcode` carrying `operand`.
pub fn instruction_size(opcode: OpCode, operand: &Operand<'_>) -> usize {
    opcode.size() + operand.size(opcode)
}

/// Extra text appended after an operand, describing call-site parameter types.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Annotation<'a> {
    /// Vararg parameter types of a `call`: `(A, B)`.
    OptionalParams(&'a [TypeRef]),
    /// Indirect call signature: `R (A, B)` plus optional vararg types.
    Calli {
        return_type: &'a TypeRef,
        params: &'a [TypeRef],
        optional: Option<&'a [TypeRef]>,
    },
}

impl fmt::Display for Annotation<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OptionalParams(types) => f.write_str(&describe_types(types)),
            Self::Calli {
                return_type,
                params,
                optional,
            } => {
                write!(f, "{return_type} {}", describe_types(params))?;
                if let Some(optional) = optional {
                    write!(f, " {}", describe_types(optional))?;
                }
                Ok(())
            }
        }
    }
}

/// Render an operand for a trace line.
///
/// | operand       | rendering                      |
/// | ------------- | ------------------------------ |
/// | None          | `NULL`                         |
/// | Method        | full description               |
/// | Str           | quoted text                    |
/// | Label         | `Label<id>`                    |
/// | Labels        | `Labels<id1>,<id2>,...`        |
/// | Local         | `<index> (<type>)`             |
/// | Autogenerated | `(autogenerated)`              |
/// | anything else | `Display` form, trimmed        |
///
/// A present `extra` annotation is appended after a single space.
pub fn format_operand(operand: &Operand<'_>, extra: Option<&Annotation<'_>>) -> String {
    let text = match operand {
        Operand::None => "NULL".to_string(),
        Operand::Method(method) => method.full_description(),
        Operand::Str(s) => format!("\"{s}\""),
        Operand::Label(label) => label.to_string(),
        Operand::Labels(labels) => {
            let ids: Vec<String> = labels.iter().map(|l| l.id().to_string()).collect();
            format!("Labels{}", ids.join(","))
        }
        Operand::Local(local) => format!("{} ({})", local.index, local.local_type),
        Operand::Autogenerated => "(autogenerated)".to_string(),
        Operand::U8(v) => v.to_string(),
        Operand::I8(v) => v.to_string(),
        Operand::I16(v) => v.to_string(),
        Operand::I32(v) => v.to_string(),
        Operand::I64(v) => v.to_string(),
        Operand::F32(v) => v.to_string(),
        Operand::F64(v) => v.to_string(),
        Operand::Field(field) => field.to_string().trim().to_string(),
        Operand::Type(ty) => ty.full_name().trim().to_string(),
        Operand::Signature(sig) => sig.to_string().trim().to_string(),
        Operand::CallConv(conv) => conv.to_string(),
    };

    match extra {
        Some(extra) => format!("{text} {extra}"),
        None => text,
    }
}

//! CIL instruction model for ilscribe.
//!
//! This crate contains:
//! - The ECMA-335 opcode table (`OpCode`, `OperandType`)
//! - Metadata descriptors referenced by operands (types, methods, fields, signatures)
//! - Writer handles (`Label`, `LocalVar`) and exception-block transitions
//! - Operand sizing and trace formatting shared by the emitter and its sinks

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub mod block;
pub mod format;
pub mod ids;
pub mod metadata;
pub mod opcode;
pub mod operand;

#[cfg(test)]
mod block_tests;
#[cfg(test)]
mod opcode_tests;

pub use block::ExceptionBlock;
pub use format::{BRANCH_ARROW, LineBuilder, code_pos, cols, mnemonic};
pub use ids::{Label, LocalVar};
pub use metadata::{
    CallConv, CallKind, CallingConventions, FieldRef, MethodRef, Signature, TypeRef,
    UnmanagedCallConv, describe_types,
};
pub use opcode::{OpCode, OperandType, PREFIX_FE, UnknownOpcode};
pub use operand::{Annotation, Operand, format_operand, instruction_size};

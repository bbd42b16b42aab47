//! The instruction writer consumed by the emitter.

use ilscribe_bytecode::{
    CallingConventions, FieldRef, Label, LocalVar, MethodRef, OpCode, Signature, TypeRef,
    UnmanagedCallConv,
};

/// Low-level instruction writer.
///
/// The emitter forwards every instruction here unchanged and keeps its own
/// offset in step with what the writer encodes. Implementations that insert
/// instructions on their own must do so only at exception-block
/// transitions: one `leave` per handler begin and one per block end.
pub trait IlWriter {
    type Error: std::error::Error;

    fn emit(&mut self, opcode: OpCode) -> Result<(), Self::Error>;
    fn emit_local(&mut self, opcode: OpCode, local: &LocalVar) -> Result<(), Self::Error>;
    fn emit_field(&mut self, opcode: OpCode, field: &FieldRef) -> Result<(), Self::Error>;
    fn emit_label(&mut self, opcode: OpCode, label: Label) -> Result<(), Self::Error>;
    fn emit_labels(&mut self, opcode: OpCode, labels: &[Label]) -> Result<(), Self::Error>;
    fn emit_str(&mut self, opcode: OpCode, value: &str) -> Result<(), Self::Error>;
    fn emit_u8(&mut self, opcode: OpCode, value: u8) -> Result<(), Self::Error>;
    fn emit_i8(&mut self, opcode: OpCode, value: i8) -> Result<(), Self::Error>;
    fn emit_i16(&mut self, opcode: OpCode, value: i16) -> Result<(), Self::Error>;
    fn emit_i32(&mut self, opcode: OpCode, value: i32) -> Result<(), Self::Error>;
    fn emit_i64(&mut self, opcode: OpCode, value: i64) -> Result<(), Self::Error>;
    fn emit_f32(&mut self, opcode: OpCode, value: f32) -> Result<(), Self::Error>;
    fn emit_f64(&mut self, opcode: OpCode, value: f64) -> Result<(), Self::Error>;
    fn emit_method(&mut self, opcode: OpCode, method: &MethodRef) -> Result<(), Self::Error>;
    fn emit_type(&mut self, opcode: OpCode, ty: &TypeRef) -> Result<(), Self::Error>;
    fn emit_signature(&mut self, opcode: OpCode, signature: &Signature)
    -> Result<(), Self::Error>;

    /// Operand slot without a value (a nil token).
    fn emit_nil(&mut self, opcode: OpCode) -> Result<(), Self::Error>;

    /// Call with optional vararg parameter types.
    fn emit_call(
        &mut self,
        opcode: OpCode,
        method: &MethodRef,
        optional_params: &[TypeRef],
    ) -> Result<(), Self::Error>;

    /// Indirect managed call.
    fn emit_calli(
        &mut self,
        opcode: OpCode,
        conv: CallingConventions,
        return_type: &TypeRef,
        params: &[TypeRef],
        optional_params: &[TypeRef],
    ) -> Result<(), Self::Error>;

    /// Indirect call into native code.
    fn emit_calli_unmanaged(
        &mut self,
        opcode: OpCode,
        conv: UnmanagedCallConv,
        return_type: &TypeRef,
        params: &[TypeRef],
    ) -> Result<(), Self::Error>;

    fn define_label(&mut self) -> Label;
    fn mark_label(&mut self, label: Label) -> Result<(), Self::Error>;
    fn declare_local(&mut self, local_type: TypeRef, pinned: bool)
    -> Result<LocalVar, Self::Error>;

    /// Locals declared so far, in slot order.
    fn locals(&self) -> &[LocalVar];

    /// Opens a protected region and returns the label its exits branch to.
    fn begin_exception_block(&mut self) -> Result<Label, Self::Error>;
    fn begin_catch_block(&mut self, catch_type: &TypeRef) -> Result<(), Self::Error>;
    fn begin_except_filter_block(&mut self) -> Result<(), Self::Error>;
    fn begin_fault_block(&mut self) -> Result<(), Self::Error>;
    fn begin_finally_block(&mut self) -> Result<(), Self::Error>;
    fn end_exception_block(&mut self) -> Result<(), Self::Error>;

    /// The opcode actually encoded when `opcode` accesses `local`.
    ///
    /// Writers that pick short forms on their own report the choice here so
    /// the emitter can size the instruction the same way.
    fn local_opcode(&self, opcode: OpCode, _local: &LocalVar) -> OpCode {
        opcode
    }
}

//! Test writers.

use ilscribe_bytecode::{
    CallingConventions, FieldRef, Label, LocalVar, MethodRef, OpCode, Signature, TypeRef,
    UnmanagedCallConv, describe_types,
};

use crate::writer::IlWriter;

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
#[error("writer rejected `{0}`")]
pub struct Rejected(pub String);

/// Writer that records every call as a line of text.
///
/// Calls whose name equals `reject` fail with [`Rejected`] and are not
/// recorded.
#[derive(Debug, Default)]
pub struct RecordingWriter {
    pub calls: Vec<String>,
    pub locals: Vec<LocalVar>,
    pub reject: Option<&'static str>,
    next_label: u32,
}

impl RecordingWriter {
    pub fn rejecting(call: &'static str) -> Self {
        Self {
            reject: Some(call),
            ..Self::default()
        }
    }

    fn record(&mut self, call: &'static str, args: String) -> Result<(), Rejected> {
        if self.reject == Some(call) {
            return Err(Rejected(call.to_string()));
        }
        if args.is_empty() {
            self.calls.push(call.to_string());
        } else {
            self.calls.push(format!("{call} {args}"));
        }
        Ok(())
    }
}

impl IlWriter for RecordingWriter {
    type Error = Rejected;

    fn emit(&mut self, opcode: OpCode) -> Result<(), Rejected> {
        self.record("emit", opcode.to_string())
    }

    fn emit_local(&mut self, opcode: OpCode, local: &LocalVar) -> Result<(), Rejected> {
        self.record("emit_local", format!("{opcode} {}", local.index))
    }

    fn emit_field(&mut self, opcode: OpCode, field: &FieldRef) -> Result<(), Rejected> {
        self.record("emit_field", format!("{opcode} {}", field.name))
    }

    fn emit_label(&mut self, opcode: OpCode, label: Label) -> Result<(), Rejected> {
        self.record("emit_label", format!("{opcode} {label}"))
    }

    fn emit_labels(&mut self, opcode: OpCode, labels: &[Label]) -> Result<(), Rejected> {
        self.record("emit_labels", format!("{opcode} {}", labels.len()))
    }

    fn emit_str(&mut self, opcode: OpCode, value: &str) -> Result<(), Rejected> {
        self.record("emit_str", format!("{opcode} {value}"))
    }

    fn emit_u8(&mut self, opcode: OpCode, value: u8) -> Result<(), Rejected> {
        self.record("emit_u8", format!("{opcode} {value}"))
    }

    fn emit_i8(&mut self, opcode: OpCode, value: i8) -> Result<(), Rejected> {
        self.record("emit_i8", format!("{opcode} {value}"))
    }

    fn emit_i16(&mut self, opcode: OpCode, value: i16) -> Result<(), Rejected> {
        self.record("emit_i16", format!("{opcode} {value}"))
    }

    fn emit_i32(&mut self, opcode: OpCode, value: i32) -> Result<(), Rejected> {
        self.record("emit_i32", format!("{opcode} {value}"))
    }

    fn emit_i64(&mut self, opcode: OpCode, value: i64) -> Result<(), Rejected> {
        self.record("emit_i64", format!("{opcode} {value}"))
    }

    fn emit_f32(&mut self, opcode: OpCode, value: f32) -> Result<(), Rejected> {
        self.record("emit_f32", format!("{opcode} {value}"))
    }

    fn emit_f64(&mut self, opcode: OpCode, value: f64) -> Result<(), Rejected> {
        self.record("emit_f64", format!("{opcode} {value}"))
    }

    fn emit_method(&mut self, opcode: OpCode, method: &MethodRef) -> Result<(), Rejected> {
        self.record("emit_method", format!("{opcode} {}", method.name))
    }

    fn emit_type(&mut self, opcode: OpCode, ty: &TypeRef) -> Result<(), Rejected> {
        self.record("emit_type", format!("{opcode} {ty}"))
    }

    fn emit_signature(&mut self, opcode: OpCode, signature: &Signature) -> Result<(), Rejected> {
        self.record("emit_signature", format!("{opcode} {signature}"))
    }

    fn emit_nil(&mut self, opcode: OpCode) -> Result<(), Rejected> {
        self.record("emit_nil", opcode.to_string())
    }

    fn emit_call(
        &mut self,
        opcode: OpCode,
        method: &MethodRef,
        optional_params: &[TypeRef],
    ) -> Result<(), Rejected> {
        self.record(
            "emit_call",
            format!("{opcode} {} {}", method.name, describe_types(optional_params)),
        )
    }

    fn emit_calli(
        &mut self,
        opcode: OpCode,
        conv: CallingConventions,
        return_type: &TypeRef,
        params: &[TypeRef],
        _optional_params: &[TypeRef],
    ) -> Result<(), Rejected> {
        self.record(
            "emit_calli",
            format!("{opcode} {conv} {return_type}{}", describe_types(params)),
        )
    }

    fn emit_calli_unmanaged(
        &mut self,
        opcode: OpCode,
        conv: UnmanagedCallConv,
        return_type: &TypeRef,
        params: &[TypeRef],
    ) -> Result<(), Rejected> {
        self.record(
            "emit_calli_unmanaged",
            format!("{opcode} {conv} {return_type}{}", describe_types(params)),
        )
    }

    fn define_label(&mut self) -> Label {
        let label = Label(self.next_label);
        self.next_label += 1;
        label
    }

    fn mark_label(&mut self, label: Label) -> Result<(), Rejected> {
        self.record("mark_label", label.to_string())
    }

    fn declare_local(&mut self, local_type: TypeRef, pinned: bool) -> Result<LocalVar, Rejected> {
        self.record("declare_local", local_type.to_string())?;
        let mut local = LocalVar::new(self.locals.len() as u16, local_type);
        local.pinned = pinned;
        self.locals.push(local.clone());
        Ok(local)
    }

    fn locals(&self) -> &[LocalVar] {
        &self.locals
    }

    fn begin_exception_block(&mut self) -> Result<Label, Rejected> {
        self.record("begin_exception_block", String::new())?;
        Ok(self.define_label())
    }

    fn begin_catch_block(&mut self, catch_type: &TypeRef) -> Result<(), Rejected> {
        self.record("begin_catch_block", catch_type.to_string())
    }

    fn begin_except_filter_block(&mut self) -> Result<(), Rejected> {
        self.record("begin_except_filter_block", String::new())
    }

    fn begin_fault_block(&mut self) -> Result<(), Rejected> {
        self.record("begin_fault_block", String::new())
    }

    fn begin_finally_block(&mut self) -> Result<(), Rejected> {
        self.record("begin_finally_block", String::new())
    }

    fn end_exception_block(&mut self) -> Result<(), Rejected> {
        self.record("end_exception_block", String::new())
    }
}

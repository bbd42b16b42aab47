//! The tracing instruction emitter.

use ilscribe_bytecode::{
    Annotation, CallConv, CallingConventions, FieldRef, Label, LineBuilder, LocalVar, MethodRef,
    OpCode, Operand, Signature, TypeRef, UnmanagedCallConv, code_pos, format_operand,
    instruction_size,
};

use crate::config::EmitConfig;
use crate::sink::{NoopSink, TraceSink};
use crate::writer::IlWriter;

/// Wraps an [`IlWriter`], tracking the byte offset of every instruction and
/// optionally tracing a disassembly-style listing to a [`TraceSink`].
///
/// Every emission follows the same order: log at the current offset, forward
/// to the writer, then advance by the instruction's encoded size. An
/// instruction the writer rejects leaves the offset untouched.
pub struct Emitter<'w, W, S = NoopSink> {
    pub(crate) writer: &'w mut W,
    pub(crate) sink: S,
    pub(crate) config: EmitConfig,
    pub(crate) lines: LineBuilder,
    pub(crate) offset: usize,
}

impl<'w, W: IlWriter> Emitter<'w, W, NoopSink> {
    /// Emitter without a trace sink.
    pub fn untraced(writer: &'w mut W) -> Self {
        Self::new(writer, NoopSink, EmitConfig::default())
    }
}

impl<'w, W: IlWriter, S: TraceSink> Emitter<'w, W, S> {
    pub fn new(writer: &'w mut W, sink: S, config: EmitConfig) -> Self {
        Self {
            writer,
            sink,
            config,
            lines: LineBuilder::new(config.mnemonic_width),
            offset: 0,
        }
    }

    /// Byte offset of the next instruction.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Offset prefix for the next instruction, e.g. `L_002a: `.
    pub fn code_pos(&self) -> String {
        code_pos(self.offset)
    }

    pub fn config(&self) -> &EmitConfig {
        &self.config
    }

    pub fn writer(&self) -> &W {
        &*self.writer
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    pub fn define_label(&mut self) -> Label {
        self.writer.define_label()
    }

    pub fn declare_local(&mut self, local_type: TypeRef, pinned: bool) -> Result<LocalVar, W::Error> {
        self.writer.declare_local(local_type, pinned)
    }

    /// All locals declared through the writer so far.
    pub fn all_local_variables(&self) -> &[LocalVar] {
        self.writer.locals()
    }

    pub fn log_comment(&mut self, text: &str) {
        if self.config.trace {
            let line = self.lines.comment(self.offset, text);
            self.sink.log(line);
        }
    }

    /// Logs a local declaration. Declarations precede the code, so the line
    /// is always placed at `L_0000`.
    pub fn log_local_variable(&mut self, local: &LocalVar) {
        if self.config.trace {
            let line = self.lines.local(local);
            self.sink.log(line);
        }
    }

    pub(crate) fn trace(&mut self, line: impl FnOnce(&LineBuilder, usize) -> String) {
        if self.config.trace {
            let line = line(&self.lines, self.offset);
            self.sink.log(line);
        }
    }

    pub(crate) fn trace_text(&mut self, text: &str) {
        if self.config.trace {
            self.sink.log(text.to_string());
        }
    }

    pub(crate) fn indent(&mut self, delta: isize) {
        if self.config.trace {
            self.sink.change_indent(delta);
        }
    }

    fn trace_operand(&mut self, opcode: OpCode, operand: &Operand<'_>, extra: Option<&Annotation<'_>>) {
        self.trace(|lines, offset| lines.instruction(offset, opcode, &format_operand(operand, extra)));
    }

    fn forward(
        &mut self,
        opcode: OpCode,
        operand: Operand<'_>,
        extra: Option<Annotation<'_>>,
        write: impl FnOnce(&mut W) -> Result<(), W::Error>,
    ) -> Result<(), W::Error> {
        self.trace_operand(opcode, &operand, extra.as_ref());
        write(&mut *self.writer)?;
        self.offset += instruction_size(opcode, &operand);
        Ok(())
    }

    /// Operand-less instruction.
    pub fn emit(&mut self, opcode: OpCode) -> Result<(), W::Error> {
        self.trace(|lines, offset| lines.plain(offset, opcode));
        self.writer.emit(opcode)?;
        self.offset += opcode.size();
        Ok(())
    }

    /// Local access. Sized by the opcode the writer reports it will encode.
    pub fn emit_local(&mut self, opcode: OpCode, local: &LocalVar) -> Result<(), W::Error> {
        let encoded = self.writer.local_opcode(opcode, local);
        let operand = Operand::Local(local);
        self.trace_operand(opcode, &operand, None);
        self.writer.emit_local(opcode, local)?;
        self.offset += instruction_size(encoded, &operand);
        Ok(())
    }

    pub fn emit_field(&mut self, opcode: OpCode, field: &FieldRef) -> Result<(), W::Error> {
        self.forward(opcode, Operand::Field(field), None, |w| w.emit_field(opcode, field))
    }

    pub fn emit_label(&mut self, opcode: OpCode, label: Label) -> Result<(), W::Error> {
        self.forward(opcode, Operand::Label(label), None, |w| w.emit_label(opcode, label))
    }

    /// `switch` jump table.
    pub fn emit_labels(&mut self, opcode: OpCode, labels: &[Label]) -> Result<(), W::Error> {
        self.forward(opcode, Operand::Labels(labels), None, |w| w.emit_labels(opcode, labels))
    }

    pub fn emit_str(&mut self, opcode: OpCode, value: &str) -> Result<(), W::Error> {
        self.forward(opcode, Operand::Str(value), None, |w| w.emit_str(opcode, value))
    }

    pub fn emit_u8(&mut self, opcode: OpCode, value: u8) -> Result<(), W::Error> {
        self.forward(opcode, Operand::U8(value), None, |w| w.emit_u8(opcode, value))
    }

    pub fn emit_i8(&mut self, opcode: OpCode, value: i8) -> Result<(), W::Error> {
        self.forward(opcode, Operand::I8(value), None, |w| w.emit_i8(opcode, value))
    }

    pub fn emit_i16(&mut self, opcode: OpCode, value: i16) -> Result<(), W::Error> {
        self.forward(opcode, Operand::I16(value), None, |w| w.emit_i16(opcode, value))
    }

    pub fn emit_i32(&mut self, opcode: OpCode, value: i32) -> Result<(), W::Error> {
        self.forward(opcode, Operand::I32(value), None, |w| w.emit_i32(opcode, value))
    }

    pub fn emit_i64(&mut self, opcode: OpCode, value: i64) -> Result<(), W::Error> {
        self.forward(opcode, Operand::I64(value), None, |w| w.emit_i64(opcode, value))
    }

    pub fn emit_f32(&mut self, opcode: OpCode, value: f32) -> Result<(), W::Error> {
        self.forward(opcode, Operand::F32(value), None, |w| w.emit_f32(opcode, value))
    }

    pub fn emit_f64(&mut self, opcode: OpCode, value: f64) -> Result<(), W::Error> {
        self.forward(opcode, Operand::F64(value), None, |w| w.emit_f64(opcode, value))
    }

    /// Method or constructor token. `call`, `callvirt` and `newobj` go
    /// through [`Emitter::emit_call`].
    pub fn emit_method(&mut self, opcode: OpCode, method: &MethodRef) -> Result<(), W::Error> {
        if opcode == OpCode::CALL || opcode == OpCode::CALLVIRT || opcode == OpCode::NEWOBJ {
            return self.emit_call(opcode, method, &[]);
        }
        self.forward(opcode, Operand::Method(method), None, |w| w.emit_method(opcode, method))
    }

    pub fn emit_type(&mut self, opcode: OpCode, ty: &TypeRef) -> Result<(), W::Error> {
        self.forward(opcode, Operand::Type(ty), None, |w| w.emit_type(opcode, ty))
    }

    pub fn emit_signature(&mut self, opcode: OpCode, signature: &Signature) -> Result<(), W::Error> {
        self.forward(opcode, Operand::Signature(signature), None, |w| {
            w.emit_signature(opcode, signature)
        })
    }

    /// Call, annotated with the optional vararg types when there are any.
    pub fn emit_call(
        &mut self,
        opcode: OpCode,
        method: &MethodRef,
        optional_params: &[TypeRef],
    ) -> Result<(), W::Error> {
        let extra = (!optional_params.is_empty()).then_some(Annotation::OptionalParams(optional_params));
        self.forward(opcode, Operand::Method(method), extra, |w| {
            w.emit_call(opcode, method, optional_params)
        })
    }

    pub fn emit_calli(
        &mut self,
        opcode: OpCode,
        conv: CallingConventions,
        return_type: &TypeRef,
        params: &[TypeRef],
        optional_params: &[TypeRef],
    ) -> Result<(), W::Error> {
        let extra = Annotation::Calli {
            return_type,
            params,
            optional: Some(optional_params),
        };
        self.forward(opcode, Operand::CallConv(CallConv::Managed(conv)), Some(extra), |w| {
            w.emit_calli(opcode, conv, return_type, params, optional_params)
        })
    }

    pub fn emit_calli_unmanaged(
        &mut self,
        opcode: OpCode,
        conv: UnmanagedCallConv,
        return_type: &TypeRef,
        params: &[TypeRef],
    ) -> Result<(), W::Error> {
        let extra = Annotation::Calli {
            return_type,
            params,
            optional: None,
        };
        self.forward(opcode, Operand::CallConv(CallConv::Unmanaged(conv)), Some(extra), |w| {
            w.emit_calli_unmanaged(opcode, conv, return_type, params)
        })
    }

    /// Emits any operand kind through the matching typed method.
    ///
    /// Operands that carry no value of their own (`None`, `Autogenerated`,
    /// a bare calling convention) are forwarded as a nil operand slot.
    pub fn emit_operand(&mut self, opcode: OpCode, operand: Operand<'_>) -> Result<(), W::Error> {
        match operand {
            Operand::Local(local) => self.emit_local(opcode, local),
            Operand::Label(label) => self.emit_label(opcode, label),
            Operand::Labels(labels) => self.emit_labels(opcode, labels),
            Operand::Str(value) => self.emit_str(opcode, value),
            Operand::U8(value) => self.emit_u8(opcode, value),
            Operand::I8(value) => self.emit_i8(opcode, value),
            Operand::I16(value) => self.emit_i16(opcode, value),
            Operand::I32(value) => self.emit_i32(opcode, value),
            Operand::I64(value) => self.emit_i64(opcode, value),
            Operand::F32(value) => self.emit_f32(opcode, value),
            Operand::F64(value) => self.emit_f64(opcode, value),
            Operand::Method(method) => self.emit_method(opcode, method),
            Operand::Field(field) => self.emit_field(opcode, field),
            Operand::Type(ty) => self.emit_type(opcode, ty),
            Operand::Signature(signature) => self.emit_signature(opcode, signature),
            Operand::None | Operand::Autogenerated | Operand::CallConv(_) => {
                self.forward(opcode, operand, None, |w| w.emit_nil(opcode))
            }
        }
    }

    /// Defines `label` at the current offset.
    pub fn mark_label(&mut self, label: Label) -> Result<(), W::Error> {
        self.trace(|lines, offset| lines.label(offset, label));
        self.writer.mark_label(label)
    }
}

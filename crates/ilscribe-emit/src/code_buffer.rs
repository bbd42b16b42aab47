//! In-memory reference writer.
//!
//! `CodeBuffer` encodes real CIL method-body bytes:
//! - operands little-endian, metadata interned into 4-byte tokens
//!   (table tag in the high byte, 1-based row)
//! - branch targets patched at [`CodeBuffer::finish`], relative to the end
//!   of the branching instruction
//! - exception clauses recorded as regions open and close, with a 5-byte
//!   `leave` inserted on every handler begin and on every block end

use indexmap::IndexSet;

use ilscribe_bytecode::{
    CallConv, CallingConventions, FieldRef, Label, LocalVar, MethodRef, OpCode, OperandType,
    Signature, TypeRef, UnmanagedCallConv,
};

use crate::error::WriteError;
use crate::writer::IlWriter;

/// Metadata table tags used in tokens.
pub mod table {
    pub const TYPE_REF: u8 = 0x01;
    pub const MEMBER_REF: u8 = 0x0A;
    pub const STAND_ALONE_SIG: u8 = 0x11;
    /// User-string heap.
    pub const USER_STRING: u8 = 0x70;
}

/// Build a token from a table tag and a 0-based row index.
pub fn token(table: u8, index: usize) -> u32 {
    (u32::from(table) << 24) | (index as u32 + 1)
}

/// Split a token into its table tag and 0-based row index.
fn row(token: u32, expected: u8) -> Option<usize> {
    let tag = (token >> 24) as u8;
    let row = token & 0x00FF_FFFF;
    (tag == expected && row > 0).then(|| row as usize - 1)
}

/// A referenced method or field.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum MemberRef {
    /// Method with the vararg types of its call site.
    Method {
        method: MethodRef,
        varargs: Vec<TypeRef>,
    },
    Field(FieldRef),
}

/// A standalone call-site signature, as referenced by `calli`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct StandAloneSig {
    pub signature: Signature,
    pub varargs: Vec<TypeRef>,
}

/// Interned metadata. Insertion order is row order.
#[derive(Clone, Debug, Default)]
pub struct MetadataTables {
    pub strings: IndexSet<String>,
    pub types: IndexSet<TypeRef>,
    pub members: IndexSet<MemberRef>,
    pub signatures: IndexSet<StandAloneSig>,
}

impl MetadataTables {
    pub fn string(&self, token: u32) -> Option<&str> {
        let index = row(token, table::USER_STRING)?;
        self.strings.get_index(index).map(String::as_str)
    }

    pub fn type_ref(&self, token: u32) -> Option<&TypeRef> {
        self.types.get_index(row(token, table::TYPE_REF)?)
    }

    pub fn member(&self, token: u32) -> Option<&MemberRef> {
        self.members.get_index(row(token, table::MEMBER_REF)?)
    }

    pub fn signature(&self, token: u32) -> Option<&StandAloneSig> {
        self.signatures.get_index(row(token, table::STAND_ALONE_SIG)?)
    }

    fn intern_string(&mut self, value: &str) -> u32 {
        let index = match self.strings.get_index_of(value) {
            Some(index) => index,
            None => self.strings.insert_full(value.to_string()).0,
        };
        token(table::USER_STRING, index)
    }

    fn intern_type(&mut self, ty: &TypeRef) -> u32 {
        let index = match self.types.get_index_of(ty) {
            Some(index) => index,
            None => self.types.insert_full(ty.clone()).0,
        };
        token(table::TYPE_REF, index)
    }

    fn intern_member(&mut self, member: MemberRef) -> u32 {
        token(table::MEMBER_REF, self.members.insert_full(member).0)
    }

    fn intern_signature(&mut self, signature: StandAloneSig) -> u32 {
        token(table::STAND_ALONE_SIG, self.signatures.insert_full(signature).0)
    }
}

/// Exception clause kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClauseKind {
    /// Typed catch; carries the catch type's token.
    Catch { catch_type: u32 },
    /// Filtered catch; the filter code starts at `filter_offset`.
    Filter { filter_offset: usize },
    Finally,
    Fault,
}

/// One entry of the method's exception-handling table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ExceptionClause {
    pub kind: ClauseKind,
    pub try_offset: usize,
    pub try_length: usize,
    pub handler_offset: usize,
    pub handler_length: usize,
}

/// Result of [`CodeBuffer::finish`].
#[derive(Clone, Debug)]
pub struct MethodBody {
    pub code: Vec<u8>,
    pub locals: Vec<LocalVar>,
    /// Innermost clauses first.
    pub clauses: Vec<ExceptionClause>,
    pub metadata: MetadataTables,
}

#[derive(Clone, Copy, Debug)]
struct Fixup {
    /// Position of the displacement bytes.
    at: usize,
    /// Position the displacement is relative to (end of the instruction).
    base: usize,
    label: Label,
    short: bool,
}

#[derive(Clone, Copy, Debug)]
struct OpenHandler {
    kind: ClauseKind,
    start: usize,
    /// Filter whose catch body has not started yet.
    awaiting_body: bool,
}

#[derive(Clone, Debug)]
struct OpenRegion {
    end_label: Label,
    try_start: usize,
    try_end: Option<usize>,
    handler: Option<OpenHandler>,
}

/// Reference [`IlWriter`] producing a [`MethodBody`].
#[derive(Clone, Debug, Default)]
pub struct CodeBuffer {
    code: Vec<u8>,
    metadata: MetadataTables,
    labels: Vec<Option<usize>>,
    fixups: Vec<Fixup>,
    locals: Vec<LocalVar>,
    regions: Vec<OpenRegion>,
    clauses: Vec<ExceptionClause>,
    compact_locals: bool,
}

impl CodeBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rewrite `ldloc`/`stloc`/`ldloca` to their smallest encoding.
    pub fn with_compact_locals(mut self, compact: bool) -> Self {
        self.compact_locals = compact;
        self
    }

    /// Bytes written so far. Branch displacements are still zero.
    pub fn code(&self) -> &[u8] {
        &self.code
    }

    pub fn len(&self) -> usize {
        self.code.len()
    }

    pub fn is_empty(&self) -> bool {
        self.code.is_empty()
    }

    pub fn metadata(&self) -> &MetadataTables {
        &self.metadata
    }

    /// Resolves branch targets and returns the finished body.
    pub fn finish(mut self) -> Result<MethodBody, WriteError> {
        if !self.regions.is_empty() {
            return Err(WriteError::UnclosedRegion(self.regions.len()));
        }

        for fixup in std::mem::take(&mut self.fixups) {
            let target = self.labels[fixup.label.id() as usize]
                .ok_or(WriteError::UnmarkedLabel(fixup.label))?;
            let delta = target as i64 - fixup.base as i64;
            if fixup.short {
                let delta = i8::try_from(delta).map_err(|_| WriteError::BranchOutOfRange {
                    label: fixup.label,
                    delta,
                })?;
                self.code[fixup.at] = delta as u8;
            } else {
                let bytes = (delta as i32).to_le_bytes();
                self.code[fixup.at..fixup.at + 4].copy_from_slice(&bytes);
            }
        }

        Ok(MethodBody {
            code: self.code,
            locals: self.locals,
            clauses: self.clauses,
            metadata: self.metadata,
        })
    }

    fn check_label(&self, label: Label) -> Result<(), WriteError> {
        if (label.id() as usize) < self.labels.len() {
            Ok(())
        } else {
            Err(WriteError::UnknownLabel(label))
        }
    }

    fn write_opcode(
        &mut self,
        opcode: OpCode,
        operand: &'static str,
        accepted: &[OperandType],
    ) -> Result<(), WriteError> {
        if !accepted.contains(&opcode.operand_type()) {
            return Err(WriteError::OperandMismatch {
                opcode: opcode.name(),
                operand,
            });
        }
        opcode.write_to(&mut self.code);
        Ok(())
    }

    fn write_token(&mut self, token: u32) {
        self.code.extend_from_slice(&token.to_le_bytes());
    }

    /// Writes a displacement placeholder and records its fixup.
    fn write_branch_target(&mut self, label: Label, short: bool, base: usize) {
        let at = self.code.len();
        let width = if short { 1 } else { 4 };
        self.code.resize(at + width, 0);
        self.fixups.push(Fixup {
            at,
            base,
            label,
            short,
        });
    }

    fn emit_branch(&mut self, opcode: OpCode, label: Label) -> Result<(), WriteError> {
        self.check_label(label)?;
        self.write_opcode(
            opcode,
            "a label",
            &[OperandType::ShortInlineBrTarget, OperandType::InlineBrTarget],
        )?;
        let short = opcode.takes_single_byte_argument();
        let base = self.code.len() + if short { 1 } else { 4 };
        self.write_branch_target(label, short, base);
        Ok(())
    }

    fn region(&mut self) -> Result<&mut OpenRegion, WriteError> {
        self.regions.last_mut().ok_or(WriteError::NoOpenRegion)
    }

    /// Leaves the current block, closes the running handler and opens a new one.
    fn begin_handler(&mut self, kind: ClauseKind) -> Result<(), WriteError> {
        let end_label = self.region()?.end_label;
        self.emit_branch(OpCode::LEAVE, end_label)?;
        let pos = self.code.len();

        let region = self.region()?;
        if region.try_end.is_none() {
            region.try_end = Some(pos);
        }

        // A catch right after a filter is the filter's handler body.
        if let (ClauseKind::Catch { .. }, Some(handler)) = (kind, region.handler.as_mut()) {
            if handler.awaiting_body {
                handler.start = pos;
                handler.awaiting_body = false;
                return Ok(());
            }
        }

        let awaiting_body = matches!(kind, ClauseKind::Filter { .. });
        let previous = region.handler.replace(OpenHandler {
            kind,
            start: pos,
            awaiting_body,
        });
        if let Some(previous) = previous {
            self.close_handler(previous, pos)?;
        }
        Ok(())
    }

    fn close_handler(&mut self, handler: OpenHandler, end: usize) -> Result<(), WriteError> {
        let region = self.region()?;
        let try_offset = region.try_start;
        let try_end = region.try_end.ok_or(WriteError::MissingHandler)?;
        self.clauses.push(ExceptionClause {
            kind: handler.kind,
            try_offset,
            try_length: try_end - try_offset,
            handler_offset: handler.start,
            handler_length: end - handler.start,
        });
        Ok(())
    }
}

/// Smallest local-access encoding for `index`.
fn compact_local(opcode: OpCode, index: u16) -> OpCode {
    let short = index < 256;
    if opcode == OpCode::LDLOC || opcode == OpCode::LDLOC_S {
        match index {
            0 => OpCode::LDLOC_0,
            1 => OpCode::LDLOC_1,
            2 => OpCode::LDLOC_2,
            3 => OpCode::LDLOC_3,
            _ if short => OpCode::LDLOC_S,
            _ => OpCode::LDLOC,
        }
    } else if opcode == OpCode::STLOC || opcode == OpCode::STLOC_S {
        match index {
            0 => OpCode::STLOC_0,
            1 => OpCode::STLOC_1,
            2 => OpCode::STLOC_2,
            3 => OpCode::STLOC_3,
            _ if short => OpCode::STLOC_S,
            _ => OpCode::STLOC,
        }
    } else if opcode == OpCode::LDLOCA || opcode == OpCode::LDLOCA_S {
        if short { OpCode::LDLOCA_S } else { OpCode::LDLOCA }
    } else {
        opcode
    }
}

impl IlWriter for CodeBuffer {
    type Error = WriteError;

    fn emit(&mut self, opcode: OpCode) -> Result<(), WriteError> {
        self.write_opcode(opcode, "no", &[OperandType::InlineNone])
    }

    fn emit_local(&mut self, opcode: OpCode, local: &LocalVar) -> Result<(), WriteError> {
        let encoded = self.local_opcode(opcode, local);
        let index = local.index.to_le_bytes();
        let operand: &[u8] = match encoded.operand_type() {
            OperandType::ShortInlineVar if local.index > u16::from(u8::MAX) => {
                return Err(WriteError::LocalIndexTooLarge {
                    opcode: encoded.name(),
                    index: local.index,
                });
            }
            OperandType::ShortInlineVar => &index[..1],
            OperandType::InlineVar => &index,
            _ => &[],
        };
        self.write_opcode(
            encoded,
            "a local",
            &[
                OperandType::InlineNone,
                OperandType::ShortInlineVar,
                OperandType::InlineVar,
            ],
        )?;
        self.code.extend_from_slice(operand);
        Ok(())
    }

    fn emit_field(&mut self, opcode: OpCode, field: &FieldRef) -> Result<(), WriteError> {
        self.write_opcode(
            opcode,
            "a field",
            &[OperandType::InlineField, OperandType::InlineTok],
        )?;
        let token = self.metadata.intern_member(MemberRef::Field(field.clone()));
        self.write_token(token);
        Ok(())
    }

    fn emit_label(&mut self, opcode: OpCode, label: Label) -> Result<(), WriteError> {
        self.emit_branch(opcode, label)
    }

    fn emit_labels(&mut self, opcode: OpCode, labels: &[Label]) -> Result<(), WriteError> {
        for &label in labels {
            self.check_label(label)?;
        }
        self.write_opcode(opcode, "a label list", &[OperandType::InlineSwitch])?;
        self.code
            .extend_from_slice(&(labels.len() as u32).to_le_bytes());
        let base = self.code.len() + labels.len() * 4;
        for &label in labels {
            self.write_branch_target(label, false, base);
        }
        Ok(())
    }

    fn emit_str(&mut self, opcode: OpCode, value: &str) -> Result<(), WriteError> {
        self.write_opcode(opcode, "a string", &[OperandType::InlineString])?;
        let token = self.metadata.intern_string(value);
        self.write_token(token);
        Ok(())
    }

    fn emit_u8(&mut self, opcode: OpCode, value: u8) -> Result<(), WriteError> {
        self.write_opcode(
            opcode,
            "a byte",
            &[OperandType::ShortInlineI, OperandType::ShortInlineVar],
        )?;
        self.code.push(value);
        Ok(())
    }

    fn emit_i8(&mut self, opcode: OpCode, value: i8) -> Result<(), WriteError> {
        self.write_opcode(
            opcode,
            "a byte",
            &[OperandType::ShortInlineI, OperandType::ShortInlineVar],
        )?;
        self.code.push(value as u8);
        Ok(())
    }

    fn emit_i16(&mut self, opcode: OpCode, value: i16) -> Result<(), WriteError> {
        self.write_opcode(opcode, "a 16-bit", &[OperandType::InlineVar])?;
        self.code.extend_from_slice(&value.to_le_bytes());
        Ok(())
    }

    fn emit_i32(&mut self, opcode: OpCode, value: i32) -> Result<(), WriteError> {
        self.write_opcode(opcode, "a 32-bit", &[OperandType::InlineI])?;
        self.code.extend_from_slice(&value.to_le_bytes());
        Ok(())
    }

    fn emit_i64(&mut self, opcode: OpCode, value: i64) -> Result<(), WriteError> {
        self.write_opcode(opcode, "a 64-bit", &[OperandType::InlineI8])?;
        self.code.extend_from_slice(&value.to_le_bytes());
        Ok(())
    }

    fn emit_f32(&mut self, opcode: OpCode, value: f32) -> Result<(), WriteError> {
        self.write_opcode(opcode, "a float32", &[OperandType::ShortInlineR])?;
        self.code.extend_from_slice(&value.to_le_bytes());
        Ok(())
    }

    fn emit_f64(&mut self, opcode: OpCode, value: f64) -> Result<(), WriteError> {
        self.write_opcode(opcode, "a float64", &[OperandType::InlineR])?;
        self.code.extend_from_slice(&value.to_le_bytes());
        Ok(())
    }

    fn emit_method(&mut self, opcode: OpCode, method: &MethodRef) -> Result<(), WriteError> {
        self.emit_call(opcode, method, &[])
    }

    fn emit_type(&mut self, opcode: OpCode, ty: &TypeRef) -> Result<(), WriteError> {
        self.write_opcode(
            opcode,
            "a type",
            &[OperandType::InlineType, OperandType::InlineTok],
        )?;
        let token = self.metadata.intern_type(ty);
        self.write_token(token);
        Ok(())
    }

    fn emit_signature(&mut self, opcode: OpCode, signature: &Signature) -> Result<(), WriteError> {
        self.write_opcode(opcode, "a signature", &[OperandType::InlineSig])?;
        let token = self.metadata.intern_signature(StandAloneSig {
            signature: signature.clone(),
            varargs: Vec::new(),
        });
        self.write_token(token);
        Ok(())
    }

    fn emit_nil(&mut self, opcode: OpCode) -> Result<(), WriteError> {
        self.write_opcode(
            opcode,
            "a nil",
            &[
                OperandType::InlineI,
                OperandType::ShortInlineR,
                OperandType::InlineString,
                OperandType::InlineMethod,
                OperandType::InlineField,
                OperandType::InlineType,
                OperandType::InlineTok,
                OperandType::InlineSig,
            ],
        )?;
        self.write_token(0);
        Ok(())
    }

    fn emit_call(
        &mut self,
        opcode: OpCode,
        method: &MethodRef,
        optional_params: &[TypeRef],
    ) -> Result<(), WriteError> {
        self.write_opcode(
            opcode,
            "a method",
            &[OperandType::InlineMethod, OperandType::InlineTok],
        )?;
        let token = self.metadata.intern_member(MemberRef::Method {
            method: method.clone(),
            varargs: optional_params.to_vec(),
        });
        self.write_token(token);
        Ok(())
    }

    fn emit_calli(
        &mut self,
        opcode: OpCode,
        conv: CallingConventions,
        return_type: &TypeRef,
        params: &[TypeRef],
        optional_params: &[TypeRef],
    ) -> Result<(), WriteError> {
        self.write_opcode(opcode, "a signature", &[OperandType::InlineSig])?;
        let token = self.metadata.intern_signature(StandAloneSig {
            signature: Signature::new(CallConv::Managed(conv), return_type.clone(), params.to_vec()),
            varargs: optional_params.to_vec(),
        });
        self.write_token(token);
        Ok(())
    }

    fn emit_calli_unmanaged(
        &mut self,
        opcode: OpCode,
        conv: UnmanagedCallConv,
        return_type: &TypeRef,
        params: &[TypeRef],
    ) -> Result<(), WriteError> {
        self.write_opcode(opcode, "a signature", &[OperandType::InlineSig])?;
        let token = self.metadata.intern_signature(StandAloneSig {
            signature: Signature::new(CallConv::Unmanaged(conv), return_type.clone(), params.to_vec()),
            varargs: Vec::new(),
        });
        self.write_token(token);
        Ok(())
    }

    fn define_label(&mut self) -> Label {
        let label = Label(self.labels.len() as u32);
        self.labels.push(None);
        label
    }

    fn mark_label(&mut self, label: Label) -> Result<(), WriteError> {
        self.check_label(label)?;
        let slot = &mut self.labels[label.id() as usize];
        if slot.is_some() {
            return Err(WriteError::LabelMarkedTwice(label));
        }
        *slot = Some(self.code.len());
        Ok(())
    }

    fn declare_local(&mut self, local_type: TypeRef, pinned: bool) -> Result<LocalVar, WriteError> {
        let index = u16::try_from(self.locals.len()).map_err(|_| WriteError::TooManyLocals)?;
        let mut local = LocalVar::new(index, local_type);
        local.pinned = pinned;
        self.locals.push(local.clone());
        Ok(local)
    }

    fn locals(&self) -> &[LocalVar] {
        &self.locals
    }

    fn begin_exception_block(&mut self) -> Result<Label, WriteError> {
        let end_label = self.define_label();
        self.regions.push(OpenRegion {
            end_label,
            try_start: self.code.len(),
            try_end: None,
            handler: None,
        });
        Ok(end_label)
    }

    fn begin_catch_block(&mut self, catch_type: &TypeRef) -> Result<(), WriteError> {
        self.region()?;
        let catch_type = self.metadata.intern_type(catch_type);
        self.begin_handler(ClauseKind::Catch { catch_type })
    }

    fn begin_except_filter_block(&mut self) -> Result<(), WriteError> {
        let filter_offset = self.code.len() + OpCode::LEAVE.size() + 4;
        self.begin_handler(ClauseKind::Filter { filter_offset })
    }

    fn begin_fault_block(&mut self) -> Result<(), WriteError> {
        self.begin_handler(ClauseKind::Fault)
    }

    fn begin_finally_block(&mut self) -> Result<(), WriteError> {
        self.begin_handler(ClauseKind::Finally)
    }

    fn end_exception_block(&mut self) -> Result<(), WriteError> {
        let region = self.region()?;
        if region.handler.is_none() {
            return Err(WriteError::MissingHandler);
        }
        let end_label = region.end_label;
        if self.labels[end_label.id() as usize].is_some() {
            return Err(WriteError::LabelMarkedTwice(end_label));
        }
        self.emit_branch(OpCode::LEAVE, end_label)?;
        let end = self.code.len();

        if let Some(handler) = self.region()?.handler.take() {
            self.close_handler(handler, end)?;
        }
        self.regions.pop();
        self.mark_label(end_label)
    }

    fn local_opcode(&self, opcode: OpCode, local: &LocalVar) -> OpCode {
        if self.compact_locals {
            compact_local(opcode, local.index)
        } else {
            opcode
        }
    }
}

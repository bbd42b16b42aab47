//! CIL opcode table.
//!
//! Every ECMA-335 Partition III opcode with its mnemonic, encoded value and
//! operand type. Two-byte opcodes carry the `0xFE` prefix in the high byte of
//! their value, so `ceq` is `0xFE01`.

use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;
use std::sync::OnceLock;

/// Prefix byte shared by all two-byte opcodes.
pub const PREFIX_FE: u8 = 0xFE;

/// Operand encoding class of an opcode.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OperandType {
    InlineNone,
    ShortInlineBrTarget,
    InlineBrTarget,
    ShortInlineI,
    InlineI,
    InlineI8,
    ShortInlineR,
    InlineR,
    ShortInlineVar,
    InlineVar,
    InlineString,
    InlineMethod,
    InlineField,
    InlineType,
    InlineTok,
    InlineSig,
    InlineSwitch,
}

impl OperandType {
    /// Encoded operand width in bytes.
    ///
    /// `InlineSwitch` reports the width of its count header only; each
    /// target adds another 4 bytes.
    pub fn width(self) -> usize {
        match self {
            Self::InlineNone => 0,
            Self::ShortInlineBrTarget | Self::ShortInlineI | Self::ShortInlineVar => 1,
            Self::InlineVar => 2,
            Self::InlineI8 | Self::InlineR => 8,
            Self::InlineBrTarget
            | Self::InlineI
            | Self::ShortInlineR
            | Self::InlineString
            | Self::InlineMethod
            | Self::InlineField
            | Self::InlineType
            | Self::InlineTok
            | Self::InlineSig
            | Self::InlineSwitch => 4,
        }
    }
}

/// A CIL opcode.
///
/// Equality and hashing use the encoded value only.
#[derive(Clone, Copy, Debug)]
pub struct OpCode {
    name: &'static str,
    value: u16,
    operand_type: OperandType,
}

impl PartialEq for OpCode {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl Eq for OpCode {}

impl Hash for OpCode {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.value.hash(state);
    }
}

impl OpCode {
    const fn new(name: &'static str, value: u16, operand_type: OperandType) -> Self {
        Self {
            name,
            value,
            operand_type,
        }
    }

    /// Mnemonic, e.g. `ldloc.s`.
    pub fn name(self) -> &'static str {
        self.name
    }

    /// Encoded value (`0xFExx` for two-byte opcodes).
    pub fn value(self) -> u16 {
        self.value
    }

    pub fn operand_type(self) -> OperandType {
        self.operand_type
    }

    /// Size of the opcode itself in bytes, without operand.
    pub fn size(self) -> usize {
        if self.value > 0xFF { 2 } else { 1 }
    }

    /// Whether the operand is encoded in a single byte (short branch,
    /// short immediate or short variable index).
    pub fn takes_single_byte_argument(self) -> bool {
        matches!(
            self.operand_type,
            OperandType::ShortInlineBrTarget | OperandType::ShortInlineI | OperandType::ShortInlineVar
        )
    }

    /// Branch-family mnemonics (`br`, `brtrue.s`, ...), excluding `break`.
    pub fn is_branch(self) -> bool {
        self.name.starts_with("br") && self.name != "break"
    }

    /// Append the opcode bytes to `out`.
    pub fn write_to(self, out: &mut Vec<u8>) {
        if self.value > 0xFF {
            out.push(PREFIX_FE);
        }
        out.push(self.value as u8);
    }

    /// Look up an opcode by mnemonic.
    pub fn from_name(name: &str) -> Option<Self> {
        by_name().get(name).copied()
    }

    /// Look up an opcode by encoded value.
    pub fn from_value(value: u16) -> Option<Self> {
        ALL.iter().copied().find(|op| op.value == value)
    }

    /// The whole table, in encoding order.
    pub fn all() -> &'static [OpCode] {
        ALL
    }
}

impl fmt::Display for OpCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.name)
    }
}

/// Mnemonic not present in the opcode table.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("unknown opcode mnemonic `{0}`")]
pub struct UnknownOpcode(pub String);

impl FromStr for OpCode {
    type Err = UnknownOpcode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s).ok_or_else(|| UnknownOpcode(s.to_string()))
    }
}

fn by_name() -> &'static HashMap<&'static str, OpCode> {
    static BY_NAME: OnceLock<HashMap<&'static str, OpCode>> = OnceLock::new();
    BY_NAME.get_or_init(|| ALL.iter().map(|op| (op.name, *op)).collect())
}

macro_rules! opcodes {
    ($($konst:ident = $name:literal, $value:literal, $operand:ident;)*) => {
        impl OpCode {
            $(
                #[doc = concat!("`", $name, "`")]
                pub const $konst: OpCode = OpCode::new($name, $value, OperandType::$operand);
            )*
        }

        static ALL: &[OpCode] = &[$(OpCode::$konst),*];
    };
}

opcodes! {
    NOP = "nop", 0x00, InlineNone;
    BREAK = "break", 0x01, InlineNone;
    LDARG_0 = "ldarg.0", 0x02, InlineNone;
    LDARG_1 = "ldarg.1", 0x03, InlineNone;
    LDARG_2 = "ldarg.2", 0x04, InlineNone;
    LDARG_3 = "ldarg.3", 0x05, InlineNone;
    LDLOC_0 = "ldloc.0", 0x06, InlineNone;
    LDLOC_1 = "ldloc.1", 0x07, InlineNone;
    LDLOC_2 = "ldloc.2", 0x08, InlineNone;
    LDLOC_3 = "ldloc.3", 0x09, InlineNone;
    STLOC_0 = "stloc.0", 0x0A, InlineNone;
    STLOC_1 = "stloc.1", 0x0B, InlineNone;
    STLOC_2 = "stloc.2", 0x0C, InlineNone;
    STLOC_3 = "stloc.3", 0x0D, InlineNone;
    LDARG_S = "ldarg.s", 0x0E, ShortInlineVar;
    LDARGA_S = "ldarga.s", 0x0F, ShortInlineVar;
    STARG_S = "starg.s", 0x10, ShortInlineVar;
    LDLOC_S = "ldloc.s", 0x11, ShortInlineVar;
    LDLOCA_S = "ldloca.s", 0x12, ShortInlineVar;
    STLOC_S = "stloc.s", 0x13, ShortInlineVar;
    LDNULL = "ldnull", 0x14, InlineNone;
    LDC_I4_M1 = "ldc.i4.m1", 0x15, InlineNone;
    LDC_I4_0 = "ldc.i4.0", 0x16, InlineNone;
    LDC_I4_1 = "ldc.i4.1", 0x17, InlineNone;
    LDC_I4_2 = "ldc.i4.2", 0x18, InlineNone;
    LDC_I4_3 = "ldc.i4.3", 0x19, InlineNone;
    LDC_I4_4 = "ldc.i4.4", 0x1A, InlineNone;
    LDC_I4_5 = "ldc.i4.5", 0x1B, InlineNone;
    LDC_I4_6 = "ldc.i4.6", 0x1C, InlineNone;
    LDC_I4_7 = "ldc.i4.7", 0x1D, InlineNone;
    LDC_I4_8 = "ldc.i4.8", 0x1E, InlineNone;
    LDC_I4_S = "ldc.i4.s", 0x1F, ShortInlineI;
    LDC_I4 = "ldc.i4", 0x20, InlineI;
    LDC_I8 = "ldc.i8", 0x21, InlineI8;
    LDC_R4 = "ldc.r4", 0x22, ShortInlineR;
    LDC_R8 = "ldc.r8", 0x23, InlineR;
    DUP = "dup", 0x25, InlineNone;
    POP = "pop", 0x26, InlineNone;
    JMP = "jmp", 0x27, InlineMethod;
    CALL = "call", 0x28, InlineMethod;
    CALLI = "calli", 0x29, InlineSig;
    RET = "ret", 0x2A, InlineNone;
    BR_S = "br.s", 0x2B, ShortInlineBrTarget;
    BRFALSE_S = "brfalse.s", 0x2C, ShortInlineBrTarget;
    BRTRUE_S = "brtrue.s", 0x2D, ShortInlineBrTarget;
    BEQ_S = "beq.s", 0x2E, ShortInlineBrTarget;
    BGE_S = "bge.s", 0x2F, ShortInlineBrTarget;
    BGT_S = "bgt.s", 0x30, ShortInlineBrTarget;
    BLE_S = "ble.s", 0x31, ShortInlineBrTarget;
    BLT_S = "blt.s", 0x32, ShortInlineBrTarget;
    BNE_UN_S = "bne.un.s", 0x33, ShortInlineBrTarget;
    BGE_UN_S = "bge.un.s", 0x34, ShortInlineBrTarget;
    BGT_UN_S = "bgt.un.s", 0x35, ShortInlineBrTarget;
    BLE_UN_S = "ble.un.s", 0x36, ShortInlineBrTarget;
    BLT_UN_S = "blt.un.s", 0x37, ShortInlineBrTarget;
    BR = "br", 0x38, InlineBrTarget;
    BRFALSE = "brfalse", 0x39, InlineBrTarget;
    BRTRUE = "brtrue", 0x3A, InlineBrTarget;
    BEQ = "beq", 0x3B, InlineBrTarget;
    BGE = "bge", 0x3C, InlineBrTarget;
    BGT = "bgt", 0x3D, InlineBrTarget;
    BLE = "ble", 0x3E, InlineBrTarget;
    BLT = "blt", 0x3F, InlineBrTarget;
    BNE_UN = "bne.un", 0x40, InlineBrTarget;
    BGE_UN = "bge.un", 0x41, InlineBrTarget;
    BGT_UN = "bgt.un", 0x42, InlineBrTarget;
    BLE_UN = "ble.un", 0x43, InlineBrTarget;
    BLT_UN = "blt.un", 0x44, InlineBrTarget;
    SWITCH = "switch", 0x45, InlineSwitch;
    LDIND_I1 = "ldind.i1", 0x46, InlineNone;
    LDIND_U1 = "ldind.u1", 0x47, InlineNone;
    LDIND_I2 = "ldind.i2", 0x48, InlineNone;
    LDIND_U2 = "ldind.u2", 0x49, InlineNone;
    LDIND_I4 = "ldind.i4", 0x4A, InlineNone;
    LDIND_U4 = "ldind.u4", 0x4B, InlineNone;
    LDIND_I8 = "ldind.i8", 0x4C, InlineNone;
    LDIND_I = "ldind.i", 0x4D, InlineNone;
    LDIND_R4 = "ldind.r4", 0x4E, InlineNone;
    LDIND_R8 = "ldind.r8", 0x4F, InlineNone;
    LDIND_REF = "ldind.ref", 0x50, InlineNone;
    STIND_REF = "stind.ref", 0x51, InlineNone;
    STIND_I1 = "stind.i1", 0x52, InlineNone;
    STIND_I2 = "stind.i2", 0x53, InlineNone;
    STIND_I4 = "stind.i4", 0x54, InlineNone;
    STIND_I8 = "stind.i8", 0x55, InlineNone;
    STIND_R4 = "stind.r4", 0x56, InlineNone;
    STIND_R8 = "stind.r8", 0x57, InlineNone;
    ADD = "add", 0x58, InlineNone;
    SUB = "sub", 0x59, InlineNone;
    MUL = "mul", 0x5A, InlineNone;
    DIV = "div", 0x5B, InlineNone;
    DIV_UN = "div.un", 0x5C, InlineNone;
    REM = "rem", 0x5D, InlineNone;
    REM_UN = "rem.un", 0x5E, InlineNone;
    AND = "and", 0x5F, InlineNone;
    OR = "or", 0x60, InlineNone;
    XOR = "xor", 0x61, InlineNone;
    SHL = "shl", 0x62, InlineNone;
    SHR = "shr", 0x63, InlineNone;
    SHR_UN = "shr.un", 0x64, InlineNone;
    NEG = "neg", 0x65, InlineNone;
    NOT = "not", 0x66, InlineNone;
    CONV_I1 = "conv.i1", 0x67, InlineNone;
    CONV_I2 = "conv.i2", 0x68, InlineNone;
    CONV_I4 = "conv.i4", 0x69, InlineNone;
    CONV_I8 = "conv.i8", 0x6A, InlineNone;
    CONV_R4 = "conv.r4", 0x6B, InlineNone;
    CONV_R8 = "conv.r8", 0x6C, InlineNone;
    CONV_U4 = "conv.u4", 0x6D, InlineNone;
    CONV_U8 = "conv.u8", 0x6E, InlineNone;
    CALLVIRT = "callvirt", 0x6F, InlineMethod;
    CPOBJ = "cpobj", 0x70, InlineType;
    LDOBJ = "ldobj", 0x71, InlineType;
    LDSTR = "ldstr", 0x72, InlineString;
    NEWOBJ = "newobj", 0x73, InlineMethod;
    CASTCLASS = "castclass", 0x74, InlineType;
    ISINST = "isinst", 0x75, InlineType;
    CONV_R_UN = "conv.r.un", 0x76, InlineNone;
    UNBOX = "unbox", 0x79, InlineType;
    THROW = "throw", 0x7A, InlineNone;
    LDFLD = "ldfld", 0x7B, InlineField;
    LDFLDA = "ldflda", 0x7C, InlineField;
    STFLD = "stfld", 0x7D, InlineField;
    LDSFLD = "ldsfld", 0x7E, InlineField;
    LDSFLDA = "ldsflda", 0x7F, InlineField;
    STSFLD = "stsfld", 0x80, InlineField;
    STOBJ = "stobj", 0x81, InlineType;
    CONV_OVF_I1_UN = "conv.ovf.i1.un", 0x82, InlineNone;
    CONV_OVF_I2_UN = "conv.ovf.i2.un", 0x83, InlineNone;
    CONV_OVF_I4_UN = "conv.ovf.i4.un", 0x84, InlineNone;
    CONV_OVF_I8_UN = "conv.ovf.i8.un", 0x85, InlineNone;
    CONV_OVF_U1_UN = "conv.ovf.u1.un", 0x86, InlineNone;
    CONV_OVF_U2_UN = "conv.ovf.u2.un", 0x87, InlineNone;
    CONV_OVF_U4_UN = "conv.ovf.u4.un", 0x88, InlineNone;
    CONV_OVF_U8_UN = "conv.ovf.u8.un", 0x89, InlineNone;
    CONV_OVF_I_UN = "conv.ovf.i.un", 0x8A, InlineNone;
    CONV_OVF_U_UN = "conv.ovf.u.un", 0x8B, InlineNone;
    BOX = "box", 0x8C, InlineType;
    NEWARR = "newarr", 0x8D, InlineType;
    LDLEN = "ldlen", 0x8E, InlineNone;
    LDELEMA = "ldelema", 0x8F, InlineType;
    LDELEM_I1 = "ldelem.i1", 0x90, InlineNone;
    LDELEM_U1 = "ldelem.u1", 0x91, InlineNone;
    LDELEM_I2 = "ldelem.i2", 0x92, InlineNone;
    LDELEM_U2 = "ldelem.u2", 0x93, InlineNone;
    LDELEM_I4 = "ldelem.i4", 0x94, InlineNone;
    LDELEM_U4 = "ldelem.u4", 0x95, InlineNone;
    LDELEM_I8 = "ldelem.i8", 0x96, InlineNone;
    LDELEM_I = "ldelem.i", 0x97, InlineNone;
    LDELEM_R4 = "ldelem.r4", 0x98, InlineNone;
    LDELEM_R8 = "ldelem.r8", 0x99, InlineNone;
    LDELEM_REF = "ldelem.ref", 0x9A, InlineNone;
    STELEM_I = "stelem.i", 0x9B, InlineNone;
    STELEM_I1 = "stelem.i1", 0x9C, InlineNone;
    STELEM_I2 = "stelem.i2", 0x9D, InlineNone;
    STELEM_I4 = "stelem.i4", 0x9E, InlineNone;
    STELEM_I8 = "stelem.i8", 0x9F, InlineNone;
    STELEM_R4 = "stelem.r4", 0xA0, InlineNone;
    STELEM_R8 = "stelem.r8", 0xA1, InlineNone;
    STELEM_REF = "stelem.ref", 0xA2, InlineNone;
    LDELEM = "ldelem", 0xA3, InlineType;
    STELEM = "stelem", 0xA4, InlineType;
    UNBOX_ANY = "unbox.any", 0xA5, InlineType;
    CONV_OVF_I1 = "conv.ovf.i1", 0xB3, InlineNone;
    CONV_OVF_U1 = "conv.ovf.u1", 0xB4, InlineNone;
    CONV_OVF_I2 = "conv.ovf.i2", 0xB5, InlineNone;
    CONV_OVF_U2 = "conv.ovf.u2", 0xB6, InlineNone;
    CONV_OVF_I4 = "conv.ovf.i4", 0xB7, InlineNone;
    CONV_OVF_U4 = "conv.ovf.u4", 0xB8, InlineNone;
    CONV_OVF_I8 = "conv.ovf.i8", 0xB9, InlineNone;
    CONV_OVF_U8 = "conv.ovf.u8", 0xBA, InlineNone;
    REFANYVAL = "refanyval", 0xC2, InlineType;
    CKFINITE = "ckfinite", 0xC3, InlineNone;
    MKREFANY = "mkrefany", 0xC6, InlineType;
    LDTOKEN = "ldtoken", 0xD0, InlineTok;
    CONV_U2 = "conv.u2", 0xD1, InlineNone;
    CONV_U1 = "conv.u1", 0xD2, InlineNone;
    CONV_I = "conv.i", 0xD3, InlineNone;
    CONV_OVF_I = "conv.ovf.i", 0xD4, InlineNone;
    CONV_OVF_U = "conv.ovf.u", 0xD5, InlineNone;
    ADD_OVF = "add.ovf", 0xD6, InlineNone;
    ADD_OVF_UN = "add.ovf.un", 0xD7, InlineNone;
    MUL_OVF = "mul.ovf", 0xD8, InlineNone;
    MUL_OVF_UN = "mul.ovf.un", 0xD9, InlineNone;
    SUB_OVF = "sub.ovf", 0xDA, InlineNone;
    SUB_OVF_UN = "sub.ovf.un", 0xDB, InlineNone;
    ENDFINALLY = "endfinally", 0xDC, InlineNone;
    LEAVE = "leave", 0xDD, InlineBrTarget;
    LEAVE_S = "leave.s", 0xDE, ShortInlineBrTarget;
    STIND_I = "stind.i", 0xDF, InlineNone;
    CONV_U = "conv.u", 0xE0, InlineNone;
    ARGLIST = "arglist", 0xFE00, InlineNone;
    CEQ = "ceq", 0xFE01, InlineNone;
    CGT = "cgt", 0xFE02, InlineNone;
    CGT_UN = "cgt.un", 0xFE03, InlineNone;
    CLT = "clt", 0xFE04, InlineNone;
    CLT_UN = "clt.un", 0xFE05, InlineNone;
    LDFTN = "ldftn", 0xFE06, InlineMethod;
    LDVIRTFTN = "ldvirtftn", 0xFE07, InlineMethod;
    LDARG = "ldarg", 0xFE09, InlineVar;
    LDARGA = "ldarga", 0xFE0A, InlineVar;
    STARG = "starg", 0xFE0B, InlineVar;
    LDLOC = "ldloc", 0xFE0C, InlineVar;
    LDLOCA = "ldloca", 0xFE0D, InlineVar;
    STLOC = "stloc", 0xFE0E, InlineVar;
    LOCALLOC = "localloc", 0xFE0F, InlineNone;
    ENDFILTER = "endfilter", 0xFE11, InlineNone;
    UNALIGNED = "unaligned.", 0xFE12, ShortInlineI;
    VOLATILE = "volatile.", 0xFE13, InlineNone;
    TAIL = "tail.", 0xFE14, InlineNone;
    INITOBJ = "initobj", 0xFE15, InlineType;
    CONSTRAINED = "constrained.", 0xFE16, InlineType;
    CPBLK = "cpblk", 0xFE17, InlineNone;
    INITBLK = "initblk", 0xFE18, InlineNone;
    NO = "no.", 0xFE19, ShortInlineI;
    RETHROW = "rethrow", 0xFE1A, InlineNone;
    SIZEOF = "sizeof", 0xFE1C, InlineType;
    REFANYTYPE = "refanytype", 0xFE1D, InlineNone;
    READONLY = "readonly.", 0xFE1E, InlineNone;
}

//! Trace line layout.
//!
//! Every instruction line shares one column layout:
//! ```text
//! L_0005: brtrue.s =>  Label3
//! |  pos  | mnemonic  |1| operand (+ annotation)
//! ```
//! The mnemonic column is left-aligned and padded; the gap before the operand
//! is only present when there is operand text.

use crate::ids::{Label, LocalVar};
use crate::opcode::OpCode;

/// Column widths for instruction line formatting.
pub mod cols {
    /// Mnemonic column width, including the branch arrow.
    pub const MNEMONIC: usize = 10;
}

/// Branch arrow appended to branch-family mnemonics.
pub const BRANCH_ARROW: &str = " =>";

/// Offset prefix: `L_002a: `.
pub fn code_pos(offset: usize) -> String {
    format!("L_{offset:04x}: ")
}

/// Mnemonic as shown in the mnemonic column.
pub fn mnemonic(opcode: OpCode) -> String {
    if opcode.is_branch() {
        format!("{}{BRANCH_ARROW}", opcode.name())
    } else {
        opcode.name().to_string()
    }
}

/// Builder for trace lines.
#[derive(Clone, Copy, Debug)]
pub struct LineBuilder {
    mnemonic_width: usize,
}

impl Default for LineBuilder {
    fn default() -> Self {
        Self::new(cols::MNEMONIC)
    }
}

impl LineBuilder {
    pub fn new(mnemonic_width: usize) -> Self {
        Self { mnemonic_width }
    }

    /// Operand-less instruction: `L_0000: nop`.
    pub fn plain(&self, offset: usize, opcode: OpCode) -> String {
        format!("{}{}", code_pos(offset), opcode.name())
    }

    /// Instruction with operand text: `L_0001: ldstr      "hi"`.
    pub fn instruction(&self, offset: usize, opcode: OpCode, operand: &str) -> String {
        let gap = if operand.is_empty() { "" } else { " " };
        format!(
            "{}{:<width$}{gap}{operand}",
            code_pos(offset),
            mnemonic(opcode),
            width = self.mnemonic_width,
        )
    }

    /// Label definition: `L_0005: Label0`.
    pub fn label(&self, offset: usize, label: Label) -> String {
        format!("{}{label}", code_pos(offset))
    }

    /// Free-form comment: `L_0005: // text`.
    pub fn comment(&self, offset: usize, text: &str) -> String {
        format!("{}// {text}", code_pos(offset))
    }

    /// Local declaration header: `L_0000: Local var 0: System.Int32(pinned)`.
    ///
    /// Locals precede the code, so the line is always placed at offset 0.
    pub fn local(&self, local: &LocalVar) -> String {
        let pinned = if local.pinned { "(pinned)" } else { "" };
        format!(
            "{}Local var {}: {}{pinned}",
            code_pos(0),
            local.index,
            local.local_type
        )
    }
}

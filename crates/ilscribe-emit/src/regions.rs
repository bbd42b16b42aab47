//! Exception-block transitions.
//!
//! Every handler begin and every block end implicitly closes the block
//! before it with a `leave` the writer inserts on its own. The emitter
//! traces that `leave` as an autogenerated line and counts its bytes.

use ilscribe_bytecode::{ExceptionBlock, Label, OpCode, Operand, format_operand, instruction_size};

use crate::emitter::Emitter;
use crate::sink::TraceSink;
use crate::writer::IlWriter;

impl<W: IlWriter, S: TraceSink> Emitter<'_, W, S> {
    /// Applies one region transition.
    ///
    /// Returns the region's end label when a protected block opens.
    pub fn mark_block(&mut self, block: &ExceptionBlock) -> Result<Option<Label>, W::Error> {
        match block {
            ExceptionBlock::BeginExceptionBlock => {
                self.trace_directive(block);
                self.trace_text("{");
                self.indent(1);
                let end = self.writer.begin_exception_block()?;
                Ok(Some(end))
            }
            ExceptionBlock::EndExceptionBlock => {
                self.trace_implicit_leave();
                self.indent(-1);
                self.trace_text("} // end handler");
                self.writer.end_exception_block()?;
                self.offset += implicit_leave_size();
                Ok(None)
            }
            ExceptionBlock::BeginCatchBlock(catch_type) => {
                self.trace_handler_begin(block);
                self.writer.begin_catch_block(catch_type)?;
                self.offset += implicit_leave_size();
                Ok(None)
            }
            ExceptionBlock::BeginExceptFilterBlock => {
                self.trace_handler_begin(block);
                self.writer.begin_except_filter_block()?;
                self.offset += implicit_leave_size();
                Ok(None)
            }
            ExceptionBlock::BeginFaultBlock => {
                self.trace_handler_begin(block);
                self.writer.begin_fault_block()?;
                self.offset += implicit_leave_size();
                Ok(None)
            }
            ExceptionBlock::BeginFinallyBlock => {
                self.trace_handler_begin(block);
                self.writer.begin_finally_block()?;
                self.offset += implicit_leave_size();
                Ok(None)
            }
        }
    }

    /// First half of a transition, for callers that visit block markers
    /// before the instruction they are attached to. Handles every begin.
    pub fn mark_block_before(&mut self, block: &ExceptionBlock) -> Result<Option<Label>, W::Error> {
        if *block == ExceptionBlock::EndExceptionBlock {
            return Ok(None);
        }
        self.mark_block(block)
    }

    /// Second half of a transition. Handles only the block end.
    pub fn mark_block_after(&mut self, block: &ExceptionBlock) -> Result<(), W::Error> {
        if *block == ExceptionBlock::EndExceptionBlock {
            self.mark_block(block)?;
        }
        Ok(())
    }

    fn trace_handler_begin(&mut self, block: &ExceptionBlock) {
        self.trace_implicit_leave();
        self.indent(-1);
        self.trace_text("} // end try");
        self.trace_directive(block);
        self.trace_text("{");
        self.indent(1);
    }

    fn trace_directive(&mut self, block: &ExceptionBlock) {
        if let Some(directive) = block.directive() {
            self.trace_text(&directive);
        }
    }

    fn trace_implicit_leave(&mut self) {
        self.trace(|lines, offset| {
            lines.instruction(
                offset,
                OpCode::LEAVE,
                &format_operand(&Operand::Autogenerated, None),
            )
        });
    }
}

fn implicit_leave_size() -> usize {
    instruction_size(OpCode::LEAVE, &Operand::Autogenerated)
}

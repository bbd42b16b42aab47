use ilscribe_bytecode::{ExceptionBlock, Label, OpCode, TypeRef};

use crate::test_utils::{RecordingWriter, Rejected};
use crate::{EmitConfig, Emitter, TraceBuffer};

fn traced(writer: &mut RecordingWriter) -> Emitter<'_, RecordingWriter, TraceBuffer> {
    Emitter::new(writer, TraceBuffer::with_indent("  "), EmitConfig::traced())
}

fn catch(name: &str) -> ExceptionBlock {
    ExceptionBlock::BeginCatchBlock(TypeRef::new(name))
}

#[test]
fn try_catch() {
    let mut writer = RecordingWriter::default();
    let mut emitter = traced(&mut writer);

    let end = emitter.mark_block(&ExceptionBlock::BeginExceptionBlock).unwrap();
    assert_eq!(end, Some(Label(0)));
    emitter.emit(OpCode::NOP).unwrap();
    assert_eq!(emitter.mark_block(&catch("System.Exception")).unwrap(), None);
    assert_eq!(emitter.offset(), 6);
    emitter.emit(OpCode::POP).unwrap();
    emitter.mark_block(&ExceptionBlock::EndExceptionBlock).unwrap();
    assert_eq!(emitter.offset(), 12);
    emitter.emit(OpCode::RET).unwrap();

    let trace = emitter.into_sink();
    assert_eq!(trace.indent(), 0);
    insta::assert_snapshot!(trace, @r"
    .try
    {
      L_0000: nop
      L_0001: leave      (autogenerated)
    } // end try
    .catch System.Exception
    {
      L_0006: pop
      L_0007: leave      (autogenerated)
    } // end handler
    L_000c: ret
    ");
    assert_eq!(
        writer.calls,
        [
            "begin_exception_block",
            "emit nop",
            "begin_catch_block System.Exception",
            "emit pop",
            "end_exception_block",
            "emit ret",
        ]
    );
}

#[test]
fn nested_regions_with_filter() {
    let mut writer = RecordingWriter::default();
    let mut emitter = traced(&mut writer);

    emitter.mark_block(&ExceptionBlock::BeginExceptionBlock).unwrap();
    emitter.mark_block(&ExceptionBlock::BeginExceptionBlock).unwrap();
    emitter.emit(OpCode::NOP).unwrap();
    emitter.mark_block(&ExceptionBlock::BeginFinallyBlock).unwrap();
    emitter.emit(OpCode::ENDFINALLY).unwrap();
    emitter.mark_block(&ExceptionBlock::EndExceptionBlock).unwrap();
    emitter.mark_block(&ExceptionBlock::BeginExceptFilterBlock).unwrap();
    emitter.emit(OpCode::ENDFILTER).unwrap();
    emitter.mark_block(&catch("System.Object")).unwrap();
    emitter.emit(OpCode::POP).unwrap();
    emitter.mark_block(&ExceptionBlock::EndExceptionBlock).unwrap();
    assert_eq!(emitter.offset(), 30);

    let trace = emitter.into_sink();
    assert_eq!(trace.indent(), 0);
    insta::assert_snapshot!(trace, @r"
    .try
    {
      .try
      {
        L_0000: nop
        L_0001: leave      (autogenerated)
      } // end try
      .finally
      {
        L_0006: endfinally
        L_0007: leave      (autogenerated)
      } // end handler
      L_000c: leave      (autogenerated)
    } // end try
    .filter
    {
      L_0011: endfilter
      L_0013: leave      (autogenerated)
    } // end try
    .catch System.Object
    {
      L_0018: pop
      L_0019: leave      (autogenerated)
    } // end handler
    ");
}

#[test]
fn before_and_after_split() {
    let mut writer = RecordingWriter::default();
    let mut emitter = traced(&mut writer);

    assert!(
        emitter
            .mark_block_before(&ExceptionBlock::BeginExceptionBlock)
            .unwrap()
            .is_some()
    );
    emitter.mark_block_after(&ExceptionBlock::BeginExceptionBlock).unwrap();
    emitter.emit(OpCode::NOP).unwrap();

    emitter.mark_block_before(&ExceptionBlock::BeginFaultBlock).unwrap();
    emitter.mark_block_after(&ExceptionBlock::BeginFaultBlock).unwrap();
    assert_eq!(emitter.offset(), 6);

    let lines_before_end = emitter.sink().lines().len();
    assert_eq!(
        emitter.mark_block_before(&ExceptionBlock::EndExceptionBlock).unwrap(),
        None
    );
    assert_eq!(emitter.sink().lines().len(), lines_before_end);
    assert_eq!(emitter.offset(), 6);

    emitter.mark_block_after(&ExceptionBlock::EndExceptionBlock).unwrap();
    assert_eq!(emitter.offset(), 11);

    insta::assert_snapshot!(emitter.into_sink(), @r"
    .try
    {
      L_0000: nop
      L_0001: leave      (autogenerated)
    } // end try
    .fault
    {
      L_0006: leave      (autogenerated)
    } // end handler
    ");
    assert_eq!(
        writer.calls,
        [
            "begin_exception_block",
            "emit nop",
            "begin_fault_block",
            "end_exception_block",
        ]
    );
}

#[test]
fn implicit_leave_counts_without_tracing() {
    let mut writer = RecordingWriter::default();
    let mut emitter = Emitter::new(&mut writer, TraceBuffer::new(), EmitConfig::default());

    emitter.mark_block(&ExceptionBlock::BeginExceptionBlock).unwrap();
    emitter.mark_block(&ExceptionBlock::BeginFinallyBlock).unwrap();
    emitter.mark_block(&ExceptionBlock::EndExceptionBlock).unwrap();

    assert_eq!(emitter.offset(), 10);
    assert!(emitter.sink().is_empty());
    assert_eq!(emitter.sink().indent(), 0);
}

#[test]
fn rejected_transition_keeps_offset() {
    let mut writer = RecordingWriter::rejecting("begin_finally_block");
    let mut emitter = Emitter::untraced(&mut writer);

    emitter.mark_block(&ExceptionBlock::BeginExceptionBlock).unwrap();
    let err = emitter
        .mark_block(&ExceptionBlock::BeginFinallyBlock)
        .unwrap_err();
    assert_eq!(err, Rejected("begin_finally_block".to_string()));
    assert_eq!(emitter.offset(), 0);
}

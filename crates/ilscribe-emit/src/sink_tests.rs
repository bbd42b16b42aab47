use std::io;
use std::sync::{Arc, Mutex};

use ilscribe_bytecode::{ExceptionBlock, OpCode};
use tracing_subscriber::fmt::MakeWriter;

use crate::test_utils::RecordingWriter;
use crate::{EmitConfig, Emitter, NoopSink, TraceBuffer, TraceSink, TracingSink};

#[test]
fn buffer_indents_with_tabs_by_default() {
    let mut sink = TraceBuffer::new();
    sink.log("a".to_string());
    sink.change_indent(2);
    sink.log("b".to_string());
    sink.change_indent(-1);
    sink.log("c".to_string());

    assert_eq!(sink.lines(), ["a", "\t\tb", "\tc"]);
    assert_eq!(sink.indent(), 1);
    assert_eq!(sink.to_string(), "a\n\t\tb\n\tc");
}

#[test]
fn indent_never_goes_negative() {
    let mut sink = TraceBuffer::with_indent("..");
    sink.change_indent(-3);
    sink.log("x".to_string());
    sink.change_indent(1);
    sink.log("y".to_string());

    assert_eq!(sink.into_lines(), ["x", "..y"]);
}

fn feed<S: TraceSink>(mut sink: S) {
    sink.change_indent(1);
    sink.log("line".to_string());
}

#[test]
fn borrowed_sink_forwards() {
    let mut buffer = TraceBuffer::with_indent(" ");
    feed(&mut buffer);
    feed(&mut buffer);
    assert_eq!(buffer.lines(), [" line", "  line"]);
}

#[test]
fn noop_sink_accepts_everything() {
    let mut sink = NoopSink;
    sink.change_indent(-10);
    sink.log("ignored".to_string());
}

#[derive(Clone, Default)]
struct Capture(Arc<Mutex<Vec<u8>>>);

impl Capture {
    fn contents(&self) -> String {
        let bytes = self.0.lock().unwrap();
        String::from_utf8_lossy(&bytes).into_owned()
    }
}

impl io::Write for Capture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for Capture {
    type Writer = Capture;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

#[test]
fn tracing_sink_emits_debug_events() {
    let capture = Capture::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(capture.clone())
        .with_max_level(tracing::Level::TRACE)
        .with_ansi(false)
        .without_time()
        .finish();

    tracing::subscriber::with_default(subscriber, || {
        let mut writer = RecordingWriter::default();
        let mut emitter = Emitter::new(&mut writer, TracingSink::new(), EmitConfig::traced());
        emitter.mark_block(&ExceptionBlock::BeginExceptionBlock).unwrap();
        emitter.emit(OpCode::NOP).unwrap();
        emitter.mark_block(&ExceptionBlock::BeginFinallyBlock).unwrap();
        emitter.mark_block(&ExceptionBlock::EndExceptionBlock).unwrap();
        assert_eq!(emitter.sink().depth(), 0);
    });

    let output = capture.contents();
    assert!(output.contains("DEBUG"), "{output}");
    assert!(output.contains("ilscribe::trace"), "{output}");
    assert!(output.contains("  L_0000: nop"), "{output}");
    assert!(output.contains("depth=1"), "{output}");
    assert!(output.contains(".finally"), "{output}");
    assert!(output.contains("} // end handler"), "{output}");
    assert_eq!(output.lines().count(), 9, "{output}");
}

#[test]
fn tracing_sink_is_silent_when_tracing_is_off() {
    let capture = Capture::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(capture.clone())
        .with_max_level(tracing::Level::TRACE)
        .finish();

    tracing::subscriber::with_default(subscriber, || {
        let mut writer = RecordingWriter::default();
        let mut emitter = Emitter::new(&mut writer, TracingSink::new(), EmitConfig::default());
        emitter.emit(OpCode::NOP).unwrap();
        emitter.log_comment("hidden");
    });

    assert!(capture.contents().is_empty());
}

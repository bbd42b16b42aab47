//! Trace sinks.
//!
//! The emitter hands every trace line to a [`TraceSink`]. [`NoopSink`] is a
//! zero-cost sink whose calls compile away; in practice the emitter skips
//! formatting entirely when tracing is off, so the sink is never reached.

use std::fmt;

/// Target used by [`TracingSink`] events.
pub const TRACE_TARGET: &str = "ilscribe::trace";

/// Receiver of trace lines.
pub trait TraceSink {
    /// Append one line at the current indentation.
    fn log(&mut self, line: String);

    /// Shift indentation by `delta` levels. Depth never drops below zero.
    fn change_indent(&mut self, delta: isize);
}

impl<S: TraceSink + ?Sized> TraceSink for &mut S {
    #[inline]
    fn log(&mut self, line: String) {
        (**self).log(line);
    }

    #[inline]
    fn change_indent(&mut self, delta: isize) {
        (**self).change_indent(delta);
    }
}

/// Sink that discards everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSink;

impl TraceSink for NoopSink {
    #[inline(always)]
    fn log(&mut self, _line: String) {}

    #[inline(always)]
    fn change_indent(&mut self, _delta: isize) {}
}

/// Sink that collects indented lines in memory.
#[derive(Clone, Debug)]
pub struct TraceBuffer {
    lines: Vec<String>,
    indent: usize,
    unit: String,
}

impl Default for TraceBuffer {
    fn default() -> Self {
        Self::with_indent("\t")
    }
}

impl TraceBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Buffer that indents with `unit` once per level.
    pub fn with_indent(unit: impl Into<String>) -> Self {
        Self {
            lines: Vec::new(),
            indent: 0,
            unit: unit.into(),
        }
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn into_lines(self) -> Vec<String> {
        self.lines
    }

    /// Current indentation depth.
    pub fn indent(&self) -> usize {
        self.indent
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

impl TraceSink for TraceBuffer {
    fn log(&mut self, line: String) {
        self.lines.push(format!("{}{line}", self.unit.repeat(self.indent)));
    }

    fn change_indent(&mut self, delta: isize) {
        self.indent = self.indent.saturating_add_signed(delta);
    }
}

impl fmt::Display for TraceBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.lines.join("\n"))
    }
}

/// Sink that forwards lines as `tracing` events at DEBUG level.
///
/// Each event carries the nesting depth as a `depth` field; the message is
/// indented by two spaces per level so plain formatters still show nesting.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingSink {
    depth: usize,
}

impl TracingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn depth(&self) -> usize {
        self.depth
    }
}

impl TraceSink for TracingSink {
    fn log(&mut self, line: String) {
        tracing::debug!(
            target: TRACE_TARGET,
            depth = self.depth,
            "{}{line}",
            "  ".repeat(self.depth)
        );
    }

    fn change_indent(&mut self, delta: isize) {
        self.depth = self.depth.saturating_add_signed(delta);
    }
}

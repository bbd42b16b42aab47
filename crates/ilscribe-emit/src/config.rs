//! Emitter configuration.

use ilscribe_bytecode::cols;

/// Per-instance emitter settings.
///
/// Tracing is decided here rather than globally, so independent emission
/// passes can run with different policies.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EmitConfig {
    /// Produce trace lines. When off, no formatting work happens at all.
    pub trace: bool,
    /// Width of the mnemonic column in instruction lines.
    pub mnemonic_width: usize,
}

impl Default for EmitConfig {
    fn default() -> Self {
        Self {
            trace: false,
            mnemonic_width: cols::MNEMONIC,
        }
    }
}

impl EmitConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Default configuration with tracing switched on.
    pub fn traced() -> Self {
        Self::default().with_trace(true)
    }

    pub fn with_trace(mut self, trace: bool) -> Self {
        self.trace = trace;
        self
    }

    pub fn with_mnemonic_width(mut self, width: usize) -> Self {
        self.mnemonic_width = width;
        self
    }
}

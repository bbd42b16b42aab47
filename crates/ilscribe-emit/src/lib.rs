//! Offset-tracking, tracing front end for CIL instruction writers.
//!
//! [`Emitter`] sits in front of an [`IlWriter`]. It forwards every
//! instruction unchanged, keeps a running byte offset that matches what the
//! writer encodes, and can render a disassembly-style listing of the stream
//! into a [`TraceSink`].
//!
//! [`CodeBuffer`] is an in-memory writer that produces real method-body bytes,
//! metadata tokens and exception clauses.

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub mod code_buffer;
mod config;
mod emitter;
mod error;
mod regions;
pub mod sink;
mod writer;

#[cfg(test)]
mod regions_tests;
#[cfg(test)]
mod sink_tests;
#[cfg(test)]
mod test_utils;

pub use code_buffer::{ClauseKind, CodeBuffer, ExceptionClause, MetadataTables, MethodBody};
pub use config::EmitConfig;
pub use emitter::Emitter;
pub use error::WriteError;
pub use sink::{NoopSink, TraceBuffer, TraceSink, TracingSink};
pub use writer::IlWriter;

pub use ilscribe_bytecode as bytecode;

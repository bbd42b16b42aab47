//! Exception-handling region transitions.

use crate::metadata::TypeRef;

/// One transition of the protected-region state machine.
///
/// A well-formed body walks `BeginExceptionBlock`, one or more handler
/// begins, then `EndExceptionBlock`. Regions nest.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ExceptionBlock {
    /// Opens a protected (`.try`) region.
    BeginExceptionBlock,
    /// Opens a typed catch handler.
    BeginCatchBlock(TypeRef),
    BeginExceptFilterBlock,
    BeginFaultBlock,
    BeginFinallyBlock,
    /// Closes the innermost protected region.
    EndExceptionBlock,
}

impl ExceptionBlock {
    /// Directive that opens the block in a trace, e.g. `.catch System.Exception`.
    pub fn directive(&self) -> Option<String> {
        match self {
            Self::BeginExceptionBlock => Some(".try".to_string()),
            Self::BeginCatchBlock(catch_type) => Some(format!(".catch {catch_type}")),
            Self::BeginExceptFilterBlock => Some(".filter".to_string()),
            Self::BeginFaultBlock => Some(".fault".to_string()),
            Self::BeginFinallyBlock => Some(".finally".to_string()),
            Self::EndExceptionBlock => None,
        }
    }
}

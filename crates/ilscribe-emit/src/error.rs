use ilscribe_bytecode::Label;

/// Errors produced by [`CodeBuffer`](crate::CodeBuffer).
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum WriteError {
    /// The opcode's operand type does not accept this kind of operand.
    #[error("`{opcode}` does not take {operand} operand")]
    OperandMismatch {
        opcode: &'static str,
        operand: &'static str,
    },
    #[error("{0} was not defined by this buffer")]
    UnknownLabel(Label),
    #[error("{0} is marked twice")]
    LabelMarkedTwice(Label),
    #[error("{0} is referenced but never marked")]
    UnmarkedLabel(Label),
    /// Short branch displacement does not fit in an `i8`.
    #[error("short branch to {label} is out of range: {delta}")]
    BranchOutOfRange { label: Label, delta: i64 },
    #[error("local index {index} does not fit `{opcode}`")]
    LocalIndexTooLarge { opcode: &'static str, index: u16 },
    #[error("too many locals (max 65535)")]
    TooManyLocals,
    #[error("no open exception block")]
    NoOpenRegion,
    #[error("exception block closed without a handler")]
    MissingHandler,
    #[error("{0} exception block(s) left open")]
    UnclosedRegion(usize),
}

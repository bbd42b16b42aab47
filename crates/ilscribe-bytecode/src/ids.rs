//! Writer-issued handles: branch labels and declared locals.

use std::fmt;

use crate::metadata::TypeRef;

/// A branch target, handed out by the writer.
///
/// The id is stable for the lifetime of one method body and doubles as the
/// label's display identity in traces.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Label(pub u32);

impl Label {
    #[inline]
    pub fn id(self) -> u32 {
        self.0
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Label{}", self.0)
    }
}

/// A declared local variable slot.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct LocalVar {
    pub index: u16,
    pub local_type: TypeRef,
    pub pinned: bool,
}

impl LocalVar {
    pub fn new(index: u16, local_type: TypeRef) -> Self {
        Self {
            index,
            local_type,
            pinned: false,
        }
    }

    pub fn pinned(mut self) -> Self {
        self.pinned = true;
        self
    }
}

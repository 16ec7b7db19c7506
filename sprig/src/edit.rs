//! Structural edits between two trees.

use core::fmt;

use serde::Serialize;

use crate::reference::Slot;

/// One step of an edit script.
///
/// Equality compares the variant and the slot references; the node handles
/// carried by the slots are not compared.
#[derive(Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "edit", rename_all = "camelCase")]
pub enum Edit {
    /// A node appears in the target tree at a slot the source does not have.
    Insertion {
        /// Slot in the target tree
        at: Slot,
    },

    /// A node of the source tree has no place in the target.
    Deletion {
        /// Slot in the source tree
        at: Slot,
    },

    /// A node with a stable id changed position.
    Move {
        /// Old slot in the source tree
        from: Slot,
        /// New slot in the target tree
        to: Slot,
    },
}

impl Edit {
    /// Single-letter tag used in the textual form: `I`, `D` or `M`.
    pub fn tag(&self) -> char {
        match self {
            Edit::Insertion { .. } => 'I',
            Edit::Deletion { .. } => 'D',
            Edit::Move { .. } => 'M',
        }
    }
}

impl fmt::Display for Edit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Edit::Insertion { at } | Edit::Deletion { at } => write!(f, "{}: {}", self.tag(), at),
            Edit::Move { from, to } => write!(f, "{}: {} -> {}", self.tag(), from, to),
        }
    }
}

impl fmt::Debug for Edit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

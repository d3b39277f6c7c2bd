//! Journal of applied changes.

use relstore_core::LocalId;

/// One change applied by the mutation engine.
///
/// `mirrored` is set on relation events written as the inverse side of
/// another write.
#[derive(Debug, Clone, PartialEq)]
pub enum MutationEvent {
    Created {
        record: LocalId,
    },
    Deleted {
        record: LocalId,
    },
    Set {
        record: LocalId,
        field: String,
    },
    Linked {
        record: LocalId,
        field: String,
        target: LocalId,
        mirrored: bool,
    },
    Unlinked {
        record: LocalId,
        field: String,
        target: LocalId,
        mirrored: bool,
    },
    /// Pure reorder of an x2many field, no membership change.
    Reordered {
        record: LocalId,
        field: String,
    },
    Computed {
        record: LocalId,
        field: String,
    },
}

impl MutationEvent {
    /// The record the event applies to.
    pub fn record(&self) -> &LocalId {
        match self {
            MutationEvent::Created { record }
            | MutationEvent::Deleted { record }
            | MutationEvent::Set { record, .. }
            | MutationEvent::Linked { record, .. }
            | MutationEvent::Unlinked { record, .. }
            | MutationEvent::Reordered { record, .. }
            | MutationEvent::Computed { record, .. } => record,
        }
    }

    /// A link requested directly, not written as an inverse.
    pub fn is_direct_link(&self) -> bool {
        matches!(self, MutationEvent::Linked { mirrored: false, .. })
    }

    /// An unlink requested directly, not written as an inverse.
    pub fn is_direct_unlink(&self) -> bool {
        matches!(self, MutationEvent::Unlinked { mirrored: false, .. })
    }
}

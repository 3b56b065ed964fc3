//! Typed change notifications.
//!
//! The engine publishes one [`ChangeEvent`] per mutation batch on a broadcast
//! channel. UI layers subscribe explicitly instead of refetching on ad hoc
//! side effects, so a download pass and a realtime subscription firing around
//! the same time do not trigger redundant queries.

use crate::records::EntityKind;

/// Where a change originated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeOrigin {
    /// A foreground write through the mutation gateway.
    Local,
    /// Rows applied from a remote download.
    Remote,
}

/// A batch of changes applied to one local table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChangeEvent {
    /// The table that changed.
    pub entity: EntityKind,
    /// Whether the change came from a local write or a download.
    pub origin: ChangeOrigin,
    /// Number of records in the batch.
    pub records: usize,
}

impl ChangeEvent {
    /// Convenience constructor for a local single-record write.
    pub fn local(entity: EntityKind) -> Self {
        Self {
            entity,
            origin: ChangeOrigin::Local,
            records: 1,
        }
    }

    /// Convenience constructor for a downloaded batch.
    pub fn remote(entity: EntityKind, records: usize) -> Self {
        Self {
            entity,
            origin: ChangeOrigin::Remote,
            records,
        }
    }
}

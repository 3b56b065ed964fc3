//! # ember-types
//!
//! Foundational types for ember-sync, the local-first synchronization engine
//! of the Ember matchmaking app.
//!
//! This crate provides the types shared across all ember-sync crates:
//! - [`UserId`], [`RecordId`], [`MatchId`], [`Timestamp`] - identity and ordering types
//! - [`ProfileRecord`], [`SwipeRecord`], [`MatchRecord`], [`MessageRecord`] - entity records
//! - [`EntityKind`], [`Checkpoint`] - per-table sync bookkeeping
//! - [`ChangeEvent`] - typed change notifications for interested consumers

#![warn(missing_docs)]
#![warn(clippy::all)]

mod events;
mod ids;
mod records;

pub use events::{ChangeEvent, ChangeOrigin};
pub use ids::{MatchId, RecordId, Timestamp, UserId};
pub use records::{
    Checkpoint, EntityKind, MatchRecord, MessageKind, MessageRecord, ProfileRecord, SwipeRecord,
    UnknownMessageKind,
};

//! # ember-store
//!
//! The persistent local store for ember-sync: durable, table-oriented storage
//! for the four synchronized entity types plus the per-table download
//! checkpoints.
//!
//! The store is the always-available half of the local-first design. Writes
//! land here first (marked dirty) and the sync orchestrator reconciles them
//! with the remote service later. Every operation is upsert-by-primary-key
//! with last-write-wins semantics; no cross-table transactions are required,
//! which is what lets a sync pass tolerate partial completion across tables.

#![warn(missing_docs)]
#![warn(clippy::all)]

mod sqlite;

pub use sqlite::SqliteStore;

use async_trait::async_trait;
use ember_types::{
    Checkpoint, EntityKind, MatchId, MatchRecord, MessageRecord, ProfileRecord, RecordId,
    SwipeRecord, Timestamp, UserId,
};

/// Storage layer errors.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Database error.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A stored row could not be decoded back into a record.
    #[error("corrupt row in {table}: {detail}")]
    CorruptRow {
        /// Table the row came from.
        table: &'static str,
        /// What failed to decode.
        detail: String,
    },
}

/// Result type alias for store operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Row counts per table, used for offline diagnostics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TableCounts {
    /// Cached profiles.
    pub profiles: u64,
    /// Stored swipes.
    pub swipes: u64,
    /// Stored matches.
    pub matches: u64,
    /// Stored messages.
    pub messages: u64,
}

impl TableCounts {
    /// Total rows across all four tables.
    pub fn total(&self) -> u64 {
        self.profiles + self.swipes + self.matches + self.messages
    }
}

/// Trait for the on-device store backing the sync engine.
///
/// All writes are upserts by primary key. The `bulk_put_*` operations are the
/// download path: they run in one transaction and force `dirty = false` with
/// a caller-supplied `last_synced` stamp, because the remote service is
/// authoritative for rows it hands us.
#[async_trait]
pub trait LocalStore: Send + Sync {
    /// Upsert a single profile as-is.
    async fn put_profile(&self, profile: &ProfileRecord) -> StoreResult<()>;

    /// Upsert a batch of downloaded profiles, clean and stamped.
    async fn bulk_put_profiles(
        &self,
        rows: &[ProfileRecord],
        synced_at: Timestamp,
    ) -> StoreResult<()>;

    /// Look up a profile by user id.
    async fn profile(&self, user_id: &UserId) -> StoreResult<Option<ProfileRecord>>;

    /// Complete profiles not in the exclusion list, newest first.
    async fn browsable_profiles(
        &self,
        exclude: &[UserId],
        limit: u32,
    ) -> StoreResult<Vec<ProfileRecord>>;

    /// Drop all cached profiles (full-resync path).
    async fn clear_profiles(&self) -> StoreResult<()>;

    /// Upsert a single swipe as-is.
    async fn put_swipe(&self, swipe: &SwipeRecord) -> StoreResult<()>;

    /// Upsert a batch of downloaded swipes, clean and stamped.
    async fn bulk_put_swipes(&self, rows: &[SwipeRecord], synced_at: Timestamp) -> StoreResult<()>;

    /// Look up a swipe by id.
    async fn swipe(&self, id: &RecordId) -> StoreResult<Option<SwipeRecord>>;

    /// All swipes created by the given user, newest first.
    async fn swipes_by_swiper(&self, swiper: &UserId) -> StoreResult<Vec<SwipeRecord>>;

    /// The reciprocity lookup: a like from `swiper` on `swiped`, if present.
    async fn reciprocal_like(
        &self,
        swiper: &UserId,
        swiped: &UserId,
    ) -> StoreResult<Option<SwipeRecord>>;

    /// All swipes awaiting upload. Full-table filter; dirty rows are expected
    /// to be a small minority.
    async fn dirty_swipes(&self) -> StoreResult<Vec<SwipeRecord>>;

    /// Clear one swipe's dirty flag after a successful remote upsert.
    async fn clear_swipe_dirty(&self, id: &RecordId, synced_at: Timestamp) -> StoreResult<()>;

    /// Remove a swipe outright. Returns whether a row was deleted.
    async fn delete_swipe(&self, id: &RecordId) -> StoreResult<bool>;

    /// Upsert a single match as-is.
    async fn put_match(&self, record: &MatchRecord) -> StoreResult<()>;

    /// Upsert a batch of downloaded matches, clean and stamped.
    async fn bulk_put_matches(&self, rows: &[MatchRecord], synced_at: Timestamp)
        -> StoreResult<()>;

    /// All matches involving the given user, newest first.
    async fn matches_for_user(&self, user: &UserId) -> StoreResult<Vec<MatchRecord>>;

    /// The ids of every match currently known locally.
    async fn local_match_ids(&self) -> StoreResult<Vec<MatchId>>;

    /// Upsert a single message as-is.
    async fn put_message(&self, message: &MessageRecord) -> StoreResult<()>;

    /// Upsert a batch of downloaded messages, clean and stamped.
    async fn bulk_put_messages(
        &self,
        rows: &[MessageRecord],
        synced_at: Timestamp,
    ) -> StoreResult<()>;

    /// All messages in a match, oldest first.
    async fn messages_for_match(&self, match_id: &MatchId) -> StoreResult<Vec<MessageRecord>>;

    /// Mark every unread message from `sender` in `match_id` as read and
    /// dirty. Returns the number of rows updated.
    async fn mark_messages_read(&self, match_id: &MatchId, sender: &UserId) -> StoreResult<u64>;

    /// All messages awaiting upload.
    async fn dirty_messages(&self) -> StoreResult<Vec<MessageRecord>>;

    /// Clear one message's dirty flag after a successful remote upsert.
    async fn clear_message_dirty(&self, id: &RecordId, synced_at: Timestamp) -> StoreResult<()>;

    /// The stored checkpoint for an entity type, if one exists.
    async fn checkpoint(&self, entity: EntityKind) -> StoreResult<Option<Timestamp>>;

    /// Advance an entity type's checkpoint. Never moves backwards.
    async fn advance_checkpoint(&self, entity: EntityKind, to: Timestamp) -> StoreResult<()>;

    /// Drop all checkpoints (full-resync path).
    async fn clear_checkpoints(&self) -> StoreResult<()>;

    /// All stored checkpoints, for diagnostics.
    async fn checkpoints(&self) -> StoreResult<Vec<Checkpoint>>;

    /// Whether the given entity table has no rows at all.
    async fn table_is_empty(&self, entity: EntityKind) -> StoreResult<bool>;

    /// Row counts per table.
    async fn table_counts(&self) -> StoreResult<TableCounts>;

    /// Number of rows across swipes and messages still awaiting upload.
    async fn dirty_count(&self) -> StoreResult<u64>;
}

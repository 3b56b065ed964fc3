//! Remote service client boundary.
//!
//! The backend is an external collaborator: the engine only ever needs
//! idempotent upserts for locally-created records and "changed since"
//! selects per entity type. [`RemoteClient`] captures exactly that surface,
//! with an HTTP binding for production and a recording mock for tests.
//!
//! The backend's realtime change-subscription feed is consumed by the UI
//! layer directly and is deliberately absent here; the engine never assumes
//! exclusive ownership of table freshness.

mod http;
mod mock;

pub use http::HttpRemote;
pub use mock::MockRemote;

use async_trait::async_trait;
use thiserror::Error;

use ember_types::{MatchId, MatchRecord, MessageRecord, ProfileRecord, SwipeRecord, Timestamp, UserId};

/// Remote service errors.
#[derive(Debug, Error)]
pub enum RemoteError {
    /// The request never completed (connection refused, DNS, timeout).
    #[error("request failed: {0}")]
    Request(String),

    /// The service answered with a non-success status.
    #[error("unexpected status {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, for diagnostics.
        body: String,
    },

    /// The response body could not be decoded.
    #[error("invalid response payload: {0}")]
    Payload(String),
}

/// Client for the remote matchmaking service.
///
/// All upserts are idempotent by primary key; retrying a previously-uploaded
/// record is harmless. All fetches support a monotonic `since` bound and a
/// page-size `limit`; `since = None` means "from the epoch".
#[async_trait]
pub trait RemoteClient: Send + Sync {
    /// Upsert one swipe.
    async fn upsert_swipe(&self, swipe: &SwipeRecord) -> Result<(), RemoteError>;

    /// Upsert one message.
    async fn upsert_message(&self, message: &MessageRecord) -> Result<(), RemoteError>;

    /// Profiles changed since the bound.
    async fn fetch_profiles(
        &self,
        since: Option<Timestamp>,
        limit: u32,
    ) -> Result<Vec<ProfileRecord>, RemoteError>;

    /// Swipes involving the user (as swiper or swiped) changed since the bound.
    async fn fetch_swipes(
        &self,
        user: &UserId,
        since: Option<Timestamp>,
        limit: u32,
    ) -> Result<Vec<SwipeRecord>, RemoteError>;

    /// Matches involving the user changed since the bound.
    async fn fetch_matches(
        &self,
        user: &UserId,
        since: Option<Timestamp>,
        limit: u32,
    ) -> Result<Vec<MatchRecord>, RemoteError>;

    /// Messages belonging to the given matches changed since the bound.
    async fn fetch_messages(
        &self,
        match_ids: &[MatchId],
        since: Option<Timestamp>,
        limit: u32,
    ) -> Result<Vec<MessageRecord>, RemoteError>;
}

//! Entity records held in the local store and exchanged with the remote service.
//!
//! Every record carries two bookkeeping fields the remote service never sees:
//! `dirty` marks a local write not yet confirmed remotely, and `last_synced`
//! stamps the moment the row was last reconciled. Both are `#[serde(skip)]`
//! so the serde shape of a record is exactly its wire shape.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::ids::{MatchId, RecordId, Timestamp, UserId};

/// The four synchronized entity types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    /// Candidate profiles, owned by the remote service.
    Profile,
    /// Swipes created by the local user (and, via download, swipes on them).
    Swipe,
    /// Materialized matches between two users.
    Match,
    /// Chat messages within a match.
    Message,
}

impl EntityKind {
    /// Download order for a sync pass.
    ///
    /// Messages come last so their download can be scoped to the match ids
    /// known locally as of the same pass.
    pub const DOWNLOAD_ORDER: [EntityKind; 4] = [
        EntityKind::Profile,
        EntityKind::Swipe,
        EntityKind::Match,
        EntityKind::Message,
    ];

    /// The storage table name for this entity type.
    pub fn table_name(&self) -> &'static str {
        match self {
            EntityKind::Profile => "profiles",
            EntityKind::Swipe => "swipes",
            EntityKind::Match => "matches",
            EntityKind::Message => "messages",
        }
    }

    /// Resolve an entity type from its storage table name.
    pub fn from_table_name(name: &str) -> Option<Self> {
        match name {
            "profiles" => Some(EntityKind::Profile),
            "swipes" => Some(EntityKind::Swipe),
            "matches" => Some(EntityKind::Match),
            "messages" => Some(EntityKind::Message),
            _ => None,
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.table_name())
    }
}

/// A candidate profile, cached read-only from the remote service.
///
/// Profiles are never dirtied by the client; the remote service owns every
/// field and local rows are replaced wholesale on download.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileRecord {
    /// The profile owner's user id.
    pub user_id: UserId,
    /// Display name shown on the profile card.
    pub display_name: String,
    /// Age in years.
    pub age: u8,
    /// Self-reported gender.
    pub gender: String,
    /// Free-form bio text.
    pub bio: Option<String>,
    /// URL of the primary profile photo.
    pub photo_url: Option<String>,
    /// Which genders the user wants to see.
    pub interested_in: String,
    /// Whether the profile has enough content to be shown to others.
    pub is_complete: bool,
    /// Last remote modification time.
    pub updated_at: Timestamp,
    /// Local write not yet confirmed remotely. Always false for profiles.
    #[serde(skip)]
    pub dirty: bool,
    /// When this row was last reconciled with the remote service.
    #[serde(skip)]
    pub last_synced: Option<Timestamp>,
}

/// A swipe by one user on another.
///
/// Immutable once created, apart from the sync bookkeeping fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwipeRecord {
    /// Client-generated primary key.
    pub id: RecordId,
    /// The user who swiped.
    pub swiper_id: UserId,
    /// The user who was swiped on.
    pub swiped_id: UserId,
    /// True for a like, false for a pass.
    pub is_like: bool,
    /// True when the like was a super like.
    pub is_super_like: bool,
    /// When the swipe was created.
    pub created_at: Timestamp,
    /// Local write not yet confirmed remotely.
    #[serde(skip)]
    pub dirty: bool,
    /// When this row was last reconciled with the remote service.
    #[serde(skip)]
    pub last_synced: Option<Timestamp>,
}

impl SwipeRecord {
    /// Create a new locally-originated swipe, marked dirty for upload.
    pub fn new(swiper_id: UserId, swiped_id: UserId, is_like: bool, is_super_like: bool) -> Self {
        Self {
            id: RecordId::new(),
            swiper_id,
            swiped_id,
            is_like,
            is_super_like,
            created_at: Timestamp::now(),
            dirty: true,
            last_synced: None,
        }
    }
}

/// A match between two users.
///
/// Invariant: `user_a < user_b` lexicographically, and `id` is derived from
/// the sorted pair. However a match is discovered (A liking B or B liking A,
/// locally or via download), the same pair always lands on the same row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchRecord {
    /// Deterministic primary key derived from the sorted pair.
    pub id: MatchId,
    /// The lexicographically smaller user id.
    pub user_a: UserId,
    /// The lexicographically larger user id.
    pub user_b: UserId,
    /// False once either side unmatches.
    pub is_active: bool,
    /// When the match was created.
    pub created_at: Timestamp,
    /// Local write not yet confirmed remotely.
    #[serde(skip)]
    pub dirty: bool,
    /// When this row was last reconciled with the remote service.
    #[serde(skip)]
    pub last_synced: Option<Timestamp>,
}

impl MatchRecord {
    /// Create a new active match for a pair of users, marked dirty.
    ///
    /// The pair is canonicalized: argument order does not affect the stored
    /// row or its id.
    pub fn from_pair(a: UserId, b: UserId) -> Self {
        let id = MatchId::from_pair(&a, &b);
        let (user_a, user_b) = if a <= b { (a, b) } else { (b, a) };
        Self {
            id,
            user_a,
            user_b,
            is_active: true,
            created_at: Timestamp::now(),
            dirty: true,
            last_synced: None,
        }
    }

    /// Rewrite this record into canonical form.
    ///
    /// Used on rows arriving from the remote service: the pair is sorted and
    /// the id re-derived, so a server row with its own id coalesces with any
    /// locally materialized row for the same pair.
    pub fn canonicalized(mut self) -> Self {
        if self.user_a > self.user_b {
            std::mem::swap(&mut self.user_a, &mut self.user_b);
        }
        self.id = MatchId::from_pair(&self.user_a, &self.user_b);
        self
    }

    /// Whether the given user is one of the two sides of this match.
    pub fn involves(&self, user: &UserId) -> bool {
        &self.user_a == user || &self.user_b == user
    }
}

/// The content type of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    /// Plain text.
    Text,
    /// An image attachment.
    Image,
    /// An animated GIF.
    Gif,
}

impl MessageKind {
    /// The storage representation of this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageKind::Text => "text",
            MessageKind::Image => "image",
            MessageKind::Gif => "gif",
        }
    }
}

/// Error returned when parsing an unrecognized message kind.
#[derive(Debug, thiserror::Error)]
#[error("unknown message kind: {0}")]
pub struct UnknownMessageKind(pub String);

impl std::str::FromStr for MessageKind {
    type Err = UnknownMessageKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" => Ok(MessageKind::Text),
            "image" => Ok(MessageKind::Image),
            "gif" => Ok(MessageKind::Gif),
            other => Err(UnknownMessageKind(other.to_string())),
        }
    }
}

/// A chat message within a match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageRecord {
    /// Client-generated primary key.
    pub id: RecordId,
    /// The match this message belongs to.
    pub match_id: MatchId,
    /// The user who sent the message.
    pub sender_id: UserId,
    /// Message body (caption for media messages).
    pub content: String,
    /// Content type.
    pub kind: MessageKind,
    /// URL of the attached media, if any.
    pub media_url: Option<String>,
    /// Whether the recipient has read the message.
    pub is_read: bool,
    /// When the message was created.
    pub created_at: Timestamp,
    /// Local write not yet confirmed remotely.
    #[serde(skip)]
    pub dirty: bool,
    /// When this row was last reconciled with the remote service.
    #[serde(skip)]
    pub last_synced: Option<Timestamp>,
}

impl MessageRecord {
    /// Create a new locally-originated message, marked dirty and unread.
    pub fn new(
        match_id: MatchId,
        sender_id: UserId,
        content: String,
        kind: MessageKind,
        media_url: Option<String>,
    ) -> Self {
        Self {
            id: RecordId::new(),
            match_id,
            sender_id,
            content,
            kind,
            media_url,
            is_read: false,
            created_at: Timestamp::now(),
            dirty: true,
            last_synced: None,
        }
    }
}

/// Per-table download watermark.
///
/// One row per entity type; `last_sync` only ever moves forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Checkpoint {
    /// The entity type this checkpoint covers.
    pub entity: EntityKind,
    /// Everything changed at or before this time has been requested.
    pub last_sync: Timestamp,
}

//! Identity and ordering types for ember-sync.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// A user identifier assigned by the remote service.
///
/// Stored as an opaque string and compared lexicographically. The lexicographic
/// ordering is load-bearing: match rows always store the smaller id first so a
/// pair of users maps to exactly one canonical row.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    /// Create a UserId from any string-like value.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for UserId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UserId({})", self.0)
    }
}

/// A unique identifier for a client-created record (swipe or message).
///
/// UUID v4 format, generated locally so writes never wait on the remote
/// service for an id.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(Uuid);

impl RecordId {
    /// Create a new random RecordId.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse a RecordId from its string form.
    pub fn parse(s: &str) -> Option<Self> {
        Uuid::parse_str(s).ok().map(Self)
    }

    /// Get the inner UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for RecordId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RecordId({})", self.0)
    }
}

/// Namespace for deriving match ids from user pairs.
const MATCH_NAMESPACE: Uuid = Uuid::from_u128(0x9f2c_4e1a_7b3d_4086_a5d9_63f0_81c2_ed47);

/// A unique identifier for a match between two users.
///
/// Derived deterministically (UUID v5) from the canonically sorted user pair,
/// so a match discovered on the client and the same match downloaded from the
/// server coalesce to one row by primary key instead of producing duplicates.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MatchId(Uuid);

impl MatchId {
    /// Derive the MatchId for a pair of users.
    ///
    /// The pair is sorted before hashing, so argument order does not matter.
    pub fn from_pair(a: &UserId, b: &UserId) -> Self {
        let (first, second) = if a <= b { (a, b) } else { (b, a) };
        let mut name = Vec::with_capacity(first.as_str().len() + second.as_str().len() + 1);
        name.extend_from_slice(first.as_str().as_bytes());
        name.push(0);
        name.extend_from_slice(second.as_str().as_bytes());
        Self(Uuid::new_v5(&MATCH_NAMESPACE, &name))
    }

    /// Parse a MatchId from its string form.
    pub fn parse(s: &str) -> Option<Self> {
        Uuid::parse_str(s).ok().map(Self)
    }

    /// Get the inner UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for MatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for MatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MatchId({})", self.0)
    }
}

/// A point in time, in Unix milliseconds.
///
/// Used for record creation times, per-record `last_synced` stamps, and the
/// per-table download checkpoints. Millisecond resolution keeps "changed
/// since" windows tight without depending on remote clock precision.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct Timestamp(i64);

impl Timestamp {
    /// Create a Timestamp from raw Unix milliseconds.
    pub fn from_millis(millis: i64) -> Self {
        Self(millis)
    }

    /// The current wall-clock time.
    pub fn now() -> Self {
        let millis = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_millis() as i64)
            .unwrap_or(0);
        Self(millis)
    }

    /// The Unix epoch, meaning "nothing downloaded yet".
    pub fn epoch() -> Self {
        Self(0)
    }

    /// Get the raw millisecond value.
    pub fn millis(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Timestamp({})", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_id_orders_lexicographically() {
        let alice = UserId::new("alice");
        let bob = UserId::new("bob");
        assert!(alice < bob);
        assert!(bob > alice);
    }

    #[test]
    fn user_id_serde_is_transparent() {
        let id = UserId::new("user-123");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"user-123\"");
        let back: UserId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn record_id_is_uuid_v4() {
        let id = RecordId::new();
        assert_eq!(id.as_uuid().get_version_num(), 4);
    }

    #[test]
    fn record_id_parse_roundtrip() {
        let id = RecordId::new();
        let parsed = RecordId::parse(&id.to_string()).unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn record_id_parse_rejects_garbage() {
        assert!(RecordId::parse("not-a-uuid").is_none());
    }

    #[test]
    fn match_id_ignores_argument_order() {
        let a = UserId::new("user-a");
        let b = UserId::new("user-b");
        assert_eq!(MatchId::from_pair(&a, &b), MatchId::from_pair(&b, &a));
    }

    #[test]
    fn match_id_differs_per_pair() {
        let a = UserId::new("user-a");
        let b = UserId::new("user-b");
        let c = UserId::new("user-c");
        assert_ne!(MatchId::from_pair(&a, &b), MatchId::from_pair(&a, &c));
    }

    #[test]
    fn match_id_is_deterministic() {
        let a = UserId::new("user-a");
        let b = UserId::new("user-b");
        let first = MatchId::from_pair(&a, &b);
        let second = MatchId::from_pair(&a, &b);
        assert_eq!(first, second);
    }

    #[test]
    fn timestamp_ordering() {
        let t1 = Timestamp::from_millis(1_000);
        let t2 = Timestamp::from_millis(2_000);
        assert!(t1 < t2);
        assert_eq!(t1.max(t2), t2);
    }

    #[test]
    fn timestamp_now_is_after_epoch() {
        assert!(Timestamp::now() > Timestamp::epoch());
    }
}

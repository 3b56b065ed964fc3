//! Mock remote client for testing.
//!
//! Records upserts, queues fetch pages per entity, and injects per-call
//! failures for verification.

use super::{RemoteClient, RemoteError};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use ember_types::{MatchId, MatchRecord, MessageRecord, ProfileRecord, SwipeRecord, Timestamp, UserId};

/// Mock remote client for testing.
///
/// Fetch queues default to empty pages, so a sync pass against a fresh mock
/// completes with zero downloaded records.
#[derive(Debug, Default)]
pub struct MockRemote {
    inner: Arc<Mutex<MockRemoteInner>>,
}

#[derive(Debug, Default)]
struct MockRemoteInner {
    upserted_swipes: Vec<SwipeRecord>,
    upserted_messages: Vec<MessageRecord>,
    profile_pages: VecDeque<Vec<ProfileRecord>>,
    swipe_pages: VecDeque<Vec<SwipeRecord>>,
    match_pages: VecDeque<Vec<MatchRecord>>,
    message_pages: VecDeque<Vec<MessageRecord>>,
    profile_since_log: Vec<Option<Timestamp>>,
    swipe_since_log: Vec<Option<Timestamp>>,
    match_since_log: Vec<Option<Timestamp>>,
    message_since_log: Vec<Option<Timestamp>>,
    message_filter_log: Vec<Vec<MatchId>>,
    fail_next_upsert: Option<String>,
    fail_next_fetch: Option<String>,
}

impl MockRemote {
    /// Create a new mock remote.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a page for the next `fetch_profiles` call.
    pub fn queue_profiles(&self, rows: Vec<ProfileRecord>) {
        self.inner.lock().unwrap().profile_pages.push_back(rows);
    }

    /// Queue a page for the next `fetch_swipes` call.
    pub fn queue_swipes(&self, rows: Vec<SwipeRecord>) {
        self.inner.lock().unwrap().swipe_pages.push_back(rows);
    }

    /// Queue a page for the next `fetch_matches` call.
    pub fn queue_matches(&self, rows: Vec<MatchRecord>) {
        self.inner.lock().unwrap().match_pages.push_back(rows);
    }

    /// Queue a page for the next `fetch_messages` call.
    pub fn queue_messages(&self, rows: Vec<MessageRecord>) {
        self.inner.lock().unwrap().message_pages.push_back(rows);
    }

    /// Cause the next upsert (swipe or message) to fail.
    pub fn fail_next_upsert(&self, error: &str) {
        self.inner.lock().unwrap().fail_next_upsert = Some(error.to_string());
    }

    /// Cause the next fetch (any entity) to fail.
    pub fn fail_next_fetch(&self, error: &str) {
        self.inner.lock().unwrap().fail_next_fetch = Some(error.to_string());
    }

    /// All swipes that were upserted, in call order.
    pub fn upserted_swipes(&self) -> Vec<SwipeRecord> {
        self.inner.lock().unwrap().upserted_swipes.clone()
    }

    /// All messages that were upserted, in call order.
    pub fn upserted_messages(&self) -> Vec<MessageRecord> {
        self.inner.lock().unwrap().upserted_messages.clone()
    }

    /// The `since` bound of every `fetch_profiles` call.
    pub fn profile_since_log(&self) -> Vec<Option<Timestamp>> {
        self.inner.lock().unwrap().profile_since_log.clone()
    }

    /// The `since` bound of every `fetch_swipes` call.
    pub fn swipe_since_log(&self) -> Vec<Option<Timestamp>> {
        self.inner.lock().unwrap().swipe_since_log.clone()
    }

    /// The `since` bound of every `fetch_matches` call.
    pub fn match_since_log(&self) -> Vec<Option<Timestamp>> {
        self.inner.lock().unwrap().match_since_log.clone()
    }

    /// The `since` bound of every `fetch_messages` call.
    pub fn message_since_log(&self) -> Vec<Option<Timestamp>> {
        self.inner.lock().unwrap().message_since_log.clone()
    }

    /// The match-id filter of every `fetch_messages` call.
    pub fn message_filter_log(&self) -> Vec<Vec<MatchId>> {
        self.inner.lock().unwrap().message_filter_log.clone()
    }

    /// Total number of fetch calls across all entities.
    pub fn fetch_calls(&self) -> usize {
        let inner = self.inner.lock().unwrap();
        inner.profile_since_log.len()
            + inner.swipe_since_log.len()
            + inner.match_since_log.len()
            + inner.message_since_log.len()
    }

    fn take_fetch_failure(&self) -> Option<RemoteError> {
        self.inner
            .lock()
            .unwrap()
            .fail_next_fetch
            .take()
            .map(RemoteError::Request)
    }
}

impl Clone for MockRemote {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

#[async_trait]
impl RemoteClient for MockRemote {
    async fn upsert_swipe(&self, swipe: &SwipeRecord) -> Result<(), RemoteError> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(error) = inner.fail_next_upsert.take() {
            return Err(RemoteError::Request(error));
        }
        inner.upserted_swipes.push(swipe.clone());
        Ok(())
    }

    async fn upsert_message(&self, message: &MessageRecord) -> Result<(), RemoteError> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(error) = inner.fail_next_upsert.take() {
            return Err(RemoteError::Request(error));
        }
        inner.upserted_messages.push(message.clone());
        Ok(())
    }

    async fn fetch_profiles(
        &self,
        since: Option<Timestamp>,
        _limit: u32,
    ) -> Result<Vec<ProfileRecord>, RemoteError> {
        if let Some(err) = self.take_fetch_failure() {
            return Err(err);
        }
        let mut inner = self.inner.lock().unwrap();
        inner.profile_since_log.push(since);
        Ok(inner.profile_pages.pop_front().unwrap_or_default())
    }

    async fn fetch_swipes(
        &self,
        _user: &UserId,
        since: Option<Timestamp>,
        _limit: u32,
    ) -> Result<Vec<SwipeRecord>, RemoteError> {
        if let Some(err) = self.take_fetch_failure() {
            return Err(err);
        }
        let mut inner = self.inner.lock().unwrap();
        inner.swipe_since_log.push(since);
        Ok(inner.swipe_pages.pop_front().unwrap_or_default())
    }

    async fn fetch_matches(
        &self,
        _user: &UserId,
        since: Option<Timestamp>,
        _limit: u32,
    ) -> Result<Vec<MatchRecord>, RemoteError> {
        if let Some(err) = self.take_fetch_failure() {
            return Err(err);
        }
        let mut inner = self.inner.lock().unwrap();
        inner.match_since_log.push(since);
        Ok(inner.match_pages.pop_front().unwrap_or_default())
    }

    async fn fetch_messages(
        &self,
        match_ids: &[MatchId],
        since: Option<Timestamp>,
        _limit: u32,
    ) -> Result<Vec<MessageRecord>, RemoteError> {
        if let Some(err) = self.take_fetch_failure() {
            return Err(err);
        }
        let mut inner = self.inner.lock().unwrap();
        inner.message_since_log.push(since);
        inner.message_filter_log.push(match_ids.to_vec());
        Ok(inner.message_pages.pop_front().unwrap_or_default())
    }
}

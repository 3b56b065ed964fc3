//! HTTP binding for the remote service.
//!
//! Speaks a PostgREST-style JSON dialect: upserts are `POST /rest/v1/{table}`
//! with merge-duplicates semantics, selects are `GET` with column filters in
//! the query string. Authentication is a per-app api key.
//!
//! The engine imposes no timeout of its own; pass a `reqwest::Client` built
//! with one if the deployment needs hung calls bounded.

use super::{RemoteClient, RemoteError};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;

use ember_types::{MatchId, MatchRecord, MessageRecord, ProfileRecord, SwipeRecord, Timestamp, UserId};

/// HTTP client for the remote matchmaking service.
#[derive(Debug, Clone)]
pub struct HttpRemote {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl HttpRemote {
    /// Create a client for the given service base URL and api key.
    pub fn new(base_url: &str, api_key: &str) -> Self {
        Self::with_client(reqwest::Client::new(), base_url, api_key)
    }

    /// Create a client reusing an existing `reqwest::Client`.
    pub fn with_client(client: reqwest::Client, base_url: &str, api_key: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        }
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    async fn upsert<T: Serialize + Sync>(&self, table: &str, record: &T) -> Result<(), RemoteError> {
        let response = self
            .client
            .post(self.table_url(table))
            .header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Prefer", "resolution=merge-duplicates")
            .json(std::slice::from_ref(record))
            .send()
            .await
            .map_err(|e| RemoteError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RemoteError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(())
    }

    async fn select<T: DeserializeOwned>(
        &self,
        table: &str,
        params: &[(&str, String)],
    ) -> Result<Vec<T>, RemoteError> {
        let response = self
            .client
            .get(self.table_url(table))
            .header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .query(params)
            .send()
            .await
            .map_err(|e| RemoteError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RemoteError::Status {
                status: status.as_u16(),
                body,
            });
        }
        response
            .json()
            .await
            .map_err(|e| RemoteError::Payload(e.to_string()))
    }
}

/// `or` filter matching rows where the user is either side of a swipe.
fn swipe_sides_filter(user: &UserId) -> String {
    format!("(swiper_id.eq.{user},swiped_id.eq.{user})")
}

/// `or` filter matching rows where the user is either side of a match.
fn match_sides_filter(user: &UserId) -> String {
    format!("(user_a.eq.{user},user_b.eq.{user})")
}

/// `in` filter over a set of match ids.
fn match_in_filter(match_ids: &[MatchId]) -> String {
    let ids: Vec<String> = match_ids.iter().map(MatchId::to_string).collect();
    format!("in.({})", ids.join(","))
}

/// Strictly-after bound on a timestamp column.
fn since_filter(since: Timestamp) -> String {
    format!("gt.{}", since.millis())
}

#[async_trait]
impl RemoteClient for HttpRemote {
    async fn upsert_swipe(&self, swipe: &SwipeRecord) -> Result<(), RemoteError> {
        self.upsert("swipes", swipe).await
    }

    async fn upsert_message(&self, message: &MessageRecord) -> Result<(), RemoteError> {
        self.upsert("messages", message).await
    }

    async fn fetch_profiles(
        &self,
        since: Option<Timestamp>,
        limit: u32,
    ) -> Result<Vec<ProfileRecord>, RemoteError> {
        let mut params = vec![
            ("order", "updated_at.asc".to_string()),
            ("limit", limit.to_string()),
        ];
        if let Some(since) = since {
            params.push(("updated_at", since_filter(since)));
        }
        self.select("profiles", &params).await
    }

    async fn fetch_swipes(
        &self,
        user: &UserId,
        since: Option<Timestamp>,
        limit: u32,
    ) -> Result<Vec<SwipeRecord>, RemoteError> {
        let mut params = vec![
            ("or", swipe_sides_filter(user)),
            ("order", "created_at.asc".to_string()),
            ("limit", limit.to_string()),
        ];
        if let Some(since) = since {
            params.push(("created_at", since_filter(since)));
        }
        self.select("swipes", &params).await
    }

    async fn fetch_matches(
        &self,
        user: &UserId,
        since: Option<Timestamp>,
        limit: u32,
    ) -> Result<Vec<MatchRecord>, RemoteError> {
        let mut params = vec![
            ("or", match_sides_filter(user)),
            ("order", "created_at.asc".to_string()),
            ("limit", limit.to_string()),
        ];
        if let Some(since) = since {
            params.push(("created_at", since_filter(since)));
        }
        self.select("matches", &params).await
    }

    async fn fetch_messages(
        &self,
        match_ids: &[MatchId],
        since: Option<Timestamp>,
        limit: u32,
    ) -> Result<Vec<MessageRecord>, RemoteError> {
        let mut params = vec![
            ("match_id", match_in_filter(match_ids)),
            ("order", "created_at.asc".to_string()),
            ("limit", limit.to_string()),
        ];
        if let Some(since) = since {
            params.push(("created_at", since_filter(since)));
        }
        self.select("messages", &params).await
    }
}

//! The sync pass: upload dirty rows, download remote changes, advance
//! checkpoints.
//!
//! A pass is one logical task. Per-record upload failures and per-step fetch
//! failures are logged and skipped: the row stays dirty, or the window is
//! simply re-requested next pass, so retries come for free on the next
//! trigger without a dedicated scheduler. Only a local store failure aborts
//! a pass, and the report it produces still carries whatever was already
//! reconciled.

use ember_store::StoreError;
use ember_types::{ChangeEvent, EntityKind, MatchRecord, Timestamp, UserId};

use crate::engine::SyncEngine;
use crate::remote::RemoteError;

/// Outcome of one sync pass.
#[derive(Debug, Clone)]
pub struct SyncReport {
    /// False only when the pass aborted on a top-level failure; per-record
    /// and per-step skips leave this true.
    pub success: bool,
    /// Entity types whose download step completed this pass.
    pub synced_tables: Vec<EntityKind>,
    /// Records moved in either direction, uploads plus downloads.
    pub total_records: u64,
    /// The top-level failure, when `success` is false.
    pub error: Option<String>,
}

impl SyncReport {
    fn new() -> Self {
        Self {
            success: true,
            synced_tables: Vec::new(),
            total_records: 0,
            error: None,
        }
    }

    fn abort(mut self, error: &StoreError) -> Self {
        self.success = false;
        self.error = Some(error.to_string());
        self
    }
}

/// A download step either failed at the remote (skippable) or at the store
/// (fatal to the pass).
enum StepError {
    Remote(RemoteError),
    Store(StoreError),
}

impl From<RemoteError> for StepError {
    fn from(e: RemoteError) -> Self {
        Self::Remote(e)
    }
}

impl From<StoreError> for StepError {
    fn from(e: StoreError) -> Self {
        Self::Store(e)
    }
}

impl SyncEngine {
    /// Execute one full pass. Caller holds the single-flight guard.
    pub(crate) async fn run_pass(&self, user: &UserId) -> SyncReport {
        let started_at = Timestamp::now();
        let mut report = SyncReport::new();
        tracing::info!(user = %user, "sync pass started");

        if let Err(e) = self.upload_dirty(&mut report).await {
            tracing::error!("sync pass aborted during upload: {e}");
            return report.abort(&e);
        }

        if let Err(e) = self.download_all(user, &mut report).await {
            tracing::error!("sync pass aborted during download: {e}");
            return report.abort(&e);
        }

        // Checkpoints advance for every entity type, including steps that
        // were skipped on a fetch failure (liveness over completeness; the
        // advance target is the pass start so nothing changed mid-pass is
        // skipped). The store keeps them non-decreasing.
        for kind in EntityKind::DOWNLOAD_ORDER {
            if let Err(e) = self.inner.store.advance_checkpoint(kind, started_at).await {
                tracing::error!("sync pass aborted advancing checkpoints: {e}");
                return report.abort(&e);
            }
        }

        tracing::info!(
            records = report.total_records,
            tables = report.synced_tables.len(),
            "sync pass finished"
        );
        report
    }

    /// Phase 1: push every dirty swipe and message, one record at a time.
    ///
    /// A failing record never aborts the batch; it stays dirty and retries
    /// on the next pass.
    async fn upload_dirty(&self, report: &mut SyncReport) -> Result<(), StoreError> {
        for swipe in self.inner.store.dirty_swipes().await? {
            match self.inner.remote.upsert_swipe(&swipe).await {
                Ok(()) => {
                    self.inner
                        .store
                        .clear_swipe_dirty(&swipe.id, Timestamp::now())
                        .await?;
                    report.total_records += 1;
                }
                Err(e) => {
                    tracing::warn!(id = %swipe.id, "swipe upload failed, row stays dirty: {e}");
                }
            }
        }

        for message in self.inner.store.dirty_messages().await? {
            match self.inner.remote.upsert_message(&message).await {
                Ok(()) => {
                    self.inner
                        .store
                        .clear_message_dirty(&message.id, Timestamp::now())
                        .await?;
                    report.total_records += 1;
                }
                Err(e) => {
                    tracing::warn!(id = %message.id, "message upload failed, row stays dirty: {e}");
                }
            }
        }

        Ok(())
    }

    /// Phase 2: download per entity type, in fixed order.
    async fn download_all(
        &self,
        user: &UserId,
        report: &mut SyncReport,
    ) -> Result<(), StoreError> {
        for kind in EntityKind::DOWNLOAD_ORDER {
            match self.download_step(user, kind).await {
                Ok(count) => {
                    report.total_records += count;
                    report.synced_tables.push(kind);
                    if count > 0 {
                        self.publish(ChangeEvent::remote(kind, count as usize));
                    }
                }
                Err(StepError::Remote(e)) => {
                    tracing::warn!(table = %kind, "download step failed, skipping: {e}");
                }
                Err(StepError::Store(e)) => return Err(e),
            }
        }
        Ok(())
    }

    /// Download one entity type and upsert the page into the local store.
    ///
    /// A first sync for the type (empty local table) ignores the stored
    /// checkpoint and fetches from the epoch, bounded by the page size.
    async fn download_step(&self, user: &UserId, kind: EntityKind) -> Result<u64, StepError> {
        let store = &self.inner.store;
        let since = if store.table_is_empty(kind).await? {
            None
        } else {
            store.checkpoint(kind).await?
        };
        let limit = self.inner.config.page_size;
        let synced_at = Timestamp::now();

        let count = match kind {
            EntityKind::Profile => {
                let rows = self.inner.remote.fetch_profiles(since, limit).await?;
                store.bulk_put_profiles(&rows, synced_at).await?;
                rows.len()
            }
            EntityKind::Swipe => {
                let rows = self.inner.remote.fetch_swipes(user, since, limit).await?;
                store.bulk_put_swipes(&rows, synced_at).await?;
                rows.len()
            }
            EntityKind::Match => {
                let rows = self.inner.remote.fetch_matches(user, since, limit).await?;
                // Server rows get the canonical sorted pair and deterministic
                // id, so they coalesce with locally materialized matches.
                let rows: Vec<MatchRecord> =
                    rows.into_iter().map(MatchRecord::canonicalized).collect();
                store.bulk_put_matches(&rows, synced_at).await?;
                rows.len()
            }
            EntityKind::Message => {
                // Ordered after the match step on purpose: only ask for
                // messages belonging to matches known locally in this pass.
                let match_ids = store.local_match_ids().await?;
                if match_ids.is_empty() {
                    0
                } else {
                    let rows = self
                        .inner
                        .remote
                        .fetch_messages(&match_ids, since, limit)
                        .await?;
                    store.bulk_put_messages(&rows, synced_at).await?;
                    rows.len()
                }
            }
        };

        tracing::debug!(table = %kind, records = count, "download step complete");
        Ok(count as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{EngineConfig, SyncEngine};
    use crate::network::NetworkMonitor;
    use crate::remote::MockRemote;
    use ember_store::{LocalStore, SqliteStore};
    use ember_types::{MessageKind, MessageRecord, SwipeRecord};
    use ember_types::{MatchId, UserId};
    use std::sync::Arc;

    async fn engine_with_parts() -> (SyncEngine, Arc<SqliteStore>, MockRemote) {
        let store = Arc::new(SqliteStore::in_memory().await.unwrap());
        let remote = MockRemote::new();
        let engine = SyncEngine::new(
            store.clone(),
            Arc::new(remote.clone()),
            Arc::new(NetworkMonitor::new(true)),
            EngineConfig::default(),
        );
        engine.set_active_user(UserId::new("me"));
        (engine, store, remote)
    }

    #[tokio::test]
    async fn upload_failure_leaves_row_dirty_and_continues() {
        let (engine, store, remote) = engine_with_parts().await;

        let failing = SwipeRecord::new(UserId::new("me"), UserId::new("v1"), true, false);
        let passing = SwipeRecord::new(UserId::new("me"), UserId::new("v2"), true, false);
        store.put_swipe(&failing).await.unwrap();
        store.put_swipe(&passing).await.unwrap();

        // First upsert in created_at order fails, the second succeeds.
        remote.fail_next_upsert("backend down");
        let report = engine.trigger_sync().await.unwrap();

        assert!(report.success);
        assert_eq!(report.total_records, 1);

        let mut dirty_left = 0;
        for swipe in [&failing, &passing] {
            let row = store.swipe(&swipe.id).await.unwrap().unwrap();
            if row.dirty {
                dirty_left += 1;
                assert!(row.last_synced.is_none());
            } else {
                assert!(row.last_synced.is_some());
            }
        }
        assert_eq!(dirty_left, 1);
        assert_eq!(remote.upserted_swipes().len(), 1);
    }

    #[tokio::test]
    async fn failed_fetch_step_is_skipped_not_fatal() {
        let (engine, _store, remote) = engine_with_parts().await;

        // The first fetch of the pass (profiles) fails; the rest proceed.
        remote.fail_next_fetch("503");
        let report = engine.trigger_sync().await.unwrap();

        assert!(report.success);
        assert!(!report.synced_tables.contains(&EntityKind::Profile));
        assert!(report.synced_tables.contains(&EntityKind::Swipe));
        assert!(report.synced_tables.contains(&EntityKind::Match));
        assert!(report.synced_tables.contains(&EntityKind::Message));
    }

    #[tokio::test]
    async fn checkpoints_advance_even_when_a_step_failed() {
        let (engine, store, remote) = engine_with_parts().await;
        let before = Timestamp::now();

        remote.fail_next_fetch("503");
        engine.trigger_sync().await.unwrap();

        for kind in EntityKind::DOWNLOAD_ORDER {
            let checkpoint = store.checkpoint(kind).await.unwrap().unwrap();
            assert!(checkpoint >= before, "{kind} checkpoint did not advance");
        }
    }

    #[tokio::test]
    async fn message_download_waits_for_local_matches() {
        let (engine, _store, remote) = engine_with_parts().await;

        // No local matches: the message fetch is never issued.
        let report = engine.trigger_sync().await.unwrap();
        assert!(report.synced_tables.contains(&EntityKind::Message));
        assert!(remote.message_filter_log().is_empty());
    }

    #[tokio::test]
    async fn message_download_scoped_to_known_matches() {
        let (engine, _store, remote) = engine_with_parts().await;
        let match_id = MatchId::from_pair(&UserId::new("me"), &UserId::new("anna"));

        // The match arrives in this same pass, before the message step.
        remote.queue_matches(vec![ember_types::MatchRecord::from_pair(
            UserId::new("anna"),
            UserId::new("me"),
        )]);
        let mut msg = MessageRecord::new(
            match_id,
            UserId::new("anna"),
            "hi".into(),
            MessageKind::Text,
            None,
        );
        msg.dirty = false;
        remote.queue_messages(vec![msg]);

        let report = engine.trigger_sync().await.unwrap();

        assert_eq!(report.total_records, 2);
        assert_eq!(remote.message_filter_log(), vec![vec![match_id]]);
    }

    #[tokio::test]
    async fn downloaded_matches_are_canonicalized() {
        let (engine, store, remote) = engine_with_parts().await;

        // A server row with the pair reversed.
        let reversed = ember_types::MatchRecord {
            id: MatchId::from_pair(&UserId::new("zz"), &UserId::new("zz")),
            user_a: UserId::new("me"),
            user_b: UserId::new("anna"),
            is_active: true,
            created_at: Timestamp::from_millis(100),
            dirty: false,
            last_synced: None,
        };
        remote.queue_matches(vec![reversed]);

        engine.trigger_sync().await.unwrap();

        let matches = store.matches_for_user(&UserId::new("me")).await.unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].user_a, UserId::new("anna"));
        assert_eq!(
            matches[0].id,
            MatchId::from_pair(&UserId::new("anna"), &UserId::new("me"))
        );
    }

    #[tokio::test]
    async fn completed_pass_reports_all_tables() {
        let (engine, _store, _remote) = engine_with_parts().await;

        let report = engine.trigger_sync().await.unwrap();

        assert!(report.success);
        assert!(report.error.is_none());
        assert_eq!(report.synced_tables, EntityKind::DOWNLOAD_ORDER.to_vec());
    }
}

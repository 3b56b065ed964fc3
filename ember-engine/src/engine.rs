//! The engine façade: session scoping, the mutation gateway, and sync control.
//!
//! [`SyncEngine`] is the one object the rest of the app talks to. It is an
//! explicit context owned by the composition root (no global state), cheap to
//! clone, and scoped to the active session user. Writes always land in the
//! local store first, marked dirty; if the network monitor reports online, a
//! detached sync task is fired afterwards so the caller returns immediately
//! either way. That decoupling is what makes swipes and messages feel instant
//! on a slow network.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use ember_store::{LocalStore, StoreError, TableCounts};
use ember_types::{
    ChangeEvent, EntityKind, MatchId, MatchRecord, MessageKind, MessageRecord, ProfileRecord,
    RecordId, SwipeRecord, UserId,
};

use crate::network::{NetworkEvent, NetworkMonitor};
use crate::orchestrator::SyncReport;
use crate::remote::RemoteClient;

/// Engine errors surfaced to callers.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// A session-scoped operation was called with no active user set.
    #[error("no active user session")]
    NoSession,

    /// A sync was requested while offline.
    #[error("no network")]
    Offline,

    /// A sync was requested while another pass was running.
    #[error("sync in progress")]
    SyncInProgress,

    /// The local store failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Engine tunables.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Maximum records fetched per entity type per pass.
    pub page_size: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self { page_size: 500 }
    }
}

impl EngineConfig {
    /// Set the download page size.
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }
}

/// Per-table row counts plus the pending upload backlog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OfflineStats {
    /// Row counts per table.
    pub tables: TableCounts,
    /// Dirty rows across swipes and messages still awaiting upload.
    pub pending_uploads: u64,
}

pub(crate) struct EngineInner {
    pub(crate) store: Arc<dyn LocalStore>,
    pub(crate) remote: Arc<dyn RemoteClient>,
    pub(crate) network: Arc<NetworkMonitor>,
    pub(crate) config: EngineConfig,
    session: RwLock<Option<UserId>>,
    sync_running: AtomicBool,
    changes: broadcast::Sender<ChangeEvent>,
    completions: broadcast::Sender<SyncReport>,
}

/// The local-first sync engine.
///
/// Clones share state; hand one to each consumer that needs the write path
/// or a sync trigger.
#[derive(Clone)]
pub struct SyncEngine {
    pub(crate) inner: Arc<EngineInner>,
}

/// Resets the single-flight flag when a pass ends, normally or not.
struct RunningGuard<'a>(&'a AtomicBool);

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl SyncEngine {
    /// Build an engine from its collaborators.
    pub fn new(
        store: Arc<dyn LocalStore>,
        remote: Arc<dyn RemoteClient>,
        network: Arc<NetworkMonitor>,
        config: EngineConfig,
    ) -> Self {
        let (changes, _) = broadcast::channel(64);
        let (completions, _) = broadcast::channel(16);
        Self {
            inner: Arc::new(EngineInner {
                store,
                remote,
                network,
                config,
                session: RwLock::new(None),
                sync_running: AtomicBool::new(false),
                changes,
                completions,
            }),
        }
    }

    /// The network monitor this engine observes.
    pub fn network(&self) -> &NetworkMonitor {
        &self.inner.network
    }

    /// Scope the engine to a signed-in user.
    pub fn set_active_user(&self, user: UserId) {
        *self.inner.session.write().unwrap() = Some(user);
    }

    /// The active session user, if any.
    pub fn active_user(&self) -> Option<UserId> {
        self.inner.session.read().unwrap().clone()
    }

    /// Clear the session (sign-out).
    pub fn clear_active_user(&self) {
        *self.inner.session.write().unwrap() = None;
    }

    /// Subscribe to per-table change events.
    pub fn subscribe_changes(&self) -> broadcast::Receiver<ChangeEvent> {
        self.inner.changes.subscribe()
    }

    /// Subscribe to sync completion reports (success and failure alike).
    pub fn subscribe_completions(&self) -> broadcast::Receiver<SyncReport> {
        self.inner.completions.subscribe()
    }

    pub(crate) fn publish(&self, event: ChangeEvent) {
        let _ = self.inner.changes.send(event);
    }

    // ---- reads -------------------------------------------------------------

    /// Complete candidate profiles, excluding the given user ids.
    pub async fn get_profiles(
        &self,
        exclude: &[UserId],
        limit: u32,
    ) -> Result<Vec<ProfileRecord>, EngineError> {
        Ok(self.inner.store.browsable_profiles(exclude, limit).await?)
    }

    /// Look up one profile by user id.
    pub async fn get_profile(&self, user_id: &UserId) -> Result<Option<ProfileRecord>, EngineError> {
        Ok(self.inner.store.profile(user_id).await?)
    }

    /// All swipes created by the given user.
    pub async fn get_user_swipes(&self, user_id: &UserId) -> Result<Vec<SwipeRecord>, EngineError> {
        Ok(self.inner.store.swipes_by_swiper(user_id).await?)
    }

    /// All matches involving the given user.
    pub async fn get_user_matches(&self, user_id: &UserId) -> Result<Vec<MatchRecord>, EngineError> {
        Ok(self.inner.store.matches_for_user(user_id).await?)
    }

    /// All messages in a match, oldest first.
    pub async fn get_match_messages(
        &self,
        match_id: &MatchId,
    ) -> Result<Vec<MessageRecord>, EngineError> {
        Ok(self.inner.store.messages_for_match(match_id).await?)
    }

    // ---- writes ------------------------------------------------------------

    /// Record a swipe by the session user on `swiped_id`.
    ///
    /// Always succeeds locally. When the swipe is a like, the reciprocity
    /// check runs before returning: if the store already holds a like from
    /// `swiped_id` back to the session user, the match is materialized
    /// immediately with its canonical deterministic id, giving instant
    /// feedback before the server's own match row is ever downloaded.
    pub async fn create_swipe(
        &self,
        swiped_id: UserId,
        is_like: bool,
        is_super_like: bool,
    ) -> Result<RecordId, EngineError> {
        let user = self.active_user().ok_or(EngineError::NoSession)?;

        let swipe = SwipeRecord::new(user.clone(), swiped_id.clone(), is_like, is_super_like);
        self.inner.store.put_swipe(&swipe).await?;
        self.publish(ChangeEvent::local(EntityKind::Swipe));

        if is_like
            && self
                .inner
                .store
                .reciprocal_like(&swiped_id, &user)
                .await?
                .is_some()
        {
            let record = MatchRecord::from_pair(user, swiped_id);
            tracing::info!(match_id = %record.id, "reciprocal like, match materialized locally");
            self.inner.store.put_match(&record).await?;
            self.publish(ChangeEvent::local(EntityKind::Match));
        }

        self.request_sync();
        Ok(swipe.id)
    }

    /// Record a message from the session user in the given match.
    pub async fn create_message(
        &self,
        match_id: MatchId,
        content: String,
        kind: MessageKind,
        media_url: Option<String>,
    ) -> Result<RecordId, EngineError> {
        let user = self.active_user().ok_or(EngineError::NoSession)?;

        let message = MessageRecord::new(match_id, user, content, kind, media_url);
        self.inner.store.put_message(&message).await?;
        self.publish(ChangeEvent::local(EntityKind::Message));

        self.request_sync();
        Ok(message.id)
    }

    /// Mark every unread message from `sender_id` in the match as read.
    ///
    /// Returns the number of messages flipped. The flipped rows are dirtied
    /// so the read receipts upload on the next pass.
    pub async fn mark_messages_read(
        &self,
        match_id: &MatchId,
        sender_id: &UserId,
    ) -> Result<u64, EngineError> {
        self.active_user().ok_or(EngineError::NoSession)?;

        let updated = self
            .inner
            .store
            .mark_messages_read(match_id, sender_id)
            .await?;
        if updated > 0 {
            self.publish(ChangeEvent {
                entity: EntityKind::Message,
                origin: ember_types::ChangeOrigin::Local,
                records: updated as usize,
            });
        }

        self.request_sync();
        Ok(updated)
    }

    /// Retract a swipe: the local row is removed outright.
    ///
    /// There is no tombstone, so a swipe that already uploaded will reappear
    /// on a later download.
    pub async fn delete_swipe(&self, id: &RecordId) -> Result<bool, EngineError> {
        let deleted = self.inner.store.delete_swipe(id).await?;
        if deleted {
            self.publish(ChangeEvent::local(EntityKind::Swipe));
        }
        Ok(deleted)
    }

    // ---- sync control ------------------------------------------------------

    /// Fire a background sync if online; never blocks, never fails.
    pub fn request_sync(&self) {
        if !self.inner.network.is_online() {
            return;
        }
        let engine = self.clone();
        tokio::spawn(async move {
            match engine.trigger_sync().await {
                Ok(report) => tracing::debug!(
                    success = report.success,
                    records = report.total_records,
                    "background sync finished"
                ),
                Err(e) => tracing::debug!("background sync not run: {e}"),
            }
        });
    }

    /// Run one sync pass now.
    ///
    /// Requires an active session and connectivity, and rejects reentrant
    /// calls: while a pass is running, further triggers return
    /// [`EngineError::SyncInProgress`] immediately without touching any
    /// state. The returned report is also published to completion
    /// subscribers after every run, success or failure.
    pub async fn trigger_sync(&self) -> Result<SyncReport, EngineError> {
        let user = self.active_user().ok_or(EngineError::NoSession)?;
        if !self.inner.network.is_online() {
            return Err(EngineError::Offline);
        }
        // Check-and-set must be atomic: the reconnect edge and a gateway
        // trigger can race into this function on different tasks.
        if self
            .inner
            .sync_running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(EngineError::SyncInProgress);
        }

        let guard = RunningGuard(&self.inner.sync_running);
        let report = self.run_pass(&user).await;
        drop(guard);

        let _ = self.inner.completions.send(report.clone());
        Ok(report)
    }

    /// Clear checkpoints and cached profiles, then sync from the epoch.
    pub async fn force_full_sync(&self) -> Result<SyncReport, EngineError> {
        self.active_user().ok_or(EngineError::NoSession)?;
        if !self.inner.network.is_online() {
            return Err(EngineError::Offline);
        }

        self.inner.store.clear_checkpoints().await?;
        self.inner.store.clear_profiles().await?;
        tracing::info!("checkpoints and cached profiles cleared, resyncing from epoch");

        self.trigger_sync().await
    }

    /// The stored download checkpoints, for diagnostics.
    pub async fn sync_checkpoints(&self) -> Result<Vec<ember_types::Checkpoint>, EngineError> {
        Ok(self.inner.store.checkpoints().await?)
    }

    /// Row counts per table plus the pending upload backlog.
    pub async fn offline_stats(&self) -> Result<OfflineStats, EngineError> {
        let tables = self.inner.store.table_counts().await?;
        let pending_uploads = self.inner.store.dirty_count().await?;
        Ok(OfflineStats {
            tables,
            pending_uploads,
        })
    }

    /// Start the auto-sync listener.
    ///
    /// The returned task consumes the monitor's offline→online edge events
    /// and runs one sync per edge. It executes outside any caller's stack;
    /// hand-off to the orchestrator goes through the same single-flight
    /// guard as every other trigger.
    pub fn spawn_auto_sync(&self) -> JoinHandle<()> {
        let engine = self.clone();
        let mut events = self.inner.network.subscribe();
        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(NetworkEvent::CameOnline) => match engine.trigger_sync().await {
                        Ok(report) => tracing::info!(
                            success = report.success,
                            records = report.total_records,
                            "auto-sync after reconnect"
                        ),
                        Err(e) => tracing::debug!("auto-sync not run: {e}"),
                    },
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "auto-sync listener lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::MockRemote;
    use ember_store::SqliteStore;
    use ember_types::ChangeOrigin;

    async fn test_engine(online: bool) -> (SyncEngine, MockRemote) {
        let store = SqliteStore::in_memory().await.unwrap();
        let remote = MockRemote::new();
        let network = Arc::new(NetworkMonitor::new(online));
        let engine = SyncEngine::new(
            Arc::new(store),
            Arc::new(remote.clone()),
            network,
            EngineConfig::default(),
        );
        (engine, remote)
    }

    #[tokio::test]
    async fn writes_require_a_session() {
        let (engine, _remote) = test_engine(false).await;

        let result = engine.create_swipe(UserId::new("v"), true, false).await;
        assert!(matches!(result, Err(EngineError::NoSession)));

        let match_id = MatchId::from_pair(&UserId::new("a"), &UserId::new("b"));
        let result = engine
            .create_message(match_id, "hi".into(), MessageKind::Text, None)
            .await;
        assert!(matches!(result, Err(EngineError::NoSession)));
    }

    #[tokio::test]
    async fn create_swipe_is_instant_while_offline() {
        let (engine, remote) = test_engine(false).await;
        engine.set_active_user(UserId::new("u"));

        let id = engine.create_swipe(UserId::new("v"), true, false).await.unwrap();

        let swipes = engine.get_user_swipes(&UserId::new("u")).await.unwrap();
        assert_eq!(swipes.len(), 1);
        assert_eq!(swipes[0].id, id);
        assert!(swipes[0].dirty);
        // Nothing reached the remote.
        assert!(remote.upserted_swipes().is_empty());
    }

    #[tokio::test]
    async fn reciprocal_like_materializes_canonical_match() {
        let (engine, _remote) = test_engine(false).await;
        engine.set_active_user(UserId::new("walt"));

        // A like from anna on walt arrived in an earlier download.
        let mut prior = SwipeRecord::new(UserId::new("anna"), UserId::new("walt"), true, false);
        prior.dirty = false;
        engine.inner.store.put_swipe(&prior).await.unwrap();

        engine.create_swipe(UserId::new("anna"), true, false).await.unwrap();

        let matches = engine.get_user_matches(&UserId::new("walt")).await.unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].user_a, UserId::new("anna"));
        assert_eq!(matches[0].user_b, UserId::new("walt"));
        assert_eq!(
            matches[0].id,
            MatchId::from_pair(&UserId::new("anna"), &UserId::new("walt"))
        );
        assert!(matches[0].is_active);
    }

    #[tokio::test]
    async fn pass_swipe_never_creates_a_match() {
        let (engine, _remote) = test_engine(false).await;
        engine.set_active_user(UserId::new("walt"));

        let mut prior = SwipeRecord::new(UserId::new("anna"), UserId::new("walt"), true, false);
        prior.dirty = false;
        engine.inner.store.put_swipe(&prior).await.unwrap();

        // walt passes on anna despite her like.
        engine.create_swipe(UserId::new("anna"), false, false).await.unwrap();

        let matches = engine.get_user_matches(&UserId::new("walt")).await.unwrap();
        assert!(matches.is_empty());
    }

    #[tokio::test]
    async fn no_reciprocal_like_means_no_match() {
        let (engine, _remote) = test_engine(false).await;
        engine.set_active_user(UserId::new("u"));

        engine.create_swipe(UserId::new("v"), true, false).await.unwrap();

        let matches = engine.get_user_matches(&UserId::new("u")).await.unwrap();
        assert!(matches.is_empty());
    }

    #[tokio::test]
    async fn mark_messages_read_reports_count() {
        let (engine, _remote) = test_engine(false).await;
        engine.set_active_user(UserId::new("a"));
        let match_id = MatchId::from_pair(&UserId::new("a"), &UserId::new("b"));

        let mut incoming = MessageRecord::new(
            match_id,
            UserId::new("b"),
            "hello".into(),
            MessageKind::Text,
            None,
        );
        incoming.dirty = false;
        engine.inner.store.put_message(&incoming).await.unwrap();

        let updated = engine
            .mark_messages_read(&match_id, &UserId::new("b"))
            .await
            .unwrap();
        assert_eq!(updated, 1);

        // Second call is a no-op.
        let updated = engine
            .mark_messages_read(&match_id, &UserId::new("b"))
            .await
            .unwrap();
        assert_eq!(updated, 0);
    }

    #[tokio::test]
    async fn delete_swipe_removes_local_row() {
        let (engine, _remote) = test_engine(false).await;
        engine.set_active_user(UserId::new("u"));

        let id = engine.create_swipe(UserId::new("v"), true, false).await.unwrap();
        assert!(engine.delete_swipe(&id).await.unwrap());

        let swipes = engine.get_user_swipes(&UserId::new("u")).await.unwrap();
        assert!(swipes.is_empty());
    }

    #[tokio::test]
    async fn local_writes_publish_change_events() {
        let (engine, _remote) = test_engine(false).await;
        engine.set_active_user(UserId::new("u"));
        let mut changes = engine.subscribe_changes();

        engine.create_swipe(UserId::new("v"), true, false).await.unwrap();

        let event = changes.recv().await.unwrap();
        assert_eq!(event.entity, EntityKind::Swipe);
        assert_eq!(event.origin, ChangeOrigin::Local);
    }

    #[tokio::test]
    async fn trigger_sync_requires_network() {
        let (engine, _remote) = test_engine(false).await;
        engine.set_active_user(UserId::new("u"));

        let result = engine.trigger_sync().await;
        assert!(matches!(result, Err(EngineError::Offline)));
    }

    #[tokio::test]
    async fn trigger_sync_requires_session() {
        let (engine, _remote) = test_engine(true).await;

        let result = engine.trigger_sync().await;
        assert!(matches!(result, Err(EngineError::NoSession)));
    }

    #[tokio::test]
    async fn offline_stats_counts_pending_uploads() {
        let (engine, _remote) = test_engine(false).await;
        engine.set_active_user(UserId::new("u"));

        engine.create_swipe(UserId::new("v"), true, false).await.unwrap();
        let match_id = MatchId::from_pair(&UserId::new("u"), &UserId::new("v"));
        engine
            .create_message(match_id, "hi".into(), MessageKind::Text, None)
            .await
            .unwrap();

        let stats = engine.offline_stats().await.unwrap();
        assert_eq!(stats.tables.swipes, 1);
        assert_eq!(stats.tables.messages, 1);
        assert_eq!(stats.pending_uploads, 2);
    }

    #[tokio::test]
    async fn engine_config_builder() {
        let config = EngineConfig::default().with_page_size(50);
        assert_eq!(config.page_size, 50);
    }
}

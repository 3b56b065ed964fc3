//! End-to-end properties of the sync engine, exercised against the real
//! SQLite store and a recording mock remote.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::timeout;

use ember_engine::{EngineConfig, EngineError, MockRemote, NetworkMonitor, SyncEngine};
use ember_store::{LocalStore, SqliteStore};
use ember_types::{
    EntityKind, MatchId, MatchRecord, ProfileRecord, SwipeRecord, Timestamp, UserId,
};

async fn build_engine(
    online: bool,
) -> (SyncEngine, Arc<SqliteStore>, MockRemote, Arc<NetworkMonitor>) {
    let store = Arc::new(SqliteStore::in_memory().await.unwrap());
    let remote = MockRemote::new();
    let network = Arc::new(NetworkMonitor::new(online));
    let engine = SyncEngine::new(
        store.clone(),
        Arc::new(remote.clone()),
        network.clone(),
        EngineConfig::default(),
    );
    (engine, store, remote, network)
}

fn profile(user: &str, updated_at: i64) -> ProfileRecord {
    ProfileRecord {
        user_id: UserId::new(user),
        display_name: user.to_string(),
        age: 31,
        gender: "man".to_string(),
        bio: None,
        photo_url: None,
        interested_in: "women".to_string(),
        is_complete: true,
        updated_at: Timestamp::from_millis(updated_at),
        dirty: false,
        last_synced: None,
    }
}

#[tokio::test]
async fn sync_is_idempotent_with_no_changes() {
    let (engine, _store, _remote, _network) = build_engine(true).await;
    engine.set_active_user(UserId::new("me"));
    engine.create_swipe(UserId::new("v"), true, false).await.unwrap();

    let first = engine.trigger_sync().await.unwrap();
    assert!(first.success);
    assert_eq!(first.total_records, 1);

    // Nothing new on either side: both subsequent passes move zero records.
    let second = engine.trigger_sync().await.unwrap();
    assert!(second.success);
    assert_eq!(second.total_records, 0);

    let third = engine.trigger_sync().await.unwrap();
    assert!(third.success);
    assert_eq!(third.total_records, 0);
}

#[tokio::test]
async fn successful_upload_clears_dirty_and_stamps() {
    let (engine, store, remote, _network) = build_engine(true).await;
    engine.set_active_user(UserId::new("me"));

    let id = engine.create_swipe(UserId::new("v"), true, true).await.unwrap();
    let before = Timestamp::now();
    engine.trigger_sync().await.unwrap();

    let row = store.swipe(&id).await.unwrap().unwrap();
    assert!(!row.dirty);
    assert!(row.last_synced.unwrap() >= before);

    // The remote saw exactly the row we wrote.
    let uploaded = remote.upserted_swipes();
    assert_eq!(uploaded.len(), 1);
    assert_eq!(uploaded[0].id, id);
    assert!(uploaded[0].is_super_like);
}

#[tokio::test]
async fn failed_upload_leaves_row_unchanged() {
    let (engine, store, remote, _network) = build_engine(true).await;
    engine.set_active_user(UserId::new("me"));

    let mut swipe = SwipeRecord::new(UserId::new("me"), UserId::new("v"), true, false);
    swipe.created_at = Timestamp::from_millis(1234);
    store.put_swipe(&swipe).await.unwrap();

    remote.fail_next_upsert("backend down");
    let report = engine.trigger_sync().await.unwrap();
    assert!(report.success);

    let row = store.swipe(&swipe.id).await.unwrap().unwrap();
    assert!(row.dirty);
    assert!(row.last_synced.is_none());
    assert_eq!(row.created_at, Timestamp::from_millis(1234));
}

#[tokio::test]
async fn at_most_one_match_row_per_pair() {
    // Discovery order one: the local reciprocity check.
    let (engine, store, _remote, _network) = build_engine(false).await;
    engine.set_active_user(UserId::new("uma"));

    let mut prior = SwipeRecord::new(UserId::new("vic"), UserId::new("uma"), true, false);
    prior.dirty = false;
    store.put_swipe(&prior).await.unwrap();
    engine.create_swipe(UserId::new("vic"), true, false).await.unwrap();

    // Discovery order two: the server's match row for the same pair, with the
    // pair reversed, downloaded later.
    let server_row = MatchRecord {
        id: MatchId::from_pair(&UserId::new("x"), &UserId::new("x")),
        user_a: UserId::new("vic"),
        user_b: UserId::new("uma"),
        is_active: true,
        created_at: Timestamp::from_millis(50),
        dirty: false,
        last_synced: None,
    };
    store
        .bulk_put_matches(&[server_row.canonicalized()], Timestamp::now())
        .await
        .unwrap();

    let matches = store.matches_for_user(&UserId::new("uma")).await.unwrap();
    assert_eq!(matches.len(), 1);
    assert!(matches[0].user_a < matches[0].user_b);
    assert_eq!(matches[0].user_a, UserId::new("uma"));
    assert_eq!(matches[0].user_b, UserId::new("vic"));
}

#[tokio::test]
async fn concurrent_triggers_run_exactly_one_pass() {
    let (engine, store, remote, _network) = build_engine(true).await;
    engine.set_active_user(UserId::new("me"));

    let (a, b) = tokio::join!(engine.trigger_sync(), engine.trigger_sync());

    let reports = [a, b];
    let ran = reports.iter().filter(|r| r.is_ok()).count();
    let rejected = reports
        .iter()
        .filter(|r| matches!(**r, Err(EngineError::SyncInProgress)))
        .count();
    assert_eq!(ran, 1, "exactly one pass must execute");
    assert_eq!(rejected, 1, "the loser must be rejected");

    // One pass: profiles, swipes, matches fetched once; messages skipped
    // because no matches exist locally.
    assert_eq!(remote.fetch_calls(), 3);

    // The rejected call advanced nothing: one checkpoint value per table.
    for kind in EntityKind::DOWNLOAD_ORDER {
        assert!(store.checkpoint(kind).await.unwrap().is_some());
    }
}

#[tokio::test]
async fn first_sync_ignores_stale_checkpoint() {
    let (engine, store, remote, _network) = build_engine(true).await;
    engine.set_active_user(UserId::new("me"));

    // A checkpoint far in the future, with an empty profile table: remote
    // profiles older than the checkpoint must still download.
    store
        .advance_checkpoint(EntityKind::Profile, Timestamp::now())
        .await
        .unwrap();
    remote.queue_profiles(vec![profile("ancient", 1), profile("older", 2)]);

    let report = engine.trigger_sync().await.unwrap();

    assert!(report.success);
    assert_eq!(report.total_records, 2);
    assert_eq!(remote.profile_since_log(), vec![None]);
    assert!(store.profile(&UserId::new("ancient")).await.unwrap().is_some());
}

#[tokio::test]
async fn later_syncs_use_the_checkpoint() {
    let (engine, _store, remote, _network) = build_engine(true).await;
    engine.set_active_user(UserId::new("me"));

    remote.queue_profiles(vec![profile("p1", 1)]);
    engine.trigger_sync().await.unwrap();
    engine.trigger_sync().await.unwrap();

    let log = remote.profile_since_log();
    assert_eq!(log.len(), 2);
    assert_eq!(log[0], None, "first sync fetches from the epoch");
    assert!(log[1].is_some(), "second sync fetches since the checkpoint");
}

#[tokio::test]
async fn reconnect_edge_triggers_exactly_one_sync() {
    let (engine, _store, remote, network) = build_engine(false).await;
    engine.set_active_user(UserId::new("me"));
    let _listener = engine.spawn_auto_sync();
    let mut completions = engine.subscribe_completions();

    network.set_online(true);

    let report = timeout(Duration::from_secs(5), completions.recv())
        .await
        .expect("auto-sync did not run")
        .unwrap();
    assert!(report.success);
    let calls_after_edge = remote.fetch_calls();
    assert_eq!(calls_after_edge, 3);

    // online → online is not a transition: no further pass.
    network.set_online(true);
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(remote.fetch_calls(), calls_after_edge);
}

#[tokio::test]
async fn offline_swipe_syncs_after_reconnect() {
    let (engine, store, remote, network) = build_engine(false).await;
    engine.set_active_user(UserId::new("ursula"));
    let _listener = engine.spawn_auto_sync();
    let mut completions = engine.subscribe_completions();

    // Offline: the swipe lands locally, dirty, with no match (no local
    // record of victor liking ursula).
    let id = engine
        .create_swipe(UserId::new("victor"), true, false)
        .await
        .unwrap();
    let stats = engine.offline_stats().await.unwrap();
    assert_eq!(stats.pending_uploads, 1);
    assert_eq!(stats.tables.matches, 0);

    // Connectivity returns: the swipe uploads and becomes clean.
    network.set_online(true);
    timeout(Duration::from_secs(5), completions.recv())
        .await
        .expect("auto-sync did not run")
        .unwrap();

    let row = store.swipe(&id).await.unwrap().unwrap();
    assert!(!row.dirty);
    assert_eq!(remote.upserted_swipes().len(), 1);
}

#[tokio::test]
async fn force_full_sync_refetches_profiles_from_epoch() {
    let (engine, store, remote, _network) = build_engine(true).await;
    engine.set_active_user(UserId::new("me"));

    remote.queue_profiles(vec![profile("p1", 100)]);
    engine.trigger_sync().await.unwrap();
    assert_eq!(store.table_counts().await.unwrap().profiles, 1);

    remote.queue_profiles(vec![profile("p1", 100), profile("p2", 200)]);
    let report = engine.force_full_sync().await.unwrap();

    assert!(report.success);
    // Profiles were cleared, so the fetch went back to the epoch.
    let log = remote.profile_since_log();
    assert_eq!(log.last().copied().unwrap(), None);
    assert_eq!(store.table_counts().await.unwrap().profiles, 2);
}

#[tokio::test]
async fn downloaded_rows_do_not_count_as_pending_uploads() {
    let (engine, _store, remote, _network) = build_engine(true).await;
    engine.set_active_user(UserId::new("me"));

    remote.queue_profiles(vec![profile("p1", 100)]);
    let mut incoming = SwipeRecord::new(UserId::new("anna"), UserId::new("me"), true, false);
    incoming.dirty = false;
    remote.queue_swipes(vec![incoming]);

    engine.trigger_sync().await.unwrap();

    let stats = engine.offline_stats().await.unwrap();
    assert_eq!(stats.tables.profiles, 1);
    assert_eq!(stats.tables.swipes, 1);
    assert_eq!(stats.pending_uploads, 0);
}

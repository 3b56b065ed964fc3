//! SQLite backend for the local store.

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use std::str::FromStr;

use ember_types::{
    Checkpoint, EntityKind, MatchId, MatchRecord, MessageKind, MessageRecord, ProfileRecord,
    RecordId, SwipeRecord, Timestamp, UserId,
};

use crate::{LocalStore, StoreError, StoreResult, TableCounts};

const UPSERT_PROFILE: &str = r#"
INSERT INTO profiles (user_id, display_name, age, gender, bio, photo_url, interested_in, is_complete, updated_at, dirty, last_synced)
VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
ON CONFLICT(user_id) DO UPDATE SET
    display_name = excluded.display_name,
    age = excluded.age,
    gender = excluded.gender,
    bio = excluded.bio,
    photo_url = excluded.photo_url,
    interested_in = excluded.interested_in,
    is_complete = excluded.is_complete,
    updated_at = excluded.updated_at,
    dirty = excluded.dirty,
    last_synced = excluded.last_synced
"#;

const UPSERT_SWIPE: &str = r#"
INSERT INTO swipes (id, swiper_id, swiped_id, is_like, is_super_like, created_at, dirty, last_synced)
VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
ON CONFLICT(id) DO UPDATE SET
    swiper_id = excluded.swiper_id,
    swiped_id = excluded.swiped_id,
    is_like = excluded.is_like,
    is_super_like = excluded.is_super_like,
    created_at = excluded.created_at,
    dirty = excluded.dirty,
    last_synced = excluded.last_synced
"#;

const UPSERT_MATCH: &str = r#"
INSERT INTO matches (id, user_a, user_b, is_active, created_at, dirty, last_synced)
VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
ON CONFLICT(id) DO UPDATE SET
    user_a = excluded.user_a,
    user_b = excluded.user_b,
    is_active = excluded.is_active,
    created_at = excluded.created_at,
    dirty = excluded.dirty,
    last_synced = excluded.last_synced
"#;

const UPSERT_MESSAGE: &str = r#"
INSERT INTO messages (id, match_id, sender_id, content, kind, media_url, is_read, created_at, dirty, last_synced)
VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
ON CONFLICT(id) DO UPDATE SET
    match_id = excluded.match_id,
    sender_id = excluded.sender_id,
    content = excluded.content,
    kind = excluded.kind,
    media_url = excluded.media_url,
    is_read = excluded.is_read,
    created_at = excluded.created_at,
    dirty = excluded.dirty,
    last_synced = excluded.last_synced
"#;

/// SQLite-based local store.
///
/// Uses WAL mode for concurrent reads/writes: the mutation gateway writes
/// single rows from the foreground while the sync orchestrator bulk-writes
/// from the background, both through the same upsert-by-id semantics.
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open (or create) a store at the given database path.
    pub async fn open(path: &Path) -> StoreResult<Self> {
        let options = SqliteConnectOptions::from_str(path.to_str().unwrap_or("ember.db"))
            .map_err(StoreError::Database)?
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
            .busy_timeout(std::time::Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            .max_connections(10)
            .connect_with(options)
            .await
            .map_err(StoreError::Database)?;

        let store = Self { pool };
        store.run_migrations().await?;
        Ok(store)
    }

    /// Create an in-memory store (for testing).
    pub async fn in_memory() -> StoreResult<Self> {
        let options = SqliteConnectOptions::from_str(":memory:")
            .map_err(StoreError::Database)?
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .synchronous(sqlx::sqlite::SqliteSynchronous::Normal);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .map_err(StoreError::Database)?;

        let store = Self { pool };
        store.run_migrations().await?;
        Ok(store)
    }

    /// Run database migrations.
    async fn run_migrations(&self) -> StoreResult<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS profiles (
                user_id TEXT PRIMARY KEY,
                display_name TEXT NOT NULL,
                age INTEGER NOT NULL,
                gender TEXT NOT NULL,
                bio TEXT,
                photo_url TEXT,
                interested_in TEXT NOT NULL,
                is_complete INTEGER NOT NULL,
                updated_at INTEGER NOT NULL,
                dirty INTEGER NOT NULL DEFAULT 0,
                last_synced INTEGER
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS swipes (
                id TEXT PRIMARY KEY,
                swiper_id TEXT NOT NULL,
                swiped_id TEXT NOT NULL,
                is_like INTEGER NOT NULL,
                is_super_like INTEGER NOT NULL,
                created_at INTEGER NOT NULL,
                dirty INTEGER NOT NULL DEFAULT 0,
                last_synced INTEGER
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS matches (
                id TEXT PRIMARY KEY,
                user_a TEXT NOT NULL,
                user_b TEXT NOT NULL,
                is_active INTEGER NOT NULL,
                created_at INTEGER NOT NULL,
                dirty INTEGER NOT NULL DEFAULT 0,
                last_synced INTEGER,
                UNIQUE(user_a, user_b)
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS messages (
                id TEXT PRIMARY KEY,
                match_id TEXT NOT NULL,
                sender_id TEXT NOT NULL,
                content TEXT NOT NULL,
                kind TEXT NOT NULL,
                media_url TEXT,
                is_read INTEGER NOT NULL,
                created_at INTEGER NOT NULL,
                dirty INTEGER NOT NULL DEFAULT 0,
                last_synced INTEGER
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS checkpoints (
                table_name TEXT PRIMARY KEY,
                last_sync_timestamp INTEGER NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_swipes_swiper ON swipes(swiper_id)")
            .execute(&self.pool)
            .await?;
        sqlx::query("CREATE INDEX IF NOT EXISTS idx_swipes_pair ON swipes(swiper_id, swiped_id)")
            .execute(&self.pool)
            .await?;
        sqlx::query("CREATE INDEX IF NOT EXISTS idx_matches_user_a ON matches(user_a)")
            .execute(&self.pool)
            .await?;
        sqlx::query("CREATE INDEX IF NOT EXISTS idx_matches_user_b ON matches(user_b)")
            .execute(&self.pool)
            .await?;
        sqlx::query("CREATE INDEX IF NOT EXISTS idx_messages_match ON messages(match_id)")
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}

#[async_trait]
impl LocalStore for SqliteStore {
    async fn put_profile(&self, profile: &ProfileRecord) -> StoreResult<()> {
        bind_profile(sqlx::query(UPSERT_PROFILE), profile, profile.dirty, profile.last_synced)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn bulk_put_profiles(
        &self,
        rows: &[ProfileRecord],
        synced_at: Timestamp,
    ) -> StoreResult<()> {
        let mut tx = self.pool.begin().await?;
        for row in rows {
            bind_profile(sqlx::query(UPSERT_PROFILE), row, false, Some(synced_at))
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn profile(&self, user_id: &UserId) -> StoreResult<Option<ProfileRecord>> {
        let row = sqlx::query_as::<_, ProfileRow>("SELECT * FROM profiles WHERE user_id = ?1")
            .bind(user_id.as_str())
            .fetch_optional(&self.pool)
            .await?;
        row.map(ProfileRecord::try_from).transpose()
    }

    async fn browsable_profiles(
        &self,
        exclude: &[UserId],
        limit: u32,
    ) -> StoreResult<Vec<ProfileRecord>> {
        let mut sql = String::from("SELECT * FROM profiles WHERE is_complete = 1");
        if !exclude.is_empty() {
            sql.push_str(" AND user_id NOT IN (");
            sql.push_str(&vec!["?"; exclude.len()].join(", "));
            sql.push(')');
        }
        sql.push_str(" ORDER BY updated_at DESC LIMIT ?");

        let mut query = sqlx::query_as::<_, ProfileRow>(&sql);
        for id in exclude {
            query = query.bind(id.as_str());
        }
        let rows = query.bind(i64::from(limit)).fetch_all(&self.pool).await?;
        rows.into_iter().map(ProfileRecord::try_from).collect()
    }

    async fn clear_profiles(&self) -> StoreResult<()> {
        sqlx::query("DELETE FROM profiles").execute(&self.pool).await?;
        Ok(())
    }

    async fn put_swipe(&self, swipe: &SwipeRecord) -> StoreResult<()> {
        bind_swipe(sqlx::query(UPSERT_SWIPE), swipe, swipe.dirty, swipe.last_synced)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn bulk_put_swipes(&self, rows: &[SwipeRecord], synced_at: Timestamp) -> StoreResult<()> {
        let mut tx = self.pool.begin().await?;
        for row in rows {
            bind_swipe(sqlx::query(UPSERT_SWIPE), row, false, Some(synced_at))
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn swipe(&self, id: &RecordId) -> StoreResult<Option<SwipeRecord>> {
        let row = sqlx::query_as::<_, SwipeRow>("SELECT * FROM swipes WHERE id = ?1")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;
        row.map(SwipeRecord::try_from).transpose()
    }

    async fn swipes_by_swiper(&self, swiper: &UserId) -> StoreResult<Vec<SwipeRecord>> {
        let rows = sqlx::query_as::<_, SwipeRow>(
            "SELECT * FROM swipes WHERE swiper_id = ?1 ORDER BY created_at DESC",
        )
        .bind(swiper.as_str())
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(SwipeRecord::try_from).collect()
    }

    async fn reciprocal_like(
        &self,
        swiper: &UserId,
        swiped: &UserId,
    ) -> StoreResult<Option<SwipeRecord>> {
        let row = sqlx::query_as::<_, SwipeRow>(
            "SELECT * FROM swipes WHERE swiper_id = ?1 AND swiped_id = ?2 AND is_like = 1 LIMIT 1",
        )
        .bind(swiper.as_str())
        .bind(swiped.as_str())
        .fetch_optional(&self.pool)
        .await?;
        row.map(SwipeRecord::try_from).transpose()
    }

    async fn dirty_swipes(&self) -> StoreResult<Vec<SwipeRecord>> {
        let rows = sqlx::query_as::<_, SwipeRow>(
            "SELECT * FROM swipes WHERE dirty = 1 ORDER BY created_at ASC",
        )
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(SwipeRecord::try_from).collect()
    }

    async fn clear_swipe_dirty(&self, id: &RecordId, synced_at: Timestamp) -> StoreResult<()> {
        sqlx::query("UPDATE swipes SET dirty = 0, last_synced = ?2 WHERE id = ?1")
            .bind(id.to_string())
            .bind(synced_at.millis())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn delete_swipe(&self, id: &RecordId) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM swipes WHERE id = ?1")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn put_match(&self, record: &MatchRecord) -> StoreResult<()> {
        bind_match(sqlx::query(UPSERT_MATCH), record, record.dirty, record.last_synced)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn bulk_put_matches(
        &self,
        rows: &[MatchRecord],
        synced_at: Timestamp,
    ) -> StoreResult<()> {
        let mut tx = self.pool.begin().await?;
        for row in rows {
            bind_match(sqlx::query(UPSERT_MATCH), row, false, Some(synced_at))
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn matches_for_user(&self, user: &UserId) -> StoreResult<Vec<MatchRecord>> {
        let rows = sqlx::query_as::<_, MatchRow>(
            "SELECT * FROM matches WHERE user_a = ?1 OR user_b = ?1 ORDER BY created_at DESC",
        )
        .bind(user.as_str())
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(MatchRecord::try_from).collect()
    }

    async fn local_match_ids(&self) -> StoreResult<Vec<MatchId>> {
        let ids: Vec<String> = sqlx::query_scalar("SELECT id FROM matches")
            .fetch_all(&self.pool)
            .await?;
        ids.into_iter()
            .map(|id| {
                MatchId::parse(&id).ok_or_else(|| StoreError::CorruptRow {
                    table: "matches",
                    detail: format!("invalid match id: {id}"),
                })
            })
            .collect()
    }

    async fn put_message(&self, message: &MessageRecord) -> StoreResult<()> {
        bind_message(sqlx::query(UPSERT_MESSAGE), message, message.dirty, message.last_synced)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn bulk_put_messages(
        &self,
        rows: &[MessageRecord],
        synced_at: Timestamp,
    ) -> StoreResult<()> {
        let mut tx = self.pool.begin().await?;
        for row in rows {
            bind_message(sqlx::query(UPSERT_MESSAGE), row, false, Some(synced_at))
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn messages_for_match(&self, match_id: &MatchId) -> StoreResult<Vec<MessageRecord>> {
        let rows = sqlx::query_as::<_, MessageRow>(
            "SELECT * FROM messages WHERE match_id = ?1 ORDER BY created_at ASC",
        )
        .bind(match_id.to_string())
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(MessageRecord::try_from).collect()
    }

    async fn mark_messages_read(&self, match_id: &MatchId, sender: &UserId) -> StoreResult<u64> {
        let result = sqlx::query(
            "UPDATE messages SET is_read = 1, dirty = 1 WHERE match_id = ?1 AND sender_id = ?2 AND is_read = 0",
        )
        .bind(match_id.to_string())
        .bind(sender.as_str())
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    async fn dirty_messages(&self) -> StoreResult<Vec<MessageRecord>> {
        let rows = sqlx::query_as::<_, MessageRow>(
            "SELECT * FROM messages WHERE dirty = 1 ORDER BY created_at ASC",
        )
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(MessageRecord::try_from).collect()
    }

    async fn clear_message_dirty(&self, id: &RecordId, synced_at: Timestamp) -> StoreResult<()> {
        sqlx::query("UPDATE messages SET dirty = 0, last_synced = ?2 WHERE id = ?1")
            .bind(id.to_string())
            .bind(synced_at.millis())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn checkpoint(&self, entity: EntityKind) -> StoreResult<Option<Timestamp>> {
        let value: Option<i64> = sqlx::query_scalar(
            "SELECT last_sync_timestamp FROM checkpoints WHERE table_name = ?1",
        )
        .bind(entity.table_name())
        .fetch_optional(&self.pool)
        .await?;
        Ok(value.map(Timestamp::from_millis))
    }

    async fn advance_checkpoint(&self, entity: EntityKind, to: Timestamp) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO checkpoints (table_name, last_sync_timestamp)
            VALUES (?1, ?2)
            ON CONFLICT(table_name) DO UPDATE SET
                last_sync_timestamp = MAX(last_sync_timestamp, excluded.last_sync_timestamp)
            "#,
        )
        .bind(entity.table_name())
        .bind(to.millis())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn clear_checkpoints(&self) -> StoreResult<()> {
        sqlx::query("DELETE FROM checkpoints")
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn checkpoints(&self) -> StoreResult<Vec<Checkpoint>> {
        let rows: Vec<(String, i64)> = sqlx::query_as(
            "SELECT table_name, last_sync_timestamp FROM checkpoints ORDER BY table_name",
        )
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter()
            .map(|(name, ts)| {
                let entity =
                    EntityKind::from_table_name(&name).ok_or_else(|| StoreError::CorruptRow {
                        table: "checkpoints",
                        detail: format!("unknown table: {name}"),
                    })?;
                Ok(Checkpoint {
                    entity,
                    last_sync: Timestamp::from_millis(ts),
                })
            })
            .collect()
    }

    async fn table_is_empty(&self, entity: EntityKind) -> StoreResult<bool> {
        let sql = match entity {
            EntityKind::Profile => "SELECT COUNT(*) FROM profiles",
            EntityKind::Swipe => "SELECT COUNT(*) FROM swipes",
            EntityKind::Match => "SELECT COUNT(*) FROM matches",
            EntityKind::Message => "SELECT COUNT(*) FROM messages",
        };
        let count: i64 = sqlx::query_scalar(sql).fetch_one(&self.pool).await?;
        Ok(count == 0)
    }

    async fn table_counts(&self) -> StoreResult<TableCounts> {
        let profiles: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM profiles")
            .fetch_one(&self.pool)
            .await?;
        let swipes: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM swipes")
            .fetch_one(&self.pool)
            .await?;
        let matches: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM matches")
            .fetch_one(&self.pool)
            .await?;
        let messages: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM messages")
            .fetch_one(&self.pool)
            .await?;
        Ok(TableCounts {
            profiles: profiles as u64,
            swipes: swipes as u64,
            matches: matches as u64,
            messages: messages as u64,
        })
    }

    async fn dirty_count(&self) -> StoreResult<u64> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT (SELECT COUNT(*) FROM swipes WHERE dirty = 1)
                 + (SELECT COUNT(*) FROM messages WHERE dirty = 1)
            "#,
        )
        .fetch_one(&self.pool)
        .await?;
        Ok(count as u64)
    }
}

fn bind_profile<'q>(
    query: sqlx::query::Query<'q, sqlx::Sqlite, sqlx::sqlite::SqliteArguments<'q>>,
    row: &'q ProfileRecord,
    dirty: bool,
    last_synced: Option<Timestamp>,
) -> sqlx::query::Query<'q, sqlx::Sqlite, sqlx::sqlite::SqliteArguments<'q>> {
    query
        .bind(row.user_id.as_str())
        .bind(row.display_name.as_str())
        .bind(i64::from(row.age))
        .bind(row.gender.as_str())
        .bind(row.bio.as_deref())
        .bind(row.photo_url.as_deref())
        .bind(row.interested_in.as_str())
        .bind(row.is_complete)
        .bind(row.updated_at.millis())
        .bind(dirty)
        .bind(last_synced.map(|t| t.millis()))
}

fn bind_swipe<'q>(
    query: sqlx::query::Query<'q, sqlx::Sqlite, sqlx::sqlite::SqliteArguments<'q>>,
    row: &'q SwipeRecord,
    dirty: bool,
    last_synced: Option<Timestamp>,
) -> sqlx::query::Query<'q, sqlx::Sqlite, sqlx::sqlite::SqliteArguments<'q>> {
    query
        .bind(row.id.to_string())
        .bind(row.swiper_id.as_str())
        .bind(row.swiped_id.as_str())
        .bind(row.is_like)
        .bind(row.is_super_like)
        .bind(row.created_at.millis())
        .bind(dirty)
        .bind(last_synced.map(|t| t.millis()))
}

fn bind_match<'q>(
    query: sqlx::query::Query<'q, sqlx::Sqlite, sqlx::sqlite::SqliteArguments<'q>>,
    row: &'q MatchRecord,
    dirty: bool,
    last_synced: Option<Timestamp>,
) -> sqlx::query::Query<'q, sqlx::Sqlite, sqlx::sqlite::SqliteArguments<'q>> {
    query
        .bind(row.id.to_string())
        .bind(row.user_a.as_str())
        .bind(row.user_b.as_str())
        .bind(row.is_active)
        .bind(row.created_at.millis())
        .bind(dirty)
        .bind(last_synced.map(|t| t.millis()))
}

fn bind_message<'q>(
    query: sqlx::query::Query<'q, sqlx::Sqlite, sqlx::sqlite::SqliteArguments<'q>>,
    row: &'q MessageRecord,
    dirty: bool,
    last_synced: Option<Timestamp>,
) -> sqlx::query::Query<'q, sqlx::Sqlite, sqlx::sqlite::SqliteArguments<'q>> {
    query
        .bind(row.id.to_string())
        .bind(row.match_id.to_string())
        .bind(row.sender_id.as_str())
        .bind(row.content.as_str())
        .bind(row.kind.as_str())
        .bind(row.media_url.as_deref())
        .bind(row.is_read)
        .bind(row.created_at.millis())
        .bind(dirty)
        .bind(last_synced.map(|t| t.millis()))
}

/// Internal row type for profile queries.
#[derive(sqlx::FromRow)]
struct ProfileRow {
    user_id: String,
    display_name: String,
    age: i64,
    gender: String,
    bio: Option<String>,
    photo_url: Option<String>,
    interested_in: String,
    is_complete: bool,
    updated_at: i64,
    dirty: bool,
    last_synced: Option<i64>,
}

impl TryFrom<ProfileRow> for ProfileRecord {
    type Error = StoreError;

    fn try_from(row: ProfileRow) -> Result<Self, Self::Error> {
        Ok(ProfileRecord {
            user_id: UserId::new(row.user_id),
            display_name: row.display_name,
            age: row.age as u8,
            gender: row.gender,
            bio: row.bio,
            photo_url: row.photo_url,
            interested_in: row.interested_in,
            is_complete: row.is_complete,
            updated_at: Timestamp::from_millis(row.updated_at),
            dirty: row.dirty,
            last_synced: row.last_synced.map(Timestamp::from_millis),
        })
    }
}

/// Internal row type for swipe queries.
#[derive(sqlx::FromRow)]
struct SwipeRow {
    id: String,
    swiper_id: String,
    swiped_id: String,
    is_like: bool,
    is_super_like: bool,
    created_at: i64,
    dirty: bool,
    last_synced: Option<i64>,
}

impl TryFrom<SwipeRow> for SwipeRecord {
    type Error = StoreError;

    fn try_from(row: SwipeRow) -> Result<Self, Self::Error> {
        Ok(SwipeRecord {
            id: RecordId::parse(&row.id).ok_or_else(|| StoreError::CorruptRow {
                table: "swipes",
                detail: format!("invalid id: {}", row.id),
            })?,
            swiper_id: UserId::new(row.swiper_id),
            swiped_id: UserId::new(row.swiped_id),
            is_like: row.is_like,
            is_super_like: row.is_super_like,
            created_at: Timestamp::from_millis(row.created_at),
            dirty: row.dirty,
            last_synced: row.last_synced.map(Timestamp::from_millis),
        })
    }
}

/// Internal row type for match queries.
#[derive(sqlx::FromRow)]
struct MatchRow {
    id: String,
    user_a: String,
    user_b: String,
    is_active: bool,
    created_at: i64,
    dirty: bool,
    last_synced: Option<i64>,
}

impl TryFrom<MatchRow> for MatchRecord {
    type Error = StoreError;

    fn try_from(row: MatchRow) -> Result<Self, Self::Error> {
        Ok(MatchRecord {
            id: MatchId::parse(&row.id).ok_or_else(|| StoreError::CorruptRow {
                table: "matches",
                detail: format!("invalid id: {}", row.id),
            })?,
            user_a: UserId::new(row.user_a),
            user_b: UserId::new(row.user_b),
            is_active: row.is_active,
            created_at: Timestamp::from_millis(row.created_at),
            dirty: row.dirty,
            last_synced: row.last_synced.map(Timestamp::from_millis),
        })
    }
}

/// Internal row type for message queries.
#[derive(sqlx::FromRow)]
struct MessageRow {
    id: String,
    match_id: String,
    sender_id: String,
    content: String,
    kind: String,
    media_url: Option<String>,
    is_read: bool,
    created_at: i64,
    dirty: bool,
    last_synced: Option<i64>,
}

impl TryFrom<MessageRow> for MessageRecord {
    type Error = StoreError;

    fn try_from(row: MessageRow) -> Result<Self, Self::Error> {
        Ok(MessageRecord {
            id: RecordId::parse(&row.id).ok_or_else(|| StoreError::CorruptRow {
                table: "messages",
                detail: format!("invalid id: {}", row.id),
            })?,
            match_id: MatchId::parse(&row.match_id).ok_or_else(|| StoreError::CorruptRow {
                table: "messages",
                detail: format!("invalid match id: {}", row.match_id),
            })?,
            sender_id: UserId::new(row.sender_id),
            content: row.content,
            kind: row.kind.parse::<MessageKind>().map_err(|e| StoreError::CorruptRow {
                table: "messages",
                detail: e.to_string(),
            })?,
            media_url: row.media_url,
            is_read: row.is_read,
            created_at: Timestamp::from_millis(row.created_at),
            dirty: row.dirty,
            last_synced: row.last_synced.map(Timestamp::from_millis),
        })
    }
}

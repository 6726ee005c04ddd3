// SQLite-backed banned-term store.
//
// Tables:
// - banned_terms: one row per banned term, keyed by guild id
//
// The pool is created lazily by `open()` so the service can retry it, and so
// `close()` is harmless when no connection was ever made.
//
// File databases run in WAL mode and every write takes the write lock up front
// (BEGIN IMMEDIATE), so concurrent writers queue on the busy timeout instead of
// failing a read-to-write lock upgrade with SQLITE_BUSY. An in-memory database
// only exists per connection, so its pool holds a single connection.

use crate::core::moderation::{BannedTerm, ModerationError, TermStore};
use async_trait::async_trait;
use sqlx::query::Query;
use sqlx::sqlite::{SqliteArguments, SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{Pool, Row, Sqlite};
use std::str::FromStr;
use std::time::Duration;
use tokio::sync::OnceCell;

pub struct SqliteTermStore {
    database_url: String,
    timeout: Duration,
    pool: OnceCell<Pool<Sqlite>>,
}

impl SqliteTermStore {
    /// Create an unconnected store. Nothing touches the database until `open()`.
    pub fn new(database_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            database_url: database_url.into(),
            timeout,
            pool: OnceCell::new(),
        }
    }

    fn pool(&self) -> Result<&Pool<Sqlite>, ModerationError> {
        self.pool.get().ok_or_else(|| {
            ModerationError::PersistenceUnavailable("term store is not connected".to_string())
        })
    }

    async fn create_pool(&self) -> Result<Pool<Sqlite>, sqlx::Error> {
        let in_memory = self.database_url.contains(":memory:")
            || self.database_url.contains("mode=memory");

        let mut options = SqliteConnectOptions::from_str(&self.database_url)?
            .create_if_missing(true)
            .busy_timeout(self.timeout);
        let mut pool_options = SqlitePoolOptions::new().acquire_timeout(self.timeout);

        if in_memory {
            pool_options = pool_options.max_connections(1);
        } else {
            options = options.journal_mode(SqliteJournalMode::Wal);
        }

        let pool = pool_options.connect_with(options).await?;

        // Liveness check
        if let Err(e) = sqlx::query("SELECT 1").execute(&pool).await {
            pool.close().await;
            return Err(e);
        }

        if let Err(e) = Self::migrate(&pool).await {
            pool.close().await;
            return Err(e);
        }

        Ok(pool)
    }

    /// Create the terms table if it does not exist yet.
    async fn migrate(pool: &Pool<Sqlite>) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS banned_terms (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                term TEXT NOT NULL,
                guild_id TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_banned_terms_guild
                ON banned_terms(guild_id);
            "#,
        )
        .execute(pool)
        .await?;

        Ok(())
    }

    /// Run one write statement inside a `BEGIN IMMEDIATE` transaction.
    async fn execute_write<'q>(
        &self,
        query: Query<'q, Sqlite, SqliteArguments<'q>>,
    ) -> Result<(), ModerationError> {
        let mut conn = self.pool()?.acquire().await.map_err(operation_failed)?;

        sqlx::query("BEGIN IMMEDIATE")
            .execute(&mut *conn)
            .await
            .map_err(operation_failed)?;

        let result = match query.execute(&mut *conn).await {
            Ok(_) => sqlx::query("COMMIT").execute(&mut *conn).await.map(|_| ()),
            Err(e) => Err(e),
        };

        if let Err(e) = result {
            if let Err(rollback) = sqlx::query("ROLLBACK").execute(&mut *conn).await {
                tracing::warn!("Failed to roll back term store write: {}", rollback);
            }
            return Err(operation_failed(e));
        }

        Ok(())
    }
}

fn operation_failed(e: sqlx::Error) -> ModerationError {
    ModerationError::PersistenceOperationFailed(e.to_string())
}

#[async_trait]
impl TermStore for SqliteTermStore {
    async fn open(&self) -> Result<(), ModerationError> {
        self.pool
            .get_or_try_init(|| self.create_pool())
            .await
            .map_err(|e| ModerationError::PersistenceUnavailable(e.to_string()))?;
        Ok(())
    }

    async fn add_term(&self, term: BannedTerm) -> Result<(), ModerationError> {
        self.execute_write(
            sqlx::query("INSERT INTO banned_terms (term, guild_id) VALUES (?, ?)")
                .bind(term.text)
                .bind(term.community_id),
        )
        .await
    }

    async fn remove_term(&self, text: &str, community_id: &str) -> Result<(), ModerationError> {
        // Delete-one semantics: only the oldest exact match goes
        self.execute_write(
            sqlx::query(
                r#"
                DELETE FROM banned_terms
                WHERE id = (
                    SELECT id FROM banned_terms
                    WHERE term = ? AND guild_id = ?
                    ORDER BY id
                    LIMIT 1
                )
                "#,
            )
            .bind(text)
            .bind(community_id),
        )
        .await
    }

    async fn list_terms(&self, community_id: &str) -> Result<Vec<BannedTerm>, ModerationError> {
        let rows = sqlx::query("SELECT term, guild_id FROM banned_terms WHERE guild_id = ?")
            .bind(community_id)
            .fetch_all(self.pool()?)
            .await
            .map_err(operation_failed)?;

        Ok(rows
            .into_iter()
            .map(|row| BannedTerm {
                text: row.get("term"),
                community_id: row.get("guild_id"),
            })
            .collect())
    }

    async fn close(&self) {
        if let Some(pool) = self.pool.get() {
            pool.close().await;
            tracing::info!("Term store connection closed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::moderation::retry_policy::tests::RecordingSleeper;
    use crate::core::moderation::{ModerationService, RetryPolicy};
    use std::sync::Arc;
    use tempfile::TempDir;

    async fn open_store(dir: &TempDir) -> SqliteTermStore {
        let url = format!("sqlite://{}", dir.path().join("terms.db").display());
        let store = SqliteTermStore::new(url, Duration::from_secs(30));
        store.open().await.unwrap();
        store
    }

    fn term(text: &str, guild: &str) -> BannedTerm {
        BannedTerm::new(text, guild).unwrap()
    }

    #[tokio::test]
    async fn test_add_and_list_by_guild() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir).await;

        store.add_term(term("badword", "1")).await.unwrap();
        store.add_term(term("worse word", "1")).await.unwrap();
        store.add_term(term("badword", "2")).await.unwrap();

        let mut texts: Vec<String> = store
            .list_terms("1")
            .await
            .unwrap()
            .into_iter()
            .map(|t| t.text)
            .collect();
        texts.sort();

        assert_eq!(texts, vec!["badword", "worse word"]);
        assert_eq!(store.list_terms("2").await.unwrap().len(), 1);
        assert!(store.list_terms("3").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_remove_requires_exact_match() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir).await;
        store.add_term(term("Word", "1")).await.unwrap();

        store.remove_term("word", "1").await.unwrap();
        store.remove_term("Word ", "1").await.unwrap();
        store.remove_term("Word", "2").await.unwrap();
        assert_eq!(store.list_terms("1").await.unwrap().len(), 1);

        store.remove_term("Word", "1").await.unwrap();
        assert!(store.list_terms("1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_duplicates_are_kept_and_removed_one_at_a_time() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir).await;
        store.add_term(term("dup", "1")).await.unwrap();
        store.add_term(term("dup", "1")).await.unwrap();

        assert_eq!(store.list_terms("1").await.unwrap().len(), 2);

        store.remove_term("dup", "1").await.unwrap();
        assert_eq!(store.list_terms("1").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_terms_survive_reopen() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir).await;
        store.add_term(term("persisted", "1")).await.unwrap();
        store.close().await;

        let reopened = open_store(&dir).await;
        let terms = reopened.list_terms("1").await.unwrap();
        assert_eq!(terms, vec![term("persisted", "1")]);
    }

    #[tokio::test]
    async fn test_operations_before_open_fail() {
        let store = SqliteTermStore::new("sqlite://unused.db", Duration::from_secs(1));

        let err = store.list_terms("1").await.unwrap_err();
        assert!(matches!(err, ModerationError::PersistenceUnavailable(_)));
    }

    #[tokio::test]
    async fn test_close_is_idempotent_and_safe_before_open() {
        let store = SqliteTermStore::new("sqlite://unused.db", Duration::from_secs(1));
        store.close().await;
        store.close().await;

        let dir = TempDir::new().unwrap();
        let opened = open_store(&dir).await;
        opened.close().await;
        opened.close().await;
    }

    /// Seed terms, then race removals of every seed against fresh adds and
    /// listings. Only the fresh adds should remain.
    async fn run_concurrent_mix(store: Arc<SqliteTermStore>) {
        const SEEDED: usize = 20;
        const ADDED: usize = 30;
        const LISTINGS: usize = 20;

        for i in 0..SEEDED {
            store.add_term(term(&format!("seed-{i}"), "1")).await.unwrap();
        }

        let mut handles = Vec::new();
        for i in 0..ADDED {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                store.add_term(term(&format!("fresh-{i}"), "1")).await
            }));
        }
        for i in 0..SEEDED {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                store.remove_term(&format!("seed-{i}"), "1").await
            }));
        }
        for _ in 0..LISTINGS {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                store.list_terms("1").await.map(|_| ())
            }));
        }

        for handle in handles {
            let result = handle.await.unwrap();
            assert!(result.is_ok(), "concurrent operation failed: {:?}", result);
        }

        let remaining = store.list_terms("1").await.unwrap();
        assert_eq!(remaining.len(), ADDED);
        assert!(remaining.iter().all(|t| t.text.starts_with("fresh-")));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_operations_on_file_database() {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(open_store(&dir).await);

        run_concurrent_mix(store).await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_operations_on_memory_database() {
        let store = SqliteTermStore::new("sqlite::memory:", Duration::from_secs(30));
        store.open().await.unwrap();

        run_concurrent_mix(Arc::new(store)).await;
    }

    #[tokio::test]
    async fn test_unreachable_database_exhausts_retries() {
        let dir = TempDir::new().unwrap();
        // Parent directory does not exist, so the file can never be created
        let url = format!(
            "sqlite://{}",
            dir.path().join("missing").join("terms.db").display()
        );
        let service =
            ModerationService::new(SqliteTermStore::new(url, Duration::from_secs(1)));
        let sleeper = RecordingSleeper::default();

        let err = service
            .connect(&RetryPolicy::default(), &sleeper)
            .await
            .unwrap_err();

        assert!(matches!(err, ModerationError::PersistenceUnavailable(_)));
        assert_eq!(sleeper.sleeps.lock().unwrap().len(), 2);
    }
}

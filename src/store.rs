//! Key/value persistence facade over SQLite.
//!
//! Application state lives in five independent keys, each holding one
//! self-contained JSON document. The facade is deliberately forgiving:
//! reads degrade to a caller-supplied default and writes are best-effort —
//! loss of durability is tolerable for this class of data, corruption of
//! the in-memory state is not.
//!
//! All implementations go through the [`KvStore`] trait so the repository
//! can be exercised against [`MemoryKvStore`] in tests, mirroring how the
//! SQLite-backed store is swapped in at runtime.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use tokio::sync::RwLock;
use tracing::warn;

/// Errors raised by the raw store operations.
///
/// Callers of the [`load`]/[`save`] facade never see these — the facade
/// logs and degrades instead.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Underlying database failure.
    #[error("store access error: {0}")]
    Db(#[from] sqlx::Error),
    /// The store was put into a failing mode (test double only).
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Raw string-keyed JSON document storage.
///
/// One writer per key is the expected access pattern; implementations must
/// still serialize concurrent same-key writes so the last full write wins.
#[async_trait]
pub trait KvStore: Send + Sync {
    /// Read the raw document stored under `key`, if any.
    async fn load_raw(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Write `json` under `key`, replacing any previous document.
    async fn save_raw(&self, key: &str, json: &str) -> Result<(), StoreError>;
}

/// Load and deserialize the document under `key`, or return `default`.
///
/// Never fails the caller: missing keys, database errors, and malformed
/// stored documents all log a warning and fall back to `default`.
pub async fn load<T: DeserializeOwned>(store: &dyn KvStore, key: &str, default: T) -> T {
    match store.load_raw(key).await {
        Ok(Some(raw)) => match serde_json::from_str(&raw) {
            Ok(value) => value,
            Err(e) => {
                warn!(key, error = %e, "stored document is malformed, using default");
                default
            }
        },
        Ok(None) => default,
        Err(e) => {
            warn!(key, error = %e, "store read failed, using default");
            default
        }
    }
}

/// Serialize `value` and write it under `key`, best-effort.
///
/// Failures are logged, never surfaced: the in-memory state remains the
/// source of truth for the rest of the session.
pub async fn save<T: Serialize>(store: &dyn KvStore, key: &str, value: &T) {
    let json = match serde_json::to_string(value) {
        Ok(json) => json,
        Err(e) => {
            warn!(key, error = %e, "failed to serialize state for persistence");
            return;
        }
    };
    if let Err(e) = store.save_raw(key, &json).await {
        warn!(key, error = %e, "store write failed, state not persisted");
    }
}

// ---------------------------------------------------------------------------
// SQLite implementation
// ---------------------------------------------------------------------------

/// SQLite-backed store. Each save is a single upsert statement, so writes
/// serialize per key at the database and last-write-wins holds even if the
/// process ever gains parallel writers.
#[derive(Debug, Clone)]
pub struct SqliteKvStore {
    pool: SqlitePool,
}

impl SqliteKvStore {
    /// Open (creating if missing) the database at `path` and apply the schema.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Db`] if the database cannot be opened or the
    /// schema cannot be applied.
    pub async fn open(path: &Path) -> Result<Self, StoreError> {
        let opts = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new().connect_with(opts).await?;
        Self::with_pool(pool).await
    }

    /// Build a store over an existing pool (used with `:memory:` in tests).
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Db`] if the schema cannot be applied.
    pub async fn with_pool(pool: SqlitePool) -> Result<Self, StoreError> {
        sqlx::raw_sql(include_str!("../migrations/001_schema.sql"))
            .execute(&pool)
            .await?;
        Ok(Self { pool })
    }

    /// The underlying connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl KvStore for SqliteKvStore {
    async fn load_raw(&self, key: &str) -> Result<Option<String>, StoreError> {
        let row: Option<(String,)> = sqlx::query_as("SELECT value FROM app_state WHERE key = ?1")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|(value,)| value))
    }

    async fn save_raw(&self, key: &str, json: &str) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO app_state (key, value, updated_at) \
             VALUES (?1, ?2, datetime('now')) \
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, \
             updated_at = datetime('now')",
        )
        .bind(key)
        .bind(json)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// In-memory implementation (test double)
// ---------------------------------------------------------------------------

/// In-memory store for tests.
///
/// `fail_writes` simulates a durability outage so the best-effort write
/// contract can be exercised.
#[derive(Default)]
pub struct MemoryKvStore {
    entries: Arc<RwLock<HashMap<String, String>>>,
    fail_writes: bool,
}

impl MemoryKvStore {
    /// Create an empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store whose every write fails.
    pub fn failing() -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            fail_writes: true,
        }
    }
}

#[async_trait]
impl KvStore for MemoryKvStore {
    async fn load_raw(&self, key: &str) -> Result<Option<String>, StoreError> {
        let entries = self.entries.read().await;
        Ok(entries.get(key).cloned())
    }

    async fn save_raw(&self, key: &str, json: &str) -> Result<(), StoreError> {
        if self.fail_writes {
            return Err(StoreError::Unavailable("simulated write failure".to_owned()));
        }
        let mut entries = self.entries.write().await;
        entries.insert(key.to_owned(), json.to_owned());
        Ok(())
    }
}

// ABOUTME: Ephemeral state cache binding an authorization request to its callback
// ABOUTME: Set-once entries with expiry, backed by process memory or the shared SQLite database

use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::debug;

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Cache key already exists")]
    AlreadyExists,

    #[error("Cache backend error: {0}")]
    Backend(#[from] sqlx::Error),
}

pub type CacheResult<T> = Result<T, CacheError>;

/// Short-lived key/value store with expiry
///
/// Expired entries behave exactly like absent ones.
#[async_trait]
pub trait StateCache: Send + Sync {
    /// Store `value` under `key` unless a live entry already exists
    async fn add_if_absent(&self, key: &str, value: &str, ttl: Duration) -> CacheResult<()>;

    async fn get(&self, key: &str) -> CacheResult<Option<String>>;

    /// Atomically read and remove an entry, so it can be consumed at most once
    async fn take(&self, key: &str) -> CacheResult<Option<String>>;

    /// Drop expired entries, returning how many were removed
    async fn purge_expired(&self) -> CacheResult<usize>;
}

/// Longest lifetime an in-memory entry can have; larger TTLs are clamped
const MAX_ENTRY_TTL: Duration = Duration::from_secs(365 * 24 * 60 * 60);

struct CacheEntry {
    value: String,
    expires_at: Instant,
}

impl CacheEntry {
    fn is_live(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}

/// In-process cache, only suitable when a single instance serves both legs
#[derive(Default)]
pub struct MemoryStateCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl MemoryStateCache {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StateCache for MemoryStateCache {
    async fn add_if_absent(&self, key: &str, value: &str, ttl: Duration) -> CacheResult<()> {
        let now = Instant::now();
        let mut entries = self.entries.lock().await;

        if entries.get(key).is_some_and(|entry| entry.is_live(now)) {
            return Err(CacheError::AlreadyExists);
        }

        entries.insert(
            key.to_string(),
            CacheEntry {
                value: value.to_string(),
                expires_at: now + ttl.min(MAX_ENTRY_TTL),
            },
        );
        Ok(())
    }

    async fn get(&self, key: &str) -> CacheResult<Option<String>> {
        let now = Instant::now();
        let entries = self.entries.lock().await;

        Ok(entries
            .get(key)
            .filter(|entry| entry.is_live(now))
            .map(|entry| entry.value.clone()))
    }

    async fn take(&self, key: &str) -> CacheResult<Option<String>> {
        let now = Instant::now();
        let mut entries = self.entries.lock().await;

        Ok(entries
            .remove(key)
            .filter(|entry| entry.is_live(now))
            .map(|entry| entry.value))
    }

    async fn purge_expired(&self) -> CacheResult<usize> {
        let now = Instant::now();
        let mut entries = self.entries.lock().await;

        let before = entries.len();
        entries.retain(|_, entry| entry.is_live(now));
        Ok(before - entries.len())
    }
}

/// Cache stored in the `oauth_states` table, shared by every instance using the database
#[derive(Clone)]
pub struct SqliteStateCache {
    pool: SqlitePool,
}

impl SqliteStateCache {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

#[async_trait]
impl StateCache for SqliteStateCache {
    async fn add_if_absent(&self, key: &str, value: &str, ttl: Duration) -> CacheResult<()> {
        let now = now_millis();
        let expires_at = now.saturating_add(i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX));

        // An expired row under the same key may be replaced, a live one may not
        let result = sqlx::query(
            r#"
            INSERT INTO oauth_states (cache_key, value, expires_at)
            VALUES (?, ?, ?)
            ON CONFLICT(cache_key) DO UPDATE SET
                value = excluded.value,
                expires_at = excluded.expires_at
            WHERE oauth_states.expires_at <= ?
            "#,
        )
        .bind(key)
        .bind(value)
        .bind(expires_at)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(CacheError::AlreadyExists);
        }
        Ok(())
    }

    async fn get(&self, key: &str) -> CacheResult<Option<String>> {
        let value = sqlx::query_scalar::<_, String>(
            "SELECT value FROM oauth_states WHERE cache_key = ? AND expires_at > ?",
        )
        .bind(key)
        .bind(now_millis())
        .fetch_optional(&self.pool)
        .await?;

        Ok(value)
    }

    async fn take(&self, key: &str) -> CacheResult<Option<String>> {
        let row = sqlx::query_as::<_, (String, i64)>(
            "DELETE FROM oauth_states WHERE cache_key = ? RETURNING value, expires_at",
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row
            .filter(|(_, expires_at)| *expires_at > now_millis())
            .map(|(value, _)| value))
    }

    async fn purge_expired(&self) -> CacheResult<usize> {
        let result = sqlx::query("DELETE FROM oauth_states WHERE expires_at <= ?")
            .bind(now_millis())
            .execute(&self.pool)
            .await?;

        let removed = result.rows_affected() as usize;
        if removed > 0 {
            debug!(removed, "Purged expired OAuth states");
        }
        Ok(removed)
    }
}

// ABOUTME: Token store for the singleton long-lived refresh token
// ABOUTME: Transactional upsert that never resets created_at and returns the merged row

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use tracing::{debug, error};

use crate::error::{StorageError, StorageResult};

/// Fixed primary key of the one and only token row
pub const GOOGLE_TOKEN_ID: &str = "google-token-id";

/// Refresh token obtained from the provider's offline-access grant
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Token {
    pub id: String,
    pub refresh_token: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Token {
    pub fn has_refresh_token(&self) -> bool {
        !self.refresh_token.is_empty()
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Token")
            .field("id", &self.id)
            .field("refresh_token", &"[REDACTED]")
            .field("created_at", &self.created_at)
            .field("updated_at", &self.updated_at)
            .finish()
    }
}

/// Storage layer for the singleton token
#[derive(Clone)]
pub struct TokenStore {
    pool: SqlitePool,
}

impl TokenStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert the token row, or overwrite `refresh_token` and `updated_at` on the existing one
    ///
    /// The write is issued before the read so the transaction holds SQLite's
    /// write lock from its first statement; concurrent callers wait on the busy
    /// timeout rather than failing a read-to-write lock upgrade.
    pub async fn upsert_refresh_token(&self, refresh_token: &str) -> StorageResult<Token> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            INSERT INTO google_token (id, refresh_token, created_at, updated_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                refresh_token = excluded.refresh_token,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(GOOGLE_TOKEN_ID)
        .bind(refresh_token)
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            error!("Failed to upsert google token: {}", e);
            StorageError::Sqlx(e)
        })?;

        let stored = sqlx::query_as::<_, Token>(
            "SELECT id, refresh_token, created_at, updated_at FROM google_token WHERE id = ?",
        )
        .bind(GOOGLE_TOKEN_ID)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        debug!(
            rows_affected = result.rows_affected(),
            inserted = stored.created_at == stored.updated_at,
            "Upserted google token"
        );
        Ok(stored)
    }

    /// Fetch the token, failing with `NotFound` if no login has completed yet
    pub async fn get(&self) -> StorageResult<Token> {
        sqlx::query_as::<_, Token>(
            "SELECT id, refresh_token, created_at, updated_at FROM google_token WHERE id = ?",
        )
        .bind(GOOGLE_TOKEN_ID)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StorageError::NotFound("google token"))
    }
}

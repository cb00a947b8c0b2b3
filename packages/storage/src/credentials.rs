// ABOUTME: Credential store for the single administrator-supplied OAuth client pair
// ABOUTME: Whole-row replace of the fixed app-config row inside a transaction

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use tracing::{debug, error};

use crate::error::{StorageError, StorageResult};

/// Fixed primary key of the one and only credential row
pub const APP_CONFIG_ID: &str = "app-config-id";

/// OAuth client credential used to talk to the identity provider
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Credential {
    pub id: String,
    pub client_id: String,
    pub client_secret: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// The client secret must never reach a log line
impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("id", &self.id)
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("created_at", &self.created_at)
            .field("updated_at", &self.updated_at)
            .finish()
    }
}

/// Storage layer for the singleton credential
#[derive(Clone)]
pub struct CredentialStore {
    pool: SqlitePool,
}

impl CredentialStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Replace the stored credential, keeping the original `created_at`
    ///
    /// Both values must be non-empty. Returns the row as stored.
    pub async fn put(&self, client_id: &str, client_secret: &str) -> StorageResult<Credential> {
        if client_id.trim().is_empty() {
            return Err(StorageError::Validation("clientId is required".to_string()));
        }
        if client_secret.trim().is_empty() {
            return Err(StorageError::Validation(
                "clientSecret is required".to_string(),
            ));
        }

        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO app_config (id, client_id, client_secret, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                client_id = excluded.client_id,
                client_secret = excluded.client_secret,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(APP_CONFIG_ID)
        .bind(client_id)
        .bind(client_secret)
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            error!("Failed to store app config: {}", e);
            StorageError::Sqlx(e)
        })?;

        let credential = sqlx::query_as::<_, Credential>(
            "SELECT id, client_id, client_secret, created_at, updated_at FROM app_config WHERE id = ?",
        )
        .bind(APP_CONFIG_ID)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        debug!(updated_at = %credential.updated_at, "Stored app config");
        Ok(credential)
    }

    /// Fetch the credential, failing with `NotFound` if it was never configured
    pub async fn get(&self) -> StorageResult<Credential> {
        self.get_optional()
            .await?
            .ok_or(StorageError::NotFound("app config"))
    }

    pub async fn get_optional(&self) -> StorageResult<Option<Credential>> {
        let credential = sqlx::query_as::<_, Credential>(
            "SELECT id, client_id, client_secret, created_at, updated_at FROM app_config WHERE id = ?",
        )
        .bind(APP_CONFIG_ID)
        .fetch_optional(&self.pool)
        .await?;

        Ok(credential)
    }
}

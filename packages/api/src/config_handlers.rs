// ABOUTME: HTTP request handlers for the admin client-credential configuration
// ABOUTME: Stores the OAuth client id and secret and exposes a masked read view

use axum::{
    extract::{rejection::JsonRejection, State},
    response::Response,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::response::{json_ok, ApiError, ApiResult};
use crate::state::AppState;
use tokenvault_storage::Credential;

/// Request body for storing client credentials
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigRequest {
    pub client_id: String,
    pub client_secret: String,
}

/// Credential view with the secret withheld
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MaskedCredential {
    pub id: String,
    pub client_id: String,
    pub has_client_secret: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Credential> for MaskedCredential {
    fn from(credential: Credential) -> Self {
        Self {
            has_client_secret: !credential.client_secret.is_empty(),
            id: credential.id,
            client_id: credential.client_id,
            created_at: credential.created_at,
            updated_at: credential.updated_at,
        }
    }
}

/// Store (or replace) the OAuth client credentials
pub async fn put_config(
    State(state): State<AppState>,
    payload: Result<Json<ConfigRequest>, JsonRejection>,
) -> ApiResult<Response> {
    let Json(request) = payload.map_err(|rejection| {
        warn!(status = %rejection.status(), "Rejected config request body");
        ApiError::InvalidInput("body must be JSON with clientId and clientSecret".to_string())
    })?;

    let credential = state
        .credentials
        .put(&request.client_id, &request.client_secret)
        .await?;

    info!(client_id = %credential.client_id, "Stored OAuth client credentials");
    Ok(json_ok(credential))
}

/// Get the stored client credentials with the secret masked
pub async fn get_config(State(state): State<AppState>) -> ApiResult<Response> {
    let credential = state
        .credentials
        .get_optional()
        .await?
        .ok_or(ApiError::NotFound)?;

    let masked: MaskedCredential = credential.into();
    Ok(json_ok(masked))
}

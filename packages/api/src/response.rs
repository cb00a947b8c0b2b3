// ABOUTME: Error type and JSON error envelope returned by every API handler
// ABOUTME: Maps storage and auth failures to HTTP status codes and client-safe messages

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokenvault_auth::AuthError;
use tokenvault_storage::StorageError;
use tracing::{error, info};

pub type ApiResult<T> = Result<T, ApiError>;

pub const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";

/// Error type returned by all handlers
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Invalid request: {0}")]
    InvalidInput(String),

    #[error("Resource not found")]
    NotFound,

    #[error("Method not allowed")]
    MethodNotAllowed,

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Error body sent for every non-2xx response
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorResponse {
    pub status: u16,
    pub messages: Vec<String>,
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::Auth(auth) => match auth {
                AuthError::InvalidInput(_) | AuthError::MissingAuthorizationCode => {
                    StatusCode::BAD_REQUEST
                }
                AuthError::Unauthorized => StatusCode::UNAUTHORIZED,
                AuthError::Storage(storage) => storage_status(storage),
                AuthError::ConfigurationMissing
                | AuthError::TokenExchange(_)
                | AuthError::StateCollision
                | AuthError::Configuration(_)
                | AuthError::Cache(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::Storage(storage) => storage_status(storage),
        }
    }

    /// Client-facing messages; never carries secrets or provider responses
    pub fn messages(&self) -> Vec<String> {
        match self {
            ApiError::InvalidInput(msg) => vec!["invalid request".to_string(), msg.clone()],
            ApiError::NotFound => vec!["not found".to_string()],
            ApiError::MethodNotAllowed => vec!["method not allowed".to_string()],
            ApiError::Auth(auth) => match auth {
                AuthError::InvalidInput(msg) => {
                    vec!["invalid request".to_string(), msg.clone()]
                }
                AuthError::ConfigurationMissing => vec!["config get error".to_string()],
                AuthError::Unauthorized => vec!["unauthorized".to_string()],
                AuthError::MissingAuthorizationCode => {
                    vec!["missing authorization code".to_string()]
                }
                AuthError::TokenExchange(_) => vec!["token exchange error".to_string()],
                AuthError::StateCollision | AuthError::Cache(_) => {
                    vec!["state cache error".to_string()]
                }
                AuthError::Configuration(_) => vec!["configuration error".to_string()],
                AuthError::Storage(storage) => storage_messages(storage),
            },
            ApiError::Storage(storage) => storage_messages(storage),
        }
    }
}

fn storage_status(err: &StorageError) -> StatusCode {
    match err {
        StorageError::Validation(_) => StatusCode::BAD_REQUEST,
        StorageError::NotFound(_) => StatusCode::NOT_FOUND,
        StorageError::Sqlx(_) | StorageError::Migration(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn storage_messages(err: &StorageError) -> Vec<String> {
    match err {
        StorageError::Validation(msg) => vec!["invalid request".to_string(), msg.clone()],
        StorageError::NotFound(_) => vec!["not found".to_string()],
        StorageError::Sqlx(_) | StorageError::Migration(_) => vec!["storage error".to_string()],
    }
}

/// Serialize a successful payload with the API's JSON content type
pub fn json_ok<T: Serialize>(value: T) -> Response {
    with_json_content_type((StatusCode::OK, Json(value)).into_response())
}

fn with_json_content_type(mut response: Response) -> Response {
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static(JSON_CONTENT_TYPE),
    );
    response
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // Error Display strings are built from our own messages, never from secrets
        if status.is_server_error() {
            error!(status = status.as_u16(), error = %self, "API request failed");
        } else {
            info!(status = status.as_u16(), error = %self, "API error response");
        }

        let body = ErrorResponse {
            status: status.as_u16(),
            messages: self.messages(),
        };

        with_json_content_type((status, Json(body)).into_response())
    }
}

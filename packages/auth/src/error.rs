// ABOUTME: Error types for the OAuth authorization flow
// ABOUTME: One variant per failure class the HTTP boundary must distinguish

use thiserror::Error;
use tokenvault_storage::StorageError;

use crate::oauth::cache::CacheError;

pub type AuthResult<T> = Result<T, AuthError>;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("OAuth client credentials have not been configured")]
    ConfigurationMissing,

    #[error("State mismatch: CSRF protection failed")]
    Unauthorized,

    #[error("Provider returned no authorization code")]
    MissingAuthorizationCode,

    #[error("Token exchange failed: {0}")]
    TokenExchange(String),

    #[error("Generated state is already pending")]
    StateCollision,

    #[error("Invalid configuration: {0}")]
    Configuration(String),

    #[error("State cache error: {0}")]
    Cache(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

impl From<CacheError> for AuthError {
    fn from(err: CacheError) -> Self {
        match err {
            CacheError::AlreadyExists => AuthError::StateCollision,
            CacheError::Backend(e) => AuthError::Cache(e.to_string()),
        }
    }
}

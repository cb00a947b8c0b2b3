// ABOUTME: Data layer for Tokenvault providing SQLite persistence
// ABOUTME: Owns the singleton credential and refresh-token rows plus schema migrations

pub mod credentials;
pub mod db;
pub mod error;
pub mod tokens;

pub use credentials::{Credential, CredentialStore, APP_CONFIG_ID};
pub use db::{connect, run_migrations, DatabaseOptions};
pub use error::{StorageError, StorageResult};
pub use tokens::{Token, TokenStore, GOOGLE_TOKEN_ID};

// ABOUTME: OAuth module providing the two-leg authorization-code flow
// ABOUTME: Includes provider settings, state cache backends, token exchange, and the coordinator

pub mod cache;
pub mod coordinator;
pub mod exchange;
pub mod provider;
pub mod state;
pub mod types;

pub use cache::{CacheError, MemoryStateCache, SqliteStateCache, StateCache};
pub use coordinator::AuthorizationCoordinator;
pub use exchange::TokenExchangeClient;
pub use provider::OAuthSettings;
pub use types::{LoginRedirect, TokenResponse};

// ABOUTME: Tokenvault authentication library providing the OAuth2 offline-access flow
// ABOUTME: Binds login and callback legs with a cached CSRF state and persists the refresh token

pub mod error;
pub mod oauth;

// Re-export main types
pub use error::{AuthError, AuthResult};
pub use oauth::{
    AuthorizationCoordinator, CacheError, LoginRedirect, MemoryStateCache, OAuthSettings,
    SqliteStateCache, StateCache, TokenExchangeClient, TokenResponse,
};

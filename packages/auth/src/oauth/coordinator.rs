// ABOUTME: Authorization coordinator orchestrating the two-leg offline-access flow
// ABOUTME: Issues the provider URL with a cached state, then validates it and stores the refresh token

use std::sync::Arc;

use tracing::{debug, error, info, warn};
use url::Url;

use tokenvault_storage::{Credential, CredentialStore, Token, TokenStore};

use crate::{
    error::{AuthError, AuthResult},
    oauth::{
        cache::StateCache,
        exchange::TokenExchangeClient,
        provider::OAuthSettings,
        state::{generate_state, state_cache_key},
        types::LoginRedirect,
    },
};

/// Coordinates login and callback requests for the single configured provider
///
/// Holds no per-attempt state of its own: the two legs are correlated only
/// through the state cache, so they may be served by different instances.
pub struct AuthorizationCoordinator {
    credentials: CredentialStore,
    tokens: TokenStore,
    cache: Arc<dyn StateCache>,
    exchange: TokenExchangeClient,
    settings: OAuthSettings,
}

impl AuthorizationCoordinator {
    pub fn new(
        credentials: CredentialStore,
        tokens: TokenStore,
        cache: Arc<dyn StateCache>,
        settings: OAuthSettings,
    ) -> AuthResult<Self> {
        let exchange = TokenExchangeClient::new(&settings.token_url, settings.exchange_timeout)?;

        Ok(Self {
            credentials,
            tokens,
            cache,
            exchange,
            settings,
        })
    }

    pub fn settings(&self) -> &OAuthSettings {
        &self.settings
    }

    /// Start a login attempt for a request that arrived on `request_host`
    ///
    /// This will:
    /// 1. Load the configured client credential
    /// 2. Generate a CSRF state parameter
    /// 3. Build the provider authorization URL
    /// 4. Record the state in the cache with a short TTL
    pub async fn begin_login(&self, request_host: &str) -> AuthResult<LoginRedirect> {
        let request_host = validate_host(request_host)?;
        let credential = self.load_credential().await?;

        let state = generate_state();
        let redirect_uri = self.settings.redirect_uri(request_host);
        let url = self.build_auth_url(&credential, &redirect_uri, &state)?;

        self.cache
            .add_if_absent(&state_cache_key(&state), &state, self.settings.state_ttl)
            .await?;

        info!(redirect_uri = %redirect_uri, "Starting OAuth login");
        Ok(LoginRedirect { url, state })
    }

    /// Complete a login attempt from the provider's redirect
    ///
    /// The cached state is consumed before anything else, so a given state
    /// validates at most once regardless of how the rest of the callback ends.
    pub async fn handle_callback(
        &self,
        state: &str,
        code: &str,
        request_host: &str,
    ) -> AuthResult<Token> {
        let cached = self.cache.take(&state_cache_key(state)).await?;

        match cached {
            None => {
                warn!("OAuth callback with unknown or expired state");
                return Err(AuthError::Unauthorized);
            }
            Some(value) if value.as_bytes() != state.as_bytes() => {
                warn!("State doesn't match cached value");
                return Err(AuthError::Unauthorized);
            }
            Some(_) => debug!("State validated"),
        }

        if code.is_empty() {
            error!("Authorization code not found in callback");
            return Err(AuthError::MissingAuthorizationCode);
        }

        let request_host = validate_host(request_host)?;
        let credential = self.load_credential().await?;
        let redirect_uri = self.settings.redirect_uri(request_host);

        let response = self
            .exchange
            .exchange_code(&credential, code, &redirect_uri)
            .await?;

        let refresh_token = match response.refresh_token {
            Some(token) if !token.is_empty() => token,
            _ => {
                warn!("Provider granted no refresh token; storing an empty value");
                String::new()
            }
        };

        let stored = self.tokens.upsert_refresh_token(&refresh_token).await?;

        info!(updated_at = %stored.updated_at, "Stored refresh token");
        Ok(stored)
    }

    async fn load_credential(&self) -> AuthResult<Credential> {
        match self.credentials.get().await {
            Ok(credential) => Ok(credential),
            Err(e) if e.is_not_found() => {
                error!("OAuth client credential has not been configured");
                Err(AuthError::ConfigurationMissing)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Build authorization URL with offline access and state parameter
    fn build_auth_url(
        &self,
        credential: &Credential,
        redirect_uri: &str,
        state: &str,
    ) -> AuthResult<String> {
        let mut url = Url::parse(&self.settings.auth_url)
            .map_err(|e| AuthError::Configuration(format!("Invalid auth URL: {}", e)))?;

        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("client_id", &credential.client_id)
                .append_pair("redirect_uri", redirect_uri)
                .append_pair("response_type", "code")
                .append_pair("scope", &self.settings.scopes.join(" "))
                .append_pair("access_type", "offline")
                .append_pair("state", state);

            if self.settings.force_consent {
                query.append_pair("prompt", "consent");
            }
        }

        Ok(url.to_string())
    }
}

fn validate_host(host: &str) -> AuthResult<&str> {
    let host = host.trim();
    if host.is_empty() || host.contains(&['/', '?', '#', '@', ' '][..]) {
        return Err(AuthError::InvalidInput(format!(
            "Invalid request host: {:?}",
            host
        )));
    }
    Ok(host)
}

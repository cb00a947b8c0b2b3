// ABOUTME: HTTP client for the provider's token endpoint
// ABOUTME: Exchanges an authorization code for tokens with a bounded timeout and no retries

use std::time::Duration;

use reqwest::Client;
use tracing::{debug, error};

use tokenvault_storage::Credential;

use crate::{
    error::{AuthError, AuthResult},
    oauth::types::{TokenExchangeRequest, TokenResponse},
};

pub struct TokenExchangeClient {
    client: Client,
    token_url: String,
}

impl TokenExchangeClient {
    pub fn new(token_url: impl Into<String>, timeout: Duration) -> AuthResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AuthError::Configuration(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            token_url: token_url.into(),
        })
    }

    /// Exchange authorization code for tokens
    pub async fn exchange_code(
        &self,
        credential: &Credential,
        code: &str,
        redirect_uri: &str,
    ) -> AuthResult<TokenResponse> {
        let request = TokenExchangeRequest {
            grant_type: "authorization_code",
            code,
            redirect_uri,
            client_id: &credential.client_id,
            client_secret: &credential.client_secret,
        };

        debug!(token_url = %self.token_url, "Exchanging authorization code");

        let response = self
            .client
            .post(&self.token_url)
            .form(&request)
            .send()
            .await
            .map_err(|e| AuthError::TokenExchange(format!("Failed to exchange code: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            // Don't leak full response body - only log status for security
            error!("Token exchange failed with status {}", status);
            return Err(AuthError::TokenExchange(format!(
                "Token exchange failed with status {}",
                status
            )));
        }

        let token_response: TokenResponse = response.json().await.map_err(|e| {
            AuthError::TokenExchange(format!("Failed to parse token response: {}", e))
        })?;

        Ok(token_response)
    }
}

// ABOUTME: Identity provider settings for the offline-access flow
// ABOUTME: Google endpoints and Drive scopes by default, with redirect URI derivation

use std::time::Duration;

/// Google's OAuth 2.0 authorization endpoint
pub const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/auth";

/// Google's OAuth 2.0 token endpoint
pub const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

/// Full Drive access
pub const DRIVE_SCOPE: &str = "https://www.googleapis.com/auth/drive";

/// Per-file Drive access for files created or opened by the app
pub const DRIVE_FILE_SCOPE: &str = "https://www.googleapis.com/auth/drive.file";

/// Path the provider redirects back to after consent
pub const CALLBACK_PATH: &str = "/oauth2callback";

/// How long a pending state nonce stays valid
pub const DEFAULT_STATE_TTL: Duration = Duration::from_secs(3 * 60);

pub const DEFAULT_EXCHANGE_TIMEOUT: Duration = Duration::from_secs(30);

/// Settings for the single identity provider this service talks to
#[derive(Debug, Clone)]
pub struct OAuthSettings {
    pub auth_url: String,
    pub token_url: String,
    pub scopes: Vec<String>,
    pub callback_path: String,
    /// Local development serves plain http, so redirect URIs use that scheme
    pub dev_mode: bool,
    pub state_ttl: Duration,
    /// Adds `prompt=consent` so the provider re-issues a refresh token on repeat logins
    pub force_consent: bool,
    pub exchange_timeout: Duration,
}

impl Default for OAuthSettings {
    fn default() -> Self {
        Self {
            auth_url: GOOGLE_AUTH_URL.to_string(),
            token_url: GOOGLE_TOKEN_URL.to_string(),
            scopes: vec![DRIVE_SCOPE.to_string(), DRIVE_FILE_SCOPE.to_string()],
            callback_path: CALLBACK_PATH.to_string(),
            dev_mode: false,
            state_ttl: DEFAULT_STATE_TTL,
            force_consent: true,
            exchange_timeout: DEFAULT_EXCHANGE_TIMEOUT,
        }
    }
}

impl OAuthSettings {
    pub fn scheme(&self) -> &'static str {
        if self.dev_mode {
            "http"
        } else {
            "https"
        }
    }

    /// Redirect URI for a request that arrived on `host`
    ///
    /// Must be identical between the login and callback legs, so it is derived
    /// only from settings and the request host.
    pub fn redirect_uri(&self, host: &str) -> String {
        format!("{}://{}{}", self.scheme(), host, self.callback_path)
    }
}

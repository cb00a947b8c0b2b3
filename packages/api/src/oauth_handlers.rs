// ABOUTME: HTTP request handlers for the offline-access login flow
// ABOUTME: Redirects to the provider and completes the callback by storing the refresh token

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    http::{header, HeaderMap, StatusCode, Uri},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use tracing::{info, warn};

use crate::response::{json_ok, ApiError, ApiResult};
use crate::state::AppState;

/// Query parameters the provider sends back to the callback
#[derive(Debug, Default, Deserialize)]
pub struct CallbackParams {
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub code: String,
    pub error: Option<String>,
}

/// Begin the login flow with a 302 to the provider's consent screen
pub async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
    uri: Uri,
) -> ApiResult<Response> {
    let host = request_host(&headers, &uri)?;
    let redirect = state.coordinator.begin_login(&host).await?;

    Ok((StatusCode::FOUND, [(header::LOCATION, redirect.url)]).into_response())
}

/// Complete the login flow from the provider's redirect
pub async fn oauth2_callback(
    State(state): State<AppState>,
    headers: HeaderMap,
    uri: Uri,
    params: Result<Query<CallbackParams>, QueryRejection>,
) -> ApiResult<Response> {
    let Query(params) = params.map_err(|rejection| {
        warn!(status = %rejection.status(), "Rejected callback query string");
        ApiError::InvalidInput("malformed callback query".to_string())
    })?;

    if let Some(provider_error) = params.error.as_deref() {
        warn!(error = %provider_error, "Provider reported an authorization error");
    }

    let host = request_host(&headers, &uri)?;
    let token = state
        .coordinator
        .handle_callback(&params.state, &params.code, &host)
        .await?;

    info!(updated_at = %token.updated_at, "OAuth callback completed");
    Ok(json_ok(token))
}

/// Host the client addressed, from the Host header or an absolute request URI
fn request_host(headers: &HeaderMap, uri: &Uri) -> ApiResult<String> {
    if let Some(value) = headers.get(header::HOST) {
        return value
            .to_str()
            .map(|host| host.trim().to_string())
            .map_err(|_| ApiError::InvalidInput("Host header is not valid text".to_string()));
    }

    uri.authority()
        .map(|authority| authority.as_str().to_string())
        .ok_or_else(|| ApiError::InvalidInput("missing Host header".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_request_host_prefers_header() {
        let mut headers = HeaderMap::new();
        headers.insert(header::HOST, HeaderValue::from_static("vault.example.com"));
        let uri: Uri = "http://other.example.com/api/1/login".parse().unwrap();

        assert_eq!(request_host(&headers, &uri).unwrap(), "vault.example.com");
    }

    #[test]
    fn test_request_host_falls_back_to_authority() {
        let uri: Uri = "http://localhost:8080/api/1/login".parse().unwrap();
        assert_eq!(
            request_host(&HeaderMap::new(), &uri).unwrap(),
            "localhost:8080"
        );
    }

    #[test]
    fn test_request_host_missing() {
        let uri: Uri = "/api/1/login".parse().unwrap();
        let err = request_host(&HeaderMap::new(), &uri).unwrap_err();
        assert!(matches!(err, ApiError::InvalidInput(_)));
    }
}

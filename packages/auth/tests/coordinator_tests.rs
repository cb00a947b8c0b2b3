// ABOUTME: Integration tests for the authorization coordinator
// ABOUTME: Drives both legs against a temp SQLite database and a mocked token endpoint

use std::sync::Arc;
use std::time::Duration;

use pretty_assertions::assert_eq;
use sqlx::SqlitePool;
use tempfile::TempDir;
use url::Url;
use wiremock::{
    matchers::{body_string_contains, method, path},
    Mock, MockServer, ResponseTemplate,
};

use tokenvault_auth::oauth::state::state_cache_key;
use tokenvault_auth::{
    AuthError, AuthorizationCoordinator, MemoryStateCache, OAuthSettings, SqliteStateCache,
    StateCache,
};
use tokenvault_storage::{connect, CredentialStore, DatabaseOptions, TokenStore};

struct TestContext {
    coordinator: AuthorizationCoordinator,
    cache: Arc<dyn StateCache>,
    pool: SqlitePool,
    server: MockServer,
    _temp_dir: TempDir,
}

async fn setup(state_ttl: Duration) -> TestContext {
    let temp_dir = TempDir::new().unwrap();
    let database_url = format!("sqlite://{}", temp_dir.path().join("test.db").display());
    let pool = connect(&database_url, &DatabaseOptions::default())
        .await
        .unwrap();

    let server = MockServer::start().await;
    let settings = OAuthSettings {
        token_url: format!("{}/token", server.uri()),
        state_ttl,
        ..OAuthSettings::default()
    };

    let cache: Arc<dyn StateCache> = Arc::new(SqliteStateCache::new(pool.clone()));
    let coordinator = AuthorizationCoordinator::new(
        CredentialStore::new(pool.clone()),
        TokenStore::new(pool.clone()),
        cache.clone(),
        settings,
    )
    .unwrap();

    TestContext {
        coordinator,
        cache,
        pool,
        server,
        _temp_dir: temp_dir,
    }
}

async fn setup_configured() -> TestContext {
    let ctx = setup(Duration::from_secs(180)).await;
    CredentialStore::new(ctx.pool.clone())
        .put("cid1", "sec1")
        .await
        .unwrap();
    ctx
}

async fn mock_token_endpoint(server: &MockServer, body: serde_json::Value) {
    Mock::given(method("POST"))
        .and(path("/token"))
        .and(body_string_contains("grant_type=authorization_code"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

fn query_param(url: &Url, name: &str) -> Option<String> {
    url.query_pairs()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.into_owned())
}

#[tokio::test]
async fn test_begin_login_builds_provider_url() {
    let ctx = setup_configured().await;

    let redirect = ctx.coordinator.begin_login("example.com").await.unwrap();
    let url = Url::parse(&redirect.url).unwrap();

    assert_eq!(url.host_str(), Some("accounts.google.com"));
    assert_eq!(query_param(&url, "client_id").as_deref(), Some("cid1"));
    assert_eq!(
        query_param(&url, "redirect_uri").as_deref(),
        Some("https://example.com/oauth2callback")
    );
    assert_eq!(query_param(&url, "access_type").as_deref(), Some("offline"));
    assert_eq!(query_param(&url, "response_type").as_deref(), Some("code"));
    assert_eq!(
        query_param(&url, "scope").as_deref(),
        Some("https://www.googleapis.com/auth/drive https://www.googleapis.com/auth/drive.file")
    );
    assert_eq!(query_param(&url, "state"), Some(redirect.state.clone()));

    let cached = ctx
        .cache
        .get(&state_cache_key(&redirect.state))
        .await
        .unwrap();
    assert_eq!(cached, Some(redirect.state));
}

#[tokio::test]
async fn test_begin_login_issues_distinct_states() {
    let ctx = setup_configured().await;

    let first = ctx.coordinator.begin_login("example.com").await.unwrap();
    let second = ctx.coordinator.begin_login("example.com").await.unwrap();
    assert_ne!(first.state, second.state);
}

#[tokio::test]
async fn test_begin_login_without_credential() {
    let ctx = setup(Duration::from_secs(180)).await;

    let err = ctx.coordinator.begin_login("example.com").await.unwrap_err();
    assert!(matches!(err, AuthError::ConfigurationMissing));
}

#[tokio::test]
async fn test_begin_login_rejects_bad_host() {
    let ctx = setup_configured().await;

    let err = ctx.coordinator.begin_login("").await.unwrap_err();
    assert!(matches!(err, AuthError::InvalidInput(_)));
}

#[tokio::test]
async fn test_callback_stores_refresh_token() {
    let ctx = setup_configured().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .and(body_string_contains("code=abc"))
        .and(body_string_contains("client_id=cid1"))
        .and(body_string_contains("client_secret=sec1"))
        .and(body_string_contains(
            "redirect_uri=https%3A%2F%2Fexample.com%2Foauth2callback",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": "ya29.access",
            "refresh_token": "1//refresh",
            "expires_in": 3599,
            "token_type": "Bearer"
        })))
        .expect(1)
        .mount(&ctx.server)
        .await;

    let redirect = ctx.coordinator.begin_login("example.com").await.unwrap();
    let token = ctx
        .coordinator
        .handle_callback(&redirect.state, "abc", "example.com")
        .await
        .unwrap();

    assert_eq!(token.id, "google-token-id");
    assert_eq!(token.refresh_token, "1//refresh");

    let stored = TokenStore::new(ctx.pool.clone()).get().await.unwrap();
    assert_eq!(stored, token);
}

#[tokio::test]
async fn test_state_is_accepted_once() {
    let ctx = setup_configured().await;
    mock_token_endpoint(
        &ctx.server,
        serde_json::json!({"access_token": "a", "refresh_token": "1//r"}),
    )
    .await;

    let redirect = ctx.coordinator.begin_login("example.com").await.unwrap();
    ctx.coordinator
        .handle_callback(&redirect.state, "abc", "example.com")
        .await
        .unwrap();

    let err = ctx
        .coordinator
        .handle_callback(&redirect.state, "abc", "example.com")
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::Unauthorized));
}

#[tokio::test]
async fn test_unknown_state_is_unauthorized() {
    let ctx = setup_configured().await;

    let err = ctx
        .coordinator
        .handle_callback("st-never-issued", "abc", "example.com")
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::Unauthorized));
}

#[tokio::test]
async fn test_cached_state_mismatch_is_unauthorized() {
    let ctx = setup_configured().await;

    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": "at",
            "refresh_token": "rt"
        })))
        .expect(0)
        .mount(&ctx.server)
        .await;

    ctx.cache
        .add_if_absent(&state_cache_key("stX"), "stY", Duration::from_secs(60))
        .await
        .unwrap();

    let err = ctx
        .coordinator
        .handle_callback("stX", "abc", "example.com")
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::Unauthorized));
    assert!(TokenStore::new(ctx.pool.clone()).get().await.is_err());
}

#[tokio::test]
async fn test_expired_state_is_unauthorized() {
    let ctx = setup(Duration::from_millis(50)).await;
    CredentialStore::new(ctx.pool.clone())
        .put("cid1", "sec1")
        .await
        .unwrap();

    let redirect = ctx.coordinator.begin_login("example.com").await.unwrap();
    tokio::time::sleep(Duration::from_millis(120)).await;

    let err = ctx
        .coordinator
        .handle_callback(&redirect.state, "abc", "example.com")
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::Unauthorized));
}

#[tokio::test]
async fn test_missing_code_consumes_state() {
    let ctx = setup_configured().await;

    let redirect = ctx.coordinator.begin_login("example.com").await.unwrap();
    let err = ctx
        .coordinator
        .handle_callback(&redirect.state, "", "example.com")
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::MissingAuthorizationCode));

    let err = ctx
        .coordinator
        .handle_callback(&redirect.state, "abc", "example.com")
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::Unauthorized));
}

#[tokio::test]
async fn test_exchange_failure_stores_nothing() {
    let ctx = setup_configured().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
            "error": "invalid_grant"
        })))
        .mount(&ctx.server)
        .await;

    let redirect = ctx.coordinator.begin_login("example.com").await.unwrap();
    let err = ctx
        .coordinator
        .handle_callback(&redirect.state, "abc", "example.com")
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::TokenExchange(_)));

    let stored = TokenStore::new(ctx.pool.clone()).get().await;
    assert!(stored.unwrap_err().is_not_found());
}

#[tokio::test]
async fn test_missing_refresh_token_stores_empty_value() {
    let ctx = setup_configured().await;
    mock_token_endpoint(&ctx.server, serde_json::json!({"access_token": "a"})).await;

    let redirect = ctx.coordinator.begin_login("example.com").await.unwrap();
    let token = ctx
        .coordinator
        .handle_callback(&redirect.state, "abc", "example.com")
        .await
        .unwrap();

    assert!(!token.has_refresh_token());
}

#[tokio::test]
async fn test_repeat_login_keeps_created_at() {
    let ctx = setup_configured().await;
    mock_token_endpoint(
        &ctx.server,
        serde_json::json!({"access_token": "a", "refresh_token": "1//r"}),
    )
    .await;

    let first_state = ctx.coordinator.begin_login("example.com").await.unwrap().state;
    let first = ctx
        .coordinator
        .handle_callback(&first_state, "abc", "example.com")
        .await
        .unwrap();

    tokio::time::sleep(Duration::from_millis(10)).await;

    let second_state = ctx.coordinator.begin_login("example.com").await.unwrap().state;
    let second = ctx
        .coordinator
        .handle_callback(&second_state, "def", "example.com")
        .await
        .unwrap();

    assert_eq!(second.created_at, first.created_at);
    assert!(second.updated_at > first.updated_at);
}

#[tokio::test]
async fn test_memory_cache_backend_round_trip() {
    let ctx = setup_configured().await;
    mock_token_endpoint(
        &ctx.server,
        serde_json::json!({"access_token": "a", "refresh_token": "1//mem"}),
    )
    .await;

    let settings = OAuthSettings {
        token_url: format!("{}/token", ctx.server.uri()),
        dev_mode: true,
        ..OAuthSettings::default()
    };
    let coordinator = AuthorizationCoordinator::new(
        CredentialStore::new(ctx.pool.clone()),
        TokenStore::new(ctx.pool.clone()),
        Arc::new(MemoryStateCache::new()),
        settings,
    )
    .unwrap();

    let redirect = coordinator.begin_login("localhost:8080").await.unwrap();
    let url = Url::parse(&redirect.url).unwrap();
    assert_eq!(
        query_param(&url, "redirect_uri").as_deref(),
        Some("http://localhost:8080/oauth2callback")
    );

    let token = coordinator
        .handle_callback(&redirect.state, "abc", "localhost:8080")
        .await
        .unwrap();
    assert_eq!(token.refresh_token, "1//mem");
}

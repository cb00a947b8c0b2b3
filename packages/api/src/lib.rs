// ABOUTME: HTTP API layer for Tokenvault providing the admin config and OAuth endpoints
// ABOUTME: Routes requests to the credential store and the authorization coordinator

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

pub mod config_handlers;
pub mod oauth_handlers;
pub mod response;
pub mod state;

pub use response::{ApiError, ApiResult, ErrorResponse};
pub use state::AppState;

/// Creates the admin API router (mounted under /admin/api/1)
pub fn create_admin_router() -> Router<AppState> {
    Router::new()
        .route("/config", post(config_handlers::put_config))
        .route("/config", get(config_handlers::get_config))
}

/// Creates the public login router
pub fn create_oauth_router() -> Router<AppState> {
    Router::new()
        .route("/api/1/login", get(oauth_handlers::login))
        .route("/oauth2callback", get(oauth_handlers::oauth2_callback))
}

async fn not_found() -> ApiError {
    ApiError::NotFound
}

async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed
}

/// Creates the full application router with state applied
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .nest("/admin/api/1", create_admin_router())
        .merge(create_oauth_router())
        .fallback(not_found)
        .method_not_allowed_fallback(method_not_allowed)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ABOUTME: Builds the application from configuration and runs the HTTP server
// ABOUTME: Also owns the background task that purges expired login states

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::{routing::get, Router};
use sqlx::SqlitePool;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::config::{Config, StateCacheBackend};
use crate::health::health_check;
use tokenvault_api::{create_router, AppState};
use tokenvault_auth::{AuthorizationCoordinator, MemoryStateCache, SqliteStateCache, StateCache};
use tokenvault_storage::{connect, CredentialStore, DatabaseOptions, TokenStore};

/// Fully wired application, ready to serve
pub struct App {
    pub router: Router,
    pub pool: SqlitePool,
    pub cache: Arc<dyn StateCache>,
}

pub async fn build_app(config: &Config) -> anyhow::Result<App> {
    let pool = connect(&config.database_url, &DatabaseOptions::default())
        .await
        .with_context(|| format!("Failed to open database {}", config.database_url))?;

    let cache: Arc<dyn StateCache> = match config.state_cache {
        StateCacheBackend::Database => Arc::new(SqliteStateCache::new(pool.clone())),
        StateCacheBackend::Memory => Arc::new(MemoryStateCache::new()),
    };

    let credentials = CredentialStore::new(pool.clone());
    let coordinator = AuthorizationCoordinator::new(
        credentials.clone(),
        TokenStore::new(pool.clone()),
        cache.clone(),
        config.oauth.clone(),
    )
    .context("Failed to build authorization coordinator")?;

    let router = create_router(AppState::new(credentials, coordinator))
        .route("/api/health", get(health_check));

    Ok(App {
        router,
        pool,
        cache,
    })
}

/// Periodically delete pending states whose TTL has passed
pub fn spawn_state_reaper(cache: Arc<dyn StateCache>, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        info!("Started state reaper (interval: {}s)", every.as_secs());

        loop {
            interval.tick().await;

            if let Err(e) = cache.purge_expired().await {
                warn!("Failed to purge expired login states: {}", e);
            }
        }
    })
}

pub async fn run_server(config: Config) -> anyhow::Result<()> {
    let app = build_app(&config).await?;
    let reaper = spawn_state_reaper(app.cache.clone(), config.reap_interval);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .with_context(|| format!("Invalid listen address {}:{}", config.host, config.port))?;

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!(
        %addr,
        dev_mode = config.oauth.dev_mode,
        state_cache = ?config.state_cache,
        "Tokenvault listening"
    );

    axum::serve(listener, app.router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    reaper.abort();
    app.pool.close().await;
    info!("Tokenvault stopped");
    Ok(())
}

/// Open the database and apply pending migrations without serving
pub async fn migrate(database_url: &str) -> anyhow::Result<()> {
    let pool = connect(database_url, &DatabaseOptions::default())
        .await
        .with_context(|| format!("Failed to migrate {}", database_url))?;
    pool.close().await;
    info!("Migrations applied to {}", database_url);
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

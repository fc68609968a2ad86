//! Polls Server - Main Entry Point

use std::sync::Arc;

use anyhow::Result;
use tracing::{info, warn};

use poll_server::{
    api, config, db,
    ratelimit::{AttemptBackend, AttemptLimitConfig, AttemptLimiter, RedisAttemptStore, SystemClock},
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "poll_server=debug,tower_http=debug".into()),
        )
        .json()
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = config::Config::from_env()?;

    info!(version = env!("CARGO_PKG_VERSION"), "Starting Polls Server");

    // Initialize database
    let db_pool = db::create_pool(&config.database_url).await?;
    db::run_migrations(&db_pool).await?;
    let store = Arc::new(db::PgStore::new(db_pool));

    // Initialize attempt limiter
    let rl_config = AttemptLimitConfig::from_env();
    let limiter = if rl_config.enabled && rl_config.backend == AttemptBackend::Redis {
        let redis = db::create_redis_client(&config.redis_url).await?;
        let attempts = RedisAttemptStore::connect(redis).await?;
        AttemptLimiter::new(Arc::new(attempts), Arc::new(SystemClock), rl_config)
    } else {
        if !rl_config.enabled {
            warn!("Attempt limiting disabled by configuration");
        }
        AttemptLimiter::in_memory(rl_config)
    };
    let sweeper = limiter.spawn_sweeper();
    info!(
        enabled = limiter.config().enabled,
        backend = ?limiter.config().backend,
        "Attempt limiter initialized"
    );

    // Build application state
    let bind_address = config.bind_address.clone();
    let state = api::AppState::new(config, store.clone(), store, limiter);

    // Build router
    let app = api::create_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    info!(address = %bind_address, "Server listening");

    // Graceful shutdown handler
    let shutdown_signal = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for shutdown signal");
            std::future::pending::<()>().await;
        }
        info!("Received shutdown signal, cleaning up...");
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await?;

    if let Some(handle) = sweeper {
        handle.abort();
    }
    info!("Server shutdown complete");

    Ok(())
}

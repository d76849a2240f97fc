mod api;
mod app;
mod auth;
mod config;
mod db;
mod domain;
mod error;
mod logging;
mod middleware;
mod routes;
mod services;

use anyhow::Result;

use services::RedisCache;

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Load configuration
    let settings = config::Settings::from_env()?;

    // Initialize logging
    logging::init_logging(&settings.env);

    tracing::info!(
        env = ?settings.env,
        server_addr = %settings.server_addr,
        "Starting TripForge backend"
    );

    // Create database pool and apply pending migrations
    let pool = db::create_pool(&settings).await?;
    db::run_migrations(&pool).await?;

    // Create Redis cache
    let cache = RedisCache::new(&settings.redis_url, settings.redis_cache_ttl_seconds).await?;
    tracing::info!("Redis cache initialized");

    // Create JWKS cache for JWT verification
    let jwks_cache = auth::JwksCache::new(
        settings.auth_jwks_url.clone(),
        settings.auth_jwt_issuer.clone(),
        settings.auth_jwt_audience.clone(),
        settings.jwks_cache_ttl_seconds,
    )?;

    // Optionally warm the JWKS cache
    if let Err(e) = jwks_cache.warm_cache().await {
        tracing::warn!(error = %e, "Failed to warm JWKS cache - will fetch on first request");
    }

    // Create application state
    let state = app::AppState::new(pool, settings.clone(), jwks_cache, cache);

    // Build application
    let app = app::create_app(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&settings.server_addr).await?;
    tracing::info!("Listening on {}", settings.server_addr);

    axum::serve(listener, app).await?;

    Ok(())
}

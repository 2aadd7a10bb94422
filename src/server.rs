//! HTTP server initialization and runtime setup.
//!
//! Connects backing services, composes the repository tiers, and runs the
//! Axum server with graceful shutdown.

use crate::config::Config;
use crate::domain::repositories::ShortUrlRepository;
use crate::infrastructure::cache::{LruRepository, RedisCacheRepository};
use crate::infrastructure::health::RedisHealthChecker;
use crate::infrastructure::messaging::{AnalyticsPublisher, RedisStreamPublisher};
use crate::infrastructure::persistence::PgShortUrlRepository;
use crate::ratelimit::{
    MemoryRateLimitStore, PolicyBuilder, PolicyLimiter, RateLimitStore, RedisRateLimitStore, Scope,
};
use crate::routes::app_router;
use crate::state::AppState;

use anyhow::{Context, Result};
use redis::aio::ConnectionManager;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

/// Runs the HTTP server with the given configuration.
///
/// Initializes:
/// - PostgreSQL connection pool and pending migrations
/// - Redis connection manager (cache tier, event stream, and optionally
///   the rate-limit counter store)
/// - The layered repository: Postgres, wrapped by the Redis cache tier,
///   wrapped by the optional LRU tier
/// - The policy limiter built from the configured per-scope limits
/// - Axum HTTP server with graceful shutdown on `SIGTERM` / `Ctrl-C`
///
/// # Errors
///
/// Returns an error if the database is unreachable, migrations fail, or
/// the listener cannot bind. Redis being down is not fatal: the cache
/// degrades to miss-through and health reports `degraded`.
pub async fn run(config: Config) -> Result<()> {
    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .acquire_timeout(Duration::from_secs(config.db_connect_timeout))
        .idle_timeout(Duration::from_secs(config.db_idle_timeout))
        .max_lifetime(Duration::from_secs(config.db_max_lifetime))
        .connect(&config.database_url)
        .await
        .context("Failed to connect to database")?;
    tracing::info!("Connected to database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to migrate")?;

    let redis = connect_redis(&config.redis_url).await?;

    let pool = Arc::new(pool);
    let repository = build_repository(pool, redis.clone(), &config);

    let rate_limit_store: Arc<dyn RateLimitStore> = match config.rate_limit_store.as_str() {
        "redis" => {
            tracing::info!("Rate limit store: redis");
            Arc::new(RedisRateLimitStore::new(redis.clone()))
        }
        _ => {
            tracing::info!("Rate limit store: memory");
            Arc::new(MemoryRateLimitStore::new())
        }
    };

    let policy = PolicyBuilder::new()
        .add_limit(
            Scope::Global,
            config.rate_limit_global_per_day,
            Duration::from_secs(24 * 3600),
        )
        .add_limit(
            Scope::Read,
            config.rate_limit_read_per_minute,
            Duration::from_secs(60),
        )
        .add_limit(
            Scope::Write,
            config.rate_limit_write_per_minute,
            Duration::from_secs(60),
        )
        .add_limit(
            Scope::Write,
            config.rate_limit_write_per_hour,
            Duration::from_secs(3600),
        )
        .add_limit(
            Scope::Write,
            config.rate_limit_write_per_day,
            Duration::from_secs(24 * 3600),
        )
        .build();
    let limiter = Arc::new(PolicyLimiter::new(rate_limit_store, policy));

    let publisher = Arc::new(RedisStreamPublisher::new(redis.clone()));
    let analytics = Arc::new(AnalyticsPublisher::new(
        publisher,
        config.topic_url_created.clone(),
        config.topic_url_accessed.clone(),
    ));

    let health = Arc::new(RedisHealthChecker::new(redis));

    let state = AppState::new(
        repository,
        analytics,
        limiter,
        health,
        config.base_url.clone(),
        config.code_length,
    );

    let app = app_router(state);

    let addr: SocketAddr = config.listen_addr.parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on http://{addr}");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("HTTP server stopped, shutdown complete");

    Ok(())
}

/// Connects the shared Redis connection manager.
///
/// The manager reconnects on its own, so a Redis outage at boot does not
/// keep the service down once Redis returns.
pub async fn connect_redis(redis_url: &str) -> Result<ConnectionManager> {
    let client = redis::Client::open(redis_url).context("Invalid Redis URL")?;

    let manager = ConnectionManager::new(client)
        .await
        .context("Failed to connect to Redis")?;

    tracing::info!("Connected to Redis");

    Ok(manager)
}

/// Composes the repository tiers: Postgres, then Redis cache-aside, then
/// the optional LRU front tier.
fn build_repository(
    pool: Arc<PgPool>,
    redis: ConnectionManager,
    config: &Config,
) -> Arc<dyn ShortUrlRepository> {
    let durable = PgShortUrlRepository::new(pool);

    let cached = RedisCacheRepository::new(
        Box::new(durable),
        redis,
        Duration::from_secs(config.cache_ttl_seconds),
    );

    if config.cache_size > 0 {
        tracing::info!(capacity = config.cache_size, "LRU tier enabled");
        Arc::new(LruRepository::new(Box::new(cached), config.cache_size))
    } else {
        tracing::info!("LRU tier disabled");
        Arc::new(cached)
    }
}

/// Resolves on Ctrl-C (all platforms) or SIGTERM (Unix).
pub async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}

//! Bookstore Server
//!
//! Role-based access controlled bookstore REST API.

use anyhow::Context;
use chrono::Utc;
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use bookstore_server::{
    api,
    auth::{password::hash_password, SystemClock},
    config::{AppConfig, LoggingConfig},
    repository::{sessions::SessionsRepository, Repository},
    AppState,
};

const SESSION_PURGE_INTERVAL: Duration = Duration::from_secs(3600);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let config = AppConfig::load().context("Failed to load configuration")?;

    // Must stay alive for the non-blocking writer to flush
    let _log_guard = init_tracing(&config.logging);

    tracing::info!("Starting Bookstore Server v{}", env!("CARGO_PKG_VERSION"));

    // Create database connection pool
    let pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .min_connections(config.database.min_connections)
        .acquire_timeout(Duration::from_secs(config.database.acquire_timeout_secs))
        .connect(&config.database.url)
        .await
        .context("Failed to connect to database")?;

    tracing::info!("Connected to database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run database migrations")?;

    tracing::info!("Database migrations completed");

    let repository = Repository::new(pool);

    if let Some(password) = &config.auth.seed_admin_password {
        let hash = hash_password(password)?;
        if repository.users.seed_super_admin(&hash).await? {
            tracing::info!("Seeded super admin account");
        }
    }

    spawn_session_purge(repository.sessions.clone());

    // Save server address before moving config
    let addr = SocketAddr::new(
        config.server.host.parse().context("Invalid host address")?,
        config.server.port,
    );

    let store = Arc::new(repository.clone());
    let state = AppState::new(config, repository, store.clone(), store, Arc::new(SystemClock));
    let app = api::create_router(state);

    tracing::info!("Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// Install the global subscriber: env filter, pretty or JSON output,
/// written through a non-blocking stdout or daily file appender
fn init_tracing(logging: &LoggingConfig) -> WorkerGuard {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!("bookstore_server={},tower_http=debug", logging.level).into()
    });

    let (writer, guard) = match &logging.directory {
        Some(directory) => tracing_appender::non_blocking(tracing_appender::rolling::daily(
            directory,
            "bookstore-server.log",
        )),
        None => tracing_appender::non_blocking(std::io::stdout()),
    };
    let ansi = logging.directory.is_none();

    let registry = tracing_subscriber::registry().with(filter);
    if logging.format == "json" {
        registry
            .with(fmt::layer().json().with_writer(writer))
            .init();
    } else {
        registry
            .with(fmt::layer().with_ansi(ansi).with_writer(writer))
            .init();
    }

    guard
}

/// Periodically drop expired session rows
fn spawn_session_purge(sessions: SessionsRepository) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(SESSION_PURGE_INTERVAL);
        loop {
            interval.tick().await;
            match sessions.purge_expired(Utc::now()).await {
                Ok(0) => {}
                Ok(purged) => tracing::info!(purged, "Purged expired sessions"),
                Err(e) => tracing::warn!("Session purge failed: {}", e),
            }
        }
    });
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}

//! Startup orchestration.
//!
//! # Responsibilities
//! - Initialize subsystems in dependency order
//! - Start background tasks (metrics endpoint, signal listener, session sweeper)
//! - Bind listeners and begin accepting traffic
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Subsystems initialize in order, not concurrently
//! - Listeners start last (traffic only when ready)

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::net::TcpListener;

use crate::config::AppConfig;
use crate::error::AppError;
use crate::http::HttpServer;
use crate::lifecycle::{signals, Shutdown};
use crate::observability::metrics;
use crate::persistence::{DbError, SqliteDatabase};
use crate::routing::RegistryError;

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("database: {0}")]
    Database(#[from] DbError),

    #[error("handler registry: {0}")]
    Registry(#[from] RegistryError),

    #[error("views: {0}")]
    Views(#[from] AppError),

    #[error("metrics: {0}")]
    Metrics(#[from] metrics_exporter_prometheus::BuildError),

    #[error("invalid address '{0}'")]
    Address(String),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

/// Bring the application up and serve until a shutdown signal arrives.
pub async fn run(config: AppConfig) -> Result<(), StartupError> {
    tracing::info!(
        bind_address = %config.listener.bind_address,
        database = %config.database.path,
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        let addr: SocketAddr = config
            .observability
            .metrics_address
            .parse()
            .map_err(|_| StartupError::Address(config.observability.metrics_address.clone()))?;
        metrics::init_metrics(addr)?;
    }

    let db = SqliteDatabase::open(&config.database.path)?;
    tracing::info!(path = %config.database.path, "Database ready");

    let bind_address = config.listener.bind_address.clone();
    let sweep_every = Duration::from_secs(config.session.sweep_interval_secs);
    let server = HttpServer::new(config, Arc::new(db))?;
    tracing::info!(
        handlers = ?server.state().dispatcher.registry().names(),
        "Handler registry compiled"
    );

    let listener = TcpListener::bind(&bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let receiver = shutdown.subscribe();
    let sweeper = server.state().sessions.spawn_sweeper(sweep_every, shutdown.subscribe());
    tokio::spawn(async move {
        signals::wait_for_signal().await;
        shutdown.trigger();
    });

    server.run(listener, receiver).await?;
    let _ = sweeper.await;
    Ok(())
}

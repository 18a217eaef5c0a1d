//! front-router
//!
//! A front-controller web application built with Tokio and Axum.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────────▶ http server ──▶ request (raw path, cookie, form)
//!                                          │
//!                                          ▼  spawn_blocking
//!                                     ┌────────────┐
//!                                     │ dispatcher │──▶ registry ──▶ handler.construct
//!                                     └─────┬──────┘                     │
//!                                           │              Halt ◀────────┤
//!                                           ▼                            ▼ Ready
//!                                        Outcome ◀──────────────── operation(params)
//!                                           │                           │
//!     Client Response                       ▼                           ▼
//!     ◀────────────── response (html / 303) ◀── view renderer      models ──▶ SQLite
//! ```

use std::path::PathBuf;

use clap::Parser;

use front_router::config::{load_config, AppConfig};
use front_router::observability::logging;

#[derive(Debug, Parser)]
#[command(name = "front-router", version, about = "Front-controller web application")]
struct Cli {
    /// TOML configuration file. Defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override `listener.bind_address`.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => AppConfig::default(),
    };
    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
    }

    logging::init(&config.observability.log_level, config.observability.json_logs)?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        config = ?cli.config,
        "front-router starting"
    );

    front_router::lifecycle::run(config).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

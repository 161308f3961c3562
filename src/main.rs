//! Loged - real-time log viewer
//!
//! # Usage
//!
//! ```bash
//! loged
//! loged --config /etc/loged/config.toml --port 9000
//! loged --log-level debug
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use loged::config::{Config, DEFAULT_CONFIG_PATH};
use tokio::signal;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Loged - stream log files to the browser as they grow
#[derive(Parser, Debug)]
#[command(name = "loged")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to configuration file (error if specified but not found)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Port to listen on. Overrides config file.
    #[arg(short, long)]
    port: Option<u16>,

    /// Log level (trace, debug, info, warn, error). Overrides config file.
    #[arg(short, long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let (mut config, missing_default) = load_config(cli.config.as_deref())?;
    if let Some(port) = cli.port {
        config.port = port;
    }

    let log_level = cli.log_level.as_deref().unwrap_or(&config.log.level);
    init_logging(log_level)?;

    if missing_default {
        tracing::warn!(path = DEFAULT_CONFIG_PATH, "config file not found, using defaults");
    }

    loged::server::run(config, wait_for_shutdown()).await?;
    Ok(())
}

/// Load the explicit config, or the default path when present.
///
/// Returns whether the default file was missing so it can be reported once
/// logging is up.
fn load_config(explicit: Option<&Path>) -> Result<(Config, bool)> {
    if let Some(path) = explicit {
        let config = Config::from_file(path)
            .with_context(|| format!("cannot load config {}", path.display()))?;
        return Ok((config, false));
    }

    let default_path = Path::new(DEFAULT_CONFIG_PATH);
    if !default_path.exists() {
        return Ok((Config::default(), true));
    }
    Ok((Config::from_file(default_path)?, false))
}

/// Initialize the tracing subscriber for logging
fn init_logging(level: &str) -> Result<()> {
    let filter = EnvFilter::try_new(level)
        .or_else(|_| EnvFilter::try_new("info"))
        .map_err(|e| anyhow::anyhow!("invalid log level: {}", e))?;

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_thread_ids(false))
        .with(filter)
        .init();

    Ok(())
}

/// Wait for SIGINT or SIGTERM
async fn wait_for_shutdown() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("shutdown signal received");
}

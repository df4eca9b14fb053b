//! Failover service daemon.
//!
//! Loads configuration, keeps endpoint health fresh and serves the status
//! API until interrupted.

use std::path::PathBuf;
use std::sync::Arc;
use clap::Parser;
use tokio::net::TcpListener;

use failover_core::config::{load_config, FailoverConfig};
use failover_core::lifecycle::signals::shutdown_token;
use failover_core::observability::{logging, metrics};
use failover_core::{admin, FailoverOrchestrator};

#[derive(Parser)]
#[command(name = "failover")]
#[command(about = "Health-checked failover for redundant endpoints", long_about = None)]
struct Args {
    /// Path to a TOML configuration file. Defaults are used when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => FailoverConfig::default(),
    };

    logging::init_logging(&config.observability.log_level);
    tracing::info!("failover v{} starting", env!("CARGO_PKG_VERSION"));

    tracing::info!(
        endpoints = config.endpoints.len(),
        algorithm = ?config.load_balancer.algorithm,
        max_retries = config.orchestrator.max_retries,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        if let Ok(addr) = config.observability.metrics_address.parse() {
            metrics::init_metrics(addr);
        } else {
            tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            );
        }
    }

    let orchestrator = Arc::new(FailoverOrchestrator::from_config(&config)?);
    orchestrator.start();

    let shutdown = shutdown_token();

    if config.admin.enabled {
        let listener = TcpListener::bind(&config.admin.bind_address).await?;
        let token = shutdown.clone();
        admin::serve(listener, orchestrator.clone(), async move { token.cancelled().await }).await?;
    } else {
        shutdown.cancelled().await;
    }

    orchestrator.stop().await;
    tracing::info!("Shutdown complete");
    Ok(())
}

//! Main entry point for the vision-mirror CLI

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use vision_mirror::cli::{Cli, Commands};
use vision_mirror::shutdown::{self, ShutdownFlag};

/// Initialize tracing subscriber with optional JSON formatting
fn init_tracing() {
    let json_format = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("vision_mirror=info"));

    if json_format {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

#[tokio::main]
async fn main() {
    init_tracing();

    let cli = Cli::parse();

    if let Some(addr) = cli.metrics_addr {
        if let Err(e) = vision_mirror::metrics::init_metrics(addr).await {
            error!("Failed to start metrics exporter: {}", e);
            std::process::exit(1);
        }
    }

    let shutdown = ShutdownFlag::shared();
    shutdown::listen_for_ctrl_c(shutdown.clone());

    let result = match cli.command {
        Commands::Sync(ref args) => args
            .execute(&cli, shutdown.clone())
            .await
            .map(|stats| {
                if stats.is_interrupted() {
                    info!("Sync interrupted; rerun to continue");
                }
            })
            .map_err(|e| anyhow::anyhow!(e)),
        Commands::Reconcile(ref args) => args
            .execute(&cli)
            .map(|summary| {
                println!(
                    "Deleted {} daily files for {} instruments ({} failed)",
                    summary.deleted, summary.instruments, summary.failed
                );
            })
            .map_err(|e| anyhow::anyhow!(e)),
        Commands::Instruments(ref args) => args.execute().await,
    };

    if let Err(e) = result {
        error!("Command failed: {}", e);
        std::process::exit(1);
    }
}

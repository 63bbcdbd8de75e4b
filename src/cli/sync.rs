//! Sync command implementation

use chrono::NaiveDate;
use clap::Args;
use tracing::info;

use super::{Cli, CliError, DatasetArgs};
use crate::downloader::config::MAX_CONCURRENCY;
use crate::downloader::{SyncConfig, SyncExecutor, SyncRequest};
use crate::fetcher::archive::VisionArchiveSource;
use crate::fetcher::catalog::BinanceCatalog;
use crate::reconcile::Reconciler;
use crate::shutdown::SharedShutdown;
use crate::stats::DumpStatistics;

/// Parse a YYYY-MM-DD date
fn parse_date(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map_err(|e| format!("'{s}' is not a YYYY-MM-DD date: {e}"))
}

/// Parse and validate a worker pool width
fn parse_concurrency(s: &str) -> Result<usize, String> {
    let value: usize = s
        .parse()
        .map_err(|_| format!("'{s}' is not a valid number"))?;

    if value == 0 {
        return Err("concurrency must be at least 1".to_string());
    }
    if value > MAX_CONCURRENCY {
        return Err(format!(
            "concurrency {value} exceeds maximum of {MAX_CONCURRENCY}"
        ));
    }
    Ok(value)
}

/// Arguments for `sync`
#[derive(Args, Debug)]
pub struct SyncArgs {
    /// Dataset to mirror
    #[command(flatten)]
    pub dataset: DatasetArgs,

    /// Comma-separated symbols to sync (default: every USDT symbol)
    #[arg(long, value_delimiter = ',')]
    pub tickers: Vec<String>,

    /// Comma-separated symbols to skip
    #[arg(long, value_delimiter = ',')]
    pub exclude: Vec<String>,

    /// First date of interest (YYYY-MM-DD, floored at 2017-01-01)
    #[arg(long, value_parser = parse_date)]
    pub start_date: Option<NaiveDate>,

    /// Exclusive end date (YYYY-MM-DD, default and cap: today)
    #[arg(long, value_parser = parse_date)]
    pub end_date: Option<NaiveDate>,

    /// Re-download partitions the ledger already has
    #[arg(long, default_value_t = false)]
    pub force: bool,

    /// Process at most this many instruments
    #[arg(long)]
    pub max_instruments: Option<usize>,

    /// Parallel downloads for regular archives (max: 60)
    #[arg(long, default_value = "10", value_parser = parse_concurrency)]
    pub concurrency: usize,

    /// Parallel downloads for trades and aggTrades archives
    #[arg(long, default_value = "1", value_parser = parse_concurrency)]
    pub bulk_concurrency: usize,

    /// Verify each archive against its published .CHECKSUM file
    #[arg(long, default_value_t = false)]
    pub verify_checksum: bool,

    /// Delete daily files covered by monthly archives after the sync
    #[arg(long, default_value_t = false)]
    pub reconcile: bool,
}

impl SyncArgs {
    /// Request described by these arguments
    pub fn request(&self) -> SyncRequest {
        SyncRequest::default()
            .with_tickers(self.tickers.clone())
            .with_excluded(self.exclude.clone())
            .with_window(self.start_date, self.end_date)
            .with_force(self.force)
            .with_max_instruments(self.max_instruments)
    }

    /// Execute the sync command
    pub async fn execute(
        &self,
        cli: &Cli,
        shutdown: SharedShutdown,
    ) -> Result<DumpStatistics, CliError> {
        let spec = self.dataset.spec()?;
        let config = SyncConfig {
            concurrency: self.concurrency,
            bulk_concurrency: self.bulk_concurrency,
            show_progress: !cli.no_progress,
        };
        let source = VisionArchiveSource::new().with_checksum_verification(self.verify_checksum);
        let executor = SyncExecutor::new(
            BinanceCatalog::new(spec.asset_class()),
            source,
            cli.open_ledger(&spec),
            cli.data_dir.clone(),
            spec,
        )
        .with_config(config)
        .with_shutdown(shutdown);

        let stats = executor.run(&self.request()).await?;
        stats.report();

        if self.reconcile {
            if stats.is_interrupted() {
                info!("Skipping reconciliation after interrupted sync");
            } else {
                Reconciler::new(executor.ledger().clone(), executor.mapper().clone()).reconcile()?;
            }
        }
        Ok(stats)
    }
}

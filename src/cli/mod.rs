//! CLI command implementations

use clap::{Args, Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;

use crate::dataset::DatasetSpec;
use crate::ledger::{Ledger, LedgerKind};

pub mod error;
pub mod instruments;
pub mod reconcile;
pub mod sync;

pub use error::CliError;
pub use instruments::InstrumentsArgs;
pub use reconcile::ReconcileArgs;
pub use sync::SyncArgs;

/// Binance Vision mirror CLI
#[derive(Parser, Debug)]
#[command(name = "vision-mirror")]
#[command(about = "Incrementally mirror Binance Vision market-data archives", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Root directory of the local mirror
    #[arg(long, global = true, default_value = "data")]
    pub data_dir: PathBuf,

    /// Ledger backend: store (persisted JSON) or probe (file existence)
    #[arg(long, global = true, default_value = "store")]
    pub ledger: LedgerKind,

    /// Hide progress bars
    #[arg(long, global = true, default_value_t = false)]
    pub no_progress: bool,

    /// Serve Prometheus metrics on this address (e.g. 127.0.0.1:9000)
    #[arg(long, global = true)]
    pub metrics_addr: Option<SocketAddr>,
}

impl Cli {
    /// Open the configured ledger for `spec`
    pub fn open_ledger(&self, spec: &DatasetSpec) -> Ledger {
        Ledger::open(self.ledger, self.data_dir.clone(), spec.clone())
    }
}

/// CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Download every missing partition of a dataset
    Sync(SyncArgs),

    /// Delete daily files already covered by monthly archives
    Reconcile(ReconcileArgs),

    /// List the instruments a sync would cover
    Instruments(InstrumentsArgs),
}

/// Dataset selection shared by `sync` and `reconcile`
#[derive(Args, Debug, Clone)]
pub struct DatasetArgs {
    /// Asset class: spot, um or cm
    #[arg(long, default_value = "spot")]
    pub asset_class: String,

    /// Data type (e.g. klines, trades, aggTrades, metrics)
    #[arg(long, default_value = "klines")]
    pub data_type: String,

    /// Bar width for kline types (e.g. 1m, 1h, 1d)
    #[arg(long)]
    pub frequency: Option<String>,
}

impl DatasetArgs {
    /// Validate into a [`DatasetSpec`]
    pub fn spec(&self) -> Result<DatasetSpec, CliError> {
        Ok(DatasetSpec::parse(
            &self.asset_class,
            &self.data_type,
            self.frequency.as_deref(),
        )?)
    }
}

//! Reconcile command implementation

use clap::Args;

use super::{Cli, CliError, DatasetArgs};
use crate::layout::ResourceMapper;
use crate::reconcile::{ReconcileSummary, Reconciler};

/// Arguments for `reconcile`
#[derive(Args, Debug)]
pub struct ReconcileArgs {
    /// Dataset to reconcile
    #[command(flatten)]
    pub dataset: DatasetArgs,
}

impl ReconcileArgs {
    /// Execute the reconcile command
    pub fn execute(&self, cli: &Cli) -> Result<ReconcileSummary, CliError> {
        let spec = self.dataset.spec()?;
        let ledger = cli.open_ledger(&spec);
        let mapper = ResourceMapper::new(cli.data_dir.clone(), spec);
        Ok(Reconciler::new(ledger, mapper).reconcile()?)
    }
}

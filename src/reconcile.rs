//! Daily to monthly retention
//!
//! Once the monthly archive for a month is local, the daily files of that
//! month are redundant. [`Reconciler::reconcile`] removes them and prunes
//! them from the ledger.

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::layout::{first_of_month, ResourceMapper};
use crate::ledger::{Ledger, LedgerResult};
use crate::{Granularity, Partition};

/// Outcome of one retention pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileSummary {
    /// Instruments that had at least one daily file removed
    pub instruments: usize,
    /// Daily files removed
    pub deleted: usize,
    /// Daily files that could not be removed
    pub failed: usize,
}

/// Removes daily files covered by a local monthly archive
pub struct Reconciler {
    ledger: Ledger,
    mapper: ResourceMapper,
}

impl Reconciler {
    /// Reconciler over `ledger`, resolving files with `mapper`
    pub fn new(ledger: Ledger, mapper: ResourceMapper) -> Self {
        Self { ledger, mapper }
    }

    /// Ledger updated by this reconciler
    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    /// Delete every daily file whose month has monthly data
    ///
    /// A file that cannot be deleted is logged and stays in the ledger. A
    /// file that is already gone counts as deleted.
    ///
    /// # Errors
    /// Ledger read and prune failures.
    pub fn reconcile(&self) -> LedgerResult<ReconcileSummary> {
        info!("Deleting daily files covered by monthly archives");
        let mut summary = ReconcileSummary::default();

        for ticker in self.ledger.instruments_with_data(Granularity::Daily)? {
            let months = self.ledger.dates_with_data(&ticker, Granularity::Monthly)?;
            if months.is_empty() {
                continue;
            }

            let mut removed: Vec<NaiveDate> = Vec::new();
            for day in self.ledger.dates_with_data(&ticker, Granularity::Daily)? {
                if !months.contains(&first_of_month(day)) {
                    continue;
                }
                let path = self
                    .mapper
                    .resource(&ticker, Partition::daily(day))
                    .local_path();
                match std::fs::remove_file(&path) {
                    Ok(()) => removed.push(day),
                    Err(e) if e.kind() == std::io::ErrorKind::NotFound => removed.push(day),
                    Err(e) => {
                        warn!(path = %path.display(), error = %e, "Unable to delete file");
                        summary.failed += 1;
                    }
                }
            }

            if removed.is_empty() {
                continue;
            }
            self.ledger.prune(&ticker, Granularity::Daily, &removed)?;
            debug!(symbol = %ticker, deleted = removed.len(), "Daily files pruned");
            summary.instruments += 1;
            summary.deleted += removed.len();
        }

        crate::metrics::record_daily_pruned(
            self.mapper.spec().data_type().as_str(),
            summary.deleted as u64,
        );
        info!(
            instruments = summary.instruments,
            deleted = summary.deleted,
            failed = summary.failed,
            "Daily files deleted"
        );
        Ok(summary)
    }
}

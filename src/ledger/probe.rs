//! Filesystem probing ledger
//!
//! A partition is present iff its decoded `.csv` file exists at the mapped
//! local path. Nothing is persisted.

use super::{read_dir_names, LedgerResult};
use crate::dataset::DatasetSpec;
use crate::layout::path::LOCAL_EXTENSION;
use crate::layout::ResourceMapper;
use crate::{Granularity, Partition};
use chrono::NaiveDate;
use std::collections::BTreeSet;
use std::path::PathBuf;

/// Ledger backed by file existence
#[derive(Debug, Clone)]
pub struct ProbeLedger {
    mapper: ResourceMapper,
}

impl ProbeLedger {
    /// Probe files under `root_dir`
    pub fn new(root_dir: impl Into<PathBuf>, spec: DatasetSpec) -> Self {
        Self {
            mapper: ResourceMapper::new(root_dir, spec),
        }
    }

    pub(crate) fn has_data(&self, ticker: &str, partition: Partition) -> bool {
        self.mapper.resource(ticker, partition).local_path().is_file()
    }

    pub(crate) fn dates_with_data(
        &self,
        ticker: &str,
        granularity: Granularity,
    ) -> LedgerResult<BTreeSet<NaiveDate>> {
        let dir = self.mapper.local_dir(granularity, ticker);
        let dates = read_dir_names(&dir)?
            .into_iter()
            .filter(|(_, is_dir)| !is_dir)
            .filter_map(|(name, _)| {
                self.mapper
                    .parse_file_date(ticker, granularity, &name, LOCAL_EXTENSION)
            })
            .collect();
        Ok(dates)
    }

    pub(crate) fn instruments_with_data(&self, granularity: Granularity) -> LedgerResult<Vec<String>> {
        let mut tickers = Vec::new();
        for (name, is_dir) in read_dir_names(&self.mapper.dataset_dir(granularity))? {
            if is_dir && !self.dates_with_data(&name, granularity)?.is_empty() {
                tickers.push(name);
            }
        }
        Ok(tickers)
    }
}

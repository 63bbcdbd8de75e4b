//! Sync configuration constants

use chrono::NaiveDate;
use std::time::Duration;

use crate::dataset::DatasetSpec;

/// Maximum number of retries for catalog requests.
/// Archive downloads are never retried.
pub const MAX_RETRIES: u32 = 5;

/// Initial backoff delay in milliseconds.
pub const INITIAL_BACKOFF_MS: u64 = 1000; // 1 second

/// Maximum backoff delay in milliseconds.
pub const MAX_BACKOFF_MS: u64 = 30000; // 30 seconds

/// Earliest date Binance Vision publishes archives for (year, month, day).
pub const EARLIEST_ARCHIVE_DATE: (i32, u32, u32) = (2017, 1, 1);

/// Parallel fetches for regular archives.
pub const DEFAULT_CONCURRENCY: usize = 10;

/// Parallel fetches for trade-level archives (`trades`, `aggTrades`).
pub const DEFAULT_BULK_CONCURRENCY: usize = 1;

/// Upper bound accepted for either concurrency setting.
pub const MAX_CONCURRENCY: usize = 60;

/// Below this many instruments the statistics report lists each one.
pub const STATS_FULL_REPORT_THRESHOLD: usize = 50;

/// Number of most common counts shown in the compact report.
pub const STATS_MOST_COMMON: usize = 5;

/// Calculate exponential backoff delay
pub fn calculate_backoff(retry_count: u32) -> Duration {
    let delay_ms = INITIAL_BACKOFF_MS.saturating_mul(2u64.saturating_pow(retry_count));
    let delay_ms = delay_ms.min(MAX_BACKOFF_MS);
    Duration::from_millis(delay_ms)
}

/// Earliest archive date as a [`NaiveDate`]
pub fn earliest_archive_date() -> NaiveDate {
    let (y, m, d) = EARLIEST_ARCHIVE_DATE;
    NaiveDate::from_ymd_opt(y, m, d).unwrap_or(NaiveDate::MIN)
}

/// Tunables for one sync run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncConfig {
    /// Worker pool width for regular archives
    pub concurrency: usize,
    /// Worker pool width for trade-level archives
    pub bulk_concurrency: usize,
    /// Show indicatif progress bars
    pub show_progress: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            bulk_concurrency: DEFAULT_BULK_CONCURRENCY,
            show_progress: false,
        }
    }
}

impl SyncConfig {
    /// Pool width K for `spec`, never below 1
    pub fn concurrency_for(&self, spec: &DatasetSpec) -> usize {
        let k = if spec.data_type().is_bulk() {
            self.bulk_concurrency
        } else {
            self.concurrency
        };
        k.clamp(1, MAX_CONCURRENCY)
    }
}

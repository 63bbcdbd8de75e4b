//! Fetch-and-extract worker and sync orchestration
//!
//! # Overview
//!
//! A sync run walks the selected instruments one at a time:
//!
//! 1. **Selection**: [`crate::universe::UniverseResolver`] picks the instruments
//! 2. **Planning**: monthly then daily partitions are planned for the window
//! 3. **Diff**: partitions already in the [`crate::ledger::Ledger`] are dropped
//! 4. **Fetch**: a bounded pool of [`worker::FetchWorker`] tasks downloads and extracts
//! 5. **Record**: saved dates are written to the ledger once the pool drains
//!
//! # Quick Start
//!
//! ```no_run
//! use vision_mirror::dataset::DatasetSpec;
//! use vision_mirror::downloader::{SyncConfig, SyncExecutor, SyncRequest};
//! use vision_mirror::fetcher::{archive::VisionArchiveSource, catalog::BinanceCatalog};
//! use vision_mirror::ledger::Ledger;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let spec = DatasetSpec::parse("um", "metrics", None)?;
//! let executor = SyncExecutor::new(
//!     BinanceCatalog::new(spec.asset_class()),
//!     VisionArchiveSource::new(),
//!     Ledger::probe("./data", spec.clone()),
//!     "./data",
//!     spec,
//! )
//! .with_config(SyncConfig { show_progress: true, ..SyncConfig::default() });
//!
//! let stats = executor
//!     .run(&SyncRequest::default().with_max_instruments(Some(5)))
//!     .await?;
//! stats.report();
//! # Ok(())
//! # }
//! ```
//!
//! # Components
//!
//! - [`executor`] - Per-instrument phase planning and the worker pool
//! - [`worker`] - Download, extraction and archive cleanup for one partition
//! - [`job`] - Request parameters
//! - [`config`] - Concurrency defaults and constants
//!
//! # Error Handling
//!
//! Per-partition failures never surface as errors; they become
//! [`FetchOutcome::Skipped`]. [`DownloadError`] covers what stops an
//! instrument (directory creation, ledger persistence) or the whole run
//! (catalog failures, an invalid window).

use std::path::PathBuf;

use crate::fetcher::FetcherError;
use crate::ledger::LedgerError;

pub mod config;
pub mod executor;
pub mod job;
pub mod worker;

pub use config::SyncConfig;
pub use executor::SyncExecutor;
pub use job::SyncRequest;
pub use worker::{FetchOutcome, FetchWorker, SkipReason};

/// Download errors
#[derive(Debug, thiserror::Error)]
pub enum DownloadError {
    /// Local directory could not be prepared
    #[error("IO error at {path}: {source}")]
    Io {
        /// Directory being created
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Catalog failure
    #[error("fetcher error: {0}")]
    Fetcher(#[from] FetcherError),

    /// Ledger failure
    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),

    /// Date window is empty or inverted
    #[error("invalid window: {0}")]
    InvalidWindow(String),
}

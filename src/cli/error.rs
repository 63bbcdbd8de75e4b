//! CLI error types and conversions

use crate::dataset::DatasetError;
use crate::downloader::DownloadError;
use crate::fetcher::FetcherError;
use crate::ledger::LedgerError;

/// CLI errors
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Dataset error
    #[error("dataset error: {0}")]
    Dataset(#[from] DatasetError),

    /// Download error
    #[error("download error: {0}")]
    Download(#[from] DownloadError),

    /// Fetcher error
    #[error("fetcher error: {0}")]
    Fetcher(#[from] FetcherError),

    /// Ledger error
    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),
}

//! Remote catalog and archive transport
//!
//! Two seams separate the sync engine from the network:
//!
//! - [`RemoteCatalog`] - instrument metadata and bucket listings
//! - [`ArchiveSource`] - byte transport of a single archive file
//!
//! [`catalog::BinanceCatalog`] and [`archive::VisionArchiveSource`] are the
//! production implementations. Tests substitute in-memory fakes.

use crate::layout::RemoteResource;
use async_trait::async_trait;
use std::path::Path;

pub mod archive;
pub mod binance_config;
pub mod binance_http;
pub mod catalog;
pub mod listing;

/// Fetcher errors
#[derive(Debug, thiserror::Error)]
pub enum FetcherError {
    /// HTTP request error
    #[error("HTTP error: {0}")]
    HttpError(String),

    /// Remote object does not exist
    #[error("not found: {0}")]
    NotFound(String),

    /// Response parse error
    #[error("parse error: {0}")]
    ParseError(String),

    /// Network error
    #[error("network error: {0}")]
    NetworkError(String),

    /// Archive error
    #[error("archive error: {0}")]
    ArchiveError(String),

    /// Checksum validation failed
    #[error("checksum validation failed: expected {expected}, got {actual}")]
    ChecksumMismatch {
        /// Published digest
        expected: String,
        /// Digest of the downloaded bytes
        actual: String,
    },

    /// Local write failed while receiving a file
    #[error("IO error: {0}")]
    IoError(String),
}

/// Result type for fetcher operations
pub type FetcherResult<T> = Result<T, FetcherError>;

/// Source of instrument metadata and archive listings
#[async_trait]
pub trait RemoteCatalog: Send + Sync {
    /// All symbols currently listed for the catalog's asset class, in
    /// exchange order
    async fn list_instruments(&self) -> FetcherResult<Vec<String>>;

    /// Object keys published under `data/{path_suffix}/`
    ///
    /// # Arguments
    /// * `path_suffix` - Remote directory without leading/trailing slash
    ///   (e.g., "spot/monthly/klines/BTCUSDT/1m")
    async fn list_archive_keys(&self, path_suffix: &str) -> FetcherResult<Vec<String>>;
}

/// Transport for single archive files
#[async_trait]
pub trait ArchiveSource: Send + Sync {
    /// Download the archive for `resource` to `dest`
    ///
    /// # Returns
    /// Number of bytes written
    ///
    /// # Errors
    /// [`FetcherError::NotFound`] when the archive is not published,
    /// other variants on transport or write failures
    async fn fetch_archive(&self, resource: &RemoteResource, dest: &Path) -> FetcherResult<u64>;
}

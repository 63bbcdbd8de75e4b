//! Fetch-and-extract worker
//!
//! One call handles one partition end to end: download the archive next to
//! its destination, unpack it, delete the archive. Every failure degrades to
//! [`FetchOutcome::Skipped`]; the worker never returns an error and never
//! touches the ledger.

use chrono::NaiveDate;
use std::fmt;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;
use tracing::{debug, warn};
use zip::ZipArchive;

use crate::fetcher::{ArchiveSource, FetcherError};
use crate::layout::RemoteResource;
use crate::metrics::ArchiveFetchMetrics;

/// Why a partition was not saved
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// Archive is not published
    NotFound,
    /// Download failed
    Transport(String),
    /// Published checksum did not match the received bytes
    ChecksumMismatch,
    /// Archive could not be unpacked
    Extraction(String),
    /// Archive could not be removed after extraction
    Cleanup(String),
    /// Worker task did not complete
    Aborted(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::NotFound => f.write_str("archive not found"),
            SkipReason::Transport(e) => write!(f, "download failed: {e}"),
            SkipReason::ChecksumMismatch => f.write_str("checksum mismatch"),
            SkipReason::Extraction(e) => write!(f, "extraction failed: {e}"),
            SkipReason::Cleanup(e) => write!(f, "archive cleanup failed: {e}"),
            SkipReason::Aborted(e) => write!(f, "worker aborted: {e}"),
        }
    }
}

/// Result of one partition fetch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Archive extracted; carries the partition date
    Saved(NaiveDate),
    /// Partition not materialized
    Skipped(SkipReason),
}

impl FetchOutcome {
    /// Saved date, if any
    pub fn saved_date(&self) -> Option<NaiveDate> {
        match self {
            FetchOutcome::Saved(date) => Some(*date),
            FetchOutcome::Skipped(_) => None,
        }
    }
}

/// Stateless worker bound to an archive source
pub struct FetchWorker<S> {
    source: Arc<S>,
    data_type: &'static str,
}

impl<S> Clone for FetchWorker<S> {
    fn clone(&self) -> Self {
        Self {
            source: Arc::clone(&self.source),
            data_type: self.data_type,
        }
    }
}

impl<S: ArchiveSource + 'static> FetchWorker<S> {
    /// Create a worker; `data_type` labels emitted metrics
    pub fn new(source: Arc<S>, data_type: &'static str) -> Self {
        Self { source, data_type }
    }

    /// Download, extract and clean up one partition
    pub async fn fetch(&self, resource: RemoteResource) -> FetchOutcome {
        let partition = resource.partition();
        let metrics = ArchiveFetchMetrics::start(self.data_type, partition.granularity());

        let outcome = self.fetch_inner(&resource).await;
        match &outcome {
            FetchOutcome::Saved(_) => {
                metrics.record_saved();
                debug!(
                    symbol = %resource.ticker(),
                    granularity = %partition.granularity(),
                    date = %partition.date_token(),
                    "Partition saved"
                );
            }
            FetchOutcome::Skipped(reason) => {
                metrics.record_skipped();
                debug!(
                    symbol = %resource.ticker(),
                    granularity = %partition.granularity(),
                    date = %partition.date_token(),
                    reason = %reason,
                    "Partition skipped"
                );
            }
        }
        outcome
    }

    async fn fetch_inner(&self, resource: &RemoteResource) -> FetchOutcome {
        let local_dir = resource.local_dir().to_path_buf();
        if let Err(e) = tokio::fs::create_dir_all(&local_dir).await {
            if e.kind() != std::io::ErrorKind::AlreadyExists {
                return FetchOutcome::Skipped(SkipReason::Transport(format!(
                    "cannot create {}: {e}",
                    local_dir.display()
                )));
            }
        }

        let archive_path = resource.archive_path();
        if let Err(e) = self.source.fetch_archive(resource, &archive_path).await {
            remove_quietly(&archive_path).await;
            return FetchOutcome::Skipped(match e {
                FetcherError::NotFound(_) => SkipReason::NotFound,
                FetcherError::ChecksumMismatch { expected, actual } => {
                    warn!(
                        archive = %resource.archive_name(),
                        expected = %expected,
                        actual = %actual,
                        "Checksum mismatch, discarding archive"
                    );
                    SkipReason::ChecksumMismatch
                }
                other => SkipReason::Transport(other.to_string()),
            });
        }

        let extract_from = archive_path.clone();
        let extract_into = local_dir.clone();
        let extracted =
            tokio::task::spawn_blocking(move || extract_archive(&extract_from, &extract_into))
                .await;
        match extracted {
            Ok(Ok(files)) => {
                debug!(archive = %resource.archive_name(), files = files, "Archive extracted");
            }
            Ok(Err(e)) => {
                warn!(archive = %resource.archive_name(), error = %e, "Failed to extract archive");
                remove_quietly(&archive_path).await;
                return FetchOutcome::Skipped(SkipReason::Extraction(e));
            }
            Err(e) => {
                remove_quietly(&archive_path).await;
                return FetchOutcome::Skipped(SkipReason::Aborted(e.to_string()));
            }
        }

        if let Err(e) = tokio::fs::remove_file(&archive_path).await {
            warn!(
                archive = %archive_path.display(),
                error = %e,
                "Failed to remove archive after extraction"
            );
            return FetchOutcome::Skipped(SkipReason::Cleanup(e.to_string()));
        }

        FetchOutcome::Saved(resource.partition().date())
    }
}

async fn remove_quietly(path: &Path) {
    if let Err(e) = tokio::fs::remove_file(path).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            debug!(path = %path.display(), error = %e, "Could not remove partial archive");
        }
    }
}

/// Unpack `archive` into `dest_dir`
///
/// Entries are staged in a temporary directory inside `dest_dir` and only
/// moved into place once every entry has been written, so a corrupt archive
/// leaves nothing behind. Entry names that would escape `dest_dir` fail the
/// extraction.
///
/// # Returns
/// Number of files extracted
pub fn extract_archive(archive: &Path, dest_dir: &Path) -> Result<usize, String> {
    let file = File::open(archive).map_err(|e| format!("Failed to open archive: {e}"))?;
    let mut zip = ZipArchive::new(file).map_err(|e| format!("Failed to open ZIP: {e}"))?;
    let staging =
        TempDir::new_in(dest_dir).map_err(|e| format!("Failed to create staging dir: {e}"))?;

    let mut staged: Vec<PathBuf> = Vec::with_capacity(zip.len());
    for index in 0..zip.len() {
        let mut entry = zip
            .by_index(index)
            .map_err(|e| format!("Failed to read ZIP entry {index}: {e}"))?;
        let relative = entry
            .enclosed_name()
            .ok_or_else(|| format!("Unsafe entry name: {}", entry.name()))?;
        if entry.is_dir() {
            continue;
        }

        let target = staging.path().join(&relative);
        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent).map_err(|e| format!("Failed to create dir: {e}"))?;
        }
        let mut out = File::create(&target)
            .map_err(|e| format!("Failed to create {}: {e}", relative.display()))?;
        std::io::copy(&mut entry, &mut out)
            .map_err(|e| format!("Failed to write {}: {e}", relative.display()))?;
        staged.push(relative);
    }

    let mut moved: Vec<PathBuf> = Vec::with_capacity(staged.len());
    for relative in &staged {
        let target = dest_dir.join(relative);
        let placed = target
            .parent()
            .map_or(Ok(()), std::fs::create_dir_all)
            .and_then(|()| std::fs::rename(staging.path().join(relative), &target));
        if let Err(e) = placed {
            roll_back(&moved);
            return Err(format!("Failed to move {} into place: {e}", relative.display()));
        }
        moved.push(target);
    }

    Ok(moved.len())
}

/// Remove entries already moved out of staging
fn roll_back(moved: &[PathBuf]) {
    for path in moved {
        if let Err(e) = std::fs::remove_file(path) {
            warn!(path = %path.display(), error = %e, "Failed to remove partially extracted file");
        }
    }
}

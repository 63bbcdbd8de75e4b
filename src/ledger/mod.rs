//! Local partition ledger
//!
//! Answers "which partitions of this ticker are already materialized locally".
//! Two backends share one interface:
//!
//! - [`probe::ProbeLedger`] - truth is the presence of the decoded file on disk
//! - [`store::StoreLedger`] - truth is a persisted per-ticker JSON document
//!
//! Callers hold a [`Ledger`] and never inspect which variant it is.

use crate::dataset::DatasetSpec;
use crate::{Granularity, Partition};
use chrono::{Datelike, NaiveDate};
use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

pub mod probe;
pub mod store;

pub use probe::ProbeLedger;
pub use store::{LedgerEntry, StoreLedger};

/// Ledger errors
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// Filesystem error on a ledger path
    #[error("I/O error on {path}: {source}")]
    Io {
        /// Path being accessed
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Advisory lock could not be taken
    #[error("lock error: {0}")]
    Lock(String),

    /// Entry could not be serialized
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Entry on disk is not valid JSON for the current schema
    #[error("deserialization error in {path}: {message}")]
    Deserialization {
        /// Offending file
        path: PathBuf,
        /// Parser message
        message: String,
    },

    /// Entry written by an incompatible version
    #[error("ledger schema version mismatch: expected {expected}, found {found}")]
    SchemaVersionMismatch {
        /// Version this build writes
        expected: String,
        /// Version found on disk
        found: String,
    },

    /// Entry file exceeds the size guard
    #[error("ledger entry too large: {size} bytes (max {max})")]
    EntryTooLarge {
        /// Actual size
        size: u64,
        /// Maximum accepted size
        max: u64,
    },
}

impl LedgerError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        LedgerError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result type for ledger operations
pub type LedgerResult<T> = Result<T, LedgerError>;

/// Backend selector used by the CLI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LedgerKind {
    /// Filesystem probing
    Probe,
    /// Persisted JSON documents
    #[default]
    Store,
}

impl LedgerKind {
    /// Lowercase name
    pub fn as_str(&self) -> &'static str {
        match self {
            LedgerKind::Probe => "probe",
            LedgerKind::Store => "store",
        }
    }
}

impl fmt::Display for LedgerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LedgerKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "probe" => Ok(LedgerKind::Probe),
            "store" => Ok(LedgerKind::Store),
            _ => Err(format!("Invalid ledger backend: {s} (expected probe or store)")),
        }
    }
}

/// Local ledger, dispatching to one backend
#[derive(Debug, Clone)]
pub enum Ledger {
    /// Filesystem probing backend
    Probe(ProbeLedger),
    /// Persisted key-store backend
    Store(StoreLedger),
}

impl Ledger {
    /// Open the backend named by `kind`
    pub fn open(kind: LedgerKind, root_dir: impl Into<PathBuf>, spec: DatasetSpec) -> Self {
        match kind {
            LedgerKind::Probe => Self::probe(root_dir, spec),
            LedgerKind::Store => Self::store(root_dir, spec),
        }
    }

    /// Filesystem probing ledger rooted at `root_dir`
    pub fn probe(root_dir: impl Into<PathBuf>, spec: DatasetSpec) -> Self {
        Ledger::Probe(ProbeLedger::new(root_dir, spec))
    }

    /// Persisted ledger under `{root_dir}/.ledger`
    pub fn store(root_dir: impl Into<PathBuf>, spec: DatasetSpec) -> Self {
        Ledger::Store(StoreLedger::new(root_dir, spec))
    }

    /// Backend in use
    pub fn kind(&self) -> LedgerKind {
        match self {
            Ledger::Probe(_) => LedgerKind::Probe,
            Ledger::Store(_) => LedgerKind::Store,
        }
    }

    /// Whether `partition` of `ticker` is materialized
    pub fn has_data(&self, ticker: &str, partition: Partition) -> LedgerResult<bool> {
        match self {
            Ledger::Probe(ledger) => Ok(ledger.has_data(ticker, partition)),
            Ledger::Store(ledger) => ledger.has_data(ticker, partition),
        }
    }

    /// All materialized dates of `ticker` at `granularity`
    pub fn dates_with_data(
        &self,
        ticker: &str,
        granularity: Granularity,
    ) -> LedgerResult<BTreeSet<NaiveDate>> {
        match self {
            Ledger::Probe(ledger) => ledger.dates_with_data(ticker, granularity),
            Ledger::Store(ledger) => ledger.dates_with_data(ticker, granularity),
        }
    }

    /// Record newly extracted partitions. No-op for the probe backend.
    pub fn record_saved(
        &self,
        ticker: &str,
        granularity: Granularity,
        dates: &[NaiveDate],
    ) -> LedgerResult<()> {
        match self {
            Ledger::Probe(_) => Ok(()),
            Ledger::Store(ledger) => ledger.record_saved(ticker, granularity, dates),
        }
    }

    /// Forget deleted partitions. No-op for the probe backend.
    pub fn prune(&self, ticker: &str, granularity: Granularity, dates: &[NaiveDate]) -> LedgerResult<()> {
        match self {
            Ledger::Probe(_) => Ok(()),
            Ledger::Store(ledger) => ledger.prune(ticker, granularity, dates),
        }
    }

    /// Tickers with at least one materialized partition at `granularity`
    pub fn instruments_with_data(&self, granularity: Granularity) -> LedgerResult<Vec<String>> {
        match self {
            Ledger::Probe(ledger) => ledger.instruments_with_data(granularity),
            Ledger::Store(ledger) => ledger.instruments_with_data(granularity),
        }
    }
}

/// Encode a date as a YYYYMMDD integer
pub fn date_key(date: NaiveDate) -> u32 {
    date.year() as u32 * 10_000 + date.month() * 100 + date.day()
}

/// Decode a YYYYMMDD integer
pub fn key_date(key: u32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt((key / 10_000) as i32, (key / 100) % 100, key % 100)
}

/// Subdirectory name for a dataset inside the ledger root (`um-klines-1h`)
pub(crate) fn dataset_key(spec: &DatasetSpec) -> String {
    match spec.frequency() {
        Some(freq) => format!("{}-{}-{}", spec.asset_class(), spec.data_type(), freq),
        None => format!("{}-{}", spec.asset_class(), spec.data_type()),
    }
}

/// Read directory entries, treating a missing directory as empty
pub(crate) fn read_dir_names(dir: &Path) -> LedgerResult<Vec<(String, bool)>> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(LedgerError::io(dir, e)),
    };

    let mut names = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| LedgerError::io(dir, e))?;
        let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);
        if let Some(name) = entry.file_name().to_str() {
            names.push((name.to_string(), is_dir));
        }
    }
    names.sort();
    Ok(names)
}

//! Persisted key-store ledger
//!
//! One JSON document per ticker at `{root}/.ledger/{dataset key}/{ticker}.json`:
//!
//! ```json
//! {
//!   "schema_version": "1.0.0",
//!   "ticker": "BTCUSDT",
//!   "monthly": [20240101, 20240201],
//!   "daily": [20240301, 20240302],
//!   "updated_at": 1710000000000
//! }
//! ```
//!
//! Every mutation is a locked read-modify-write: an exclusive fd-lock on the
//! sibling `.lock` file, then an atomic temp-file rename.

use super::{dataset_key, date_key, key_date, read_dir_names, LedgerError, LedgerResult};
use crate::dataset::DatasetSpec;
use crate::layout::path::sanitize_symbol;
use crate::{Granularity, Partition};
use chrono::NaiveDate;
use fd_lock::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Current entry schema version
const SCHEMA_VERSION: &str = "1.0.0";

/// Directory under the storage root that holds all ledger documents
pub const LEDGER_DIR_NAME: &str = ".ledger";

/// Maximum accepted entry size (10 MB)
pub const MAX_ENTRY_FILE_SIZE: u64 = 10 * 1024 * 1024;

/// Persisted partitions of one ticker
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    schema_version: String,
    ticker: String,
    #[serde(default)]
    monthly: BTreeSet<u32>,
    #[serde(default)]
    daily: BTreeSet<u32>,
    updated_at: i64,
}

impl LedgerEntry {
    /// Empty entry for `ticker`
    pub fn new(ticker: impl Into<String>) -> Self {
        Self {
            schema_version: SCHEMA_VERSION.to_string(),
            ticker: ticker.into(),
            monthly: BTreeSet::new(),
            daily: BTreeSet::new(),
            updated_at: chrono::Utc::now().timestamp_millis(),
        }
    }

    /// Ticker this entry belongs to
    pub fn ticker(&self) -> &str {
        &self.ticker
    }

    /// YYYYMMDD keys recorded at `granularity`
    pub fn keys(&self, granularity: Granularity) -> &BTreeSet<u32> {
        match granularity {
            Granularity::Monthly => &self.monthly,
            Granularity::Daily => &self.daily,
        }
    }

    fn keys_mut(&mut self, granularity: Granularity) -> &mut BTreeSet<u32> {
        match granularity {
            Granularity::Monthly => &mut self.monthly,
            Granularity::Daily => &mut self.daily,
        }
    }

    /// Decoded dates at `granularity`; malformed keys are skipped
    pub fn dates(&self, granularity: Granularity) -> BTreeSet<NaiveDate> {
        self.keys(granularity)
            .iter()
            .filter_map(|&key| key_date(key))
            .collect()
    }

    fn touch(&mut self) {
        self.updated_at = chrono::Utc::now().timestamp_millis();
    }
}

/// Ledger persisted as one JSON document per ticker
#[derive(Debug, Clone)]
pub struct StoreLedger {
    dir: PathBuf,
}

impl StoreLedger {
    /// Store documents for `spec` under `{root_dir}/.ledger`
    pub fn new(root_dir: impl Into<PathBuf>, spec: DatasetSpec) -> Self {
        let dir = root_dir
            .into()
            .join(LEDGER_DIR_NAME)
            .join(dataset_key(&spec));
        Self { dir }
    }

    /// Directory holding this dataset's documents
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Document path for `ticker`
    pub fn entry_path(&self, ticker: &str) -> PathBuf {
        self.dir.join(format!("{}.json", sanitize_symbol(ticker)))
    }

    /// Load the entry for `ticker` (empty when never written)
    ///
    /// A ticker without a document is answered without touching the disk.
    pub fn load(&self, ticker: &str) -> LedgerResult<LedgerEntry> {
        let path = self.entry_path(ticker);
        if !path.exists() {
            return Ok(LedgerEntry::new(ticker));
        }
        let lock = open_lock(&path)?;
        let _guard = lock
            .read()
            .map_err(|e| LedgerError::Lock(format!("Failed to acquire read lock: {e}")))?;
        read_entry(&path, ticker)
    }

    pub(crate) fn has_data(&self, ticker: &str, partition: Partition) -> LedgerResult<bool> {
        let entry = self.load(ticker)?;
        Ok(entry
            .keys(partition.granularity())
            .contains(&date_key(partition.date())))
    }

    pub(crate) fn dates_with_data(
        &self,
        ticker: &str,
        granularity: Granularity,
    ) -> LedgerResult<BTreeSet<NaiveDate>> {
        Ok(self.load(ticker)?.dates(granularity))
    }

    pub(crate) fn record_saved(
        &self,
        ticker: &str,
        granularity: Granularity,
        dates: &[NaiveDate],
    ) -> LedgerResult<()> {
        if dates.is_empty() {
            return Ok(());
        }
        self.update(ticker, |entry| {
            let keys = entry.keys_mut(granularity);
            for &date in dates {
                keys.insert(date_key(date));
            }
        })
    }

    pub(crate) fn prune(
        &self,
        ticker: &str,
        granularity: Granularity,
        dates: &[NaiveDate],
    ) -> LedgerResult<()> {
        if dates.is_empty() {
            return Ok(());
        }
        self.update(ticker, |entry| {
            let keys = entry.keys_mut(granularity);
            for &date in dates {
                keys.remove(&date_key(date));
            }
        })
    }

    pub(crate) fn instruments_with_data(&self, granularity: Granularity) -> LedgerResult<Vec<String>> {
        let mut tickers = Vec::new();
        for (name, is_dir) in read_dir_names(&self.dir)? {
            if is_dir {
                continue;
            }
            let Some(stem) = name.strip_suffix(".json") else {
                continue;
            };
            let entry = self.load(stem)?;
            if !entry.keys(granularity).is_empty() {
                tickers.push(entry.ticker().to_string());
            }
        }
        Ok(tickers)
    }

    /// Locked read-modify-write of one ticker's document
    fn update<F>(&self, ticker: &str, mutate: F) -> LedgerResult<()>
    where
        F: FnOnce(&mut LedgerEntry),
    {
        std::fs::create_dir_all(&self.dir).map_err(|e| LedgerError::io(&self.dir, e))?;

        let path = self.entry_path(ticker);
        let mut lock = open_lock(&path)?;
        let _guard = lock
            .write()
            .map_err(|e| LedgerError::Lock(format!("Failed to acquire write lock: {e}")))?;

        let mut entry = read_entry(&path, ticker)?;
        mutate(&mut entry);
        entry.touch();
        write_entry(&path, &entry)?;

        debug!(
            ticker = %ticker,
            path = %path.display(),
            monthly = entry.monthly.len(),
            daily = entry.daily.len(),
            "Ledger entry saved"
        );
        Ok(())
    }
}

fn open_lock(path: &Path) -> LedgerResult<RwLock<File>> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| LedgerError::io(parent, e))?;
    }
    let lock_path = path.with_extension("lock");
    let file = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(false)
        .open(&lock_path)
        .map_err(|e| LedgerError::Lock(format!("Failed to create lock file: {e}")))?;
    Ok(RwLock::new(file))
}

/// Read an entry while the caller holds the lock
fn read_entry(path: &Path, ticker: &str) -> LedgerResult<LedgerEntry> {
    let metadata = match std::fs::metadata(path) {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(LedgerEntry::new(ticker)),
        Err(e) => return Err(LedgerError::io(path, e)),
    };
    if metadata.len() > MAX_ENTRY_FILE_SIZE {
        return Err(LedgerError::EntryTooLarge {
            size: metadata.len(),
            max: MAX_ENTRY_FILE_SIZE,
        });
    }

    let contents = std::fs::read_to_string(path).map_err(|e| LedgerError::io(path, e))?;
    let entry: LedgerEntry = serde_json::from_str(&contents).map_err(|e| {
        warn!(path = %path.display(), error = %e, "Failed to deserialize ledger entry");
        LedgerError::Deserialization {
            path: path.to_path_buf(),
            message: e.to_string(),
        }
    })?;

    if entry.schema_version != SCHEMA_VERSION {
        return Err(LedgerError::SchemaVersionMismatch {
            expected: SCHEMA_VERSION.to_string(),
            found: entry.schema_version,
        });
    }
    Ok(entry)
}

/// Atomically replace the entry while the caller holds the write lock
fn write_entry(path: &Path, entry: &LedgerEntry) -> LedgerResult<()> {
    let json = serde_json::to_string_pretty(entry)
        .map_err(|e| LedgerError::Serialization(e.to_string()))?;

    let parent_dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut temp_file =
        tempfile::NamedTempFile::new_in(parent_dir).map_err(|e| LedgerError::io(parent_dir, e))?;

    temp_file
        .write_all(json.as_bytes())
        .map_err(|e| LedgerError::io(path, e))?;
    temp_file
        .flush()
        .map_err(|e| LedgerError::io(path, e))?;
    temp_file
        .as_file()
        .sync_all()
        .map_err(|e| LedgerError::io(path, e))?;

    temp_file
        .persist(path)
        .map_err(|e| LedgerError::io(path, e.error))?;

    // Make the rename durable
    if let Ok(dir) = File::open(parent_dir) {
        let _ = dir.sync_all();
    }
    Ok(())
}

//! In-memory catalog and archive source serving real zip archives

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::{HashMap, HashSet};
use std::io::Write;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use vision_mirror::downloader::{SyncConfig, SyncExecutor};
use vision_mirror::fetcher::{ArchiveSource, FetcherError, FetcherResult, RemoteCatalog};
use vision_mirror::ledger::Ledger;
use vision_mirror::{DatasetSpec, Partition, RemoteResource, ResourceMapper};
use zip::write::SimpleFileOptions;

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn spec(asset_class: &str, data_type: &str, frequency: Option<&str>) -> DatasetSpec {
    DatasetSpec::parse(asset_class, data_type, frequency).unwrap()
}

/// Catalog with a fixed symbol list and bucket listing
#[derive(Default)]
pub struct FakeCatalog {
    symbols: Vec<String>,
    keys: HashMap<String, Vec<String>>,
}

impl FakeCatalog {
    pub fn new(symbols: &[&str]) -> Self {
        Self {
            symbols: symbols.iter().map(|s| s.to_string()).collect(),
            keys: HashMap::new(),
        }
    }

    /// List `partition` of `ticker` in the bucket
    pub fn publish(mut self, mapper: &ResourceMapper, ticker: &str, partition: Partition) -> Self {
        let resource = mapper.resource(ticker, partition);
        self.keys
            .entry(resource.path_suffix().to_string())
            .or_default()
            .push(format!("data/{}/{}", resource.path_suffix(), resource.archive_name()));
        self
    }
}

#[async_trait]
impl RemoteCatalog for FakeCatalog {
    async fn list_instruments(&self) -> FetcherResult<Vec<String>> {
        Ok(self.symbols.clone())
    }

    async fn list_archive_keys(&self, path_suffix: &str) -> FetcherResult<Vec<String>> {
        Ok(self.keys.get(path_suffix).cloned().unwrap_or_default())
    }
}

/// What a [`FakeSource`] was asked for
#[derive(Default)]
pub struct FetchLog {
    requests: Mutex<Vec<String>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl FetchLog {
    fn begin(&self, archive: String) {
        self.requests.lock().unwrap().push(archive);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
    }

    fn end(&self) {
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }

    /// Requested archive names, sorted
    pub fn requests(&self) -> Vec<String> {
        let mut requests = self.requests.lock().unwrap().clone();
        requests.sort();
        requests
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

/// Archive source serving every archive except the configured ones
#[derive(Default)]
pub struct FakeSource {
    missing: HashSet<String>,
    failing: HashSet<String>,
    delay: Option<Duration>,
    log: Arc<FetchLog>,
}

impl FakeSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Respond 404 for this archive name
    pub fn missing(mut self, archive: &str) -> Self {
        self.missing.insert(archive.to_string());
        self
    }

    /// Fail the transfer of this archive name
    pub fn failing(mut self, archive: &str) -> Self {
        self.failing.insert(archive.to_string());
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn log(&self) -> Arc<FetchLog> {
        Arc::clone(&self.log)
    }
}

#[async_trait]
impl ArchiveSource for FakeSource {
    async fn fetch_archive(&self, resource: &RemoteResource, dest: &Path) -> FetcherResult<u64> {
        let archive = resource.archive_name();
        self.log.begin(archive.clone());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let result = if self.failing.contains(&archive) {
            Err(FetcherError::NetworkError("connection reset".to_string()))
        } else if self.missing.contains(&archive) {
            Err(FetcherError::NotFound(archive.clone()))
        } else {
            let bytes = csv_zip(&resource.local_name());
            tokio::fs::write(dest, &bytes)
                .await
                .map(|_| bytes.len() as u64)
                .map_err(|e| FetcherError::IoError(e.to_string()))
        };
        self.log.end();
        result
    }
}

/// Zip archive holding one small CSV named `entry`
pub fn csv_zip(entry: &str) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
    writer.start_file(entry, SimpleFileOptions::default()).unwrap();
    writer
        .write_all(b"1704067200000,42000.1,42100.0,41950.5,42050.2,12.5\n")
        .unwrap();
    writer.finish().unwrap().into_inner()
}

/// Executor over the fakes with progress bars hidden
pub fn executor(
    root: &Path,
    spec: DatasetSpec,
    ledger: Ledger,
    catalog: FakeCatalog,
    source: FakeSource,
) -> SyncExecutor<FakeCatalog, FakeSource> {
    SyncExecutor::new(catalog, source, ledger, root, spec).with_config(SyncConfig::default())
}

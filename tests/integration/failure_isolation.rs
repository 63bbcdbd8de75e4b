//! One failing partition never costs the others

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use vision_mirror::downloader::{SyncExecutor, SyncRequest};
use vision_mirror::fetcher::{ArchiveSource, FetcherResult};
use vision_mirror::ledger::Ledger;
use vision_mirror::{Granularity, Partition, RemoteResource, ResourceMapper};

use super::support::{date, executor, spec, FakeCatalog, FakeSource};

/// Serves archives but overwrites the ledger document once daily fetches start
struct LedgerBreakingSource {
    inner: FakeSource,
    entry: PathBuf,
}

#[async_trait]
impl ArchiveSource for LedgerBreakingSource {
    async fn fetch_archive(&self, resource: &RemoteResource, dest: &Path) -> FetcherResult<u64> {
        if resource.partition().granularity() == Granularity::Daily {
            std::fs::write(&self.entry, b"{broken").unwrap();
        }
        self.inner.fetch_archive(resource, dest).await
    }
}

#[tokio::test]
async fn test_one_of_five_failing_saves_the_other_four() {
    let dir = TempDir::new().unwrap();
    let spec = spec("um", "klines", Some("1h"));
    let mapper = ResourceMapper::new(dir.path(), spec.clone());
    let catalog = FakeCatalog::new(&["BTCUSDT"]).publish(
        &mapper,
        "BTCUSDT",
        Partition::monthly(date(2020, 1, 1)),
    );
    let source = FakeSource::new().failing("BTCUSDT-1h-2024-05-03.zip");
    let log = source.log();
    let ledger = Ledger::store(dir.path(), spec.clone());

    let exec = executor(dir.path(), spec, ledger, catalog, source);
    let request = SyncRequest::default().with_window(Some(date(2024, 5, 1)), Some(date(2024, 5, 6)));
    let stats = exec.run(&request).await.unwrap();

    assert_eq!(log.requests().len(), 5);
    assert_eq!(stats.get("BTCUSDT").unwrap().daily, 4);

    let recorded: Vec<_> = exec
        .ledger()
        .dates_with_data("BTCUSDT", Granularity::Daily)
        .unwrap()
        .into_iter()
        .collect();
    assert_eq!(
        recorded,
        vec![date(2024, 5, 1), date(2024, 5, 2), date(2024, 5, 4), date(2024, 5, 5)]
    );

    let failed = mapper.resource("BTCUSDT", Partition::daily(date(2024, 5, 3)));
    assert!(!failed.local_path().exists());
    assert!(!failed.archive_path().exists());
}

#[tokio::test]
async fn test_unpublished_partition_is_retried_next_run() {
    let dir = TempDir::new().unwrap();
    let spec = spec("um", "klines", Some("1h"));
    let mapper = ResourceMapper::new(dir.path(), spec.clone());
    let catalog = || {
        FakeCatalog::new(&["BTCUSDT"]).publish(&mapper, "BTCUSDT", Partition::monthly(date(2020, 1, 1)))
    };
    let request = SyncRequest::default().with_window(Some(date(2024, 5, 1)), Some(date(2024, 5, 3)));

    let source = FakeSource::new().missing("BTCUSDT-1h-2024-05-02.zip");
    let exec = executor(dir.path(), spec.clone(), Ledger::store(dir.path(), spec.clone()), catalog(), source);
    assert_eq!(exec.run(&request).await.unwrap().get("BTCUSDT").unwrap().daily, 1);

    let source = FakeSource::new();
    let log = source.log();
    let exec = executor(dir.path(), spec.clone(), Ledger::store(dir.path(), spec), catalog(), source);
    assert_eq!(exec.run(&request).await.unwrap().get("BTCUSDT").unwrap().daily, 1);
    assert_eq!(log.requests(), vec!["BTCUSDT-1h-2024-05-02.zip"]);
}

#[tokio::test]
async fn test_each_instrument_is_reported() {
    let dir = TempDir::new().unwrap();
    let spec = spec("spot", "klines", Some("1d"));
    let mapper = ResourceMapper::new(dir.path(), spec.clone());
    let catalog = FakeCatalog::new(&["BTCUSDT", "ETHUSDT", "BTCBUSD", "XRPUSDT"])
        .publish(&mapper, "BTCUSDT", Partition::monthly(date(2020, 1, 1)))
        .publish(&mapper, "ETHUSDT", Partition::monthly(date(2020, 1, 1)))
        .publish(&mapper, "XRPUSDT", Partition::monthly(date(2020, 1, 1)));
    let source = FakeSource::new()
        .missing("ETHUSDT-1d-2024-05-01.zip")
        .missing("ETHUSDT-1d-2024-05-02.zip");

    let exec = executor(dir.path(), spec.clone(), Ledger::store(dir.path(), spec), catalog, source);
    let request = SyncRequest::default()
        .with_excluded(vec!["XRPUSDT".to_string()])
        .with_window(Some(date(2024, 5, 1)), Some(date(2024, 5, 3)));
    let stats = exec.run(&request).await.unwrap();

    let tickers: Vec<_> = stats.instruments().map(|(t, _)| t.to_string()).collect();
    assert_eq!(tickers, vec!["BTCUSDT", "ETHUSDT"]);
    assert_eq!(stats.get("BTCUSDT").unwrap().daily, 2);
    assert!(!stats.get("ETHUSDT").unwrap().has_new_data());
    assert_eq!(
        stats.render(),
        vec![
            "BTCUSDT: new data saved for 0 months 2 days",
            "ETHUSDT: new data saved for 0 months 0 days",
        ]
    );
}

#[tokio::test]
async fn test_daily_failure_keeps_monthly_count() {
    let dir = TempDir::new().unwrap();
    let spec = spec("spot", "klines", Some("1d"));
    let mapper = ResourceMapper::new(dir.path(), spec.clone());
    let catalog = FakeCatalog::new(&["BTCUSDT"]).publish(
        &mapper,
        "BTCUSDT",
        Partition::monthly(date(2023, 6, 1)),
    );
    let source = LedgerBreakingSource {
        inner: FakeSource::new(),
        entry: dir
            .path()
            .join(".ledger")
            .join("spot-klines-1d")
            .join("BTCUSDT.json"),
    };

    let exec = SyncExecutor::new(catalog, source, Ledger::store(dir.path(), spec.clone()), dir.path(), spec);
    let request = SyncRequest::default().with_window(Some(date(2024, 1, 1)), Some(date(2024, 3, 2)));
    let stats = exec.run(&request).await.unwrap();

    let btc = stats.get("BTCUSDT").unwrap();
    assert_eq!((btc.monthly, btc.daily), (2, 0));
    assert_eq!(stats.total_monthly(), 2);
}

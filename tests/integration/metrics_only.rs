//! Datasets without monthly archives run only the daily phase

use tempfile::TempDir;
use vision_mirror::downloader::SyncRequest;
use vision_mirror::ledger::Ledger;
use vision_mirror::{Partition, ResourceMapper};

use super::support::{date, executor, spec, FakeCatalog, FakeSource};

#[tokio::test]
async fn test_metrics_sync_fetches_daily_over_whole_window() {
    let dir = TempDir::new().unwrap();
    let spec = spec("um", "metrics", None);
    let mapper = ResourceMapper::new(dir.path(), spec.clone());
    let catalog = FakeCatalog::new(&["BTCUSDT"]).publish(
        &mapper,
        "BTCUSDT",
        Partition::daily(date(2024, 1, 30)),
    );
    let source = FakeSource::new();
    let log = source.log();

    let exec = executor(dir.path(), spec.clone(), Ledger::store(dir.path(), spec), catalog, source);
    let request = SyncRequest::default().with_window(Some(date(2024, 1, 1)), Some(date(2024, 2, 3)));
    let stats = exec.run(&request).await.unwrap();

    // start clamps to the first published day; no monthly archive is requested
    assert_eq!(
        log.requests(),
        vec![
            "BTCUSDT-metrics-2024-01-30.zip",
            "BTCUSDT-metrics-2024-01-31.zip",
            "BTCUSDT-metrics-2024-02-01.zip",
            "BTCUSDT-metrics-2024-02-02.zip",
        ]
    );
    let btc = stats.get("BTCUSDT").unwrap();
    assert_eq!((btc.monthly, btc.daily), (0, 4));

    let saved = mapper.resource("BTCUSDT", Partition::daily(date(2024, 2, 2)));
    assert!(saved.local_path().ends_with(
        "futures/um/daily/metrics/BTCUSDT/BTCUSDT-metrics-2024-02-02.csv"
    ));
    assert!(saved.local_path().is_file());
}

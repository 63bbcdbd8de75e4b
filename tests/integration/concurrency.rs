//! Worker pool width follows the data type

use std::time::Duration;
use tempfile::TempDir;
use vision_mirror::downloader::{SyncConfig, SyncRequest};
use vision_mirror::ledger::Ledger;
use vision_mirror::{Partition, ResourceMapper};

use super::support::{date, executor, spec, FakeCatalog, FakeSource};

async fn max_in_flight(data_type: &str, frequency: Option<&str>, config: SyncConfig) -> usize {
    let dir = TempDir::new().unwrap();
    let spec = spec("spot", data_type, frequency);
    let mapper = ResourceMapper::new(dir.path(), spec.clone());
    let catalog = FakeCatalog::new(&["BTCUSDT"]).publish(
        &mapper,
        "BTCUSDT",
        Partition::monthly(date(2020, 1, 1)),
    );
    let source = FakeSource::new().with_delay(Duration::from_millis(20));
    let log = source.log();

    let exec = executor(dir.path(), spec.clone(), Ledger::store(dir.path(), spec), catalog, source)
        .with_config(config);
    let request = SyncRequest::default().with_window(Some(date(2024, 5, 1)), Some(date(2024, 5, 9)));
    let stats = exec.run(&request).await.unwrap();
    assert_eq!(stats.get("BTCUSDT").unwrap().daily, 8);

    log.max_in_flight()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_bulk_archives_are_fetched_one_at_a_time() {
    assert_eq!(max_in_flight("trades", None, SyncConfig::default()).await, 1);
    assert_eq!(max_in_flight("aggTrades", None, SyncConfig::default()).await, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_regular_archives_respect_configured_width() {
    let config = SyncConfig {
        concurrency: 3,
        ..SyncConfig::default()
    };
    let observed = max_in_flight("klines", Some("1m"), config).await;
    assert!(observed <= 3, "observed {observed} concurrent fetches");
    assert!(observed >= 2, "expected parallel fetches, observed {observed}");
}

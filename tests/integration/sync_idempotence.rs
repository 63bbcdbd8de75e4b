//! Repeated syncs fetch only what is missing

use tempfile::TempDir;
use vision_mirror::downloader::SyncRequest;
use vision_mirror::ledger::Ledger;
use vision_mirror::{Granularity, Partition, ResourceMapper};

use super::support::{date, executor, spec, FakeCatalog, FakeSource};

fn request() -> SyncRequest {
    SyncRequest::default()
        .with_tickers(vec!["BTCUSDT".to_string()])
        .with_window(Some(date(2024, 1, 1)), Some(date(2024, 3, 4)))
}

fn catalog(mapper: &ResourceMapper) -> FakeCatalog {
    FakeCatalog::new(&["BTCUSDT", "ETHUSDT", "BTCBUSD"]).publish(
        mapper,
        "BTCUSDT",
        Partition::monthly(date(2023, 6, 1)),
    )
}

async fn assert_second_run_is_noop(ledger: Ledger, dir: &TempDir) {
    let spec = spec("spot", "klines", Some("1d"));
    let mapper = ResourceMapper::new(dir.path(), spec.clone());

    let first_source = FakeSource::new();
    let first_log = first_source.log();
    let first = executor(dir.path(), spec.clone(), ledger.clone(), catalog(&mapper), first_source);
    let stats = first.run(&request()).await.unwrap();

    let btc = stats.get("BTCUSDT").unwrap();
    assert_eq!(btc.monthly, 2);
    assert_eq!(btc.daily, 3);
    assert_eq!(
        first_log.requests(),
        vec![
            "BTCUSDT-1d-2024-01.zip",
            "BTCUSDT-1d-2024-02.zip",
            "BTCUSDT-1d-2024-03-01.zip",
            "BTCUSDT-1d-2024-03-02.zip",
            "BTCUSDT-1d-2024-03-03.zip",
        ]
    );
    for partition in [
        Partition::monthly(date(2024, 2, 1)),
        Partition::daily(date(2024, 3, 3)),
    ] {
        let resource = mapper.resource("BTCUSDT", partition);
        assert!(resource.local_path().is_file());
        assert!(!resource.archive_path().exists());
    }

    let second_source = FakeSource::new();
    let second_log = second_source.log();
    let second = executor(dir.path(), spec, ledger, catalog(&mapper), second_source);
    let stats = second.run(&request()).await.unwrap();

    let btc = stats.get("BTCUSDT").unwrap();
    assert_eq!((btc.monthly, btc.daily), (0, 0));
    assert!(second_log.requests().is_empty());
}

#[tokio::test]
async fn test_second_sync_is_noop_with_store_ledger() {
    let dir = TempDir::new().unwrap();
    let ledger = Ledger::store(dir.path(), spec("spot", "klines", Some("1d")));
    assert_second_run_is_noop(ledger, &dir).await;
}

#[tokio::test]
async fn test_second_sync_is_noop_with_probe_ledger() {
    let dir = TempDir::new().unwrap();
    let ledger = Ledger::probe(dir.path(), spec("spot", "klines", Some("1d")));
    assert_second_run_is_noop(ledger, &dir).await;
}

#[tokio::test]
async fn test_only_missing_partitions_are_dispatched() {
    let dir = TempDir::new().unwrap();
    let spec = spec("spot", "klines", Some("1d"));
    let mapper = ResourceMapper::new(dir.path(), spec.clone());
    let ledger = Ledger::store(dir.path(), spec.clone());
    ledger
        .record_saved(
            "BTCUSDT",
            Granularity::Daily,
            &[date(2024, 3, 1), date(2024, 3, 2)],
        )
        .unwrap();

    let source = FakeSource::new();
    let log = source.log();
    let exec = executor(dir.path(), spec, ledger, catalog(&mapper), source);
    let request = SyncRequest::default()
        .with_tickers(vec!["BTCUSDT".to_string()])
        .with_window(Some(date(2024, 3, 1)), Some(date(2024, 3, 4)));
    let stats = exec.run(&request).await.unwrap();

    assert_eq!(log.requests(), vec!["BTCUSDT-1d-2024-03-03.zip"]);
    assert_eq!(stats.get("BTCUSDT").unwrap().daily, 1);
}

#[tokio::test]
async fn test_force_refetches_recorded_partitions() {
    let dir = TempDir::new().unwrap();
    let spec = spec("spot", "klines", Some("1d"));
    let mapper = ResourceMapper::new(dir.path(), spec.clone());
    let ledger = Ledger::store(dir.path(), spec.clone());
    ledger
        .record_saved("BTCUSDT", Granularity::Daily, &[date(2024, 3, 1)])
        .unwrap();

    let source = FakeSource::new();
    let log = source.log();
    let exec = executor(dir.path(), spec, ledger, catalog(&mapper), source);
    let request = SyncRequest::default()
        .with_tickers(vec!["BTCUSDT".to_string()])
        .with_window(Some(date(2024, 3, 1)), Some(date(2024, 3, 3)))
        .with_force(true);
    exec.run(&request).await.unwrap();

    assert_eq!(
        log.requests(),
        vec!["BTCUSDT-1d-2024-03-01.zip", "BTCUSDT-1d-2024-03-02.zip"]
    );
}

#[tokio::test]
async fn test_start_is_clamped_to_earliest_published_month() {
    let dir = TempDir::new().unwrap();
    let spec = spec("spot", "klines", Some("1d"));
    let mapper = ResourceMapper::new(dir.path(), spec.clone());
    let catalog = FakeCatalog::new(&["NEWUSDT"]).publish(
        &mapper,
        "NEWUSDT",
        Partition::monthly(date(2024, 2, 1)),
    );

    let source = FakeSource::new();
    let log = source.log();
    let exec = executor(dir.path(), spec.clone(), Ledger::store(dir.path(), spec), catalog, source);
    let request = SyncRequest::default().with_window(Some(date(2023, 1, 1)), Some(date(2024, 3, 1)));
    let stats = exec.run(&request).await.unwrap();

    assert_eq!(log.requests(), vec!["NEWUSDT-1d-2024-02.zip"]);
    assert_eq!(stats.get("NEWUSDT").unwrap().monthly, 1);
}

#[tokio::test]
async fn test_daily_phase_starts_at_first_of_end_month() {
    let dir = TempDir::new().unwrap();
    let spec = spec("spot", "klines", Some("1d"));
    let mapper = ResourceMapper::new(dir.path(), spec.clone());

    let source = FakeSource::new();
    let log = source.log();
    let exec = executor(dir.path(), spec.clone(), Ledger::store(dir.path(), spec), catalog(&mapper), source);
    let request = SyncRequest::default()
        .with_tickers(vec!["BTCUSDT".to_string()])
        .with_window(Some(date(2024, 3, 2)), Some(date(2024, 3, 4)));
    let stats = exec.run(&request).await.unwrap();

    assert_eq!(
        log.requests(),
        vec![
            "BTCUSDT-1d-2024-03-01.zip",
            "BTCUSDT-1d-2024-03-02.zip",
            "BTCUSDT-1d-2024-03-03.zip",
        ]
    );
    let btc = stats.get("BTCUSDT").unwrap();
    assert_eq!((btc.monthly, btc.daily), (0, 3));
}

//! Daily files give way to the monthly archive covering them

use tempfile::TempDir;
use vision_mirror::downloader::SyncRequest;
use vision_mirror::ledger::Ledger;
use vision_mirror::reconcile::{ReconcileSummary, Reconciler};
use vision_mirror::{Granularity, Partition, ResourceMapper};

use super::support::{date, executor, spec, FakeCatalog, FakeSource};

#[tokio::test]
async fn test_month_rollover_then_reconcile() {
    let dir = TempDir::new().unwrap();
    let spec = spec("um", "klines", Some("1d"));
    let mapper = ResourceMapper::new(dir.path(), spec.clone());
    let catalog = || {
        FakeCatalog::new(&["BTCUSDT"]).publish(&mapper, "BTCUSDT", Partition::monthly(date(2024, 1, 1)))
    };
    let ledger = Ledger::store(dir.path(), spec.clone());

    // early February: January as a monthly archive, then three February days
    let exec = executor(dir.path(), spec.clone(), ledger.clone(), catalog(), FakeSource::new());
    let request = SyncRequest::default().with_window(None, Some(date(2024, 2, 4)));
    let stats = exec.run(&request).await.unwrap();
    let btc = stats.get("BTCUSDT").unwrap();
    assert_eq!((btc.monthly, btc.daily), (1, 3));

    // after the month closes the February archive arrives
    let exec = executor(dir.path(), spec.clone(), ledger.clone(), catalog(), FakeSource::new());
    let request = SyncRequest::default().with_window(None, Some(date(2024, 3, 1)));
    let stats = exec.run(&request).await.unwrap();
    let btc = stats.get("BTCUSDT").unwrap();
    assert_eq!((btc.monthly, btc.daily), (1, 0));

    let reconciler = Reconciler::new(ledger.clone(), mapper.clone());
    let summary = reconciler.reconcile().unwrap();
    assert_eq!(summary, ReconcileSummary { instruments: 1, deleted: 3, failed: 0 });

    assert!(ledger
        .dates_with_data("BTCUSDT", Granularity::Daily)
        .unwrap()
        .is_empty());
    assert_eq!(ledger.dates_with_data("BTCUSDT", Granularity::Monthly).unwrap().len(), 2);
    for day in 1..=3 {
        let resource = mapper.resource("BTCUSDT", Partition::daily(date(2024, 2, day)));
        assert!(!resource.local_path().exists());
    }
}

#[tokio::test]
async fn test_reconcile_keeps_days_without_monthly_archive() {
    let dir = TempDir::new().unwrap();
    let spec = spec("spot", "klines", Some("1d"));
    let mapper = ResourceMapper::new(dir.path(), spec.clone());
    let ledger = Ledger::probe(dir.path(), spec.clone());
    let catalog = FakeCatalog::new(&["BTCUSDT"]).publish(
        &mapper,
        "BTCUSDT",
        Partition::monthly(date(2024, 1, 1)),
    );

    let exec = executor(dir.path(), spec, ledger.clone(), catalog, FakeSource::new());
    let request = SyncRequest::default().with_window(Some(date(2024, 2, 1)), Some(date(2024, 2, 3)));
    exec.run(&request).await.unwrap();

    let summary = Reconciler::new(ledger.clone(), mapper).reconcile().unwrap();
    assert_eq!(summary, ReconcileSummary::default());
    assert_eq!(ledger.dates_with_data("BTCUSDT", Granularity::Daily).unwrap().len(), 2);
}

//! Checks against the live Binance endpoints

use vision_mirror::dataset::AssetClass;
use vision_mirror::fetcher::archive::VisionArchiveSource;
use vision_mirror::fetcher::catalog::BinanceCatalog;
use vision_mirror::fetcher::{ArchiveSource, RemoteCatalog};
use vision_mirror::{Partition, ResourceMapper};

use super::support::{date, spec};

#[tokio::test]
#[ignore] // Requires network access
async fn test_live_spot_instruments_include_btcusdt() {
    let catalog = BinanceCatalog::new(AssetClass::Spot);
    let symbols = catalog.list_instruments().await.unwrap();
    assert!(symbols.iter().any(|s| s == "BTCUSDT"));
}

#[tokio::test]
#[ignore] // Requires network access
async fn test_live_monthly_listing_starts_in_2017() {
    let spec = spec("spot", "klines", Some("1d"));
    let mapper = ResourceMapper::new("unused", spec);
    let catalog = BinanceCatalog::new(AssetClass::Spot);
    let keys = catalog
        .list_archive_keys(&mapper.path_suffix(vision_mirror::Granularity::Monthly, "BTCUSDT"))
        .await
        .unwrap();
    let earliest = vision_mirror::fetcher::listing::earliest_key_date(
        &keys,
        vision_mirror::Granularity::Monthly,
    );
    assert_eq!(earliest, Some(date(2017, 8, 1)));
}

#[tokio::test]
#[ignore] // Requires network access
async fn test_live_archive_download_with_checksum() {
    let dir = tempfile::TempDir::new().unwrap();
    let mapper = ResourceMapper::new(dir.path(), spec("spot", "klines", Some("1d")));
    let resource = mapper.resource("BTCUSDT", Partition::monthly(date(2024, 1, 1)));
    std::fs::create_dir_all(resource.local_dir()).unwrap();

    let source = VisionArchiveSource::new().with_checksum_verification(true);
    let bytes = source
        .fetch_archive(&resource, &resource.archive_path())
        .await
        .unwrap();
    assert!(bytes > 0);
}

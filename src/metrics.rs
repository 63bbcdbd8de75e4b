//! Observability metrics for the archive mirror
//!
//! ## Architecture
//!
//! - Uses `metrics` crate for low-overhead metric collection
//! - Optional Prometheus exporter for a scrape endpoint (`--metrics-addr`)
//! - Recording is a no-op until an exporter is installed
//!
//! ## Metrics
//!
//! | name | kind | labels |
//! |------|------|--------|
//! | `partitions_saved_total` | counter | `data_type`, `granularity` |
//! | `partitions_skipped_total` | counter | `data_type`, `granularity` |
//! | `daily_files_pruned_total` | counter | `data_type` |
//! | `catalog_requests_total` | counter | `endpoint`, `status` |
//! | `archive_fetch_duration_seconds` | histogram | `granularity` |

use metrics::{counter, describe_counter, describe_histogram, histogram, Unit};
use metrics_exporter_prometheus::PrometheusBuilder;
use once_cell::sync::Lazy;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::Granularity;

/// Global metrics registry initialization flag
static METRICS_INITIALIZED: Lazy<Arc<RwLock<bool>>> = Lazy::new(|| Arc::new(RwLock::new(false)));

/// Initialize metrics system with Prometheus exporter
///
/// Idempotent: later calls are ignored once an exporter is installed.
///
/// # Arguments
/// * `addr` - Socket address to bind Prometheus scrape endpoint (e.g., "0.0.0.0:9090")
pub async fn init_metrics(addr: SocketAddr) -> Result<(), Box<dyn std::error::Error>> {
    let mut initialized = METRICS_INITIALIZED.write().await;
    if *initialized {
        debug!("Metrics already initialized, skipping");
        return Ok(());
    }

    info!("Initializing metrics system on {}", addr);

    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| format!("Failed to install Prometheus exporter: {e}"))?;

    describe_counter!(
        "partitions_saved_total",
        Unit::Count,
        "Archive partitions downloaded and extracted"
    );

    describe_counter!(
        "partitions_skipped_total",
        Unit::Count,
        "Archive partitions that were missing remotely or failed to extract"
    );

    describe_counter!(
        "daily_files_pruned_total",
        Unit::Count,
        "Daily files deleted because their monthly archive is present"
    );

    describe_counter!(
        "catalog_requests_total",
        Unit::Count,
        "Requests made to exchange metadata and bucket listing endpoints"
    );

    describe_histogram!(
        "archive_fetch_duration_seconds",
        Unit::Seconds,
        "Time to download and extract one archive"
    );

    *initialized = true;
    info!("Metrics system initialized successfully on {}", addr);
    Ok(())
}

/// Check if metrics system is initialized
pub async fn is_initialized() -> bool {
    *METRICS_INITIALIZED.read().await
}

/// Record one catalog request outcome
///
/// `status` is the HTTP status code, or `None` for a network error.
pub fn record_catalog_request(endpoint: &str, status: Option<u16>) {
    let status = status
        .map(|code| code.to_string())
        .unwrap_or_else(|| "network_error".to_string());
    counter!(
        "catalog_requests_total",
        "endpoint" => endpoint.to_string(),
        "status" => status,
    )
    .increment(1);
}

/// Record daily files removed by reconciliation
pub fn record_daily_pruned(data_type: &str, count: u64) {
    if count == 0 {
        return;
    }
    counter!(
        "daily_files_pruned_total",
        "data_type" => data_type.to_string(),
    )
    .increment(count);
}

/// Timer around a single archive fetch
pub struct ArchiveFetchMetrics {
    data_type: &'static str,
    granularity: Granularity,
    start_time: Instant,
}

impl ArchiveFetchMetrics {
    /// Start timing a fetch
    pub fn start(data_type: &'static str, granularity: Granularity) -> Self {
        Self {
            data_type,
            granularity,
            start_time: Instant::now(),
        }
    }

    /// Record a saved partition
    pub fn record_saved(&self) {
        self.record_duration();
        counter!(
            "partitions_saved_total",
            "data_type" => self.data_type,
            "granularity" => self.granularity.as_str(),
        )
        .increment(1);
    }

    /// Record a skipped partition
    pub fn record_skipped(&self) {
        self.record_duration();
        counter!(
            "partitions_skipped_total",
            "data_type" => self.data_type,
            "granularity" => self.granularity.as_str(),
        )
        .increment(1);
    }

    fn record_duration(&self) {
        histogram!(
            "archive_fetch_duration_seconds",
            "granularity" => self.granularity.as_str(),
        )
        .record(self.start_time.elapsed().as_secs_f64());
    }
}

//! # Vision Mirror Library
//!
//! Incremental, idempotent mirror of the Binance Vision historical market-data
//! archive (<https://data.binance.vision>) onto local storage.
//!
//! ## Features
//!
//! - **Dataset validation**: asset class / data type / frequency combinations are checked up front
//! - **Incremental sync**: only partitions missing from the local ledger are fetched
//! - **Two ledger backends**: filesystem probing or a persisted per-ticker JSON store
//! - **Bounded concurrency**: small archives in parallel, bulk trade archives one at a time
//! - **Retention**: daily files are removed once the monthly archive covering them is local
//!
//! ## Quick Start
//!
//! ```no_run
//! use vision_mirror::dataset::{AssetClass, DataType, DatasetSpec};
//! use vision_mirror::downloader::{SyncExecutor, SyncRequest};
//! use vision_mirror::fetcher::{archive::VisionArchiveSource, catalog::BinanceCatalog};
//! use vision_mirror::ledger::Ledger;
//! use vision_mirror::Frequency;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let spec = DatasetSpec::new(AssetClass::Spot, DataType::Klines, Some(Frequency::OneMinute))?;
//! let catalog = BinanceCatalog::new(spec.asset_class());
//! let source = VisionArchiveSource::new();
//! let ledger = Ledger::store("./data", spec.clone());
//!
//! let executor = SyncExecutor::new(catalog, source, ledger, "./data", spec);
//! let request = SyncRequest::default().with_tickers(vec!["BTCUSDT".to_string()]);
//! let stats = executor.run(&request).await?;
//! stats.report();
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - [`dataset`] - Dataset specification and validation
//! - [`layout`] - Remote/local path mapping and date range planning
//! - [`ledger`] - Tracking of locally materialized partitions
//! - [`fetcher`] - Remote catalog and archive transport
//! - [`universe`] - Instrument selection
//! - [`downloader`] - Fetch-and-extract worker and sync orchestration
//! - [`reconcile`] - Daily to monthly retention
//! - [`stats`] - Per-run statistics

#![warn(missing_docs)]
#![warn(clippy::all)]

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// CLI command implementations
pub mod cli;

/// Dataset specification and validation
pub mod dataset;

/// Fetch-and-extract worker and sync orchestration
pub mod downloader;

/// Remote catalog and archive transport
pub mod fetcher;

/// Path mapping and date range planning
pub mod layout;

/// Local partition ledger
pub mod ledger;

/// Metrics recording
pub mod metrics;

/// Daily to monthly retention
pub mod reconcile;

/// Ctrl+C stop flag checked between instruments
pub mod shutdown;

/// Per-run download statistics
pub mod stats;

/// Instrument universe resolution
pub mod universe;

pub use dataset::{AssetClass, DataType, DatasetError, DatasetSpec};
pub use layout::path::{RemoteResource, ResourceMapper};

/// Bar width of frequency-bearing archives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Frequency {
    /// 1 minute
    #[serde(rename = "1m")]
    OneMinute,
    /// 3 minutes
    #[serde(rename = "3m")]
    ThreeMinutes,
    /// 5 minutes
    #[serde(rename = "5m")]
    FiveMinutes,
    /// 15 minutes
    #[serde(rename = "15m")]
    FifteenMinutes,
    /// 30 minutes
    #[serde(rename = "30m")]
    ThirtyMinutes,
    /// 1 hour
    #[serde(rename = "1h")]
    OneHour,
    /// 2 hours
    #[serde(rename = "2h")]
    TwoHours,
    /// 4 hours
    #[serde(rename = "4h")]
    FourHours,
    /// 6 hours
    #[serde(rename = "6h")]
    SixHours,
    /// 8 hours
    #[serde(rename = "8h")]
    EightHours,
    /// 12 hours
    #[serde(rename = "12h")]
    TwelveHours,
    /// 1 day
    #[serde(rename = "1d")]
    OneDay,
    /// 3 days
    #[serde(rename = "3d")]
    ThreeDays,
    /// 1 week
    #[serde(rename = "1w")]
    OneWeek,
    /// 1 month (Binance Vision names it "1mo")
    #[serde(rename = "1mo")]
    OneMonth,
}

impl Frequency {
    /// All frequencies published on Binance Vision
    pub const ALL: [Frequency; 15] = [
        Frequency::OneMinute,
        Frequency::ThreeMinutes,
        Frequency::FiveMinutes,
        Frequency::FifteenMinutes,
        Frequency::ThirtyMinutes,
        Frequency::OneHour,
        Frequency::TwoHours,
        Frequency::FourHours,
        Frequency::SixHours,
        Frequency::EightHours,
        Frequency::TwelveHours,
        Frequency::OneDay,
        Frequency::ThreeDays,
        Frequency::OneWeek,
        Frequency::OneMonth,
    ];

    /// Path and filename token for this frequency
    pub fn as_str(&self) -> &'static str {
        match self {
            Frequency::OneMinute => "1m",
            Frequency::ThreeMinutes => "3m",
            Frequency::FiveMinutes => "5m",
            Frequency::FifteenMinutes => "15m",
            Frequency::ThirtyMinutes => "30m",
            Frequency::OneHour => "1h",
            Frequency::TwoHours => "2h",
            Frequency::FourHours => "4h",
            Frequency::SixHours => "6h",
            Frequency::EightHours => "8h",
            Frequency::TwelveHours => "12h",
            Frequency::OneDay => "1d",
            Frequency::ThreeDays => "3d",
            Frequency::OneWeek => "1w",
            Frequency::OneMonth => "1mo",
        }
    }
}

impl std::fmt::Display for Frequency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Frequency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Frequency::ALL
            .iter()
            .copied()
            .find(|freq| freq.as_str() == s)
            .ok_or_else(|| format!("Invalid frequency: {s}"))
    }
}

/// Archive partition width
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    /// One archive per calendar month
    Monthly,
    /// One archive per calendar day
    Daily,
}

impl Granularity {
    /// Path token ("monthly" / "daily")
    pub fn as_str(&self) -> &'static str {
        match self {
            Granularity::Monthly => "monthly",
            Granularity::Daily => "daily",
        }
    }

    /// Date format used in archive filenames
    pub fn date_format(&self) -> &'static str {
        match self {
            Granularity::Monthly => "%Y-%m",
            Granularity::Daily => "%Y-%m-%d",
        }
    }
}

impl std::fmt::Display for Granularity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Granularity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "monthly" => Ok(Granularity::Monthly),
            "daily" => Ok(Granularity::Daily),
            _ => Err(format!("Invalid granularity: {s}")),
        }
    }
}

/// One archive file's worth of data for a ticker
///
/// Monthly partitions are always keyed by the first day of their month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Partition {
    granularity: Granularity,
    date: NaiveDate,
}

impl Partition {
    /// Create a partition, normalizing monthly dates to the first of the month
    pub fn new(granularity: Granularity, date: NaiveDate) -> Self {
        let date = match granularity {
            Granularity::Monthly => layout::calendar::first_of_month(date),
            Granularity::Daily => date,
        };
        Self { granularity, date }
    }

    /// Monthly partition containing `date`
    pub fn monthly(date: NaiveDate) -> Self {
        Self::new(Granularity::Monthly, date)
    }

    /// Daily partition for `date`
    pub fn daily(date: NaiveDate) -> Self {
        Self::new(Granularity::Daily, date)
    }

    /// Partition width
    pub fn granularity(&self) -> Granularity {
        self.granularity
    }

    /// Partition key date
    pub fn date(&self) -> NaiveDate {
        self.date
    }

    /// Date as it appears in archive filenames ("2024-03" or "2024-03-05")
    pub fn date_token(&self) -> String {
        self.date.format(self.granularity.date_format()).to_string()
    }
}

//! Resource path mapping
//!
//! Maps a (dataset, ticker, partition) triple onto the remote archive URL and
//! the local directory/filename it is extracted to.
//!
//! # Usage Example
//!
//! ```rust
//! use chrono::NaiveDate;
//! use vision_mirror::dataset::DatasetSpec;
//! use vision_mirror::layout::ResourceMapper;
//! use vision_mirror::Partition;
//!
//! let spec = DatasetSpec::parse("spot", "klines", Some("1m")).unwrap();
//! let mapper = ResourceMapper::new("data", spec);
//! let partition = Partition::monthly(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
//!
//! let resource = mapper.resource("BTCUSDT", partition);
//! assert_eq!(resource.path_suffix(), "spot/monthly/klines/BTCUSDT/1m");
//! assert_eq!(resource.archive_name(), "BTCUSDT-1m-2024-03.zip");
//! // Local: data/spot/monthly/klines/BTCUSDT/1m/BTCUSDT-1m-2024-03.csv
//! ```

use crate::dataset::DatasetSpec;
use crate::{Granularity, Partition};
use chrono::NaiveDate;
use std::path::{Path, PathBuf};

/// Extension of remote archives
pub const ARCHIVE_EXTENSION: &str = "zip";

/// Extension of decoded local files
pub const LOCAL_EXTENSION: &str = "csv";

/// Everything needed to fetch one partition and find it locally
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteResource {
    ticker: String,
    partition: Partition,
    path_suffix: String,
    file_stem: String,
    local_dir: PathBuf,
}

impl RemoteResource {
    /// Ticker this resource belongs to
    pub fn ticker(&self) -> &str {
        &self.ticker
    }

    /// Partition this resource covers
    pub fn partition(&self) -> Partition {
        self.partition
    }

    /// Remote path below the data root, without leading or trailing slash
    pub fn path_suffix(&self) -> &str {
        &self.path_suffix
    }

    /// Filename without extension (`BTCUSDT-1m-2024-03`)
    pub fn file_stem(&self) -> &str {
        &self.file_stem
    }

    /// Remote archive filename
    pub fn archive_name(&self) -> String {
        format!("{}.{ARCHIVE_EXTENSION}", self.file_stem)
    }

    /// Local decoded filename
    pub fn local_name(&self) -> String {
        format!("{}.{LOCAL_EXTENSION}", self.file_stem)
    }

    /// Directory the archive is downloaded to and extracted into
    pub fn local_dir(&self) -> &Path {
        &self.local_dir
    }

    /// Where the downloaded archive is written before extraction
    pub fn archive_path(&self) -> PathBuf {
        self.local_dir.join(self.archive_name())
    }

    /// Expected local decoded file
    pub fn local_path(&self) -> PathBuf {
        self.local_dir.join(self.local_name())
    }

    /// Full archive URL below `base_url` (`https://data.binance.vision/data`)
    pub fn url(&self, base_url: &str) -> String {
        format!(
            "{}/{}/{}",
            base_url.trim_end_matches('/'),
            self.path_suffix,
            self.archive_name()
        )
    }
}

/// Deterministic mapper bound to one storage root and dataset
#[derive(Debug, Clone)]
pub struct ResourceMapper {
    root_dir: PathBuf,
    spec: DatasetSpec,
}

impl ResourceMapper {
    /// Create a mapper rooted at `root_dir`
    pub fn new(root_dir: impl Into<PathBuf>, spec: DatasetSpec) -> Self {
        Self {
            root_dir: root_dir.into(),
            spec,
        }
    }

    /// Storage root
    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    /// Dataset this mapper serves
    pub fn spec(&self) -> &DatasetSpec {
        &self.spec
    }

    /// Remote suffix for a ticker's directory of `granularity` archives
    ///
    /// Order is fixed: `[futures/]{asset_class}/{granularity}/{data_type}/{ticker}/[{frequency}]`
    pub fn path_suffix(&self, granularity: Granularity, ticker: &str) -> String {
        let mut parts: Vec<&str> = Vec::with_capacity(6);
        if self.spec.asset_class().is_futures() {
            parts.push("futures");
        }
        parts.push(self.spec.asset_class().as_str());
        parts.push(granularity.as_str());
        parts.push(self.spec.data_type().as_str());
        parts.push(ticker);
        if let Some(freq) = self.spec.frequency() {
            parts.push(freq.as_str());
        }
        parts.join("/")
    }

    /// Directory holding every ticker for `granularity`
    /// (`{root}/[futures/]{asset_class}/{granularity}/{data_type}`)
    pub fn dataset_dir(&self, granularity: Granularity) -> PathBuf {
        let mut dir = self.root_dir.clone();
        if self.spec.asset_class().is_futures() {
            dir.push("futures");
        }
        dir.push(self.spec.asset_class().as_str());
        dir.push(granularity.as_str());
        dir.push(self.spec.data_type().as_str());
        dir
    }

    /// Local directory for a ticker's `granularity` files
    pub fn local_dir(&self, granularity: Granularity, ticker: &str) -> PathBuf {
        let mut dir = self.dataset_dir(granularity);
        dir.push(sanitize_symbol(ticker));
        if let Some(freq) = self.spec.frequency() {
            dir.push(freq.as_str());
        }
        dir
    }

    /// Filename stem as published on the server
    ///
    /// The ticker is sanitized the same way as in [`Self::local_dir`].
    pub fn file_stem(&self, ticker: &str, partition: Partition) -> String {
        format!(
            "{}-{}-{}",
            sanitize_symbol(ticker),
            self.spec.file_tag(),
            partition.date_token()
        )
    }

    /// Map one partition to its remote and local locations
    pub fn resource(&self, ticker: &str, partition: Partition) -> RemoteResource {
        RemoteResource {
            ticker: ticker.to_string(),
            partition,
            path_suffix: self.path_suffix(partition.granularity(), ticker),
            file_stem: self.file_stem(ticker, partition),
            local_dir: self.local_dir(partition.granularity(), ticker),
        }
    }

    /// Recover the partition date from a local or remote filename
    ///
    /// Accepts `{ticker}-{tag}-{date}.{ext}` for this mapper's dataset and
    /// returns `None` for anything else (other tickers, checksum files, ...).
    pub fn parse_file_date(
        &self,
        ticker: &str,
        granularity: Granularity,
        file_name: &str,
        extension: &str,
    ) -> Option<NaiveDate> {
        let prefix = format!("{}-{}-", sanitize_symbol(ticker), self.spec.file_tag());
        let token = file_name
            .strip_prefix(&prefix)?
            .strip_suffix(extension)?
            .strip_suffix('.')?;
        parse_date_token(token, granularity)
    }
}

/// Parse "2024-03" (monthly) or "2024-03-05" (daily)
pub fn parse_date_token(token: &str, granularity: Granularity) -> Option<NaiveDate> {
    match granularity {
        Granularity::Monthly => {
            NaiveDate::parse_from_str(&format!("{token}-01"), "%Y-%m-%d").ok()
        }
        Granularity::Daily => NaiveDate::parse_from_str(token, "%Y-%m-%d").ok(),
    }
}

/// Sanitize a ticker before it becomes part of a local path
///
/// Replaces `/`, `\`, `:` and `..` so a hostile catalog entry cannot escape
/// the storage root. Exchange symbols never contain these characters.
pub(crate) fn sanitize_symbol(name: &str) -> String {
    name.replace("..", "__").replace(['/', '\\', ':'], "_")
}

//! Sync request parameters

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// What a sync run should cover
///
/// `start`/`end` of `None` mean "from the earliest archive" and "until today".
/// `end` is exclusive: the last partition considered is the day before it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncRequest {
    /// Allow-list; empty selects every `USDT` symbol
    #[serde(default)]
    pub tickers: Vec<String>,
    /// Deny-list applied after selection
    #[serde(default)]
    pub excluded: Vec<String>,
    /// First date of interest
    pub start: Option<NaiveDate>,
    /// Exclusive end date
    pub end: Option<NaiveDate>,
    /// Re-fetch partitions the ledger already has
    #[serde(default)]
    pub force: bool,
    /// Cap on the number of instruments processed
    pub max_instruments: Option<usize>,
}

impl SyncRequest {
    /// Restrict to `tickers`
    pub fn with_tickers(mut self, tickers: Vec<String>) -> Self {
        self.tickers = tickers;
        self
    }

    /// Exclude `tickers`
    pub fn with_excluded(mut self, excluded: Vec<String>) -> Self {
        self.excluded = excluded;
        self
    }

    /// Set the date window
    pub fn with_window(mut self, start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        self.start = start;
        self.end = end;
        self
    }

    /// Enable or disable forced re-fetch
    pub fn with_force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    /// Cap the number of instruments
    pub fn with_max_instruments(mut self, max_instruments: Option<usize>) -> Self {
        self.max_instruments = max_instruments;
        self
    }
}

//! Per-run download statistics
//!
//! [`DumpStatistics`] is an explicit accumulator returned by
//! [`crate::downloader::SyncExecutor::run`]. It is never persisted.

use serde::Serialize;
use std::collections::HashMap;
use tracing::info;

use crate::downloader::config::{STATS_FULL_REPORT_THRESHOLD, STATS_MOST_COMMON};

/// New partitions saved for one instrument in this run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct InstrumentStats {
    /// Monthly archives saved
    pub monthly: usize,
    /// Daily archives saved
    pub daily: usize,
}

impl InstrumentStats {
    /// Whether anything new was saved
    pub fn has_new_data(&self) -> bool {
        self.monthly > 0 || self.daily > 0
    }
}

/// Statistics for a whole run, in instrument processing order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DumpStatistics {
    instruments: Vec<(String, InstrumentStats)>,
    #[serde(skip)]
    positions: HashMap<String, usize>,
    interrupted: bool,
}

impl DumpStatistics {
    /// Empty accumulator
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the result for `ticker`, replacing an earlier entry
    pub fn record(&mut self, ticker: impl Into<String>, stats: InstrumentStats) {
        let ticker = ticker.into();
        match self.positions.get(&ticker) {
            Some(&at) => self.instruments[at].1 = stats,
            None => {
                self.positions.insert(ticker.clone(), self.instruments.len());
                self.instruments.push((ticker, stats));
            }
        }
    }

    /// Mark the run as stopped early by a shutdown request
    pub fn mark_interrupted(&mut self) {
        self.interrupted = true;
    }

    /// Whether the run was stopped early
    pub fn is_interrupted(&self) -> bool {
        self.interrupted
    }

    /// Stats for `ticker`
    pub fn get(&self, ticker: &str) -> Option<InstrumentStats> {
        self.positions.get(ticker).map(|&at| self.instruments[at].1)
    }

    /// All recorded instruments in processing order
    pub fn instruments(&self) -> impl Iterator<Item = (&str, InstrumentStats)> {
        self.instruments.iter().map(|(t, s)| (t.as_str(), *s))
    }

    /// Number of instruments processed
    pub fn len(&self) -> usize {
        self.instruments.len()
    }

    /// Whether no instrument was processed
    pub fn is_empty(&self) -> bool {
        self.instruments.is_empty()
    }

    /// Total monthly partitions saved
    pub fn total_monthly(&self) -> usize {
        self.instruments.iter().map(|(_, s)| s.monthly).sum()
    }

    /// Total daily partitions saved
    pub fn total_daily(&self) -> usize {
        self.instruments.iter().map(|(_, s)| s.daily).sum()
    }

    /// Report lines: one per instrument below the threshold, otherwise a
    /// compact summary
    pub fn render(&self) -> Vec<String> {
        if self.instruments.len() < STATS_FULL_REPORT_THRESHOLD {
            self.render_full()
        } else {
            self.render_compact()
        }
    }

    /// Log the report at info level
    pub fn report(&self) {
        for line in self.render() {
            info!("{}", line);
        }
    }

    fn render_full(&self) -> Vec<String> {
        self.instruments
            .iter()
            .map(|(ticker, s)| {
                format!(
                    "{ticker}: new data saved for {} months {} days",
                    s.monthly, s.daily
                )
            })
            .collect()
    }

    fn render_compact(&self) -> Vec<String> {
        let with_data = self
            .instruments
            .iter()
            .filter(|(_, s)| s.has_new_data())
            .count();
        let without_data = self.instruments.len() - with_data;

        let mut lines = vec![
            "General stats:".to_string(),
            format!("  new data was saved for {with_data} instruments"),
            format!("  no new data for {without_data} instruments"),
        ];

        for (label, values) in [
            ("months", self.instruments.iter().map(|(_, s)| s.monthly).collect::<Vec<_>>()),
            ("days", self.instruments.iter().map(|(_, s)| s.daily).collect::<Vec<_>>()),
        ] {
            lines.push(format!("New {label} saved:"));
            let counts = most_common(&values);
            for (value, times) in counts.iter().take(STATS_MOST_COMMON) {
                lines.push(format!("  {times} instruments saved {value} {label}"));
            }
            if counts.len() > STATS_MOST_COMMON {
                lines.push("  ...".to_string());
            }
        }
        lines
    }
}

/// Distinct values with their occurrence counts, most frequent first; ties
/// keep first-seen order
fn most_common(values: &[usize]) -> Vec<(usize, usize)> {
    // value -> (times, first seen at)
    let mut seen: HashMap<usize, (usize, usize)> = HashMap::new();
    for (at, &value) in values.iter().enumerate() {
        seen.entry(value).or_insert((0, at)).0 += 1;
    }
    let mut counts: Vec<_> = seen.into_iter().collect();
    counts.sort_by(|(_, (a_times, a_at)), (_, (b_times, b_at))| {
        b_times.cmp(a_times).then(a_at.cmp(b_at))
    });
    counts
        .into_iter()
        .map(|(value, (times, _))| (value, times))
        .collect()
}

//! Sync executor
//!
//! Drives instruments sequentially; within a phase, partitions are fetched by
//! spawned tasks bounded by `buffer_unordered(K)`. The ledger is written once
//! per phase, after the pool has fully drained.

use chrono::{NaiveDate, Utc};
use futures::stream::{self, StreamExt};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::dataset::DatasetSpec;
use crate::downloader::config::{earliest_archive_date, SyncConfig};
use crate::downloader::worker::{FetchOutcome, FetchWorker, SkipReason};
use crate::downloader::{DownloadError, SyncRequest};
use crate::fetcher::{ArchiveSource, RemoteCatalog};
use crate::layout::{first_of_month, plan, ResourceMapper};
use crate::ledger::Ledger;
use crate::shutdown::SharedShutdown;
use crate::stats::{DumpStatistics, InstrumentStats};
use crate::universe::UniverseResolver;
use crate::{Granularity, Partition};

/// Incremental sync of one dataset into a local root
pub struct SyncExecutor<C, S> {
    universe: UniverseResolver<C>,
    worker: FetchWorker<S>,
    ledger: Ledger,
    mapper: ResourceMapper,
    config: SyncConfig,
    shutdown: Option<SharedShutdown>,
    progress: MultiProgress,
}

impl<C, S> SyncExecutor<C, S>
where
    C: RemoteCatalog,
    S: ArchiveSource + 'static,
{
    /// Create an executor writing under `root_dir`
    pub fn new(
        catalog: C,
        source: S,
        ledger: Ledger,
        root_dir: impl Into<PathBuf>,
        spec: DatasetSpec,
    ) -> Self {
        let data_type = spec.data_type().as_str();
        let mapper = ResourceMapper::new(root_dir, spec);
        Self {
            universe: UniverseResolver::new(Arc::new(catalog), mapper.clone()),
            worker: FetchWorker::new(Arc::new(source), data_type),
            ledger,
            mapper,
            config: SyncConfig::default(),
            shutdown: None,
            progress: MultiProgress::new(),
        }
    }

    /// Override concurrency and progress settings
    pub fn with_config(mut self, config: SyncConfig) -> Self {
        self.config = config;
        self
    }

    /// Attach a shared shutdown handle, checked between instruments.
    pub fn with_shutdown(mut self, shutdown: SharedShutdown) -> Self {
        self.shutdown = Some(shutdown);
        self
    }

    /// Ledger consulted and updated by this executor
    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    /// Path mapper for this dataset
    pub fn mapper(&self) -> &ResourceMapper {
        &self.mapper
    }

    /// Instrument resolver backed by this executor's catalog
    pub fn universe(&self) -> &UniverseResolver<C> {
        &self.universe
    }

    /// Sync every selected instrument
    ///
    /// A failing instrument is logged and keeps the counts of the phases that
    /// completed before the failure; the run moves on. Catalog failures during selection abort the run.
    pub async fn run(&self, request: &SyncRequest) -> Result<DumpStatistics, DownloadError> {
        let today = Utc::now().date_naive();
        let (start, end) = resolve_window(request.start, request.end, today)?;
        let spec = self.mapper.spec();
        info!(
            dataset = %spec,
            start = %start,
            end = %end,
            force = request.force,
            "Starting sync"
        );

        let tickers = self
            .universe
            .select_for_download(&request.tickers, &request.excluded, request.max_instruments)
            .await?;

        let mut stats = DumpStatistics::new();
        let pb = self.progress_bar(tickers.len() as u64);
        for ticker in &tickers {
            if self.is_shutdown_requested() {
                warn!(
                    processed = stats.len(),
                    remaining = tickers.len() - stats.len(),
                    "Shutdown requested, stopping before next instrument"
                );
                stats.mark_interrupted();
                break;
            }

            pb.set_message(ticker.clone());
            let mut instrument_stats = InstrumentStats::default();
            if let Err(e) = self
                .sync_phases(ticker, start, end, request.force, &mut instrument_stats)
                .await
            {
                error!(
                    symbol = %ticker,
                    monthly = instrument_stats.monthly,
                    error = %e,
                    "Failed to sync instrument"
                );
            }
            stats.record(ticker.as_str(), instrument_stats);
            pb.inc(1);
        }
        pb.finish_and_clear();

        info!(
            instruments = stats.len(),
            monthly = stats.total_monthly(),
            daily = stats.total_daily(),
            interrupted = stats.is_interrupted(),
            "Sync finished"
        );
        Ok(stats)
    }

    /// Sync one instrument over `[start, end)`
    ///
    /// Runs the monthly phase over whole months before `end`'s month and the
    /// daily phase from the first of `end`'s month. Data types without monthly
    /// archives run only the daily phase over the full window.
    pub async fn sync_instrument(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
        force: bool,
    ) -> Result<InstrumentStats, DownloadError> {
        let mut stats = InstrumentStats::default();
        self.sync_phases(ticker, start, end, force, &mut stats).await?;
        Ok(stats)
    }

    /// Phases of [`Self::sync_instrument`], filling `stats` as each completes
    async fn sync_phases(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
        force: bool,
        stats: &mut InstrumentStats,
    ) -> Result<(), DownloadError> {
        let start = match self.universe.earliest_partition(ticker, end).await {
            Some(earliest) if earliest > start => {
                debug!(symbol = %ticker, requested = %start, earliest = %earliest, "Clamping start");
                earliest
            }
            _ => start,
        };
        let Some(last_day) = end.pred_opt() else {
            return Ok(());
        };

        let daily_start = if self.mapper.spec().data_type().has_monthly_archives() {
            let month_boundary = first_of_month(end);
            if let Some(last_monthly_day) = month_boundary.pred_opt() {
                stats.monthly = self
                    .run_phase(ticker, Granularity::Monthly, start, last_monthly_day, force)
                    .await?;
            }
            // the end month is always fetched from its first day
            month_boundary
        } else {
            start
        };
        stats.daily = self
            .run_phase(ticker, Granularity::Daily, daily_start, last_day, force)
            .await?;

        info!(
            symbol = %ticker,
            monthly = stats.monthly,
            daily = stats.daily,
            "Instrument synced"
        );
        Ok(())
    }

    /// Partitions of `[start, last]` still to fetch
    ///
    /// With `force` every planned partition is returned; otherwise those the
    /// ledger already holds are dropped.
    pub fn pending_partitions(
        &self,
        ticker: &str,
        granularity: Granularity,
        start: NaiveDate,
        last: NaiveDate,
        force: bool,
    ) -> Result<Vec<Partition>, DownloadError> {
        let planned = plan(start, last, granularity);
        if force || planned.is_empty() {
            return Ok(planned
                .into_iter()
                .map(|d| Partition::new(granularity, d))
                .collect());
        }

        let present = self.ledger.dates_with_data(ticker, granularity)?;
        Ok(planned
            .into_iter()
            .filter(|d| !present.contains(d))
            .map(|d| Partition::new(granularity, d))
            .collect())
    }

    async fn run_phase(
        &self,
        ticker: &str,
        granularity: Granularity,
        start: NaiveDate,
        last: NaiveDate,
        force: bool,
    ) -> Result<usize, DownloadError> {
        let local_dir = self.mapper.local_dir(granularity, ticker);
        if let Err(e) = tokio::fs::create_dir_all(&local_dir).await {
            if e.kind() != std::io::ErrorKind::AlreadyExists {
                return Err(DownloadError::Io {
                    path: local_dir,
                    source: e,
                });
            }
        }

        let partitions = self.pending_partitions(ticker, granularity, start, last, force)?;
        if partitions.is_empty() {
            debug!(symbol = %ticker, granularity = %granularity, "Nothing to fetch");
            return Ok(0);
        }

        let width = partitions
            .len()
            .min(self.config.concurrency_for(self.mapper.spec()));
        info!(
            symbol = %ticker,
            granularity = %granularity,
            partitions = partitions.len(),
            concurrency = width,
            "Fetching partitions"
        );

        let pb = self.progress_bar(partitions.len() as u64);
        pb.set_message(format!("{ticker} {granularity}"));

        let resources: Vec<_> = partitions
            .into_iter()
            .map(|p| self.mapper.resource(ticker, p))
            .collect();
        let worker = self.worker.clone();
        let mut outcomes = stream::iter(resources)
            .map(|resource| {
                let worker = worker.clone();
                tokio::spawn(async move { worker.fetch(resource).await })
            })
            .buffer_unordered(width);

        let mut saved = Vec::new();
        while let Some(joined) = outcomes.next().await {
            let outcome = joined
                .unwrap_or_else(|e| FetchOutcome::Skipped(SkipReason::Aborted(e.to_string())));
            if let Some(date) = outcome.saved_date() {
                saved.push(date);
            }
            pb.inc(1);
        }
        pb.finish_and_clear();

        saved.sort_unstable();
        self.ledger.record_saved(ticker, granularity, &saved)?;
        Ok(saved.len())
    }

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown
            .as_ref()
            .is_some_and(|s| s.is_requested())
    }

    fn progress_bar(&self, len: u64) -> ProgressBar {
        if !self.config.show_progress {
            return ProgressBar::hidden();
        }
        let pb = self.progress.add(ProgressBar::new(len));
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}")
                .expect("hardcoded template is valid")
                .progress_chars("#>-"),
        );
        pb
    }
}

/// Resolve the requested window against `today`
///
/// `start` defaults to and is floored at the earliest archive date; `end`
/// defaults to and is capped at `today`. Returns `(start, end)` with `end`
/// exclusive.
///
/// # Errors
/// [`DownloadError::InvalidWindow`] when the resolved start is after the end.
pub fn resolve_window(
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
    today: NaiveDate,
) -> Result<(NaiveDate, NaiveDate), DownloadError> {
    let floor = earliest_archive_date();
    let start = start.map_or(floor, |s| s.max(floor));
    let end = end.map_or(today, |e| e.min(today));
    if start > end {
        return Err(DownloadError::InvalidWindow(format!(
            "start {start} is after end {end}"
        )));
    }
    Ok((start, end))
}

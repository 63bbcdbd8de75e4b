//! Instrument universe resolution
//!
//! Decides which symbols a sync covers and how far back each one goes.

use chrono::NaiveDate;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::fetcher::listing::earliest_key_date;
use crate::fetcher::{FetcherResult, RemoteCatalog};
use crate::layout::{first_of_month, ResourceMapper};
use crate::Granularity;

/// Quote suffix selected when no allow-list is given
pub const DEFAULT_QUOTE_SUFFIX: &str = "USDT";

/// Resolves instruments and their earliest published partition
pub struct UniverseResolver<C> {
    catalog: Arc<C>,
    mapper: ResourceMapper,
}

impl<C: RemoteCatalog> UniverseResolver<C> {
    /// Resolver over `catalog`, mapping remote paths with `mapper`
    pub fn new(catalog: Arc<C>, mapper: ResourceMapper) -> Self {
        Self { catalog, mapper }
    }

    /// Every symbol of the asset class, queried fresh on each call
    pub async fn list_instruments(&self) -> FetcherResult<Vec<String>> {
        self.catalog.list_instruments().await
    }

    /// Symbols to sync, in catalog order
    ///
    /// # Errors
    /// Catalog failures propagate; an empty selection is logged, not an error.
    pub async fn select_for_download(
        &self,
        requested: &[String],
        excluded: &[String],
        max_instruments: Option<usize>,
    ) -> FetcherResult<Vec<String>> {
        let all = self.list_instruments().await?;
        info!(count = all.len(), "Found instruments in catalog");

        let mut selected = select_instruments(&all, requested, excluded);
        if let Some(max) = max_instruments {
            selected.truncate(max);
        }

        if selected.is_empty() {
            warn!(
                requested = requested.len(),
                excluded = excluded.len(),
                "No instruments selected for download"
            );
        } else {
            info!(count = selected.len(), "Instruments selected for download");
        }
        Ok(selected)
    }

    /// Earliest published partition date for `ticker`
    ///
    /// Monthly archive keys are consulted first; daily keys only when no
    /// monthly key exists. With no archives at all the result is
    /// `first_of_month(fallback)`. Returns `None` when the listing fails, in
    /// which case the caller should not clamp.
    pub async fn earliest_partition(&self, ticker: &str, fallback: NaiveDate) -> Option<NaiveDate> {
        match self.discover_earliest(ticker).await {
            Ok(Some(date)) => {
                debug!(symbol = %ticker, earliest = %date, "Earliest published partition");
                Some(date)
            }
            Ok(None) => {
                debug!(symbol = %ticker, "No published archives found");
                Some(first_of_month(fallback))
            }
            Err(e) => {
                error!(symbol = %ticker, error = %e, "Earliest date not found");
                None
            }
        }
    }

    async fn discover_earliest(&self, ticker: &str) -> FetcherResult<Option<NaiveDate>> {
        if self.mapper.spec().data_type().has_monthly_archives() {
            let suffix = self.mapper.path_suffix(Granularity::Monthly, ticker);
            let keys = self.catalog.list_archive_keys(&suffix).await?;
            if let Some(date) = earliest_key_date(&keys, Granularity::Monthly) {
                return Ok(Some(date));
            }
        }

        let suffix = self.mapper.path_suffix(Granularity::Daily, ticker);
        let keys = self.catalog.list_archive_keys(&suffix).await?;
        Ok(earliest_key_date(&keys, Granularity::Daily))
    }
}

/// Pure selection over a catalog listing
///
/// With a non-empty `requested`, keeps catalog symbols that were requested
/// (unknown requests are dropped silently); otherwise keeps symbols ending in
/// `USDT`. `excluded` is removed afterwards. Catalog order is preserved.
pub fn select_instruments(all: &[String], requested: &[String], excluded: &[String]) -> Vec<String> {
    all.iter()
        .filter(|symbol| {
            if requested.is_empty() {
                symbol.ends_with(DEFAULT_QUOTE_SUFFIX)
            } else {
                requested.contains(symbol)
            }
        })
        .filter(|symbol| !excluded.contains(symbol))
        .cloned()
        .collect()
}

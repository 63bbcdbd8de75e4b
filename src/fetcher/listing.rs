//! Parsers for catalog responses
//!
//! - `exchangeInfo` JSON → symbol list
//! - listing page HTML → bucket URL (`var BUCKET_URL = '...';`)
//! - bucket XML → `<Key>` values
//! - archive key → partition date

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;

use super::{FetcherError, FetcherResult};
use crate::layout::path::{parse_date_token, ARCHIVE_EXTENSION};
use crate::Granularity;
use chrono::NaiveDate;

/// `var BUCKET_URL = '...';` in the listing page script
static BUCKET_URL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"var BUCKET_URL = '(.*?)';"#).expect("Invalid regex pattern"));

/// `<Key>...</Key>` text nodes in the S3 listing
static KEY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<Key>(.*?)</Key>").expect("Invalid regex pattern"));

/// `exchangeInfo` response, reduced to what the mirror needs
#[derive(Debug, Deserialize)]
pub struct ExchangeInfo {
    /// Listed symbols
    pub symbols: Vec<SymbolInfo>,
}

/// One `symbols[]` element
#[derive(Debug, Deserialize)]
pub struct SymbolInfo {
    /// Exchange symbol (e.g., "BTCUSDT")
    pub symbol: String,
}

impl ExchangeInfo {
    /// Symbols in exchange order
    pub fn into_symbols(self) -> Vec<String> {
        self.symbols.into_iter().map(|s| s.symbol).collect()
    }
}

/// Extract the S3 bucket URL embedded in the listing page
pub fn parse_bucket_url(html: &str) -> FetcherResult<String> {
    BUCKET_URL_RE
        .captures(html)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .ok_or_else(|| FetcherError::ParseError("BUCKET_URL not found in listing page".to_string()))
}

/// Extract every `<Key>` text node from a bucket listing
pub fn parse_keys(xml: &str) -> Vec<String> {
    KEY_RE
        .captures_iter(xml)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Partition date of an archive key, if it is an archive of `granularity`
///
/// `data/spot/monthly/klines/BTCUSDT/1m/BTCUSDT-1m-2019-09.zip` → 2019-09-01.
/// Checksum files and anything without a trailing date token yield `None`.
pub fn key_date(key: &str, granularity: Granularity) -> Option<NaiveDate> {
    let file_name = key.rsplit('/').next()?;
    let stem = file_name.strip_suffix(ARCHIVE_EXTENSION)?.strip_suffix('.')?;
    let token_len = match granularity {
        Granularity::Monthly => "YYYY-MM".len(),
        Granularity::Daily => "YYYY-MM-DD".len(),
    };
    let split = stem.len().checked_sub(token_len)?;
    let token = stem.get(split..)?;
    if split > 0 && !stem[..split].ends_with('-') {
        return None;
    }
    parse_date_token(token, granularity)
}

/// Earliest partition date among `keys`
pub fn earliest_key_date(keys: &[String], granularity: Granularity) -> Option<NaiveDate> {
    keys.iter()
        .filter_map(|key| key_date(key, granularity))
        .min()
}

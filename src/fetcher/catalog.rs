//! Binance catalog client
//!
//! Lists symbols via `exchangeInfo` and archive keys via the Binance Vision
//! listing page plus the S3 bucket it points to.

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, info};

use super::binance_config::{BinanceMarketConfig, VISION_BASE_URL};
use super::binance_http::CatalogHttpClient;
use super::listing::{parse_bucket_url, parse_keys, ExchangeInfo};
use super::{FetcherResult, RemoteCatalog};
use crate::dataset::AssetClass;

/// Production [`RemoteCatalog`] for one asset class
#[derive(Debug, Clone)]
pub struct BinanceCatalog {
    http: CatalogHttpClient,
    api_base_url: String,
    exchange_info_endpoint: &'static str,
    vision_base_url: String,
}

impl BinanceCatalog {
    /// Catalog for `asset_class` with default endpoints
    pub fn new(asset_class: AssetClass) -> Self {
        Self::with_client(asset_class, Client::new())
    }

    /// Catalog sharing an existing reqwest client
    pub fn with_client(asset_class: AssetClass, client: Client) -> Self {
        let config = BinanceMarketConfig::for_asset_class(asset_class);
        Self {
            http: CatalogHttpClient::new(client),
            api_base_url: config.api_base_url.to_string(),
            exchange_info_endpoint: config.exchange_info_endpoint,
            vision_base_url: VISION_BASE_URL.to_string(),
        }
    }

    /// Override both hosts (for tests)
    pub fn with_base_urls(
        mut self,
        api_base_url: impl Into<String>,
        vision_base_url: impl Into<String>,
    ) -> Self {
        self.api_base_url = api_base_url.into();
        self.vision_base_url = vision_base_url.into();
        self
    }

    /// Override the HTTP client (retry policy)
    pub fn with_http(mut self, http: CatalogHttpClient) -> Self {
        self.http = http;
        self
    }

    fn exchange_info_url(&self) -> String {
        format!("{}{}", self.api_base_url, self.exchange_info_endpoint)
    }
}

#[async_trait]
impl RemoteCatalog for BinanceCatalog {
    async fn list_instruments(&self) -> FetcherResult<Vec<String>> {
        let url = self.exchange_info_url();
        let info: ExchangeInfo = self.http.get_json(&url, "exchangeInfo").await?;
        let symbols = info.into_symbols();
        info!(count = symbols.len(), url = %url, "Fetched exchange symbols");
        Ok(symbols)
    }

    async fn list_archive_keys(&self, path_suffix: &str) -> FetcherResult<Vec<String>> {
        let prefix = format!("data/{}/", path_suffix.trim_matches('/'));

        let page = self
            .http
            .get_text(
                &format!("{}/", self.vision_base_url.trim_end_matches('/')),
                &[("prefix", prefix.as_str())],
                "listing",
            )
            .await?;
        let bucket_url = parse_bucket_url(&page)?;

        let xml = self
            .http
            .get_text(
                &bucket_url,
                &[("delimiter", "/"), ("prefix", prefix.as_str())],
                "bucket",
            )
            .await?;
        let keys = parse_keys(&xml);
        debug!(prefix = %prefix, keys = keys.len(), "Listed archive keys");
        Ok(keys)
    }
}

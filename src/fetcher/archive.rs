//! Binance Vision archive transport
//!
//! Streams one `.zip` to disk in a single attempt. When checksum verification
//! is enabled the published `.CHECKSUM` sidecar is fetched first and the
//! SHA-256 of the received bytes must match it.

use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::Client;
use sha2::{Digest, Sha256};
use std::path::Path;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use super::binance_config::VISION_DATA_URL;
use super::{ArchiveSource, FetcherError, FetcherResult};
use crate::layout::RemoteResource;

/// Production [`ArchiveSource`] for data.binance.vision
#[derive(Debug, Clone)]
pub struct VisionArchiveSource {
    client: Client,
    base_url: String,
    verify_checksum: bool,
}

impl VisionArchiveSource {
    /// Source with the default base URL, checksum verification off
    pub fn new() -> Self {
        Self::with_client(Client::new())
    }

    /// Source sharing an existing reqwest client
    pub fn with_client(client: Client) -> Self {
        Self {
            client,
            base_url: VISION_DATA_URL.to_string(),
            verify_checksum: false,
        }
    }

    /// Create with custom base URL (for testing)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Enable or disable `.CHECKSUM` verification
    pub fn with_checksum_verification(mut self, enabled: bool) -> Self {
        self.verify_checksum = enabled;
        self
    }

    /// Base URL archives are fetched from
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Generate CHECKSUM file URL
    fn checksum_url(archive_url: &str) -> String {
        format!("{archive_url}.CHECKSUM")
    }

    /// Download and parse a CHECKSUM file, returning the expected SHA-256
    async fn download_checksum(&self, checksum_url: &str) -> FetcherResult<String> {
        debug!("Downloading CHECKSUM from {}", checksum_url);

        let response = self
            .client
            .get(checksum_url)
            .send()
            .await
            .map_err(|e| FetcherError::NetworkError(e.to_string()))?;

        if response.status().as_u16() == 404 {
            return Err(FetcherError::NotFound(checksum_url.to_string()));
        }
        if !response.status().is_success() {
            return Err(FetcherError::ArchiveError(format!(
                "CHECKSUM download failed: HTTP {}",
                response.status()
            )));
        }

        let content = response
            .text()
            .await
            .map_err(|e| FetcherError::NetworkError(e.to_string()))?;
        parse_checksum(&content)
    }
}

impl Default for VisionArchiveSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ArchiveSource for VisionArchiveSource {
    async fn fetch_archive(&self, resource: &RemoteResource, dest: &Path) -> FetcherResult<u64> {
        let archive_url = resource.url(&self.base_url);

        let expected = if self.verify_checksum {
            Some(self.download_checksum(&Self::checksum_url(&archive_url)).await?)
        } else {
            None
        };

        debug!("Downloading archive from {}", archive_url);
        let response = self
            .client
            .get(&archive_url)
            .send()
            .await
            .map_err(|e| FetcherError::NetworkError(e.to_string()))?;

        let status = response.status();
        if status.as_u16() == 404 {
            return Err(FetcherError::NotFound(archive_url));
        }
        if !status.is_success() {
            return Err(FetcherError::HttpError(format!(
                "Archive download failed: HTTP {status}"
            )));
        }

        let mut file = tokio::fs::File::create(dest)
            .await
            .map_err(|e| FetcherError::IoError(format!("Failed to create {}: {e}", dest.display())))?;
        let mut hasher = Sha256::new();
        let mut written: u64 = 0;

        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| FetcherError::NetworkError(e.to_string()))?;
            if expected.is_some() {
                hasher.update(&chunk);
            }
            file.write_all(&chunk)
                .await
                .map_err(|e| FetcherError::IoError(format!("Failed to write {}: {e}", dest.display())))?;
            written += chunk.len() as u64;
        }
        file.flush()
            .await
            .map_err(|e| FetcherError::IoError(format!("Failed to flush {}: {e}", dest.display())))?;

        if let Some(expected) = expected {
            verify_digest(hasher, expected)?;
            debug!("Checksum validation passed");
        }

        debug!("Downloaded {} bytes to {:?}", written, dest);
        Ok(written)
    }
}

/// Compare the streamed SHA-256 with the published one
fn verify_digest(hasher: Sha256, expected: String) -> FetcherResult<()> {
    let actual = format!("{:x}", hasher.finalize());
    if actual.eq_ignore_ascii_case(&expected) {
        Ok(())
    } else {
        Err(FetcherError::ChecksumMismatch { expected, actual })
    }
}

/// Parse a CHECKSUM body (`"<hash>  <filename>"` or just `"<hash>"`)
pub fn parse_checksum(content: &str) -> FetcherResult<String> {
    content
        .split_whitespace()
        .next()
        .map(|hash| hash.to_lowercase())
        .ok_or_else(|| FetcherError::ArchiveError("Empty CHECKSUM file".to_string()))
}

//! Source file download
//!
//! Each unit's file is fetched with a single GET and written in full to a
//! deterministic local path. An existing file is replaced; a failed
//! request leaves the target untouched.

use crate::error::{Error, Result};
use crate::http::HttpClient;
use std::path::Path;
use tracing::info;

/// Downloads remote files to local storage
#[derive(Debug)]
pub struct Fetcher {
    client: HttpClient,
}

impl Fetcher {
    /// Create a fetcher over `client`
    pub fn new(client: HttpClient) -> Self {
        Self { client }
    }

    /// Get the HTTP client
    pub fn client(&self) -> &HttpClient {
        &self.client
    }

    /// Fetch `url` into `target`, returning the number of bytes written
    pub async fn fetch(&self, url: &str, target: &Path) -> Result<u64> {
        info!("Downloading {url}");

        let body = self.client.get_bytes(url).await?;

        tokio::fs::write(target, &body).await.map_err(|e| {
            Error::output(format!("Failed to write {}: {e}", target.display()))
        })?;

        let written = body.len() as u64;
        info!("Saved {} ({written} bytes)", target.display());
        Ok(written)
    }
}

#[cfg(test)]
mod tests;

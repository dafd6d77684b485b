//! Outbound manifest fetching seam.
//!
//! The splicer only ever needs "URL in, playlist text out", so that is the
//! whole interface. Production uses the shared reqwest client; tests inject
//! canned manifests and stay off the network.

use crate::error::Result;
use std::future::Future;

/// Fetches manifest text by URL.
pub trait ManifestFetcher: Send + Sync {
    fn fetch(&self, url: &str) -> impl Future<Output = Result<String>> + Send;
}

/// reqwest-backed fetcher sharing the process-wide connection pool.
#[derive(Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl ManifestFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String> {
        let response = self.client.get(url).send().await?.error_for_status()?;
        Ok(response.text().await?)
    }
}

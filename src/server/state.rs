use crate::cache::AdManifestCache;
use crate::config::Config;
use crate::splice::fetch::HttpFetcher;
use metrics_exporter_prometheus::PrometheusHandle;
use reqwest::Client;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<Config>,
    /// Manifest fetcher over a pooled HTTP client
    pub fetcher: HttpFetcher,
    /// Process-wide ad/bumper creative cache
    pub ad_cache: AdManifestCache,
    /// Prometheus exposition handle, when the recorder installed cleanly
    pub prometheus: Option<PrometheusHandle>,
    /// Server start time for uptime tracking
    pub started_at: Instant,
}

impl AppState {
    /// Create a new AppState with the given configuration
    pub fn new(config: Config, prometheus: Option<PrometheusHandle>) -> Self {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(5))
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(10)
            .build()
            .expect("Failed to create HTTP client");

        AppState {
            config: Arc::new(config),
            fetcher: HttpFetcher::new(http_client),
            ad_cache: AdManifestCache::new(),
            prometheus,
            started_at: Instant::now(),
        }
    }
}

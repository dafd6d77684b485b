use std::env;

/// Fallback placeholder subtitle resource, served by this process itself.
pub const DEFAULT_DUMMY_SUBTITLE_ENDPOINT: &str = "textstream/empty.vtt";

/// Application configuration loaded from environment variables
#[derive(Clone, Debug)]
pub struct Config {
    pub port: u16,
    /// Public base URL of this service, used when building absolute self-hosted URLs
    pub base_url: String,
    /// Route prefix for all stitching endpoints
    pub prefix: String,
    /// URI stamped on fabricated filler subtitle segments
    pub dummy_subtitle_url: String,
    /// Optional hostname override applied to source base URLs when `o=1`
    pub override_hostname: Option<String>,
    /// Retries per top-level manifest operation after the first attempt
    pub max_retries: u32,
    /// Backoff between retries, milliseconds
    pub retry_backoff_ms: u64,
    pub is_dev: bool,
}

impl Config {
    /// Load configuration from environment variables.
    /// In DEV mode, provides sensible defaults. In PROD mode, PORT and BASE_URL are required.
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        let is_dev = env::var("DEV_MODE")
            .unwrap_or_else(|_| "false".to_string())
            .parse()
            .unwrap_or(false);

        let port = if is_dev {
            env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()?
        } else {
            env::var("PORT")
                .map_err(|_| "PORT is required in production")?
                .parse()?
        };

        let base_url = if is_dev {
            env::var("BASE_URL").unwrap_or_else(|_| "http://localhost:3000".to_string())
        } else {
            env::var("BASE_URL").map_err(|_| "BASE_URL is required in production")?
        };

        let prefix = env::var("PREFIX").unwrap_or_else(|_| "/stitch".to_string());

        let dummy_subtitle_url = env::var("DUMMY_SUBTITLE_URL")
            .unwrap_or_else(|_| default_dummy_subtitle_url(&base_url, &prefix));

        let override_hostname = env::var("OVERRIDE_HOSTNAME").ok().filter(|h| !h.is_empty());

        let max_retries = env::var("NUM_RETRIES")
            .unwrap_or_else(|_| "1".to_string())
            .parse()
            .unwrap_or(1);

        let retry_backoff_ms = env::var("RETRY_BACKOFF_MS")
            .unwrap_or_else(|_| "100".to_string())
            .parse()
            .unwrap_or(100);

        Ok(Config {
            port,
            base_url,
            prefix,
            dummy_subtitle_url,
            override_hostname,
            max_retries,
            retry_backoff_ms,
            is_dev,
        })
    }

    /// Configuration suitable for tests: dev defaults, no env access.
    pub fn for_tests() -> Self {
        Config {
            port: 0,
            base_url: "http://localhost:3000".to_string(),
            prefix: "/stitch".to_string(),
            dummy_subtitle_url: default_dummy_subtitle_url("http://localhost:3000", "/stitch"),
            override_hostname: None,
            max_retries: 1,
            retry_backoff_ms: 10,
            is_dev: true,
        }
    }
}

/// Absolute URL of the built-in placeholder subtitle resource, served by
/// this process under its own route prefix.
fn default_dummy_subtitle_url(base_url: &str, prefix: &str) -> String {
    format!(
        "{}{}/{}",
        base_url.trim_end_matches('/'),
        prefix,
        DEFAULT_DUMMY_SUBTITLE_ENDPOINT
    )
}

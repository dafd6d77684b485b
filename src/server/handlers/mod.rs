pub mod asset_list;
pub mod audio;
pub mod demo;
pub mod dummy_subtitle;
pub mod health;
pub mod master;
pub mod media;
pub mod metrics_endpoint;
pub mod subtitle;
pub mod vtt;

use crate::config::Config;
use crate::error::Result;
use crate::metrics;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use std::future::Future;
use std::time::Instant;
use tokio::time::{sleep, Duration};
use tracing::warn;

pub const MANIFEST_CONTENT_TYPE: &str = "application/vnd.apple.mpegurl";

/// Run a manifest operation with the configured bounded retry.
/// Non-retryable errors (malformed manifests, payload problems) surface
/// immediately.
pub async fn with_retry<T, F, Fut>(endpoint: &'static str, config: &Config, mut op: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempt: u32 = 0;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_retryable() && attempt < config.max_retries => {
                attempt += 1;
                warn!(
                    "{}: attempt {} failed, retrying in {}ms: {}",
                    endpoint, attempt, config.retry_backoff_ms, e
                );
                metrics::record_retry(endpoint);
                sleep(Duration::from_millis(config.retry_backoff_ms)).await;
            }
            Err(e) => return Err(e),
        }
    }
}

/// Finalize a manifest handler: record request metrics and wrap successful
/// playlist text with the HLS content type.
pub fn manifest_response(endpoint: &'static str, start: Instant, result: Result<String>) -> Response {
    match result {
        Ok(text) => {
            metrics::record_request(endpoint, 200);
            metrics::record_duration(endpoint, start);
            (
                StatusCode::OK,
                [(header::CONTENT_TYPE, MANIFEST_CONTENT_TYPE)],
                text,
            )
                .into_response()
        }
        Err(e) => {
            if matches!(e, crate::error::StitchError::OriginFetch(_)) {
                metrics::record_origin_error();
            }
            let response = e.into_response();
            metrics::record_request(endpoint, response.status().as_u16());
            metrics::record_duration(endpoint, start);
            response
        }
    }
}

/// CORS preflight response shared by every stitching endpoint.
pub async fn preflight() -> Response {
    (
        StatusCode::NO_CONTENT,
        [
            (header::ACCESS_CONTROL_ALLOW_ORIGIN, "*"),
            (header::ACCESS_CONTROL_ALLOW_METHODS, "GET, OPTIONS"),
            (header::ACCESS_CONTROL_ALLOW_HEADERS, "*"),
            (header::ACCESS_CONTROL_MAX_AGE, "86400"),
        ],
    )
        .into_response()
}

/// Parse a `1`-valued query flag (`o`, `i`, `c`).
pub fn flag(value: Option<&str>) -> bool {
    matches!(value, Some("1"))
}

/// Parse a `true`-valued query flag (`fs`, `ns`).
pub fn bool_flag(value: Option<&str>) -> bool {
    matches!(value, Some("true"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flag_grammars_are_distinct() {
        assert!(flag(Some("1")));
        assert!(!flag(Some("true")));
        assert!(!flag(Some("0")));
        assert!(!flag(None));

        assert!(bool_flag(Some("true")));
        assert!(!bool_flag(Some("1")));
        assert!(!bool_flag(Some("TRUE")));
        assert!(!bool_flag(None));
    }
}

use metrics::{counter, histogram};
use std::time::Instant;

// ── Metric names ────────────────────────────────────────────────────────

/// Total HTTP requests by endpoint and status
pub const REQUESTS_TOTAL: &str = "stitcher_requests_total";
/// Request duration in seconds
pub const REQUEST_DURATION: &str = "stitcher_request_duration_seconds";
/// Ad/bumper manifest cache lookups by result (hit, miss)
pub const AD_CACHE_LOOKUPS: &str = "stitcher_ad_cache_lookups_total";
/// Ad break insertions skipped after a creative failure
pub const AD_BREAKS_SKIPPED: &str = "stitcher_ad_breaks_skipped_total";
/// Origin fetch errors
pub const ORIGIN_FETCH_ERRORS: &str = "stitcher_origin_fetch_errors_total";
/// Request-level retries performed
pub const RETRIES_TOTAL: &str = "stitcher_retries_total";

// ── Recording helpers ───────────────────────────────────────────────────

/// Record an incoming request
pub fn record_request(endpoint: &str, status: u16) {
    counter!(REQUESTS_TOTAL, "endpoint" => endpoint.to_string(), "status" => status.to_string())
        .increment(1);
}

/// Record request duration
pub fn record_duration(endpoint: &str, start: Instant) {
    let duration = start.elapsed().as_secs_f64();
    histogram!(REQUEST_DURATION, "endpoint" => endpoint.to_string()).record(duration);
}

/// Record an ad cache lookup result
pub fn record_cache_lookup(result: &str) {
    counter!(AD_CACHE_LOOKUPS, "result" => result.to_string()).increment(1);
}

/// Record a skipped ad break
pub fn record_break_skipped() {
    counter!(AD_BREAKS_SKIPPED).increment(1);
}

/// Record an origin fetch error
pub fn record_origin_error() {
    counter!(ORIGIN_FETCH_ERRORS).increment(1);
}

/// Record a request-level retry
pub fn record_retry(endpoint: &str) {
    counter!(RETRIES_TOTAL, "endpoint" => endpoint.to_string()).increment(1);
}

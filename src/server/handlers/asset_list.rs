//! HLS Interstitials asset-list endpoint
//!
//! Called by HLS players (hls.js ≥1.6, AVPlayer) when they encounter an
//! `EXT-X-DATERANGE` tag with `CLASS="com.apple.hls.interstitial"` and
//! `X-ASSET-LIST` pointing to this endpoint. The stitching payload travels
//! percent-encoded inside the path segment.
//!
//! Returns a JSON asset list conforming to RFC 8216bis §6.3:
//! ```json
//! {"ASSETS": [{"URI": "https://ad-cdn.example.com/ad.m3u8", "DURATION": 30.0}]}
//! ```

use crate::error::{Result, StitchError};
use crate::metrics;
use crate::payload::Payload;
use axum::{
    extract::Path,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::time::Instant;
use tracing::info;

/// HLS Interstitials asset-list response
#[derive(Serialize)]
struct AssetList {
    #[serde(rename = "ASSETS")]
    assets: Vec<Asset>,
}

/// Single asset entry in the asset-list
#[derive(Serialize)]
struct Asset {
    #[serde(rename = "URI")]
    uri: String,
    #[serde(rename = "DURATION")]
    duration: f64,
}

/// Serve HLS Interstitials asset-list JSON from the path-carried payload.
pub async fn serve_asset_list(Path(payload): Path<String>) -> Result<Response> {
    let start = Instant::now();

    let payload = Payload::decode_path_segment(&payload)?;
    let assets: Vec<Asset> = payload
        .assets
        .unwrap_or_default()
        .into_iter()
        .map(|a| Asset {
            uri: a.uri,
            duration: a.dur,
        })
        .collect();

    info!("Asset-list: {} creative(s)", assets.len());
    metrics::record_request("asset_list", 200);
    metrics::record_duration("asset_list", start);

    Ok(Json(AssetList { assets }).into_response())
}

/// A request without the payload path segment is a client error, not an
/// unknown route.
pub async fn serve_asset_list_missing() -> Response {
    metrics::record_request("asset_list", 400);
    StitchError::MissingPayload.into_response()
}

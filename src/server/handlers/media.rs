use crate::error::{Result, StitchError};
use crate::payload::Payload;
use crate::server::handlers::{flag, manifest_response, with_retry};
use crate::server::state::AppState;
use crate::splice::session::{build_vod, StitchFlags, VodTarget};
use axum::extract::{Query, State};
use axum::response::Response;
use serde::Deserialize;
use std::time::Instant;
use tracing::info;

#[derive(Deserialize)]
pub struct MediaParams {
    payload: Option<String>,
    bw: u64,
    o: Option<String>,
    i: Option<String>,
    c: Option<String>,
}

/// Serve the spliced video media playlist nearest the requested bandwidth.
pub async fn serve_media(
    Query(params): Query<MediaParams>,
    State(state): State<AppState>,
) -> Response {
    let start = Instant::now();
    manifest_response("media", start, handle(params, &state).await)
}

async fn handle(params: MediaParams, state: &AppState) -> Result<String> {
    let encoded = params.payload.ok_or(StitchError::MissingPayload)?;
    let payload = Payload::decode(&encoded)?;
    let flags = StitchFlags {
        override_host: flag(params.o.as_deref()),
        use_interstitial: flag(params.i.as_deref()),
        combine_interstitial: flag(params.c.as_deref()),
    };
    info!("Serving media manifest: bw={} uri={}", params.bw, payload.uri);

    let bw = params.bw;
    let payload = &payload;
    let state = &*state;
    with_retry("media", &state.config, move || async move {
        let vod = build_vod(
            payload,
            VodTarget::Media { bandwidth: bw },
            flags,
            &state.config,
            &state.ad_cache,
            &state.fetcher,
        )
        .await?;
        vod.media_manifest(bw)
    })
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn params_carry_all_stitching_flags() {
        let uri = "http://localhost/stitch/media.m3u8?bw=800000&payload=abc&o=1&i=1&c=1"
            .parse()
            .unwrap();
        let Query(params) = Query::<MediaParams>::try_from_uri(&uri).unwrap();
        assert_eq!(params.bw, 800_000);
        assert!(flag(params.o.as_deref()));
        assert!(flag(params.i.as_deref()));
        assert!(flag(params.c.as_deref()));
    }
}

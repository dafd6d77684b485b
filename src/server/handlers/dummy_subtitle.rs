use crate::error::{Result, StitchError};
use crate::hls::dummy::rewrite_into_subtitle_manifest;
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
pub struct DummySubtitleParams {
    payload: Option<String>,
    bw: u64,
    o: Option<String>,
    i: Option<String>,
    c: Option<String>,
}

/// Serve a placeholder subtitle playlist shaped after the spliced video
/// timeline, for sources that carry no subtitle renditions of their own.
pub async fn serve_dummy_subtitle(
    Query(params): Query<DummySubtitleParams>,
    State(state): State<AppState>,
) -> Response {
    let start = Instant::now();
    manifest_response("dummy_subtitle", start, handle(params, &state).await)
}

async fn handle(params: DummySubtitleParams, state: &AppState) -> Result<String> {
    let encoded = params.payload.ok_or(StitchError::MissingPayload)?;
    let payload = Payload::decode(&encoded)?;
    let flags = StitchFlags {
        override_host: flag(params.o.as_deref()),
        use_interstitial: flag(params.i.as_deref()),
        combine_interstitial: flag(params.c.as_deref()),
    };
    info!(
        "Serving dummy subtitle manifest: bw={} uri={}",
        params.bw, payload.uri
    );

    let bw = params.bw;
    let payload = &payload;
    let state = &*state;
    let media_manifest = with_retry("dummy_subtitle", &state.config, move || async move {
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
    .await?;

    Ok(rewrite_into_subtitle_manifest(
        &media_manifest,
        &state.config.dummy_subtitle_url,
    ))
}

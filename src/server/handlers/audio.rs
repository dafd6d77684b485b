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
pub struct AudioParams {
    payload: Option<String>,
    groupid: String,
    language: String,
    o: Option<String>,
}

/// Serve the spliced audio rendition, duration-synced against the video track.
pub async fn serve_audio(
    Query(params): Query<AudioParams>,
    State(state): State<AppState>,
) -> Response {
    let start = Instant::now();
    manifest_response("audio", start, handle(params, &state).await)
}

async fn handle(params: AudioParams, state: &AppState) -> Result<String> {
    let encoded = params.payload.ok_or(StitchError::MissingPayload)?;
    let payload = Payload::decode(&encoded)?;
    let flags = StitchFlags {
        override_host: flag(params.o.as_deref()),
        ..StitchFlags::default()
    };
    info!(
        "Serving audio manifest: group={} language={} uri={}",
        params.groupid, params.language, payload.uri
    );

    let payload = &payload;
    let group_id = params.groupid.as_str();
    let language = params.language.as_str();
    let state = &*state;
    with_retry("audio", &state.config, move || async move {
        let mut vod = build_vod(
            payload,
            VodTarget::Rendition {
                group_id: group_id.to_string(),
                language: language.to_string(),
            },
            flags,
            &state.config,
            &state.ad_cache,
            &state.fetcher,
        )
        .await?;
        vod.synchronize_audio(group_id, language);
        vod.audio_manifest(group_id, language)
    })
    .await
}

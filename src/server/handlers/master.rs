use crate::error::{Result, StitchError};
use crate::hls::rewrite::{rewrite_master_manifest, RewriteOptions};
use crate::payload::Payload;
use crate::server::handlers::{bool_flag, flag, manifest_response, with_retry};
use crate::server::state::AppState;
use crate::splice::fetch::ManifestFetcher;
use axum::extract::{Query, State};
use axum::response::Response;
use serde::Deserialize;
use std::time::Instant;
use tracing::info;

#[derive(Deserialize)]
pub struct MasterParams {
    payload: Option<String>,
    o: Option<String>,
    i: Option<String>,
    c: Option<String>,
    fs: Option<String>,
    ns: Option<String>,
}

/// Rewrite the source multivariant manifest into self-hosted stitching URLs.
pub async fn serve_master(
    Query(params): Query<MasterParams>,
    State(state): State<AppState>,
) -> Response {
    let start = Instant::now();
    manifest_response("master", start, handle(params, &state).await)
}

async fn handle(params: MasterParams, state: &AppState) -> Result<String> {
    let encoded = params.payload.ok_or(StitchError::MissingPayload)?;
    let payload = Payload::decode(&encoded)?;
    let opts = RewriteOptions {
        override_host: flag(params.o.as_deref()),
        use_interstitial: flag(params.i.as_deref()),
        combine_interstitial: flag(params.c.as_deref()),
        force_subtitles: bool_flag(params.fs.as_deref()),
        no_subtitles: bool_flag(params.ns.as_deref()),
    };
    let source_uri = payload.uri.clone();
    info!("Rewriting master manifest: {}", source_uri);

    let config = &state.config;
    let fetcher = &state.fetcher;
    let payload = &payload;
    let opts = &opts;
    let source_uri = source_uri.as_str();
    let prefix = config.prefix.as_str();
    with_retry("master", config, move || async move {
        let manifest = fetcher.fetch(source_uri).await?;
        let mut payload = payload.clone();
        rewrite_master_manifest(&manifest, &mut payload, source_uri, prefix, opts)
    })
    .await
}

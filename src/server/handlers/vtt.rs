use crate::hls::dummy::EMPTY_WEBVTT;
use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};

/// Serve the empty WebVTT cue file referenced by fabricated subtitle
/// segments.
pub async fn serve_empty_vtt() -> Response {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain")],
        EMPTY_WEBVTT,
    )
        .into_response()
}

use crate::server::state::AppState;
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};

/// Serve Prometheus metrics in text exposition format
///
/// Returns all registered metrics in the standard Prometheus text format
/// for scraping by Prometheus, Grafana Agent, or similar collectors.
pub async fn serve_metrics(State(state): State<AppState>) -> Response {
    let body = state
        .prometheus
        .as_ref()
        .map(|handle| handle.render())
        .unwrap_or_default();

    (
        StatusCode::OK,
        [(
            header::CONTENT_TYPE,
            "text/plain; version=0.0.4; charset=utf-8",
        )],
        body,
    )
        .into_response()
}

pub mod handlers;
pub mod state;

use crate::config::Config;
use axum::{routing::get, Router};
use handlers::preflight;
use metrics_exporter_prometheus::PrometheusBuilder;
use state::AppState;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info, warn};

/// Build the full application router. Exposed for integration tests.
pub fn build_router(config: Config) -> Router {
    // A second install (tests spin up multiple routers in one process) keeps
    // the first recorder; those routers render empty exposition.
    let prometheus = match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => Some(handle),
        Err(e) => {
            warn!("Prometheus recorder not installed: {}", e);
            None
        }
    };

    let prefix = config.prefix.clone();
    let state = AppState::new(config, prometheus);

    // Manifests are fetched cross-origin by browser players; every response
    // carries permissive CORS headers in all modes.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let stitch = Router::new()
        .route(
            "/",
            get(handlers::master::serve_master).options(preflight),
        )
        .route(
            "/master.m3u8",
            get(handlers::master::serve_master).options(preflight),
        )
        .route(
            "/media.m3u8",
            get(handlers::media::serve_media).options(preflight),
        )
        .route(
            "/audio.m3u8",
            get(handlers::audio::serve_audio).options(preflight),
        )
        .route(
            "/subtitle.m3u8",
            get(handlers::subtitle::serve_subtitle).options(preflight),
        )
        .route(
            "/dummy-subtitle.m3u8",
            get(handlers::dummy_subtitle::serve_dummy_subtitle).options(preflight),
        )
        .route(
            "/textstream/empty.vtt",
            get(handlers::vtt::serve_empty_vtt).options(preflight),
        )
        .route(
            "/assetlist/{payload}",
            get(handlers::asset_list::serve_asset_list).options(preflight),
        )
        .route(
            "/assetlist",
            get(handlers::asset_list::serve_asset_list_missing).options(preflight),
        )
        .route(
            "/assetlist/",
            get(handlers::asset_list::serve_asset_list_missing).options(preflight),
        );

    Router::new()
        .nest(&prefix, stitch)
        .route("/health", get(handlers::health::health_check))
        .route("/metrics", get(handlers::metrics_endpoint::serve_metrics))
        // Demo origin: synthetic multivariant VOD for players and tests
        .route("/demo/master.m3u8", get(handlers::demo::serve_demo_master))
        .route("/demo/video.m3u8", get(handlers::demo::serve_demo_video))
        .route("/demo/audio.m3u8", get(handlers::demo::serve_demo_audio))
        .layer(cors)
        .with_state(state)
}

/// Start the Axum HTTP server
pub async fn start(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    let addr = format!("0.0.0.0:{}", config.port);
    let prefix = config.prefix.clone();

    info!(
        "Mode: {}, public base URL: {}",
        if config.is_dev { "dev" } else { "prod" },
        config.base_url
    );
    let app = build_router(config);

    let listener = match tokio::net::TcpListener::bind(addr.as_str()).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind to address {}: {}", addr, e);
            return Err(e.into());
        }
    };

    info!("🚀 Server listening on http://{}", addr);
    info!("📺 Demo origin: http://{}/demo/master.m3u8", addr);
    info!(
        "🔗 Stitching endpoints under http://{}{}/master.m3u8",
        addr, prefix
    );

    if let Err(e) = axum::serve(listener, app).await {
        error!("Server error: {}", e);
        return Err(e.into());
    }

    Ok(())
}

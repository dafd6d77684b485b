use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use tracing::info;

/// Demo HLS origin for testing the stitching pipeline end to end
///
/// Serves a small self-contained multivariant VOD (one video variant plus an
/// audio rendition) with relative URIs, so the whole flow can be exercised
/// against this process itself:
///
///   1. Start the stitcher: `DEV_MODE=true cargo run`
///   2. Base64-encode `{"uri":"http://localhost:3000/demo/master.m3u8"}`
///   3. Point a player at:
///      http://localhost:3000/stitch/master.m3u8?payload=<encoded>
pub async fn serve_demo_master() -> Response {
    info!("Serving demo multivariant manifest");
    m3u8(
        r#"#EXTM3U
#EXT-X-VERSION:6
#EXT-X-MEDIA:TYPE=AUDIO,GROUP-ID="stereo",LANGUAGE="en",NAME="English",DEFAULT=YES,AUTOSELECT=YES,URI="audio.m3u8"
#EXT-X-STREAM-INF:BANDWIDTH=1200000,CODECS="avc1.64001f,mp4a.40.2",RESOLUTION=1280x720,AUDIO="stereo"
video.m3u8
"#,
    )
}

/// Demo video media playlist: six 10-second segments.
pub async fn serve_demo_video() -> Response {
    m3u8(
        r#"#EXTM3U
#EXT-X-VERSION:6
#EXT-X-TARGETDURATION:10
#EXT-X-MEDIA-SEQUENCE:0
#EXTINF:10.0,
video_0.ts
#EXTINF:10.0,
video_1.ts
#EXTINF:10.0,
video_2.ts
#EXTINF:10.0,
video_3.ts
#EXTINF:10.0,
video_4.ts
#EXTINF:10.0,
video_5.ts
#EXT-X-ENDLIST
"#,
    )
}

/// Demo audio media playlist, same timeline as the video track.
pub async fn serve_demo_audio() -> Response {
    m3u8(
        r#"#EXTM3U
#EXT-X-VERSION:6
#EXT-X-TARGETDURATION:10
#EXT-X-MEDIA-SEQUENCE:0
#EXTINF:10.0,
audio_0.aac
#EXTINF:10.0,
audio_1.aac
#EXTINF:10.0,
audio_2.aac
#EXTINF:10.0,
audio_3.aac
#EXTINF:10.0,
audio_4.aac
#EXTINF:10.0,
audio_5.aac
#EXT-X-ENDLIST
"#,
    )
}

fn m3u8(body: &'static str) -> Response {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/vnd.apple.mpegurl")],
        body,
    )
        .into_response()
}

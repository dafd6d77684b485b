//! Placeholder subtitle track generation.
//!
//! A forced subtitle track needs a playlist whose timing mirrors the video
//! track but whose every segment is the same empty-captions resource. Rather
//! than fabricating a playlist from scratch, the resolved video media
//! manifest is rewritten line by line: tags pass through, segment URIs are
//! stubbed out.

/// Minimal valid empty WebVTT document served as the placeholder resource.
pub const EMPTY_WEBVTT: &str = "WEBVTT\nX-TIMESTAMP-MAP=MPEGTS:0,LOCAL:00:00:00.000\n\n";

/// Rewrite a media manifest into a placeholder subtitle manifest.
///
/// Every segment URI line is replaced with `placeholder_uri`; `EXT-X-MAP`
/// lines are dropped (initialization segments mean nothing to a text track);
/// emission stops at `EXT-X-ENDLIST` inclusive. All other tag lines pass
/// through unchanged.
pub fn rewrite_into_subtitle_manifest(media_manifest: &str, placeholder_uri: &str) -> String {
    let mut out = String::new();
    for line in media_manifest.lines() {
        if line.starts_with("#EXT-X-ENDLIST") {
            out.push_str(line);
            out.push('\n');
            break;
        }
        if line.starts_with("#EXT-X-MAP") {
            continue;
        }
        if !line.starts_with('#') && !line.trim().is_empty() {
            out.push_str(placeholder_uri);
        } else {
            out.push_str(line);
        }
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const PLACEHOLDER: &str = "/stitch/textstream/empty.vtt";

    #[test]
    fn stubs_segments_drops_map_stops_at_endlist() {
        let manifest = "#EXTM3U\n\
#EXT-X-VERSION:6\n\
#EXT-X-TARGETDURATION:10\n\
#EXT-X-MAP:URI=\"init.mp4\"\n\
#EXTINF:10.0,\n\
seg0.m4s\n\
#EXTINF:10.0,\n\
seg1.m4s\n\
#EXTINF:5.0,\n\
seg2.m4s\n\
#EXT-X-ENDLIST\n\
#EXTINF:10.0,\n\
trailing.m4s\n";

        let out = rewrite_into_subtitle_manifest(manifest, PLACEHOLDER);

        assert_eq!(out.matches(PLACEHOLDER).count(), 3);
        assert!(!out.contains("EXT-X-MAP"));
        assert!(!out.contains("seg0.m4s"));
        assert!(!out.contains("trailing.m4s"));
        assert!(out.ends_with("#EXT-X-ENDLIST\n"));
        // Timing tags are untouched.
        assert_eq!(out.matches("#EXTINF:10.0,").count(), 2);
        assert!(out.contains("#EXT-X-TARGETDURATION:10"));
    }

    #[test]
    fn blank_lines_pass_through() {
        let manifest = "#EXTM3U\n\n#EXTINF:4.0,\nseg.ts\n";
        let out = rewrite_into_subtitle_manifest(manifest, PLACEHOLDER);
        assert_eq!(out, format!("#EXTM3U\n\n#EXTINF:4.0,\n{}\n", PLACEHOLDER));
    }

    #[test]
    fn empty_webvtt_is_valid() {
        assert!(EMPTY_WEBVTT.starts_with("WEBVTT\n"));
        assert!(EMPTY_WEBVTT.ends_with("\n\n"));
    }
}

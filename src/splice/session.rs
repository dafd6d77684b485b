//! Orchestration of one stitching request: load the source, splice the
//! bumper and every ad break, consulting the creative cache along the way.

use crate::cache::AdManifestCache;
use crate::config::Config;
use crate::error::{Result, StitchError};
use crate::metrics;
use crate::payload::Payload;
use crate::splice::fetch::ManifestFetcher;
use crate::splice::vod::{Creative, SpliceVod, SYNC_REFERENCE_BANDWIDTH};
use tracing::{debug, warn};

/// Stitching behavior toggles carried on every playlist request.
#[derive(Debug, Clone, Copy, Default)]
pub struct StitchFlags {
    /// Rewrite segment hosts with the configured override hostname.
    pub override_host: bool,
    /// Ad breaks are served as HLS interstitials.
    pub use_interstitial: bool,
    /// Combine consecutive interstitial breaks into one asset list.
    pub combine_interstitial: bool,
}

/// Which rendition the request is for.
pub enum VodTarget {
    /// A video media playlist request at a target bandwidth.
    Media { bandwidth: u64 },
    /// An audio or subtitle rendition request.
    Rendition { group_id: String, language: String },
}

impl VodTarget {
    fn bandwidth(&self) -> Option<u64> {
        match self {
            VodTarget::Media { bandwidth } => Some(*bandwidth),
            VodTarget::Rendition { .. } => None,
        }
    }
}

/// Build a fully spliced VOD for one request.
///
/// The source is loaded as multivariant first; a `NotMultivariant` answer
/// falls back to loading the payload's URI directly as the requested track
/// (with the payload's video hint as sync reference for rendition requests).
/// The bumper is spliced first, then every break in descending timeline
/// order so earlier insertions never shift later positions. A failed break
/// is logged and skipped; a failed bumper fails the request.
pub async fn build_vod<F: ManifestFetcher>(
    payload: &Payload,
    target: VodTarget,
    flags: StitchFlags,
    config: &Config,
    cache: &AdManifestCache,
    fetcher: &F,
) -> Result<SpliceVod> {
    let override_hostname = if flags.override_host {
        config.override_hostname.clone()
    } else {
        None
    };
    if flags.use_interstitial || flags.combine_interstitial {
        debug!(
            "Interstitial flags set (i={}, c={}), breaks stay inline in the spliced playlist",
            flags.use_interstitial, flags.combine_interstitial
        );
    }

    let mut vod = SpliceVod::new(&payload.uri, override_hostname.clone());
    match vod.load(fetcher).await {
        Ok(()) => {}
        Err(StitchError::NotMultivariant) => {
            debug!("Source {} is a media playlist, loading directly", payload.uri);
            vod = SpliceVod::new(&payload.uri, override_hostname);
            match &target {
                VodTarget::Media { bandwidth } => {
                    vod.load_media_manifest(fetcher, &payload.uri, *bandwidth)
                        .await?;
                }
                VodTarget::Rendition { group_id, language } => {
                    if let Some(video_uri) = &payload.video_uri {
                        vod.load_media_manifest(fetcher, video_uri, SYNC_REFERENCE_BANDWIDTH)
                            .await?;
                    }
                    vod.load_audio_manifest(fetcher, &payload.uri, group_id, language)
                        .await?;
                    vod.load_subtitle_manifest(fetcher, &payload.uri, group_id, language)
                        .await?;
                }
            }
        }
        Err(e) => return Err(e),
    }

    if let Some(bumper_url) = &payload.bumper {
        let creative = load_creative(bumper_url, target.bandwidth(), cache, fetcher).await?;
        vod.insert_bumper(&creative);
    }

    // Descending position order keeps earlier timeline offsets stable while
    // splicing.
    for ad_break in payload.breaks.iter().rev() {
        match load_creative(&ad_break.url, target.bandwidth(), cache, fetcher).await {
            Ok(creative) => vod.insert_ad_at(ad_break.pos, &creative),
            Err(e) => {
                warn!("Skipping ad break at {}ms ({}): {}", ad_break.pos, ad_break.url, e);
                metrics::record_break_skipped();
            }
        }
    }

    Ok(vod)
}

/// Fetch a creative, cache-first. A hit that lacks the rendition this
/// request needs falls through to a fetch, and the fresh snapshot is merged
/// back into the cache.
async fn load_creative<F: ManifestFetcher>(
    url: &str,
    target_bandwidth: Option<u64>,
    cache: &AdManifestCache,
    fetcher: &F,
) -> Result<Creative> {
    if let Some(entry) = cache.get(url) {
        if entry.has_rendition(target_bandwidth.unwrap_or(0)) {
            metrics::record_cache_lookup("hit");
            debug!("Creative cache hit: {}", url);
            return Creative::from_cache(&entry, url, target_bandwidth);
        }
    }
    metrics::record_cache_lookup("miss");

    let creative = Creative::fetch(fetcher, url, target_bandwidth).await?;
    cache.put(url, creative.snapshot()?);
    Ok(creative)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hls::track::MediaTrack;
    use crate::splice::fetch::testing::StubFetcher;

    const SOURCE_URL: &str = "https://cdn.example.com/vod/master.m3u8";
    const AD_URL: &str = "https://ads.example.com/creative/master.m3u8";
    const BUMPER_URL: &str = "https://ads.example.com/bumper/master.m3u8";

    fn media_playlist(prefix: &str, durations: &[f64]) -> String {
        let mut text = String::from("#EXTM3U\n#EXT-X-VERSION:3\n#EXT-X-TARGETDURATION:10\n");
        for (i, d) in durations.iter().enumerate() {
            text.push_str(&format!("#EXTINF:{},\n{}{}.ts\n", d, prefix, i));
        }
        text.push_str("#EXT-X-ENDLIST\n");
        text
    }

    fn fetcher() -> StubFetcher {
        let source_master = "#EXTM3U\n\
#EXT-X-STREAM-INF:BANDWIDTH=800000\n\
video/800.m3u8\n";
        let ad_master = "#EXTM3U\n\
#EXT-X-STREAM-INF:BANDWIDTH=900000\n\
v/900.m3u8\n";
        StubFetcher::new()
            .with(SOURCE_URL, source_master)
            .with(
                "https://cdn.example.com/vod/video/800.m3u8",
                &media_playlist("s-", &[10.0, 10.0, 10.0, 10.0]),
            )
            .with(AD_URL, ad_master)
            .with(
                "https://ads.example.com/creative/v/900.m3u8",
                &media_playlist("ad-", &[5.0, 5.0]),
            )
            .with(BUMPER_URL, ad_master.replace("v/900", "b/900").as_str())
            .with(
                "https://ads.example.com/bumper/b/900.m3u8",
                &media_playlist("bumper-", &[4.0]),
            )
    }

    fn payload() -> Payload {
        Payload {
            uri: SOURCE_URL.to_string(),
            video_uri: None,
            breaks: vec![crate::payload::AdBreak {
                pos: 20_000,
                url: AD_URL.to_string(),
                break_type: Some("ad".to_string()),
            }],
            bumper: Some(BUMPER_URL.to_string()),
            assets: None,
        }
    }

    #[tokio::test]
    async fn builds_spliced_media_track() {
        let config = Config::for_tests();
        let cache = AdManifestCache::new();
        let vod = build_vod(
            &payload(),
            VodTarget::Media { bandwidth: 800_000 },
            StitchFlags::default(),
            &config,
            &cache,
            &fetcher(),
        )
        .await
        .unwrap();

        let manifest = vod.media_manifest(800_000).unwrap();
        let track = MediaTrack::parse(&manifest).unwrap();
        // bumper + 2 content + 2 ad + 2 content
        assert_eq!(track.segments.len(), 7);
        assert!(manifest.contains("bumper-0.ts"));
        assert!(track.segments[3].cue_out);
        assert!(track.segments[5].cue_in);
    }

    #[tokio::test]
    async fn failed_break_is_skipped() {
        let config = Config::for_tests();
        let cache = AdManifestCache::new();
        let mut payload = payload();
        payload.bumper = None;
        payload.breaks[0].url = "https://ads.example.com/missing.m3u8".to_string();

        let vod = build_vod(
            &payload,
            VodTarget::Media { bandwidth: 800_000 },
            StitchFlags::default(),
            &config,
            &cache,
            &fetcher(),
        )
        .await
        .unwrap();

        let manifest = vod.media_manifest(800_000).unwrap();
        let track = MediaTrack::parse(&manifest).unwrap();
        assert_eq!(track.segments.len(), 4);
        assert!(!manifest.contains("CUE-OUT"));
    }

    #[tokio::test]
    async fn failed_bumper_fails_the_request() {
        let config = Config::for_tests();
        let cache = AdManifestCache::new();
        let mut payload = payload();
        payload.breaks.clear();
        payload.bumper = Some("https://ads.example.com/missing.m3u8".to_string());

        let result = build_vod(
            &payload,
            VodTarget::Media { bandwidth: 800_000 },
            StitchFlags::default(),
            &config,
            &cache,
            &fetcher(),
        )
        .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn creative_is_cached_after_first_build() {
        let config = Config::for_tests();
        let cache = AdManifestCache::new();
        build_vod(
            &payload(),
            VodTarget::Media { bandwidth: 800_000 },
            StitchFlags::default(),
            &config,
            &cache,
            &fetcher(),
        )
        .await
        .unwrap();

        assert_eq!(cache.len(), 2);
        let entry = cache.get(AD_URL).unwrap();
        assert!(entry.has_rendition(800_000));
        assert!(entry.master.is_some());

        // A second build is served from the cache even with no ad origin.
        let no_ads = StubFetcher::new()
            .with(
                SOURCE_URL,
                "#EXTM3U\n#EXT-X-STREAM-INF:BANDWIDTH=800000\nvideo/800.m3u8\n",
            )
            .with(
                "https://cdn.example.com/vod/video/800.m3u8",
                &media_playlist("s-", &[10.0, 10.0, 10.0, 10.0]),
            );
        let mut payload = payload();
        payload.bumper = None;
        let vod = build_vod(
            &payload,
            VodTarget::Media { bandwidth: 800_000 },
            StitchFlags::default(),
            &config,
            &cache,
            &no_ads,
        )
        .await
        .unwrap();
        let manifest = vod.media_manifest(800_000).unwrap();
        assert!(manifest.contains("ad-0.ts"));
    }

    #[tokio::test]
    async fn media_playlist_source_falls_back_to_direct_load() {
        let config = Config::for_tests();
        let cache = AdManifestCache::new();
        let direct = StubFetcher::new().with(SOURCE_URL, &media_playlist("s-", &[10.0, 10.0]));
        let mut payload = payload();
        payload.breaks.clear();
        payload.bumper = None;

        let vod = build_vod(
            &payload,
            VodTarget::Media { bandwidth: 800_000 },
            StitchFlags::default(),
            &config,
            &cache,
            &direct,
        )
        .await
        .unwrap();
        assert!(vod.media_manifest(800_000).is_ok());
    }

    #[tokio::test]
    async fn rendition_fallback_loads_video_hint() {
        let config = Config::for_tests();
        let cache = AdManifestCache::new();
        let audio_url = "https://cdn.example.com/vod/audio/en.m3u8";
        let hint_url = "https://cdn.example.com/vod/video/hint.m3u8";
        let direct = StubFetcher::new()
            .with(audio_url, &media_playlist("a-", &[10.0, 10.0]))
            .with(hint_url, &media_playlist("v-", &[10.0, 10.0]));

        let payload = Payload {
            uri: audio_url.to_string(),
            video_uri: Some(hint_url.to_string()),
            breaks: vec![],
            bumper: None,
            assets: None,
        };

        let vod = build_vod(
            &payload,
            VodTarget::Rendition {
                group_id: "stereo".to_string(),
                language: "en".to_string(),
            },
            StitchFlags::default(),
            &config,
            &cache,
            &direct,
        )
        .await
        .unwrap();
        assert!(vod.has_video());
        assert!(vod.audio_manifest("stereo", "en").is_ok());
    }
}

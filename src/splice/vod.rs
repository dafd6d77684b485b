//! Per-request VOD splicing session.
//!
//! `SpliceVod` mirrors the external splicing engine's interface: load a
//! multivariant source (or individual media playlists when the source is
//! not multivariant), insert bumper/ad creatives at timeline positions, and
//! serialize per-rendition playlists back to text. Segment URIs are made
//! absolute at load time so the returned playlists are playable from
//! anywhere; pre-existing cue tags in the source are cleared so the only cue
//! markers in the output delimit splices made here.

use crate::cache::AdCacheEntry;
use crate::error::{Result, StitchError};
use crate::hls::bandwidth::nearest_bandwidth;
use crate::hls::padding;
use crate::hls::sync::synchronize_track_durations;
use crate::hls::track::{MediaTrack, Segment};
use crate::splice::fetch::ManifestFetcher;
use m3u8_rs::{AlternativeMediaType, MasterPlaylist, Playlist};
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, info};
use url::Url;

/// Bandwidth used when loading a video reference track for an audio/subtitle
/// request that must stay duration-synced against it.
pub const SYNC_REFERENCE_BANDWIDTH: u64 = 100_000;

type RenditionKey = (String, String);

/// One splicing session's loaded tracks.
#[derive(Default)]
pub struct SpliceVod {
    source_uri: String,
    override_hostname: Option<String>,
    /// Video tracks keyed by advertised bandwidth
    video: BTreeMap<u64, MediaTrack>,
    /// Audio tracks keyed by (group-id, language)
    audio: HashMap<RenditionKey, MediaTrack>,
    /// Subtitle tracks keyed by (group-id, language)
    subtitles: HashMap<RenditionKey, MediaTrack>,
}

impl SpliceVod {
    pub fn new(source_uri: impl Into<String>, override_hostname: Option<String>) -> Self {
        SpliceVod {
            source_uri: source_uri.into(),
            override_hostname,
            ..Default::default()
        }
    }

    pub fn has_video(&self) -> bool {
        !self.video.is_empty()
    }

    pub fn has_audio(&self) -> bool {
        !self.audio.is_empty()
    }

    /// Advertised bandwidths of the loaded video tracks.
    pub fn bandwidths(&self) -> Vec<u64> {
        self.video.keys().copied().collect()
    }

    /// Load the multivariant source manifest and every referenced media
    /// playlist. Fails with `NotMultivariant` when the source turns out to be
    /// a media playlist; callers recover via the direct `load_*` operations.
    pub async fn load<F: ManifestFetcher>(&mut self, fetcher: &F) -> Result<()> {
        let text = fetcher.fetch(&self.source_uri).await?;
        let master = parse_master(&text)?;

        for variant in master.variants.iter().filter(|v| !v.is_i_frame) {
            let playlist_url = self.resolve(&variant.uri, &self.source_uri)?;
            let track = self.load_track(fetcher, &playlist_url, true).await?;
            self.video.insert(variant.bandwidth, track);
        }

        for alt in &master.alternatives {
            let Some(uri) = &alt.uri else { continue };
            let key = (
                alt.group_id.clone(),
                alt.language.clone().unwrap_or_else(|| alt.name.clone()),
            );
            match alt.media_type {
                AlternativeMediaType::Audio => {
                    let playlist_url = self.resolve(uri, &self.source_uri)?;
                    let track = self.load_track(fetcher, &playlist_url, true).await?;
                    self.audio.insert(key, track);
                }
                AlternativeMediaType::Subtitles => {
                    let playlist_url = self.resolve(uri, &self.source_uri)?;
                    let track = self.load_track(fetcher, &playlist_url, true).await?;
                    self.subtitles.insert(key, track);
                }
                _ => {}
            }
        }

        info!(
            "Loaded source: {} video / {} audio / {} subtitle track(s)",
            self.video.len(),
            self.audio.len(),
            self.subtitles.len()
        );
        Ok(())
    }

    /// Load a single media playlist directly as the video track for `bandwidth`.
    pub async fn load_media_manifest<F: ManifestFetcher>(
        &mut self,
        fetcher: &F,
        uri: &str,
        bandwidth: u64,
    ) -> Result<()> {
        let track = self.load_track(fetcher, uri, true).await?;
        self.video.insert(bandwidth, track);
        Ok(())
    }

    /// Load a single media playlist directly as the audio track for (group, language).
    pub async fn load_audio_manifest<F: ManifestFetcher>(
        &mut self,
        fetcher: &F,
        uri: &str,
        group_id: &str,
        language: &str,
    ) -> Result<()> {
        let track = self.load_track(fetcher, uri, true).await?;
        self.audio
            .insert((group_id.to_string(), language.to_string()), track);
        Ok(())
    }

    /// Load a single media playlist directly as the subtitle track for (group, language).
    pub async fn load_subtitle_manifest<F: ManifestFetcher>(
        &mut self,
        fetcher: &F,
        uri: &str,
        group_id: &str,
        language: &str,
    ) -> Result<()> {
        let track = self.load_track(fetcher, uri, true).await?;
        self.subtitles
            .insert((group_id.to_string(), language.to_string()), track);
        Ok(())
    }

    async fn load_track<F: ManifestFetcher>(
        &self,
        fetcher: &F,
        playlist_url: &str,
        clear_cues: bool,
    ) -> Result<MediaTrack> {
        let text = fetcher.fetch(playlist_url).await?;
        let mut track = MediaTrack::parse(&text)?;
        if clear_cues {
            for seg in &mut track.segments {
                seg.cue_out = false;
                seg.cue_out_duration = None;
                seg.cue_in = false;
            }
        }
        absolutize_segments(&mut track, playlist_url, self.override_hostname.as_deref())?;
        Ok(track)
    }

    fn resolve(&self, reference: &str, base: &str) -> Result<String> {
        let base = Url::parse(base)
            .map_err(|e| StitchError::MalformedManifest(format!("invalid URI {}: {}", base, e)))?;
        let resolved = base.join(reference).map_err(|e| {
            StitchError::MalformedManifest(format!("cannot resolve {}: {}", reference, e))
        })?;
        Ok(resolved.into())
    }

    /// Splice a bumper creative at the start of every track. The first
    /// content segment after it gets a discontinuity but no cue markers.
    pub fn insert_bumper(&mut self, creative: &Creative) {
        debug!("Inserting bumper (uri={})", creative.source_url);
        self.insert_creative(creative, None);
    }

    /// Splice an ad creative at a timeline position (milliseconds), bracketed
    /// by cue-out/cue-in markers and discontinuities on every track.
    pub fn insert_ad_at(&mut self, position_ms: u64, creative: &Creative) {
        debug!(
            "Inserting ad at {}ms (uri={})",
            position_ms, creative.source_url
        );
        self.insert_creative(creative, Some(position_ms));
    }

    fn insert_creative(&mut self, creative: &Creative, position_ms: Option<u64>) {
        if let Some(ad_video) = &creative.video {
            for track in self.video.values_mut() {
                splice_into(track, &ad_video.segments, position_ms);
            }
        }
        if let Some(ad_audio) = &creative.audio {
            for track in self.audio.values_mut() {
                splice_into(track, &ad_audio.segments, position_ms);
            }
        }
        if let Some(ad_subs) = &creative.subs {
            for track in self.subtitles.values_mut() {
                splice_into(track, &ad_subs.segments, position_ms);
            }
        }
    }

    /// Reconcile the (group, language) audio track's durations against the
    /// reference video track.
    pub fn synchronize_audio(&mut self, group_id: &str, language: &str) {
        let Some(video) = self.video.values().next() else {
            return;
        };
        let video_segments = video.segments.clone();
        let key = (group_id.to_string(), language.to_string());
        if let Some(track) = self.audio.get_mut(&key) {
            synchronize_track_durations(&video_segments, &mut track.segments);
        }
    }

    /// Pad the (group, language) subtitle track out to the reference video
    /// track's duration using `filler_uri` segments.
    pub fn pad_subtitles(&mut self, group_id: &str, language: &str, filler_uri: &str) {
        let Some(video) = self.video.values().next() else {
            return;
        };
        let video_segments = video.segments.clone();
        let key = (group_id.to_string(), language.to_string());
        if let Some(track) = self.subtitles.get_mut(&key) {
            padding::pad_subtitle_track(&video_segments, &mut track.segments, filler_uri);
        }
    }

    /// Serialize the video track nearest `bandwidth`.
    pub fn media_manifest(&self, bandwidth: u64) -> Result<String> {
        let bw = nearest_bandwidth(bandwidth, &self.bandwidths())?;
        self.video[&bw].serialize()
    }

    /// Serialize the (group, language) audio track.
    pub fn audio_manifest(&self, group_id: &str, language: &str) -> Result<String> {
        let key = (group_id.to_string(), language.to_string());
        self.audio
            .get(&key)
            .ok_or_else(|| {
                StitchError::Internal(format!("no audio rendition {}:{}", group_id, language))
            })?
            .serialize()
    }

    /// Serialize the (group, language) subtitle track.
    pub fn subtitle_manifest(&self, group_id: &str, language: &str) -> Result<String> {
        let key = (group_id.to_string(), language.to_string());
        self.subtitles
            .get(&key)
            .ok_or_else(|| {
                StitchError::Internal(format!("no subtitle rendition {}:{}", group_id, language))
            })?
            .serialize()
    }
}

/// A loaded ad or bumper creative: one video rendition chosen for the
/// request's target bandwidth, plus the first audio and subtitle renditions.
pub struct Creative {
    pub source_url: String,
    pub master: Option<String>,
    pub bandwidths: Vec<u64>,
    pub video_bandwidth: Option<u64>,
    pub video: Option<MediaTrack>,
    pub audio: Option<MediaTrack>,
    pub subs: Option<MediaTrack>,
}

impl Creative {
    /// Fetch a creative's multivariant manifest and the renditions needed to
    /// splice it: the video rendition nearest `target_bandwidth`, the first
    /// audio rendition, and the first subtitle rendition.
    pub async fn fetch<F: ManifestFetcher>(
        fetcher: &F,
        url: &str,
        target_bandwidth: Option<u64>,
    ) -> Result<Self> {
        let master_text = fetcher.fetch(url).await?;
        let master = parse_master(&master_text).map_err(|_| {
            StitchError::MalformedManifest(format!("ad source is not multivariant: {}", url))
        })?;

        let base = Url::parse(url).map_err(|e| {
            StitchError::MalformedManifest(format!("invalid ad URI {}: {}", url, e))
        })?;

        let bandwidths: Vec<u64> = master
            .variants
            .iter()
            .filter(|v| !v.is_i_frame)
            .map(|v| v.bandwidth)
            .collect();

        let mut video_bandwidth = None;
        let mut video = None;
        if let Ok(chosen) = nearest_bandwidth(target_bandwidth.unwrap_or(0), &bandwidths) {
            if let Some(variant) = master
                .variants
                .iter()
                .find(|v| !v.is_i_frame && v.bandwidth == chosen)
            {
                let playlist_url: String = base
                    .join(&variant.uri)
                    .map_err(|e| StitchError::MalformedManifest(e.to_string()))?
                    .into();
                video = Some(fetch_track(fetcher, &playlist_url).await?);
                video_bandwidth = Some(chosen);
            }
        }

        let audio = fetch_first_rendition(
            fetcher,
            &base,
            &master,
            AlternativeMediaType::Audio,
        )
        .await?;
        let subs = fetch_first_rendition(
            fetcher,
            &base,
            &master,
            AlternativeMediaType::Subtitles,
        )
        .await?;

        Ok(Creative {
            source_url: url.to_string(),
            master: Some(master_text),
            bandwidths,
            video_bandwidth,
            video,
            audio,
            subs,
        })
    }

    /// Rebuild a creative from cached text snapshots.
    pub fn from_cache(entry: &AdCacheEntry, url: &str, target_bandwidth: Option<u64>) -> Result<Self> {
        let target = target_bandwidth.unwrap_or(0);
        let video_bandwidth = nearest_bandwidth(target, &entry.bandwidths).ok();
        let video = match entry.video_for(target) {
            Some(text) => Some(MediaTrack::parse(text)?),
            None => None,
        };
        let audio = entry
            .audio
            .as_deref()
            .map(MediaTrack::parse)
            .transpose()?;
        let subs = entry
            .subs
            .as_deref()
            .map(MediaTrack::parse)
            .transpose()?;

        Ok(Creative {
            source_url: url.to_string(),
            master: entry.master.clone(),
            bandwidths: entry.bandwidths.clone(),
            video_bandwidth,
            video,
            audio,
            subs,
        })
    }

    /// Text snapshot for the cache: playlist objects are serialized here,
    /// at write time, never stored live.
    pub fn snapshot(&self) -> Result<AdCacheEntry> {
        let mut video_texts = HashMap::new();
        if let (Some(bw), Some(track)) = (self.video_bandwidth, &self.video) {
            video_texts.insert(bw, track.serialize()?);
        }
        Ok(AdCacheEntry {
            master: self.master.clone(),
            bandwidths: self.bandwidths.clone(),
            video: video_texts,
            audio: self.audio.as_ref().map(|t| t.serialize()).transpose()?,
            subs: self.subs.as_ref().map(|t| t.serialize()).transpose()?,
        })
    }
}

fn parse_master(text: &str) -> Result<MasterPlaylist> {
    match m3u8_rs::parse_playlist_res(text.as_bytes()) {
        Ok(Playlist::MasterPlaylist(master)) => Ok(master),
        Ok(Playlist::MediaPlaylist(_)) => Err(StitchError::NotMultivariant),
        Err(e) => Err(StitchError::MalformedManifest(format!(
            "failed to parse manifest: {:?}",
            e
        ))),
    }
}

async fn fetch_track<F: ManifestFetcher>(fetcher: &F, playlist_url: &str) -> Result<MediaTrack> {
    let text = fetcher.fetch(playlist_url).await?;
    let mut track = MediaTrack::parse(&text)?;
    absolutize_segments(&mut track, playlist_url, None)?;
    Ok(track)
}

async fn fetch_first_rendition<F: ManifestFetcher>(
    fetcher: &F,
    base: &Url,
    master: &MasterPlaylist,
    media_type: AlternativeMediaType,
) -> Result<Option<MediaTrack>> {
    let Some(alt) = master
        .alternatives
        .iter()
        .find(|a| a.media_type == media_type && a.uri.is_some())
    else {
        return Ok(None);
    };
    let uri = alt.uri.as_deref().unwrap_or_default();
    let playlist_url: String = base
        .join(uri)
        .map_err(|e| StitchError::MalformedManifest(e.to_string()))?
        .into();
    Ok(Some(fetch_track(fetcher, &playlist_url).await?))
}

/// Resolve every segment (and init-map) URI against the playlist's own URL,
/// optionally overriding the hostname for relative references.
fn absolutize_segments(
    track: &mut MediaTrack,
    playlist_url: &str,
    override_hostname: Option<&str>,
) -> Result<()> {
    let mut base = Url::parse(playlist_url).map_err(|e| {
        StitchError::MalformedManifest(format!("invalid playlist URI {}: {}", playlist_url, e))
    })?;
    if let Some(host) = override_hostname {
        base.set_host(Some(host)).map_err(|e| {
            StitchError::MalformedManifest(format!("invalid override hostname {}: {}", host, e))
        })?;
    }

    for seg in &mut track.segments {
        if let Some(uri) = &seg.uri {
            // Absolute segment URIs pass through `join` unchanged.
            let resolved = base
                .join(uri)
                .map_err(|e| StitchError::MalformedManifest(e.to_string()))?;
            seg.uri = Some(resolved.into());
        }
        if let Some(map) = &mut seg.map {
            let resolved = base
                .join(&map.uri)
                .map_err(|e| StitchError::MalformedManifest(e.to_string()))?;
            map.uri = resolved.into();
        }
    }
    Ok(())
}

/// Index of the segment boundary at or after `position_ms`.
fn insertion_index(segments: &[Segment], position_ms: u64) -> usize {
    let mut elapsed_ms = 0.0;
    for (i, seg) in segments.iter().enumerate() {
        if elapsed_ms >= position_ms as f64 {
            return i;
        }
        elapsed_ms += seg.duration * 1000.0;
    }
    segments.len()
}

/// Splice `ad_segments` into `track` at a position (`None` = start, bumper
/// semantics: no cue markers). The block opens with a discontinuity; the
/// first content segment after it gets a discontinuity, and cue-out/cue-in
/// brackets when this is a mid-roll break.
fn splice_into(track: &mut MediaTrack, ad_segments: &[Segment], position_ms: Option<u64>) {
    if ad_segments.is_empty() {
        return;
    }
    let with_cues = position_ms.is_some();
    let index = match position_ms {
        Some(ms) => insertion_index(&track.segments, ms),
        None => 0,
    };

    let total: f64 = ad_segments.iter().map(|s| s.duration).sum();
    let mut block: Vec<Segment> = ad_segments.to_vec();
    // The bumper opens the stream; no context reset precedes it.
    if index > 0 {
        block[0].discontinuity = true;
    }
    if with_cues {
        block[0].cue_out = true;
        block[0].cue_out_duration = Some(total);
    }

    let mut tail = track.segments.split_off(index);
    if let Some(after) = tail.first_mut() {
        after.discontinuity = true;
        if with_cues {
            after.cue_in = true;
        }
    }
    track.segments.extend(block);
    track.segments.extend(tail);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::splice::fetch::testing::StubFetcher;

    const SOURCE_MASTER_URL: &str = "https://cdn.example.com/vod/master.m3u8";
    const AD_MASTER_URL: &str = "https://ads.example.com/creative/master.m3u8";

    fn media_playlist(prefix: &str, durations: &[f64]) -> String {
        let mut text = String::from("#EXTM3U\n#EXT-X-VERSION:3\n#EXT-X-TARGETDURATION:10\n");
        for (i, d) in durations.iter().enumerate() {
            text.push_str(&format!("#EXTINF:{},\n{}{}.ts\n", d, prefix, i));
        }
        text.push_str("#EXT-X-ENDLIST\n");
        text
    }

    fn source_fetcher() -> StubFetcher {
        let master = "#EXTM3U\n\
#EXT-X-MEDIA:TYPE=AUDIO,GROUP-ID=\"stereo\",LANGUAGE=\"en\",NAME=\"English\",URI=\"audio/en.m3u8\"\n\
#EXT-X-STREAM-INF:BANDWIDTH=800000,AUDIO=\"stereo\"\n\
video/800.m3u8\n\
#EXT-X-STREAM-INF:BANDWIDTH=2000000,AUDIO=\"stereo\"\n\
video/2000.m3u8\n";
        let ad_master = "#EXTM3U\n\
#EXT-X-MEDIA:TYPE=AUDIO,GROUP-ID=\"aac\",LANGUAGE=\"en\",NAME=\"English\",URI=\"a/en.m3u8\"\n\
#EXT-X-STREAM-INF:BANDWIDTH=900000,AUDIO=\"aac\"\n\
v/900.m3u8\n";

        StubFetcher::new()
            .with(SOURCE_MASTER_URL, master)
            .with(
                "https://cdn.example.com/vod/video/800.m3u8",
                &media_playlist("s800-", &[10.0, 10.0, 10.0, 10.0]),
            )
            .with(
                "https://cdn.example.com/vod/video/2000.m3u8",
                &media_playlist("s2000-", &[10.0, 10.0, 10.0, 10.0]),
            )
            .with(
                "https://cdn.example.com/vod/audio/en.m3u8",
                &media_playlist("a-", &[10.0, 10.0, 10.0, 10.0]),
            )
            .with(AD_MASTER_URL, ad_master)
            .with(
                "https://ads.example.com/creative/v/900.m3u8",
                &media_playlist("ad-", &[5.0, 5.0]),
            )
            .with(
                "https://ads.example.com/creative/a/en.m3u8",
                &media_playlist("ad-a-", &[5.0, 5.0]),
            )
    }

    #[tokio::test]
    async fn load_resolves_all_tracks() {
        let fetcher = source_fetcher();
        let mut vod = SpliceVod::new(SOURCE_MASTER_URL, None);
        vod.load(&fetcher).await.unwrap();

        assert_eq!(vod.bandwidths(), vec![800_000, 2_000_000]);
        assert!(vod.has_audio());

        // Segment URIs come back absolute.
        let manifest = vod.media_manifest(800_000).unwrap();
        assert!(manifest.contains("https://cdn.example.com/vod/video/s800-0.ts"));
    }

    #[tokio::test]
    async fn load_of_media_playlist_is_not_multivariant() {
        let fetcher = StubFetcher::new().with(SOURCE_MASTER_URL, &media_playlist("s-", &[10.0]));
        let mut vod = SpliceVod::new(SOURCE_MASTER_URL, None);
        assert!(matches!(
            vod.load(&fetcher).await,
            Err(StitchError::NotMultivariant)
        ));
    }

    #[tokio::test]
    async fn ad_insertion_brackets_with_cues() {
        let fetcher = source_fetcher();
        let mut vod = SpliceVod::new(SOURCE_MASTER_URL, None);
        vod.load(&fetcher).await.unwrap();

        let creative = Creative::fetch(&fetcher, AD_MASTER_URL, Some(800_000))
            .await
            .unwrap();
        vod.insert_ad_at(20_000, &creative);

        let manifest = vod.media_manifest(800_000).unwrap();
        let track = MediaTrack::parse(&manifest).unwrap();
        // 2 content + 2 ad + 2 content
        assert_eq!(track.segments.len(), 6);
        assert!(track.segments[2].cue_out);
        assert!(track.segments[2].discontinuity);
        assert_eq!(track.segments[2].cue_out_duration, Some(10.0));
        assert!(track.segments[4].cue_in);
        assert!(track.segments[4].discontinuity);

        // Audio got the creative's audio rendition at the same position.
        let audio = vod.audio_manifest("stereo", "en").unwrap();
        assert!(audio.contains("ad-a-0.ts"));
    }

    #[tokio::test]
    async fn bumper_splices_at_start_without_cues() {
        let fetcher = source_fetcher();
        let mut vod = SpliceVod::new(SOURCE_MASTER_URL, None);
        vod.load(&fetcher).await.unwrap();

        let creative = Creative::fetch(&fetcher, AD_MASTER_URL, Some(800_000))
            .await
            .unwrap();
        vod.insert_bumper(&creative);

        let manifest = vod.media_manifest(800_000).unwrap();
        let track = MediaTrack::parse(&manifest).unwrap();
        assert_eq!(track.segments.len(), 6);
        assert!(!track.segments[0].discontinuity);
        assert!(!track.segments[0].cue_out);
        // First content segment after the bumper resets context, no cue.
        assert!(track.segments[2].discontinuity);
        assert!(!track.segments[2].cue_in);
    }

    #[tokio::test]
    async fn creative_snapshot_roundtrips_through_cache_entry() {
        let fetcher = source_fetcher();
        let creative = Creative::fetch(&fetcher, AD_MASTER_URL, Some(800_000))
            .await
            .unwrap();

        let entry = creative.snapshot().unwrap();
        assert_eq!(entry.bandwidths, vec![900_000]);
        assert!(entry.has_rendition(800_000));
        assert!(entry.audio.is_some());

        let rebuilt = Creative::from_cache(&entry, AD_MASTER_URL, Some(800_000)).unwrap();
        assert_eq!(rebuilt.video_bandwidth, Some(900_000));
        assert_eq!(
            rebuilt.video.as_ref().map(|t| t.segments.len()),
            creative.video.as_ref().map(|t| t.segments.len())
        );
    }

    #[tokio::test]
    async fn not_multivariant_fallback_via_direct_loads() {
        let audio_url = "https://cdn.example.com/vod/audio/en.m3u8";
        let fetcher = StubFetcher::new()
            .with(audio_url, &media_playlist("a-", &[10.0, 10.0]))
            .with(
                "https://cdn.example.com/vod/video/hint.m3u8",
                &media_playlist("v-", &[10.0, 10.0]),
            );

        let mut vod = SpliceVod::new(audio_url, None);
        vod.load_media_manifest(
            &fetcher,
            "https://cdn.example.com/vod/video/hint.m3u8",
            SYNC_REFERENCE_BANDWIDTH,
        )
        .await
        .unwrap();
        vod.load_audio_manifest(&fetcher, audio_url, "stereo", "en")
            .await
            .unwrap();
        vod.load_subtitle_manifest(&fetcher, audio_url, "stereo", "en")
            .await
            .unwrap();

        assert!(vod.has_video());
        assert!(vod.audio_manifest("stereo", "en").is_ok());
        assert!(vod.subtitle_manifest("stereo", "en").is_ok());
    }

    #[tokio::test]
    async fn source_cue_tags_are_cleared_on_load() {
        let spliced_source = "#EXTM3U\n\
#EXT-X-TARGETDURATION:10\n\
#EXTINF:10.0,\n\
s0.ts\n\
#EXT-X-CUE-OUT:30\n\
#EXTINF:10.0,\n\
s1.ts\n\
#EXT-X-CUE-IN\n\
#EXTINF:10.0,\n\
s2.ts\n\
#EXT-X-ENDLIST\n";
        let url = "https://cdn.example.com/vod/video/800.m3u8";
        let fetcher = StubFetcher::new().with(url, spliced_source);

        let mut vod = SpliceVod::new(url, None);
        vod.load_media_manifest(&fetcher, url, 800_000).await.unwrap();

        let manifest = vod.media_manifest(800_000).unwrap();
        assert!(!manifest.contains("CUE-OUT"));
        assert!(!manifest.contains("CUE-IN"));
    }

    #[tokio::test]
    async fn override_hostname_rewrites_relative_segments() {
        let url = "https://cdn.example.com/vod/video/800.m3u8";
        let fetcher = StubFetcher::new().with(url, &media_playlist("s-", &[10.0]));

        let mut vod = SpliceVod::new(url, Some("edge.example.net".to_string()));
        vod.load_media_manifest(&fetcher, url, 800_000).await.unwrap();

        let manifest = vod.media_manifest(800_000).unwrap();
        assert!(manifest.contains("https://edge.example.net/vod/video/s-0.ts"));
    }

    #[test]
    fn insertion_index_walks_durations() {
        let segments: Vec<Segment> = (0..4).map(|i| Segment::new(10.0, format!("s{}.ts", i))).collect();
        assert_eq!(insertion_index(&segments, 0), 0);
        assert_eq!(insertion_index(&segments, 10_000), 1);
        assert_eq!(insertion_index(&segments, 15_000), 2);
        assert_eq!(insertion_index(&segments, 40_000), 4);
        assert_eq!(insertion_index(&segments, 99_000), 4);
    }
}

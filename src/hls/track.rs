//! Typed view over a media playlist's ordered segment list.
//!
//! The synchronizer, padding engine and splicer all operate on `MediaTrack`;
//! parsing and serialization go through `m3u8-rs`, with SCTE-35 cue markers
//! recovered from (and emitted into) each segment's `unknown_tags`.

use crate::error::{Result, StitchError};
use m3u8_rs::{ExtTag, Map, MediaPlaylist, MediaPlaylistType, MediaSegment, Playlist};

/// One playlist entry in presentation order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Segment {
    /// Duration in seconds. Mutated by the synchronizer and padding engine.
    pub duration: f64,
    /// Media URI; `None` only for fabricated segments not yet assigned one.
    pub uri: Option<String>,
    /// Timing/encoding context reset boundary (ad-break edge)
    pub discontinuity: bool,
    /// First segment inside an ad break
    pub cue_out: bool,
    /// Advertised break duration carried on the cue-out marker
    pub cue_out_duration: Option<f64>,
    /// First content segment after an ad break
    pub cue_in: bool,
    /// EXT-X-MAP initialization segment, carried through for fMP4 sources
    pub map: Option<Map>,
}

impl Segment {
    pub fn new(duration: f64, uri: impl Into<String>) -> Self {
        Segment {
            duration,
            uri: Some(uri.into()),
            ..Default::default()
        }
    }
}

/// Ordered segment list of one rendition, with the playlist-level tags
/// needed to serialize it back out as a VOD media playlist.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaTrack {
    pub version: Option<usize>,
    pub target_duration: u64,
    pub media_sequence: u64,
    pub independent_segments: bool,
    pub end_list: bool,
    pub segments: Vec<Segment>,
}

impl Default for MediaTrack {
    fn default() -> Self {
        MediaTrack {
            version: Some(6),
            target_duration: 10,
            media_sequence: 0,
            independent_segments: false,
            end_list: true,
            segments: Vec::new(),
        }
    }
}

impl MediaTrack {
    /// Sum of all segment durations in seconds.
    pub fn total_duration(&self) -> f64 {
        self.segments.iter().map(|s| s.duration).sum()
    }

    /// Parse a media playlist's text into a typed track.
    pub fn parse(content: &str) -> Result<Self> {
        match m3u8_rs::parse_playlist_res(content.as_bytes()) {
            Ok(Playlist::MediaPlaylist(playlist)) => Ok(Self::from_media_playlist(playlist)),
            Ok(Playlist::MasterPlaylist(_)) => Err(StitchError::MalformedManifest(
                "expected a media playlist, got a multivariant manifest".to_string(),
            )),
            Err(e) => Err(StitchError::MalformedManifest(format!(
                "failed to parse media playlist: {:?}",
                e
            ))),
        }
    }

    fn from_media_playlist(playlist: MediaPlaylist) -> Self {
        let segments = playlist
            .segments
            .into_iter()
            .map(|seg| {
                let (cue_out, cue_out_duration, cue_in) = cue_markers(&seg.unknown_tags);
                Segment {
                    duration: seg.duration as f64,
                    uri: Some(seg.uri),
                    discontinuity: seg.discontinuity,
                    cue_out,
                    cue_out_duration,
                    cue_in,
                    map: seg.map,
                }
            })
            .collect();

        MediaTrack {
            version: playlist.version,
            target_duration: playlist.target_duration,
            media_sequence: playlist.media_sequence,
            independent_segments: playlist.independent_segments,
            end_list: playlist.end_list,
            segments,
        }
    }

    /// Serialize the track back to media playlist text.
    pub fn serialize(&self) -> Result<String> {
        let max_duration = self
            .segments
            .iter()
            .map(|s| s.duration.ceil() as u64)
            .max()
            .unwrap_or(0);

        let playlist = MediaPlaylist {
            version: self.version,
            target_duration: self.target_duration.max(max_duration),
            media_sequence: self.media_sequence,
            independent_segments: self.independent_segments,
            end_list: self.end_list,
            playlist_type: Some(MediaPlaylistType::Vod),
            segments: self.segments.iter().map(to_media_segment).collect(),
            ..Default::default()
        };

        let mut output = Vec::new();
        playlist
            .write_to(&mut output)
            .map_err(|e| StitchError::PlaylistWrite(e.to_string()))?;
        String::from_utf8(output).map_err(|e| StitchError::PlaylistWrite(e.to_string()))
    }
}

/// Recover cue-out/cue-in markers from a segment's unparsed tags.
///
/// `m3u8-rs` stores unknown tags without their `#EXT-` prefix, so
/// `#EXT-X-CUE-OUT:30` arrives as tag `X-CUE-OUT` with rest `30`.
fn cue_markers(tags: &[ExtTag]) -> (bool, Option<f64>, bool) {
    let mut cue_out = false;
    let mut cue_out_duration = None;
    let mut cue_in = false;

    for tag in tags {
        if tag.tag == "X-CUE-IN" {
            cue_in = true;
        } else if tag.tag == "X-CUE-OUT" {
            cue_out = true;
            cue_out_duration = tag.rest.as_deref().and_then(parse_cue_out_duration);
        }
    }

    (cue_out, cue_out_duration, cue_in)
}

/// Extract the break duration from a CUE-OUT tag value.
///
/// Supports `30`, `30.0` and `DURATION=30` forms.
fn parse_cue_out_duration(rest: &str) -> Option<f64> {
    let value = match rest.split_once('=') {
        Some((key, value)) if key.trim().eq_ignore_ascii_case("DURATION") => value,
        Some(_) => return None,
        None => rest,
    };
    value.trim().parse().ok()
}

fn to_media_segment(segment: &Segment) -> MediaSegment {
    // ExtTag serializes as `#EXT-{tag}`, so the prefix stays off here.
    let mut unknown_tags = Vec::new();
    if segment.cue_out {
        unknown_tags.push(ExtTag {
            tag: "X-CUE-OUT".to_string(),
            rest: segment
                .cue_out_duration
                .map(|d| format!("DURATION={}", d)),
        });
    }
    if segment.cue_in {
        unknown_tags.push(ExtTag {
            tag: "X-CUE-IN".to_string(),
            rest: None,
        });
    }

    MediaSegment {
        uri: segment.uri.clone().unwrap_or_default(),
        duration: segment.duration as f32,
        discontinuity: segment.discontinuity,
        map: segment.map.clone(),
        unknown_tags,
        ..Default::default()
    }
}

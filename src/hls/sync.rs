//! Cross-track duration synchronization.
//!
//! An external splicing engine inserts ad creatives into video and audio
//! playlists independently, and the creatives' segment granularity rarely
//! matches across tracks. Left alone, the cumulative durations drift apart at
//! every ad-break boundary and players stall or cut the tail of one track.
//! This walks both playlists region by region and corrects the trailing
//! segment duration on the audio side so both tracks terminate together.

use crate::hls::track::Segment;
use tracing::{debug, info, warn};

/// Safety valve against malformed or cyclic region structures.
const MAX_REGIONS: u32 = 999;

/// Result of scanning one region (cursor to the next discontinuity).
struct RegionScan {
    /// Sum of durations of segments inside the cue-out/cue-in bracket
    break_duration: f64,
    /// Index of the last segment scanned before the region boundary
    target_index: usize,
    /// Cursor for the next region (index of the post-discontinuity segment)
    next_start: usize,
    /// Running total of content (non-break) durations including this region
    content_total: f64,
}

/// Scan forward from `start` until the first segment followed by a
/// discontinuity, classifying each segment as ad-break or content.
fn scan_region(segments: &[Segment], start: usize, running_content: f64) -> RegionScan {
    let len = segments.len();
    let mut break_duration = 0.0;
    let mut content_total = running_content;
    let mut in_break = false;

    for x in start..len {
        let seg = &segments[x];
        let next_index = if x + 1 >= len { len - 1 } else { x + 1 };
        if seg.cue_in && !seg.cue_out {
            in_break = false;
        }
        if seg.cue_out {
            in_break = true;
        }
        if in_break {
            break_duration += seg.duration;
            if segments[next_index].discontinuity {
                return RegionScan {
                    break_duration,
                    target_index: x,
                    next_start: next_index,
                    content_total,
                };
            }
        } else {
            content_total += seg.duration;
        }
    }

    RegionScan {
        break_duration,
        target_index: len.saturating_sub(1),
        next_start: len,
        content_total,
    }
}

/// Difference truncated toward zero at six decimal places.
fn calc_diff(a: f64, b: f64) -> f64 {
    let diff = (a * 1e6 - b * 1e6).floor() / 1e6;
    if diff < 0.0 {
        debug!("Video duration ({}) > audio duration ({})", b, a);
    }
    diff
}

/// Exact decimal subtraction at two-decimal granularity.
fn apply_diff(a: f64, b: f64) -> f64 {
    (a * 100.0 - b * 100.0).round() / 100.0
}

/// Truncate a running total at four decimal places.
fn to_4_decimals(a: f64) -> f64 {
    (a * 1e4).floor() / 1e4
}

/// Walk the video and audio segment lists in lock-step, one content region
/// per iteration, and rewrite the audio region's trailing segment duration so
/// cumulative durations agree at each ad-break boundary.
///
/// A correction that would produce a negative duration is logged and skipped
/// for that region, never clamped.
pub fn synchronize_track_durations(video: &[Segment], audio: &mut [Segment]) {
    let video_size = video.len();
    let audio_size = audio.len();
    if video_size == 0 || audio_size == 0 {
        return;
    }

    let mut video_start = 0usize;
    let mut audio_start = 0usize;
    let mut video_content_total = 0.0f64;
    let mut audio_content_total = 0.0f64;
    let mut iterations = MAX_REGIONS;
    let mut corrections = 0usize;

    while video_start < video_size && iterations != 0 {
        iterations -= 1;

        let v = scan_region(video, video_start, video_content_total);
        let a = scan_region(audio, audio_start, audio_content_total);
        video_content_total = to_4_decimals(v.content_total);
        audio_content_total = to_4_decimals(a.content_total);

        let total_diff = calc_diff(audio_content_total, video_content_total);
        let region_diff = calc_diff(a.break_duration, v.break_duration);

        let target_index = a.target_index;
        let original = audio[target_index].duration;

        if region_diff != 0.0 || target_index == audio_size - 1 {
            let diff = if region_diff == 0.0 && total_diff != 0.0 {
                total_diff
            } else {
                region_diff
            };
            let new_duration = apply_diff(original, diff);
            if new_duration < 0.0 {
                warn!(
                    "Negative duration ({}) for audio segment at index {}; skipping correction",
                    new_duration, target_index
                );
            } else if v.break_duration > 0.0 || video_content_total > 0.0 {
                audio[target_index].duration = new_duration;
                corrections += 1;
                debug!(
                    "Adjusted audio segment {}: {} -> {} (diff {})",
                    target_index, original, new_duration, diff
                );
            }
        }

        video_start = v.next_start;
        audio_start = a.next_start;
    }

    info!(
        "Track synchronization done: {} segment duration(s) adjusted",
        corrections
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hls::track::Segment;

    fn content(duration: f64) -> Segment {
        Segment::new(duration, "content.ts")
    }

    fn break_start(duration: f64) -> Segment {
        Segment {
            discontinuity: true,
            cue_out: true,
            ..Segment::new(duration, "ad.ts")
        }
    }

    fn break_cont(duration: f64) -> Segment {
        Segment::new(duration, "ad.ts")
    }

    fn content_after_break(duration: f64) -> Segment {
        Segment {
            discontinuity: true,
            cue_in: true,
            ..Segment::new(duration, "content.ts")
        }
    }

    fn total(segments: &[Segment]) -> f64 {
        segments.iter().map(|s| s.duration).sum()
    }

    #[test]
    fn scan_region_splits_at_discontinuity() {
        let segments = vec![
            content(10.0),
            content(10.0),
            break_start(5.0),
            break_cont(5.0),
            content_after_break(10.0),
        ];
        let scan = scan_region(&segments, 0, 0.0);
        assert_eq!(scan.target_index, 3);
        assert_eq!(scan.next_start, 4);
        assert!((scan.break_duration - 10.0).abs() < 1e-9);
        assert!((scan.content_total - 20.0).abs() < 1e-9);

        let tail = scan_region(&segments, scan.next_start, scan.content_total);
        assert_eq!(tail.next_start, segments.len());
        assert!((tail.content_total - 30.0).abs() < 1e-9);
    }

    #[test]
    fn equalizes_divergent_break_durations() {
        let video = vec![
            content(10.0),
            break_start(5.0),
            break_cont(5.0),
            content_after_break(10.0),
        ];
        let mut audio = vec![
            content(10.0),
            break_start(5.0),
            break_cont(5.4),
            content_after_break(10.0),
        ];

        synchronize_track_durations(&video, &mut audio);

        // The audio break ran 0.4s long; its trailing break segment absorbs it.
        assert!((audio[2].duration - 5.0).abs() < 1e-9);
        assert!((total(&audio) - total(&video)).abs() < 1e-6);
    }

    #[test]
    fn content_drift_corrected_at_final_segment() {
        let video = vec![
            content(10.0),
            content(10.0),
            break_start(5.0),
            break_cont(5.0),
            content_after_break(10.0),
            content(10.0),
        ];
        let mut audio = vec![
            content(9.6),
            content(10.2),
            break_start(5.0),
            break_cont(5.0),
            content_after_break(10.2),
            content(10.3),
        ];

        synchronize_track_durations(&video, &mut audio);

        assert!((total(&audio) - total(&video)).abs() < 1e-6);
        // Drift is absorbed by the last audio segment, not mid-stream content.
        assert!((audio[0].duration - 9.6).abs() < 1e-9);
        assert!((audio[5].duration - 10.0).abs() < 1e-9);
    }

    #[test]
    fn negative_correction_is_skipped() {
        let video = vec![
            content(10.0),
            break_start(2.0),
            content_after_break(10.0),
        ];
        let mut audio = vec![
            content(10.0),
            break_start(5.0),
            break_cont(0.2),
            content_after_break(10.0),
        ];

        synchronize_track_durations(&video, &mut audio);

        // Audio break ran 3.2s over video's; correcting the trailing 0.2s
        // break segment would make it negative, so it stays untouched.
        assert!((audio[2].duration - 0.2).abs() < 1e-9);
    }

    #[test]
    fn decimal_helpers_match_documented_precision() {
        assert_eq!(calc_diff(19.8, 20.0), -0.2);
        assert_eq!(calc_diff(10.5, 10.0), 0.5);
        assert_eq!(apply_diff(10.3, 0.3), 10.0);
        assert_eq!(apply_diff(5.4, 0.4), 5.0);
        assert_eq!(to_4_decimals(10.00009), 10.0);
        assert_eq!(to_4_decimals(10.12349), 10.1234);
    }

    #[test]
    fn empty_tracks_are_a_no_op() {
        let video: Vec<Segment> = vec![];
        let mut audio = vec![content(10.0)];
        synchronize_track_durations(&video, &mut audio);
        assert!((audio[0].duration - 10.0).abs() < 1e-9);
    }
}

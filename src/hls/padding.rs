//! Subtitle track padding.
//!
//! Subtitle creatives spliced into a break rarely cover the full break, and
//! many sources carry sparse subtitle playlists to begin with. Players refuse
//! to finish a VOD whose subtitle timeline ends early, so filler segments
//! pointing at an empty-captions resource are fabricated until the subtitle
//! track covers the video track.

use crate::hls::track::Segment;
use tracing::{info, warn};

/// Bring a subtitle track's total duration (and, where possible, its segment
/// count) up to the video track's. No-op when subtitles already meet or
/// exceed the video duration.
///
/// `filler_uri` is stamped on every fabricated segment.
pub fn pad_subtitle_track(video: &[Segment], subs: &mut Vec<Segment>, filler_uri: &str) {
    let video_size = video.len();
    let subs_size = subs.len();
    if video_size == 0 || subs_size == 0 {
        return;
    }

    let video_duration: f64 = video.iter().map(|s| s.duration).sum();
    let subs_duration: f64 = subs.iter().map(|s| s.duration).sum();

    if video_duration > subs_duration && video_size == subs_size {
        // Same segment grid; the final subtitle segment absorbs the deficit.
        let diff = video_duration - subs_duration;
        let last = &mut subs[subs_size - 1];
        last.duration += diff;
        info!("Extended final subtitle segment by {}s", diff);
    } else if video_duration > subs_duration && video_size > subs_size {
        // Mirror the video grid: retime the last shared segment, then append
        // one filler per remaining video segment.
        subs[subs_size - 1].duration = video[subs_size - 1].duration;
        for video_segment in &video[subs_size..] {
            subs.push(Segment::new(video_segment.duration, filler_uri));
        }
        info!(
            "Appended {} filler subtitle segment(s) to match the video grid",
            video_size - subs_size
        );
    } else if video_duration > subs_duration && video_size < subs_size {
        // No shared grid to copy from; append fillers of the median subtitle
        // duration, the last one clipped so the sum matches exactly.
        let median = median_duration(subs);
        if median <= 0.0 {
            warn!("Median subtitle segment duration is zero; skipping padding");
            return;
        }
        let diff = video_duration - subs_duration;
        let mut remaining = diff;
        let mut appended = 0usize;
        while remaining > 0.0 {
            let mut filler = Segment::new(remaining.min(median), filler_uri);
            remaining -= median;
            if remaining < median {
                filler.duration += remaining.max(0.0);
                subs.push(filler);
                appended += 1;
                break;
            }
            subs.push(filler);
            appended += 1;
        }
        info!(
            "Appended {} median-duration filler subtitle segment(s) covering {}s",
            appended, diff
        );
    }
}

/// Median of the existing subtitle segment durations; even counts average
/// the two middle values after an ascending sort.
fn median_duration(segments: &[Segment]) -> f64 {
    let mut durations: Vec<f64> = segments.iter().map(|s| s.duration).collect();
    durations.sort_by(|a, b| a.partial_cmp(b).expect("segment durations are finite"));
    let mid = durations.len() / 2;
    if durations.len() % 2 != 0 {
        durations[mid]
    } else {
        (durations[mid - 1] + durations[mid]) / 2.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FILLER: &str = "/stitch/textstream/empty.vtt";

    fn track(durations: &[f64]) -> Vec<Segment> {
        durations
            .iter()
            .map(|&d| Segment::new(d, "seg.ts"))
            .collect()
    }

    fn total(segments: &[Segment]) -> f64 {
        segments.iter().map(|s| s.duration).sum()
    }

    #[test]
    fn equal_counts_extend_last_segment() {
        let video = track(&[20.0; 5]);
        let mut subs = track(&[16.0; 5]);

        pad_subtitle_track(&video, &mut subs, FILLER);

        assert_eq!(subs.len(), 5);
        assert!((subs[4].duration - 36.0).abs() < 1e-9);
        assert!((total(&subs) - 100.0).abs() < 1e-9);
    }

    #[test]
    fn more_video_segments_appends_matching_fillers() {
        let video = track(&[10.0; 7]);
        let mut subs = track(&[10.0; 5]);

        pad_subtitle_track(&video, &mut subs, FILLER);

        assert_eq!(subs.len(), 7);
        assert!((total(&subs) - 70.0).abs() < 1e-9);
        for filler in &subs[5..] {
            assert!((filler.duration - 10.0).abs() < 1e-9);
            assert_eq!(filler.uri.as_deref(), Some(FILLER));
        }
    }

    #[test]
    fn more_subtitle_segments_pads_with_median() {
        // 8 subtitle segments, median = (4 + 6) / 2 = 5
        let mut subs = track(&[2.0, 4.0, 4.0, 4.0, 6.0, 6.0, 6.0, 8.0]);
        let video = track(&[20.0, 20.0, 12.0]); // 52s vs 40s

        pad_subtitle_track(&video, &mut subs, FILLER);

        // 12s deficit at median 5: fillers 5, 5+2 — last one absorbs the rest.
        assert_eq!(subs.len(), 10);
        assert!((subs[8].duration - 5.0).abs() < 1e-9);
        assert!((subs[9].duration - 7.0).abs() < 1e-9);
        assert!((total(&subs) - 52.0).abs() < 1e-9);
        assert_eq!(subs[9].uri.as_deref(), Some(FILLER));
    }

    #[test]
    fn deficit_smaller_than_median_gets_one_clipped_filler() {
        let mut subs = track(&[10.0, 10.0, 10.0]);
        let video = track(&[21.0, 12.0]); // 33s vs 30s, median 10

        pad_subtitle_track(&video, &mut subs, FILLER);

        assert_eq!(subs.len(), 4);
        assert!((subs[3].duration - 3.0).abs() < 1e-9);
        assert!((total(&subs) - 33.0).abs() < 1e-9);
    }

    #[test]
    fn no_padding_when_subs_cover_video() {
        let video = track(&[10.0; 4]);
        let mut subs = track(&[10.0; 4]);
        let before = subs.clone();

        pad_subtitle_track(&video, &mut subs, FILLER);
        assert_eq!(subs, before);

        let mut longer = track(&[12.0; 4]);
        let before = longer.clone();
        pad_subtitle_track(&video, &mut longer, FILLER);
        assert_eq!(longer, before);
    }

    #[test]
    fn median_of_even_and_odd_counts() {
        assert_eq!(median_duration(&track(&[1.0, 3.0, 2.0])), 2.0);
        assert_eq!(median_duration(&track(&[4.0, 1.0, 2.0, 3.0])), 2.5);
    }
}

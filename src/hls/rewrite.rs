//! Master manifest rewriting.
//!
//! Turns an absolute multivariant source manifest into a self-referencing one:
//! every variant and alternate rendition points back at this service with the
//! stitching payload serialized into the URL. Operates on a line-oriented
//! token stream so unaffected lines pass through byte-identical.

use crate::error::{Result, StitchError};
use crate::payload::Payload;
use url::Url;

/// Group id used when a subtitle track is forced onto a source without one.
pub const FORCED_SUBTITLE_GROUP: &str = "textstream";

/// Amount subtracted from every advertised variant BANDWIDTH so downstream
/// nearest-bandwidth matching never lands on an exact tie with the source.
const BANDWIDTH_NUDGE: u64 = 100;

/// Rewrite options carried in from the request's query flags.
#[derive(Debug, Clone, Default)]
pub struct RewriteOptions {
    /// `o=1` — propagate the hostname-override flag into generated URLs
    pub override_host: bool,
    /// `i=1` — interstitial mode flag, passed through to variant URLs
    pub use_interstitial: bool,
    /// `c=1` — combine-interstitial flag, passed through to variant URLs
    pub combine_interstitial: bool,
    /// `fs=true` — synthesize a subtitle track when the source has none
    pub force_subtitles: bool,
    /// `ns=true` — drop all subtitle renditions and references
    pub no_subtitles: bool,
}

/// One classified manifest line.
#[derive(Debug, PartialEq)]
enum Line<'a> {
    /// `#EXT…` tag with its name and raw attribute text
    Tag { name: &'a str, attrs: &'a str },
    /// Non-tag, non-blank line: a media or variant URI
    Uri(&'a str),
    /// Comment or blank — passed through untouched
    Other,
}

fn classify(line: &str) -> Line<'_> {
    if let Some(rest) = line.strip_prefix('#') {
        if rest.starts_with("EXT") {
            let (name, attrs) = rest.split_once(':').unwrap_or((rest, ""));
            return Line::Tag { name, attrs };
        }
        return Line::Other;
    }
    if line.trim().is_empty() {
        return Line::Other;
    }
    Line::Uri(line)
}

/// Split an attribute list on commas outside quoted values, preserving each
/// `KEY=VALUE` chunk's original text.
fn split_attribute_list(attrs: &str) -> Vec<&str> {
    let mut chunks = Vec::new();
    let mut start = 0;
    let mut in_quotes = false;
    for (i, c) in attrs.char_indices() {
        match c {
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => {
                chunks.push(&attrs[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    chunks.push(&attrs[start..]);
    chunks
}

fn attribute_value<'a>(chunks: &[&'a str], key: &str) -> Option<&'a str> {
    chunks.iter().find_map(|chunk| {
        let (k, v) = chunk.split_once('=')?;
        (k.trim() == key).then(|| v.trim().trim_matches('"'))
    })
}

/// RFC 3986 relative resolution against the manifest's own fetch URI.
fn resolve_uri(reference: &str, base: &str) -> Result<String> {
    let base = Url::parse(base)
        .map_err(|e| StitchError::MalformedManifest(format!("invalid base URI {}: {}", base, e)))?;
    let resolved = base.join(reference.trim()).map_err(|e| {
        StitchError::MalformedManifest(format!("cannot resolve {}: {}", reference, e))
    })?;
    Ok(resolved.into())
}

fn flag_suffix(opts: &RewriteOptions) -> String {
    let mut suffix = String::new();
    if opts.override_host {
        suffix.push_str("&o=1");
    }
    if opts.use_interstitial {
        suffix.push_str("&i=1");
    }
    if opts.combine_interstitial {
        suffix.push_str("&c=1");
    }
    suffix
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum MediaKind {
    Audio,
    Subtitle,
}

impl MediaKind {
    fn endpoint(self) -> &'static str {
        match self {
            MediaKind::Audio => "audio.m3u8",
            MediaKind::Subtitle => "subtitle.m3u8",
        }
    }
}

/// Rewrite a multivariant source manifest into self-hosted stitching URLs.
///
/// `payload` is threaded mutably: each rewritten rendition overwrites its
/// `uri` (and for audio, `video_uri`) before the payload is re-serialized
/// into that rendition's URL, exactly in source order.
pub fn rewrite_master_manifest(
    manifest: &str,
    payload: &mut Payload,
    master_uri: &str,
    prefix: &str,
    opts: &RewriteOptions,
) -> Result<String> {
    let lines: Vec<&str> = manifest.lines().collect();

    // The first variant URI establishes the video source hint used to tag
    // audio rewrite targets.
    let mut video_uri: Option<String> = None;
    for (i, line) in lines.iter().enumerate() {
        if let Line::Tag { name: "EXT-X-STREAM-INF", .. } = classify(line) {
            if let Some(next) = lines.get(i + 1) {
                video_uri = Some(resolve_uri(next, master_uri)?);
            }
            break;
        }
    }

    let mut out = String::new();
    let mut subtitle_count = 0usize;
    let mut pending_stream_inf: Option<String> = None;
    let mut pending_bandwidth: Option<u64> = None;

    for &line in &lines {
        match classify(line) {
            Line::Tag { name: "EXT-X-MEDIA", attrs } => {
                let chunks = split_attribute_list(attrs);
                let media_type = attribute_value(&chunks, "TYPE");
                let has_group = attribute_value(&chunks, "GROUP-ID").is_some();

                match media_type {
                    Some("AUDIO") if has_group => {
                        if let Some(rewritten) = rewrite_media_line(
                            &chunks,
                            MediaKind::Audio,
                            payload,
                            master_uri,
                            video_uri.as_deref(),
                            prefix,
                            opts,
                        )? {
                            out.push_str(&rewritten);
                            out.push('\n');
                            continue;
                        }
                    }
                    Some("SUBTITLES") if has_group => {
                        if opts.no_subtitles {
                            continue;
                        }
                        if let Some(rewritten) = rewrite_media_line(
                            &chunks,
                            MediaKind::Subtitle,
                            payload,
                            master_uri,
                            None,
                            prefix,
                            opts,
                        )? {
                            out.push_str(&rewritten);
                            out.push('\n');
                            subtitle_count += 1;
                            continue;
                        }
                    }
                    _ => {}
                }
                // URI-less or unrelated EXT-X-MEDIA lines pass through.
                out.push_str(line);
                out.push('\n');
            }
            Line::Tag { name, attrs }
                if attribute_value(&split_attribute_list(attrs), "BANDWIDTH").is_some() =>
            {
                let mut chunks: Vec<String> = split_attribute_list(attrs)
                    .iter()
                    .map(|c| c.to_string())
                    .collect();

                if name == "EXT-X-STREAM-INF" {
                    nudge_bandwidth(&mut chunks)?;
                }
                let chunk_refs: Vec<&str> = chunks.iter().map(|c| c.as_str()).collect();
                pending_bandwidth = attribute_value(&chunk_refs, "BANDWIDTH")
                    .and_then(|v| v.parse().ok());

                if opts.no_subtitles {
                    chunks.retain(|c| !c.trim_start().starts_with("SUBTITLES="));
                } else if opts.force_subtitles
                    && !chunks.iter().any(|c| c.trim_start().starts_with("SUBTITLES="))
                {
                    chunks.push(format!("SUBTITLES=\"{}\"", FORCED_SUBTITLE_GROUP));
                }

                // I-frame entries keep pointing at the origin and are never
                // re-hosted, so they are dropped rather than held pending.
                if name != "EXT-X-I-FRAME-STREAM-INF" {
                    pending_stream_inf = Some(format!("#{}:{}", name, chunks.join(",")));
                }
            }
            Line::Uri(uri) => {
                payload.uri = resolve_uri(uri, master_uri)?;
                let Some(bw) = pending_bandwidth else {
                    continue;
                };
                let Some(stream_inf) = pending_stream_inf.take() else {
                    continue;
                };

                if opts.force_subtitles && subtitle_count == 0 {
                    let dummy_url = format!(
                        "{}/dummy-subtitle.m3u8?bw={}&payload={}{}",
                        prefix,
                        bw,
                        payload.encode(),
                        if opts.override_host { "&o=1" } else { "" }
                    );
                    out.push_str("\n## Dummy Subtitle Track\n");
                    out.push_str(&format!(
                        "#EXT-X-MEDIA:TYPE=SUBTITLES,GROUP-ID=\"{}\",LANGUAGE=\"sv\",NAME=\"Svenska\",DEFAULT=YES,AUTOSELECT=YES,URI=\"{}\"\n\n",
                        FORCED_SUBTITLE_GROUP, dummy_url
                    ));
                    subtitle_count += 1;
                }

                out.push_str(&stream_inf);
                out.push('\n');
                out.push_str(&format!(
                    "{}/media.m3u8?bw={}&payload={}{}\n",
                    prefix,
                    bw,
                    payload.encode(),
                    flag_suffix(opts)
                ));
            }
            _ => {
                out.push_str(line);
                out.push('\n');
            }
        }
    }

    if pending_stream_inf.is_some() {
        return Err(StitchError::MalformedManifest(
            "stream-info tag without a following media URI".to_string(),
        ));
    }

    Ok(out)
}

/// Decrement the BANDWIDTH attribute in place.
fn nudge_bandwidth(chunks: &mut [String]) -> Result<()> {
    for chunk in chunks.iter_mut() {
        if let Some((key, value)) = chunk.split_once('=') {
            if key.trim() == "BANDWIDTH" {
                let original: u64 = value.trim().parse().map_err(|_| {
                    StitchError::MalformedManifest(format!("invalid BANDWIDTH value: {}", value))
                })?;
                *chunk = format!("{}={}", key, original.saturating_sub(BANDWIDTH_NUDGE));
                return Ok(());
            }
        }
    }
    Ok(())
}

/// Rewrite an audio or subtitle `EXT-X-MEDIA` line: resolve its URI into the
/// payload, then replace the URI attribute in place with a self-hosted
/// endpoint carrying group, language and the re-serialized payload. Returns
/// `None` when the line has no URI attribute (nothing to re-host).
fn rewrite_media_line(
    chunks: &[&str],
    kind: MediaKind,
    payload: &mut Payload,
    master_uri: &str,
    video_uri: Option<&str>,
    prefix: &str,
    opts: &RewriteOptions,
) -> Result<Option<String>> {
    let Some(uri) = attribute_value(chunks, "URI") else {
        return Ok(None);
    };

    let group = attribute_value(chunks, "GROUP-ID").unwrap_or_default();
    let language = attribute_value(chunks, "LANGUAGE")
        .or_else(|| attribute_value(chunks, "NAME"))
        .unwrap_or_default();

    payload.uri = resolve_uri(uri, master_uri)?;
    if let Some(video_uri) = video_uri {
        payload.video_uri = Some(video_uri.to_string());
    }

    let new_uri = format!(
        "{}/{}?groupid={}&language={}&payload={}{}",
        prefix,
        kind.endpoint(),
        group,
        language,
        payload.encode(),
        flag_suffix(opts)
    );

    let rewritten: Vec<String> = chunks
        .iter()
        .map(|chunk| {
            if chunk.trim_start().starts_with("URI=") {
                format!("URI=\"{}\"", new_uri)
            } else {
                chunk.to_string()
            }
        })
        .collect();

    Ok(Some(format!("#EXT-X-MEDIA:{}", rewritten.join(","))))
}

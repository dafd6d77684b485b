//! Process-wide ad/bumper manifest cache.
//!
//! Ad creatives are shared across every viewer of an asset, so their
//! manifests are fetched once per process and replayed from text snapshots on
//! later requests. Entries hold serialized playlist text only — never live
//! playlist objects — so concurrent requests can parse their own copies
//! without aliasing. Writes are last-writer-wins: two requests racing on the
//! same cold URI both fetch and both write idempotent content.
//!
//! Entries are never evicted. Growth is bounded by the number of distinct
//! creative URIs the process ever sees; revisit if that stops holding.

use crate::hls::bandwidth::nearest_bandwidth;
use dashmap::DashMap;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Text snapshots of one creative's manifests, keyed by its source URI.
#[derive(Debug, Clone, Default)]
pub struct AdCacheEntry {
    /// Multivariant manifest text
    pub master: Option<String>,
    /// Bandwidths advertised when the creative was first loaded
    pub bandwidths: Vec<u64>,
    /// Per-bandwidth video media playlist text
    pub video: HashMap<u64, String>,
    /// First audio rendition's playlist text
    pub audio: Option<String>,
    /// First subtitle rendition's playlist text
    pub subs: Option<String>,
}

impl AdCacheEntry {
    /// Whether this entry can serve a video rendition for `target_bandwidth`:
    /// the nearest advertised bandwidth must have its playlist text captured.
    pub fn has_rendition(&self, target_bandwidth: u64) -> bool {
        match nearest_bandwidth(target_bandwidth, &self.bandwidths) {
            Ok(bw) => self.video.contains_key(&bw),
            Err(_) => false,
        }
    }

    /// Video playlist text for the advertised bandwidth nearest `target_bandwidth`.
    pub fn video_for(&self, target_bandwidth: u64) -> Option<&str> {
        let bw = nearest_bandwidth(target_bandwidth, &self.bandwidths).ok()?;
        self.video.get(&bw).map(String::as_str)
    }
}

/// Shared, never-evicting creative manifest store.
#[derive(Clone, Default)]
pub struct AdManifestCache {
    entries: Arc<DashMap<String, AdCacheEntry>>,
}

impl AdManifestCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the entry for `uri`, if any.
    pub fn get(&self, uri: &str) -> Option<AdCacheEntry> {
        self.entries.get(uri).map(|e| e.clone())
    }

    /// Store a creative's snapshots. Merging into an existing entry adds or
    /// overwrites only the supplied bandwidths' video text; the first write
    /// captures everything (master, bandwidth list, audio, subs).
    pub fn put(&self, uri: &str, entry: AdCacheEntry) {
        match self.entries.get_mut(uri) {
            Some(mut existing) => {
                for (bw, text) in entry.video {
                    debug!("Adding rendition bw={} to cached ad (uri={})", bw, uri);
                    existing.video.insert(bw, text);
                }
            }
            None => {
                debug!(
                    "Caching new ad manifest set (uri={}, bandwidths={:?})",
                    uri, entry.bandwidths
                );
                self.entries.insert(uri.to_string(), entry);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

//! Opaque request payload carried through every self-hosted manifest URL.
//!
//! Serialized as UTF-8 JSON, then base64 — the sole state format that crosses
//! the system boundary. The asset-list endpoint carries the same encoding
//! percent-escaped inside a path segment.

use crate::error::{Result, StitchError};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use percent_encoding::percent_decode_str;
use serde::{Deserialize, Serialize};

/// One mid-roll ad break to splice into the source timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdBreak {
    /// Timeline position in milliseconds
    pub pos: u64,
    /// URL of the ad creative's multivariant manifest
    pub url: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub break_type: Option<String>,
}

/// Asset description surfaced through the asset-list endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Asset {
    pub uri: String,
    pub dur: f64,
}

/// Request-carried stitching descriptor.
///
/// `uri` points at the source manifest to load for the current request; the
/// master rewriter retargets it per rendition as it walks the source. The
/// optional `video_uri` tags audio/subtitle requests with the video track
/// they must stay in sync with when the source is not multivariant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payload {
    pub uri: String,
    #[serde(rename = "videoUri", default, skip_serializing_if = "Option::is_none")]
    pub video_uri: Option<String>,
    #[serde(default)]
    pub breaks: Vec<AdBreak>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bumper: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assets: Option<Vec<Asset>>,
}

impl Payload {
    /// Serialize to base64-encoded JSON for embedding in a query parameter.
    pub fn encode(&self) -> String {
        // Payload is plain data; serialization cannot fail
        let json = serde_json::to_string(self).unwrap_or_default();
        STANDARD.encode(json)
    }

    /// Decode a base64-encoded JSON payload.
    ///
    /// The value travels unescaped inside query strings, where `+` decodes
    /// to a space; that translation is undone here.
    pub fn decode(encoded: &str) -> Result<Self> {
        let normalized = encoded.trim().replace(' ', "+");
        let bytes = STANDARD
            .decode(normalized)
            .map_err(|e| StitchError::PayloadDecode(format!("invalid base64: {}", e)))?;
        serde_json::from_slice(&bytes)
            .map_err(|e| StitchError::PayloadDecode(format!("invalid JSON: {}", e)))
    }

    /// Decode a payload carried percent-encoded inside a path segment
    /// (asset-list endpoint).
    pub fn decode_path_segment(segment: &str) -> Result<Self> {
        let unescaped = percent_decode_str(segment)
            .decode_utf8()
            .map_err(|e| StitchError::PayloadDecode(format!("invalid percent-encoding: {}", e)))?;
        Self::decode(&unescaped)
    }
}

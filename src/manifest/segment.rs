use crate::hls::{AttributeMap, Attributes, ByteRange, Key};
use chrono::{DateTime, FixedOffset};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;

/// One media segment, or one variant stream of a master playlist.
///
/// Built up tag by tag while the parser walks the playlist, and closed when
/// its URI line arrives.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Segment {
    pub uri: String,
    /// Seconds.
    pub duration: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub byterange: Option<ByteRange>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub map: Option<Arc<InitMap>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<Arc<Key>>,
    pub timeline: u64,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub discontinuity: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub gap: bool,
    /// Kilobits per second, from `EXT-X-BITRATE`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bitrate: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_time_string: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_time: Option<DateTime<FixedOffset>>,
    /// Milliseconds since the Unix epoch, declared or extrapolated.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub program_date_time: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cue_out: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cue_out_cont: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cue_in: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub parts: Vec<Part>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub preload_hints: Vec<PreloadHint>,
    /// `EXT-X-STREAM-INF` attributes; only set on variant entries.
    #[serde(skip_serializing_if = "Attributes::is_empty")]
    pub attributes: Attributes,
    /// Segment-scoped custom tag data, keyed by custom type.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub custom: BTreeMap<String, String>,
}

impl Segment {
    /// True once something low-latency has been attached.
    pub fn has_partial_content(&self) -> bool {
        !self.parts.is_empty() || !self.preload_hints.is_empty()
    }

    pub fn is_encrypted(&self) -> bool {
        self.key.is_some()
    }
}

/// Initialization section declared by `EXT-X-MAP`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InitMap {
    pub uri: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub byterange: Option<ByteRange>,
    /// The key that was active when the map was declared.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<Arc<Key>>,
}

/// A low-latency partial segment (`EXT-X-PART`).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Part {
    #[serde(flatten)]
    pub attributes: AttributeMap,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub byterange: Option<ByteRange>,
}

impl Part {
    pub fn uri(&self) -> Option<&str> {
        self.attributes.get("uri").and_then(|v| v.as_str())
    }

    pub fn duration(&self) -> Option<f64> {
        self.attributes.get("duration").and_then(|v| v.as_f64())
    }

    pub fn independent(&self) -> bool {
        self.attributes
            .get("independent")
            .and_then(|v| v.as_bool())
            .unwrap_or(false)
    }

    pub fn gap(&self) -> bool {
        self.attributes
            .get("gap")
            .and_then(|v| v.as_bool())
            .unwrap_or(false)
    }
}

/// A resource the server advertises before it is complete
/// (`EXT-X-PRELOAD-HINT`).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PreloadHint {
    #[serde(flatten)]
    pub attributes: AttributeMap,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub byterange: Option<ByteRange>,
}

impl PreloadHint {
    /// `PART` or `MAP`.
    pub fn hint_type(&self) -> Option<&str> {
        self.attributes.get("type").and_then(|v| v.as_str())
    }

    pub fn uri(&self) -> Option<&str> {
        self.attributes.get("uri").and_then(|v| v.as_str())
    }
}

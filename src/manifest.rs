//! The parse result: a master or media playlist.

pub mod date_range;
pub mod media_group;
pub mod segment;

pub use date_range::DateRange;
pub use media_group::{IFramePlaylist, MediaGroup};
pub use segment::{InitMap, Part, PreloadHint, Segment};

use crate::hls::AttributeMap;
use chrono::{DateTime, FixedOffset};
use serde::Serialize;
use std::collections::BTreeMap;

/// Media type -> group id -> rendition name -> rendition.
pub type MediaGroups = BTreeMap<String, BTreeMap<String, BTreeMap<String, MediaGroup>>>;

/// Media types every manifest starts out with, even if empty.
pub const MEDIA_TYPES: [&str; 4] = ["AUDIO", "VIDEO", "CLOSED-CAPTIONS", "SUBTITLES"];

/// `EXT-X-START`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Start {
    pub time_offset: f64,
    pub precise: bool,
}

/// `EXT-X-SKIP` on a delta playlist.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Skip {
    pub skipped_segments: Option<u64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub recently_removed_dateranges: Vec<String>,
}

/// `EXT-X-RENDITION-REPORT`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenditionReport {
    pub uri: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_msn: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_part: Option<u64>,
}

/// `EXT-X-CONTENT-STEERING`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentSteering {
    pub server_uri: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pathway_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    pub allow_cache: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_duration: Option<u64>,
    pub media_sequence: u64,
    pub discontinuity_sequence: u64,
    pub end_list: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub playlist_type: Option<String>,
    pub independent_segments: bool,
    pub i_frames_only: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start: Option<Start>,
    /// First `EXT-X-PROGRAM-DATE-TIME` of the playlist.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_time_string: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_time: Option<DateTime<FixedOffset>>,
    pub segments: Vec<Segment>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preload_segment: Option<Segment>,
    /// Variant streams of a master playlist.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub playlists: Vec<Segment>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub i_frame_playlists: Vec<IFramePlaylist>,
    /// Indices into `segments` where a discontinuity begins.
    pub discontinuity_starts: Vec<usize>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub date_ranges: Vec<DateRange>,
    pub media_groups: MediaGroups,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server_control: Option<AttributeMap>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub part_inf: Option<AttributeMap>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub part_target_duration: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip: Option<Skip>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub rendition_reports: Vec<RenditionReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_steering: Option<ContentSteering>,
    /// Manifest-scoped custom tag data, keyed by custom type.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub custom: BTreeMap<String, String>,
    /// Variables from `EXT-X-DEFINE`.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub definitions: BTreeMap<String, String>,
}

impl Manifest {
    pub fn new() -> Self {
        let media_groups = MEDIA_TYPES
            .iter()
            .map(|t| (t.to_string(), BTreeMap::new()))
            .collect();

        Self {
            allow_cache: true,
            version: None,
            target_duration: None,
            media_sequence: 0,
            discontinuity_sequence: 0,
            end_list: false,
            playlist_type: None,
            independent_segments: false,
            i_frames_only: false,
            start: None,
            date_time_string: None,
            date_time: None,
            segments: Vec::new(),
            preload_segment: None,
            playlists: Vec::new(),
            i_frame_playlists: Vec::new(),
            discontinuity_starts: Vec::new(),
            date_ranges: Vec::new(),
            media_groups,
            server_control: None,
            part_inf: None,
            part_target_duration: None,
            skip: None,
            rendition_reports: Vec::new(),
            content_steering: None,
            custom: BTreeMap::new(),
            definitions: BTreeMap::new(),
        }
    }

    /// A master playlist lists variant or I-frame streams rather than
    /// segments.
    pub fn is_master_playlist(&self) -> bool {
        !self.playlists.is_empty() || !self.i_frame_playlists.is_empty()
    }

    /// Sum of segment durations, in seconds.
    pub fn total_duration(&self) -> f64 {
        self.segments.iter().map(|s| s.duration).sum()
    }

    /// AES-128 IV for the segment at `index`, if it is encrypted.
    pub fn segment_iv(&self, index: usize) -> Option<[u8; 16]> {
        let segment = self.segments.get(index)?;
        let key = segment.key.as_ref()?;
        Some(key.effective_iv(self.media_sequence.wrapping_add(index as u64)))
    }
}

impl Default for Manifest {
    fn default() -> Self {
        Self::new()
    }
}

use crate::hls::Attributes;
use serde::Serialize;

/// One rendition declared by `EXT-X-MEDIA`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaGroup {
    pub default: bool,
    pub autoselect: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instream_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub characteristics: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub forced: Option<bool>,
}

impl MediaGroup {
    pub fn from_attributes(attrs: &Attributes) -> Self {
        Self {
            default: attrs.flag("DEFAULT"),
            autoselect: attrs.flag("AUTOSELECT"),
            language: attrs.get("LANGUAGE").map(str::to_string),
            uri: attrs.get("URI").map(str::to_string),
            instream_id: attrs.get("INSTREAM-ID").map(str::to_string),
            characteristics: attrs.get("CHARACTERISTICS").map(str::to_string),
            forced: attrs.contains("FORCED").then(|| attrs.flag("FORCED")),
        }
    }
}

/// An `EXT-X-I-FRAME-STREAM-INF` entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IFramePlaylist {
    pub uri: String,
    pub attributes: Attributes,
    pub timeline: u64,
}

use super::Attributes;

/// Typed view of an `EXT-X-STREAM-INF` or `EXT-X-I-FRAME-STREAM-INF`
/// attribute list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StreamInfo {
    pub bandwidth: Option<u64>,
    pub average_bandwidth: Option<u64>,
    pub resolution: Option<(u32, u32)>,
    pub codecs: Option<String>,
    pub frame_rate: Option<f64>,
    pub program_id: Option<u64>,
    pub audio: Option<String>,
    pub video: Option<String>,
    pub subtitles: Option<String>,
    pub closed_captions: Option<String>,
}

impl StreamInfo {
    pub fn from_attributes(attrs: &Attributes) -> Self {
        let mut info = Self::default();

        for (key, value) in attrs.iter() {
            match key.to_uppercase().as_str() {
                "BANDWIDTH" => info.bandwidth = value.parse().ok(),
                "AVERAGE-BANDWIDTH" => info.average_bandwidth = value.parse().ok(),
                "RESOLUTION" => info.resolution = Self::parse_resolution(value),
                "CODECS" => info.codecs = Some(value.to_string()),
                "FRAME-RATE" => info.frame_rate = value.parse().ok(),
                "PROGRAM-ID" => info.program_id = value.parse().ok(),
                "AUDIO" => info.audio = Some(value.to_string()),
                "VIDEO" => info.video = Some(value.to_string()),
                "SUBTITLES" => info.subtitles = Some(value.to_string()),
                "CLOSED-CAPTIONS" => info.closed_captions = Some(value.to_string()),
                _ => {}
            }
        }

        info
    }

    /// Rewrite numeric attributes in canonical form and add
    /// `RESOLUTION_WIDTH`/`RESOLUTION_HEIGHT`. Unparseable values are left
    /// as written.
    pub fn normalize(attrs: &mut Attributes) {
        if let Some((width, height)) = attrs.get("RESOLUTION").and_then(Self::parse_resolution) {
            attrs.insert("RESOLUTION_WIDTH", width.to_string());
            attrs.insert("RESOLUTION_HEIGHT", height.to_string());
        }

        for key in ["BANDWIDTH", "PROGRAM-ID"] {
            if let Some(n) = attrs.integer(key) {
                attrs.insert(key, n.to_string());
            }
        }

        if let Some(rate) = attrs.float("FRAME-RATE") {
            attrs.insert("FRAME-RATE", rate.to_string());
        }
    }

    pub fn parse_resolution(s: &str) -> Option<(u32, u32)> {
        let (w, h) = s.split_once('x')?;
        Some((w.trim().parse().ok()?, h.trim().parse().ok()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_attributes() {
        let attrs = Attributes::parse(
            r#"BANDWIDTH=1000000,RESOLUTION=1280x720,CODECS="avc1.64001f,mp4a.40.2",AUDIO="aac""#,
        );
        let info = StreamInfo::from_attributes(&attrs);
        assert_eq!(info.bandwidth, Some(1000000));
        assert_eq!(info.resolution, Some((1280, 720)));
        assert_eq!(info.codecs, Some("avc1.64001f,mp4a.40.2".to_string()));
        assert_eq!(info.audio, Some("aac".to_string()));
    }

    #[test]
    fn test_normalize_adds_resolution_parts() {
        let mut attrs = Attributes::parse("BANDWIDTH=01280000,RESOLUTION=640x360,FRAME-RATE=30.000");
        StreamInfo::normalize(&mut attrs);
        assert_eq!(attrs.get("BANDWIDTH"), Some("1280000"));
        assert_eq!(attrs.get("RESOLUTION"), Some("640x360"));
        assert_eq!(attrs.get("RESOLUTION_WIDTH"), Some("640"));
        assert_eq!(attrs.get("RESOLUTION_HEIGHT"), Some("360"));
        assert_eq!(attrs.get("FRAME-RATE"), Some("30"));
    }

    #[test]
    fn test_normalize_leaves_garbage() {
        let mut attrs = Attributes::parse("BANDWIDTH=lots,RESOLUTION=big");
        StreamInfo::normalize(&mut attrs);
        assert_eq!(attrs.get("BANDWIDTH"), Some("lots"));
        assert!(!attrs.contains("RESOLUTION_WIDTH"));
    }
}

use super::rules::Extensions;
use crate::hls::{Attributes, ByteRange, Key, StreamInfo, date_time::parse_date_time};
use chrono::{DateTime, FixedOffset};

/// One tokenized playlist line.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Uri(String),
    /// A `#` line that is not a tag; the text excludes the `#`.
    Comment(String),
    Custom {
        custom_type: String,
        data: String,
        segment: bool,
    },
    Tag(Tag),
}

/// A recognized tag and its typed payload.
///
/// Payload fields are optional: a tag without a payload, or with one that
/// fails to parse, still produces its event.
#[derive(Debug, Clone, PartialEq)]
pub enum Tag {
    M3u,
    Inf {
        duration: Option<f64>,
        title: Option<String>,
    },
    TargetDuration(Option<u64>),
    Version(Option<u64>),
    MediaSequence(Option<u64>),
    DiscontinuitySequence(Option<u64>),
    PlaylistType(Option<String>),
    ByteRange(Option<ByteRange>),
    AllowCache(Option<bool>),
    Map(Option<Attributes>),
    StreamInf(Option<Attributes>),
    Media(Option<Attributes>),
    EndList,
    Discontinuity,
    ProgramDateTime {
        value: Option<String>,
        date_time: Option<DateTime<FixedOffset>>,
    },
    Key(Option<Attributes>),
    Start(Option<Attributes>),
    CueOut(String),
    CueOutCont(String),
    CueIn(String),
    Skip(Option<Attributes>),
    Part(Option<Attributes>),
    ServerControl(Option<Attributes>),
    PartInf(Option<Attributes>),
    IndependentSegments,
    IFramesOnly,
    IFrameStreamInf(Option<Attributes>),
    DateRange(Option<Attributes>),
    Define(Option<Attributes>),
    PreloadHint(Option<Attributes>),
    RenditionReport(Option<Attributes>),
    ContentSteering(Option<Attributes>),
    Gap,
    Bitrate(Option<u64>),
    /// An `#EXT` tag with no entry in the table; carries the line after
    /// `#EXT`.
    Unknown(String),
}

impl Tag {
    pub fn name(&self) -> &'static str {
        match self {
            Self::M3u => "m3u",
            Self::Inf { .. } => "inf",
            Self::TargetDuration(_) => "targetduration",
            Self::Version(_) => "version",
            Self::MediaSequence(_) => "media-sequence",
            Self::DiscontinuitySequence(_) => "discontinuity-sequence",
            Self::PlaylistType(_) => "playlist-type",
            Self::ByteRange(_) => "byterange",
            Self::AllowCache(_) => "allow-cache",
            Self::Map(_) => "map",
            Self::StreamInf(_) => "stream-inf",
            Self::Media(_) => "media",
            Self::EndList => "endlist",
            Self::Discontinuity => "discontinuity",
            Self::ProgramDateTime { .. } => "program-date-time",
            Self::Key(_) => "key",
            Self::Start(_) => "start",
            Self::CueOut(_) => "cue-out",
            Self::CueOutCont(_) => "cue-out-cont",
            Self::CueIn(_) => "cue-in",
            Self::Skip(_) => "skip",
            Self::Part(_) => "part",
            Self::ServerControl(_) => "server-control",
            Self::PartInf(_) => "part-inf",
            Self::IndependentSegments => "independent-segments",
            Self::IFramesOnly => "i-frames-only",
            Self::IFrameStreamInf(_) => "i-frame-playlist",
            Self::DateRange(_) => "daterange",
            Self::Define(_) => "define",
            Self::PreloadHint(_) => "preload-hint",
            Self::RenditionReport(_) => "rendition-report",
            Self::ContentSteering(_) => "content-steering",
            Self::Gap => "gap",
            Self::Bitrate(_) => "bitrate",
            Self::Unknown(_) => "unknown",
        }
    }

    /// Mutable access to the attribute list of attribute-bearing tags.
    pub fn attributes_mut(&mut self) -> Option<&mut Attributes> {
        match self {
            Self::Map(a)
            | Self::StreamInf(a)
            | Self::Media(a)
            | Self::Key(a)
            | Self::Start(a)
            | Self::Skip(a)
            | Self::Part(a)
            | Self::ServerControl(a)
            | Self::PartInf(a)
            | Self::IFrameStreamInf(a)
            | Self::DateRange(a)
            | Self::Define(a)
            | Self::PreloadHint(a)
            | Self::RenditionReport(a)
            | Self::ContentSteering(a) => a.as_mut(),
            _ => None,
        }
    }
}

type PayloadParser = fn(Option<&str>) -> Tag;

/// Tag name (everything before the first `:`) to payload parser.
const TAGS: &[(&str, PayloadParser)] = &[
    ("#EXTM3U", |_| Tag::M3u),
    ("#EXTINF", parse_inf),
    ("#EXT-X-TARGETDURATION", |p| Tag::TargetDuration(p.and_then(parse_target_duration))),
    ("#EXT-X-VERSION", |p| Tag::Version(p.and_then(parse_integer))),
    ("#EXT-X-MEDIA-SEQUENCE", |p| Tag::MediaSequence(p.and_then(parse_integer))),
    ("#EXT-X-DISCONTINUITY-SEQUENCE", |p| Tag::DiscontinuitySequence(p.and_then(parse_integer))),
    ("#EXT-X-PLAYLIST-TYPE", |p| Tag::PlaylistType(p.map(str::to_string))),
    ("#EXT-X-BYTERANGE", |p| Tag::ByteRange(p.and_then(|s| ByteRange::parse(s).ok()))),
    ("#EXT-X-ALLOW-CACHE", |p| Tag::AllowCache(p.and_then(parse_yes_no))),
    ("#EXT-X-MAP", |p| Tag::Map(p.map(Attributes::parse))),
    ("#EXT-X-STREAM-INF", |p| Tag::StreamInf(p.map(parse_stream_inf))),
    ("#EXT-X-MEDIA", |p| Tag::Media(p.map(Attributes::parse))),
    ("#EXT-X-ENDLIST", |_| Tag::EndList),
    ("#EXT-X-DISCONTINUITY", |_| Tag::Discontinuity),
    ("#EXT-X-PROGRAM-DATE-TIME", parse_program_date_time),
    ("#EXT-X-KEY", |p| Tag::Key(p.map(parse_key))),
    ("#EXT-X-START", |p| Tag::Start(p.map(Attributes::parse))),
    ("#EXT-X-CUE-OUT-CONT", |p| Tag::CueOutCont(p.unwrap_or_default().to_string())),
    ("#EXT-X-CUE-OUT", |p| Tag::CueOut(p.unwrap_or_default().to_string())),
    ("#EXT-X-CUE-IN", |p| Tag::CueIn(p.unwrap_or_default().to_string())),
    ("#EXT-X-SKIP", |p| Tag::Skip(p.map(Attributes::parse))),
    ("#EXT-X-PART", |p| Tag::Part(p.map(Attributes::parse))),
    ("#EXT-X-SERVER-CONTROL", |p| Tag::ServerControl(p.map(Attributes::parse))),
    ("#EXT-X-PART-INF", |p| Tag::PartInf(p.map(Attributes::parse))),
    ("#EXT-X-INDEPENDENT-SEGMENTS", |_| Tag::IndependentSegments),
    ("#EXT-X-I-FRAMES-ONLY", |_| Tag::IFramesOnly),
    ("#EXT-X-I-FRAME-STREAM-INF", |p| Tag::IFrameStreamInf(p.map(parse_stream_inf))),
    ("#EXT-X-DATERANGE", |p| Tag::DateRange(p.map(Attributes::parse))),
    ("#EXT-X-DEFINE", |p| Tag::Define(p.map(Attributes::parse))),
    ("#EXT-X-PRELOAD-HINT", |p| Tag::PreloadHint(p.map(Attributes::parse))),
    ("#EXT-X-RENDITION-REPORT", |p| Tag::RenditionReport(p.map(Attributes::parse))),
    ("#EXT-X-CONTENT-STEERING", |p| Tag::ContentSteering(p.map(Attributes::parse))),
    ("#EXT-X-GAP", |_| Tag::Gap),
    ("#EXT-X-BITRATE", |p| Tag::Bitrate(p.and_then(parse_integer))),
];

/// Classifier for M3U8 lines.
pub struct LineClassifier;

impl LineClassifier {
    /// Tokenize one line. Blank lines produce nothing.
    pub fn classify(line: &str, extensions: &Extensions) -> Option<Event> {
        let line = line.trim();

        if line.is_empty() {
            return None;
        }

        if !line.starts_with('#') {
            return Some(Event::Uri(line.to_string()));
        }

        let line = extensions.map_line(line);

        if let Some(event) = extensions.parse_custom(&line) {
            return Some(event);
        }

        // A mapper may rewrite a tag into anything, including a URI.
        let Some(body) = line.strip_prefix('#') else {
            let line = line.trim();
            return (!line.is_empty()).then(|| Event::Uri(line.to_string()));
        };

        if !body.starts_with("EXT") {
            return Some(Event::Comment(body.to_string()));
        }

        let line = line.replace('\r', "");
        Some(Event::Tag(Self::classify_tag(&line)))
    }

    /// Classify a line already known to start with `#EXT`.
    pub fn classify_tag(line: &str) -> Tag {
        let (name, payload) = match line.split_once(':') {
            Some((name, payload)) => (name, Some(payload.trim()).filter(|p| !p.is_empty())),
            None => (line, None),
        };

        TAGS.iter()
            .find(|(tag, _)| *tag == name)
            .map(|(_, parse)| parse(payload))
            .unwrap_or_else(|| Tag::Unknown(line.get(4..).unwrap_or_default().to_string()))
    }
}

fn parse_inf(payload: Option<&str>) -> Tag {
    let Some(payload) = payload else {
        return Tag::Inf {
            duration: None,
            title: None,
        };
    };

    let (duration, title) = match payload.split_once(',') {
        Some((duration, title)) => (duration, Some(title)),
        None => (payload, None),
    };

    Tag::Inf {
        duration: duration
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|d| d.is_finite() && *d >= 0.0),
        title: title.filter(|t| !t.is_empty()).map(str::to_string),
    }
}

fn parse_program_date_time(payload: Option<&str>) -> Tag {
    Tag::ProgramDateTime {
        value: payload.map(str::to_string),
        date_time: payload.and_then(|s| parse_date_time(s).ok()),
    }
}

fn parse_integer(s: &str) -> Option<u64> {
    s.trim().parse().ok()
}

/// Integer per the HLS grammar, but tolerate a decimal by rounding up.
fn parse_target_duration(s: &str) -> Option<u64> {
    parse_integer(s).or_else(|| {
        let d: f64 = s.trim().parse().ok()?;
        (d.is_finite() && d >= 0.0).then(|| d.ceil() as u64)
    })
}

fn parse_yes_no(s: &str) -> Option<bool> {
    match s.trim() {
        "YES" => Some(true),
        "NO" => Some(false),
        _ => None,
    }
}

fn parse_stream_inf(s: &str) -> Attributes {
    let mut attrs = Attributes::parse(s);
    StreamInfo::normalize(&mut attrs);
    attrs
}

fn parse_key(s: &str) -> Attributes {
    let mut attrs = Attributes::parse(s);
    if let Some(iv) = attrs.remove("IV")
        && let Ok(iv) = Key::normalize_iv(&iv)
    {
        attrs.insert("IV", iv);
    }
    attrs
}

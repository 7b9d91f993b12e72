use super::classifier::{Event, Tag};
use super::context::{ParseOptions, substitute_variables};
use super::diagnostics::Diagnostics;
use super::state::ParserState;
use crate::hls::{
    AttributeValue, Attributes, ByteRange, Key, KeyMethod,
    date_time::{parse_date_time, seconds_to_millis, to_millis},
    value::camel_case_keys,
};
use crate::Result;
use crate::manifest::{
    ContentSteering, DateRange, IFramePlaylist, Manifest, MediaGroup, Part, PreloadHint,
    RenditionReport, Skip, Start,
};
use chrono::{DateTime, FixedOffset};
use std::borrow::Cow;

/// Duration given to segments declared with `#EXTINF:0`.
const MIN_SEGMENT_DURATION: f64 = 0.01;

type AttributeHandler = fn(&mut Assembler, Attributes);

/// Folds tokenized events into a [`Manifest`].
///
/// Events must arrive in playlist order: most tags only make sense relative
/// to the state left behind by earlier ones.
#[derive(Debug)]
pub struct Assembler {
    manifest: Manifest,
    state: ParserState,
    options: ParseOptions,
    diagnostics: Diagnostics,
}

impl Assembler {
    pub fn new(options: ParseOptions) -> Self {
        Self {
            manifest: Manifest::new(),
            state: ParserState::new(),
            options,
            diagnostics: Diagnostics::new(),
        }
    }

    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    pub fn into_manifest(self) -> Manifest {
        self.manifest
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub fn diagnostics_mut(&mut self) -> &mut Diagnostics {
        &mut self.diagnostics
    }

    pub fn options(&self) -> &ParseOptions {
        &self.options
    }

    pub fn consume(&mut self, event: Event) {
        match event {
            Event::Uri(uri) => {
                let uri = substitute_variables(&uri, &self.manifest.definitions).into_owned();
                self.on_uri(uri);
            }
            Event::Comment(text) => {
                tracing::trace!("Skipping comment: {}", text);
            }
            Event::Custom {
                custom_type,
                data,
                segment,
            } => self.on_custom(custom_type, data, segment),
            Event::Tag(mut tag) => {
                if let Some(attrs) = tag.attributes_mut() {
                    self.substitute_attributes(attrs);
                }
                tracing::debug!(tag = tag.name(), "Consuming tag");
                self.on_tag(tag);
            }
        }
    }

    /// Close out the session: promote a trailing partial segment and drop
    /// the date-time baseline.
    pub fn finish(&mut self) {
        if let Some(segment) = self.state.take_preload_segment() {
            tracing::debug!(
                parts = segment.parts.len(),
                hints = segment.preload_hints.len(),
                "Promoting trailing segment to preload segment"
            );
            self.manifest.preload_segment = Some(segment);
        }
        self.state.last_program_date_time = None;
    }

    fn substitute_attributes(&self, attrs: &mut Attributes) {
        let definitions = &self.manifest.definitions;
        if definitions.is_empty() {
            return;
        }

        for value in attrs.values_mut() {
            let replaced = match substitute_variables(value, definitions) {
                Cow::Owned(s) => Some(s),
                Cow::Borrowed(_) => None,
            };
            if let Some(s) = replaced {
                *value = s;
            }
        }
    }

    fn on_uri(&mut self, uri: String) {
        if uri.is_empty() {
            self.diagnostics.error("received uri event without a URI");
            return;
        }

        if let Some(mut variant) = self.state.take_pending_variant() {
            variant.uri = uri;
            variant.timeline = self.state.timeline;
            self.manifest.playlists.push(variant);
            return;
        }

        if self.state.current.duration == 0.0
            && let Some(target) = self.manifest.target_duration.filter(|t| *t > 0)
        {
            self.diagnostics
                .warn("defaulting segment duration to the target duration");
            self.state.current.duration = target as f64;
        }

        let segment = self.state.advance_segment(uri);
        self.manifest.segments.push(segment);
    }

    fn on_custom(&mut self, custom_type: String, data: String, segment: bool) {
        if custom_type.is_empty() {
            self.diagnostics.error("received custom event without a type");
            return;
        }

        if segment {
            self.state.current.custom.insert(custom_type, data);
        } else {
            self.manifest.custom.insert(custom_type, data);
        }
    }

    fn on_tag(&mut self, tag: Tag) {
        match tag {
            Tag::M3u => {}
            Tag::Inf { duration, title } => self.on_inf(duration, title),
            Tag::TargetDuration(value) => {
                if value.is_some() {
                    self.manifest.target_duration = value;
                }
            }
            Tag::Version(value) => {
                if value.is_some() {
                    self.manifest.version = value;
                }
            }
            Tag::MediaSequence(value) => {
                if let Some(n) = value {
                    self.manifest.media_sequence = n;
                }
            }
            Tag::DiscontinuitySequence(value) => {
                if let Some(n) = value {
                    self.manifest.discontinuity_sequence = n;
                    self.state.timeline = n;
                }
            }
            Tag::PlaylistType(value) => {
                if value.is_some() {
                    self.manifest.playlist_type = value;
                }
            }
            Tag::ByteRange(value) => {
                let resolved = value.map(|br| self.state.set_byterange(br));
                self.checked_byterange("segment", resolved);
            }
            Tag::AllowCache(value) => match value {
                Some(allowed) => self.manifest.allow_cache = allowed,
                None => {
                    self.manifest.allow_cache = true;
                    self.diagnostics.info("defaulting allowCache to YES");
                }
            },
            Tag::EndList => self.manifest.end_list = true,
            Tag::Discontinuity => {
                self.state.timeline = self.state.timeline.saturating_add(1);
                self.state.current.discontinuity = true;
                self.manifest
                    .discontinuity_starts
                    .push(self.manifest.segments.len());
            }
            Tag::ProgramDateTime { value, date_time } => {
                self.on_program_date_time(value, date_time)
            }
            Tag::CueOut(data) => self.state.current.cue_out = Some(data),
            Tag::CueOutCont(data) => self.state.current.cue_out_cont = Some(data),
            Tag::CueIn(data) => self.state.current.cue_in = Some(data),
            Tag::IndependentSegments => self.manifest.independent_segments = true,
            Tag::IFramesOnly => self.manifest.i_frames_only = true,
            Tag::Gap => self.state.current.gap = true,
            Tag::Bitrate(value) => {
                if value.is_some() {
                    self.state.current.bitrate = value;
                }
            }
            Tag::Map(attrs) => self.with_attributes("map", attrs, Self::on_map),
            Tag::StreamInf(attrs) => self.with_attributes("stream-inf", attrs, Self::on_stream_inf),
            Tag::Media(attrs) => self.with_attributes("media", attrs, Self::on_media),
            Tag::Key(attrs) => self.with_attributes("key", attrs, Self::on_key),
            Tag::Start(attrs) => self.with_attributes("start", attrs, Self::on_start),
            Tag::Skip(attrs) => self.with_attributes("skip", attrs, Self::on_skip),
            Tag::Part(attrs) => self.with_attributes("part", attrs, Self::on_part),
            Tag::ServerControl(attrs) => {
                self.with_attributes("server-control", attrs, Self::on_server_control)
            }
            Tag::PartInf(attrs) => self.with_attributes("part-inf", attrs, Self::on_part_inf),
            Tag::IFrameStreamInf(attrs) => {
                self.with_attributes("i-frame-playlist", attrs, Self::on_i_frame_playlist)
            }
            Tag::DateRange(attrs) => self.with_attributes("daterange", attrs, Self::on_date_range),
            Tag::Define(attrs) => self.with_attributes("define", attrs, Self::on_define),
            Tag::PreloadHint(attrs) => {
                self.with_attributes("preload-hint", attrs, Self::on_preload_hint)
            }
            Tag::RenditionReport(attrs) => {
                self.with_attributes("rendition-report", attrs, Self::on_rendition_report)
            }
            Tag::ContentSteering(attrs) => {
                self.with_attributes("content-steering", attrs, Self::on_content_steering)
            }
            Tag::Unknown(data) => {
                tracing::debug!("Ignoring unsupported tag: #EXT{}", data);
            }
        }
    }

    /// Unwrap a parsed and resolved byte range, warning about a bad one.
    fn checked_byterange(
        &mut self,
        kind: &str,
        byterange: Option<Result<ByteRange>>,
    ) -> Option<ByteRange> {
        match byterange? {
            Ok(br) => Some(br),
            Err(e) => {
                self.diagnostics
                    .warn_invalid(format!("ignoring invalid {} byte range", kind), &e);
                None
            }
        }
    }

    fn with_attributes(&mut self, name: &str, attrs: Option<Attributes>, handler: AttributeHandler) {
        match attrs {
            Some(attrs) => handler(self, attrs),
            None => self
                .diagnostics
                .warn(format!("ignoring {} without attributes", name)),
        }
    }

    fn on_inf(&mut self, duration: Option<f64>, title: Option<String>) {
        if !self.state.sequence_defaults_reported {
            self.state.sequence_defaults_reported = true;
            if self.manifest.media_sequence == 0 {
                self.diagnostics.info("defaulting media sequence to zero");
            }
            if self.manifest.discontinuity_sequence == 0 {
                self.diagnostics
                    .info("defaulting discontinuity sequence to zero");
            }
        }

        if title.is_some() {
            self.state.current.title = title;
        }

        match duration {
            Some(d) if d > 0.0 => self.state.current.duration = d,
            Some(d) if d == 0.0 => {
                self.state.current.duration = MIN_SEGMENT_DURATION;
                self.diagnostics
                    .info("updating zero segment duration to a small value");
            }
            _ => {}
        }
    }

    fn on_program_date_time(
        &mut self,
        value: Option<String>,
        date_time: Option<DateTime<FixedOffset>>,
    ) {
        let Some(value) = value else {
            self.diagnostics
                .warn("ignoring program-date-time without a value");
            return;
        };

        if self.manifest.date_time_string.is_none() {
            self.manifest.date_time_string = Some(value.clone());
            self.manifest.date_time = date_time;
        }

        self.state.current.date_time_string = Some(value.clone());
        self.state.current.date_time = date_time;

        let Some(date_time) = date_time else {
            if let Err(e) = parse_date_time(&value) {
                self.diagnostics
                    .warn_invalid(format!("ignoring unparseable program-date-time {}", value), &e);
            }
            return;
        };

        let millis = to_millis(&date_time);

        if self.state.last_program_date_time.is_none() {
            let mut next = millis;
            for segment in self.manifest.segments.iter_mut().rev() {
                next = next.saturating_sub(seconds_to_millis(segment.duration));
                segment.program_date_time = Some(next);
            }
        }

        self.state.set_program_date_time(millis);
    }

    fn on_map(&mut self, mut attrs: Attributes) {
        let Some(uri) = attrs.remove("URI") else {
            self.diagnostics.warn("ignoring map declaration without URI");
            return;
        };

        let resolved = attrs
            .get("BYTERANGE")
            .map(|s| ByteRange::parse(s).and_then(|br| br.with_continuation(0)));
        let byterange = self.checked_byterange("map", resolved);

        self.state.update_map(uri, byterange);
    }

    fn on_stream_inf(&mut self, attrs: Attributes) {
        self.state.set_pending_variant(attrs);
    }

    fn on_media(&mut self, attrs: Attributes) {
        let (Some(media_type), Some(group_id), Some(name)) =
            (attrs.get("TYPE"), attrs.get("GROUP-ID"), attrs.get("NAME"))
        else {
            let missing = ["TYPE", "GROUP-ID", "NAME"]
                .into_iter()
                .find(|key| !attrs.contains(key))
                .unwrap_or("TYPE");
            self.diagnostics
                .warn(format!("ignoring media without {}", missing));
            return;
        };

        self.manifest
            .media_groups
            .entry(media_type.to_string())
            .or_default()
            .entry(group_id.to_string())
            .or_default()
            .insert(name.to_string(), MediaGroup::from_attributes(&attrs));
    }

    fn on_key(&mut self, attrs: Attributes) {
        if attrs
            .get("METHOD")
            .is_some_and(|m| KeyMethod::parse(m) == KeyMethod::None)
        {
            self.state.clear_key();
            return;
        }

        match Key::from_attributes(&attrs) {
            Some(key) => self.state.update_key(key),
            None => self
                .diagnostics
                .warn("ignoring key declaration without URI"),
        }
    }

    fn on_start(&mut self, attrs: Attributes) {
        let Some(time_offset) = attrs.float("TIME-OFFSET") else {
            self.diagnostics
                .warn("ignoring start declaration without appropriate attribute list");
            return;
        };

        self.manifest.start = Some(Start {
            time_offset,
            precise: attrs.flag("PRECISE"),
        });
    }

    fn on_skip(&mut self, attrs: Attributes) {
        let skipped_segments = attrs.integer("SKIPPED-SEGMENTS");
        if skipped_segments.is_none() {
            self.diagnostics
                .warn("#EXT-X-SKIP lacks required attribute SKIPPED-SEGMENTS");
        }

        let recently_removed_dateranges = attrs
            .get("RECENTLY-REMOVED-DATERANGES")
            .map(|ids| {
                ids.split('\t')
                    .map(str::trim)
                    .filter(|id| !id.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        self.manifest.skip = Some(Skip {
            skipped_segments,
            recently_removed_dateranges,
        });
    }

    fn on_part(&mut self, mut attrs: Attributes) {
        let parts = self.state.current.parts.len();
        for key in ["URI", "DURATION"] {
            if !attrs.contains(key) {
                self.diagnostics.warn(format!(
                    "#EXT-X-PART #{} lacks required attribute {}",
                    parts, key
                ));
            }
        }

        let resolved = attrs.remove("BYTERANGE").map(|s| {
            ByteRange::parse(&s).and_then(|br| self.state.resolve_part_byterange(br))
        });
        let byterange = self.checked_byterange("part", resolved);

        self.state.current.parts.push(Part {
            attributes: camel_case_keys(&attrs),
            byterange,
        });
    }

    fn on_server_control(&mut self, attrs: Attributes) {
        let mut control = camel_case_keys(&attrs);

        if !control.contains_key("canBlockReload") {
            control.insert("canBlockReload".to_string(), AttributeValue::Bool(false));
            self.diagnostics
                .info("#EXT-X-SERVER-CONTROL defaulting CAN-BLOCK-RELOAD to false");
        }

        let can_skip_dateranges = control
            .get("canSkipDateranges")
            .and_then(AttributeValue::as_bool)
            .unwrap_or(false);
        if can_skip_dateranges && !control.contains_key("canSkipUntil") {
            self.diagnostics.warn(
                "#EXT-X-SERVER-CONTROL lacks required attribute CAN-SKIP-UNTIL which is required when CAN-SKIP-DATERANGES is set",
            );
        }

        self.manifest.server_control = Some(control);
    }

    fn on_part_inf(&mut self, attrs: Attributes) {
        let part_inf = camel_case_keys(&attrs);

        match part_inf.get("partTarget").and_then(AttributeValue::as_f64) {
            Some(target) => self.manifest.part_target_duration = Some(target),
            None => self
                .diagnostics
                .warn("#EXT-X-PART-INF lacks required attribute PART-TARGET"),
        }

        self.manifest.part_inf = Some(part_inf);
    }

    fn on_i_frame_playlist(&mut self, mut attrs: Attributes) {
        let Some(uri) = attrs.remove("URI") else {
            self.diagnostics
                .warn("ignoring i-frame-playlist without URI");
            return;
        };

        self.manifest.i_frame_playlists.push(IFramePlaylist {
            uri,
            attributes: attrs,
            timeline: self.state.timeline,
        });
    }

    fn on_date_range(&mut self, attrs: Attributes) {
        let Some(id) = attrs.get("ID") else {
            self.diagnostics.warn("ignoring daterange without ID");
            return;
        };
        let Some(start_date) = attrs.get("START-DATE") else {
            self.diagnostics
                .warn("ignoring daterange without START-DATE");
            return;
        };

        match parse_date_time(start_date) {
            Ok(start_date) => {
                let date_range = DateRange::new(id, start_date, &attrs);
                self.manifest.date_ranges.push(date_range);
            }
            Err(e) => self.diagnostics.warn_invalid(
                format!("ignoring daterange {} with invalid START-DATE", id),
                &e,
            ),
        }
    }

    fn on_define(&mut self, attrs: Attributes) {
        if let (Some(name), Some(value)) = (attrs.get("NAME"), attrs.get("VALUE")) {
            self.define(name, value.to_string());
            return;
        }

        if let Some(name) = attrs.get("IMPORT") {
            match self.options.main_definitions.get(name) {
                Some(value) => {
                    let value = value.clone();
                    self.define(name, value);
                }
                None => self.diagnostics.warn(format!(
                    "#EXT-X-DEFINE IMPORT attribute {} not found in main definitions",
                    name
                )),
            }
            return;
        }

        if let Some(name) = attrs.get("QUERYPARAM") {
            match self.options.query_param(name) {
                Some(value) => self.define(name, value),
                None => self.diagnostics.warn(format!(
                    "#EXT-X-DEFINE QUERYPARAM {} not found in playlist URI",
                    name
                )),
            }
            return;
        }

        self.diagnostics
            .warn("ignoring define without NAME and VALUE, IMPORT or QUERYPARAM");
    }

    fn define(&mut self, name: &str, value: String) {
        if self.manifest.definitions.contains_key(name) {
            self.diagnostics
                .warn(format!("#EXT-X-DEFINE redefines variable {}", name));
        }
        self.manifest.definitions.insert(name.to_string(), value);
    }

    fn on_preload_hint(&mut self, attrs: Attributes) {
        let (Some(hint_type), Some(_)) = (attrs.get("TYPE"), attrs.get("URI")) else {
            self.diagnostics
                .warn("ignoring preload hint without TYPE and URI");
            return;
        };

        let duplicate = self
            .state
            .current
            .preload_hints
            .iter()
            .any(|hint| hint.hint_type() == Some(hint_type));
        if duplicate {
            self.diagnostics.warn(format!(
                "#EXT-X-PRELOAD-HINT has the same TYPE {} as an earlier hint for this segment",
                hint_type
            ));
        }

        let start = attrs.integer("BYTERANGE-START");
        let resolved = attrs
            .integer("BYTERANGE-LENGTH")
            .map(|length| match hint_type {
                "PART" => self
                    .state
                    .resolve_part_byterange(ByteRange::new(length, start)),
                _ => ByteRange::new(length, start).with_continuation(0),
            });
        let byterange = self.checked_byterange("preload hint", resolved);

        self.state.current.preload_hints.push(PreloadHint {
            attributes: camel_case_keys(&attrs),
            byterange,
        });
    }

    fn on_rendition_report(&mut self, mut attrs: Attributes) {
        let Some(uri) = attrs.remove("URI") else {
            self.diagnostics
                .warn("ignoring rendition report without URI");
            return;
        };

        let last_msn = attrs.integer("LAST-MSN");
        if last_msn.is_none() {
            self.diagnostics
                .warn("#EXT-X-RENDITION-REPORT lacks required attribute LAST-MSN");
        }

        self.manifest.rendition_reports.push(RenditionReport {
            uri,
            last_msn,
            last_part: attrs.integer("LAST-PART"),
        });
    }

    fn on_content_steering(&mut self, mut attrs: Attributes) {
        let Some(server_uri) = attrs.remove("SERVER-URI") else {
            self.diagnostics
                .warn("ignoring content steering without SERVER-URI");
            return;
        };

        self.manifest.content_steering = Some(ContentSteering {
            server_uri,
            pathway_id: attrs.remove("PATHWAY-ID"),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::classifier::LineClassifier;
    use crate::stream::diagnostics::DiagnosticLevel;
    use crate::stream::rules::Extensions;
    use url::Url;

    fn assemble_with(options: ParseOptions, lines: &[&str]) -> Assembler {
        let extensions = Extensions::default();
        let mut assembler = Assembler::new(options);
        for line in lines {
            if let Some(event) = LineClassifier::classify(line, &extensions) {
                assembler.consume(event);
            }
        }
        assembler.finish();
        assembler
    }

    fn assemble(lines: &[&str]) -> Assembler {
        assemble_with(ParseOptions::default(), lines)
    }

    fn warnings(assembler: &Assembler) -> Vec<String> {
        assembler
            .diagnostics()
            .at_level(DiagnosticLevel::Warn)
            .map(|d| d.message.clone())
            .collect()
    }

    #[test]
    fn test_duration_defaults() {
        let a = assemble(&[
            "#EXT-X-TARGETDURATION:6",
            "no-inf.ts",
            "#EXTINF:0,",
            "zero.ts",
        ]);
        let segments = &a.manifest().segments;
        assert_eq!(segments[0].duration, 6.0);
        assert_eq!(segments[1].duration, MIN_SEGMENT_DURATION);
        assert!(warnings(&a).contains(&"defaulting segment duration to the target duration".to_string()));
    }

    #[test]
    fn test_sequence_defaults_reported_once() {
        let a = assemble(&["#EXTINF:1,", "a.ts", "#EXTINF:1,", "b.ts"]);
        let infos: Vec<_> = a
            .diagnostics()
            .at_level(DiagnosticLevel::Info)
            .map(|d| d.message.as_str())
            .collect();
        assert_eq!(
            infos,
            vec![
                "defaulting media sequence to zero",
                "defaulting discontinuity sequence to zero"
            ]
        );
    }

    #[test]
    fn test_discontinuity_tracking() {
        let a = assemble(&[
            "#EXT-X-DISCONTINUITY-SEQUENCE:4",
            "#EXTINF:2,",
            "a.ts",
            "#EXT-X-DISCONTINUITY",
            "#EXTINF:2,",
            "b.ts",
        ]);
        let m = a.manifest();
        assert_eq!(m.discontinuity_sequence, 4);
        assert_eq!(m.segments[0].timeline, 4);
        assert_eq!(m.segments[1].timeline, 5);
        assert!(m.segments[1].discontinuity);
        assert_eq!(m.discontinuity_starts, vec![1]);
    }

    #[test]
    fn test_discontinuity_at_max_sequence() {
        let a = assemble(&[
            "#EXT-X-DISCONTINUITY-SEQUENCE:18446744073709551615",
            "#EXT-X-DISCONTINUITY",
            "#EXTINF:2,",
            "a.ts",
        ]);
        assert_eq!(a.manifest().segments[0].timeline, u64::MAX);
    }

    #[test]
    fn test_key_without_uri_keeps_previous() {
        let a = assemble(&[
            r#"#EXT-X-KEY:METHOD=AES-128,URI="k1""#,
            "#EXT-X-KEY:METHOD=AES-128",
            "#EXTINF:2,",
            "a.ts",
        ]);
        assert_eq!(a.manifest().segments[0].key.as_ref().unwrap().uri, "k1");
        assert_eq!(warnings(&a), vec!["ignoring key declaration without URI"]);
    }

    #[test]
    fn test_map_captures_key_and_requires_uri() {
        let a = assemble(&[
            r#"#EXT-X-KEY:METHOD=SAMPLE-AES,URI="k""#,
            r#"#EXT-X-MAP:URI="init.mp4",BYTERANGE="720@0""#,
            "#EXT-X-MAP:BYTERANGE=10",
            "#EXTINF:2,",
            "a.mp4",
        ]);
        let map = a.manifest().segments[0].map.as_ref().unwrap();
        assert_eq!(map.uri, "init.mp4");
        assert_eq!(map.byterange, Some(ByteRange::new(720, Some(0))));
        assert_eq!(map.key.as_ref().unwrap().method, KeyMethod::SampleAes);
        assert_eq!(warnings(&a), vec!["ignoring map declaration without URI"]);
    }

    #[test]
    fn test_media_groups() {
        let a = assemble(&[
            r#"#EXT-X-MEDIA:TYPE=AUDIO,GROUP-ID="aac",NAME="English",DEFAULT=YES,LANGUAGE="en",URI="en.m3u8""#,
            r#"#EXT-X-MEDIA:TYPE=AUDIO,NAME="NoGroup""#,
            r#"#EXT-X-MEDIA:TYPE=DATA,GROUP-ID="d",NAME="x""#,
        ]);
        let groups = &a.manifest().media_groups;
        let english = &groups["AUDIO"]["aac"]["English"];
        assert!(english.default);
        assert_eq!(english.language.as_deref(), Some("en"));
        assert!(groups["DATA"]["d"].contains_key("x"));
        assert!(groups["SUBTITLES"].is_empty());
        assert_eq!(warnings(&a), vec!["ignoring media without GROUP-ID"]);
    }

    #[test]
    fn test_start_and_allow_cache() {
        let a = assemble(&[
            "#EXT-X-ALLOW-CACHE:NO",
            "#EXT-X-START:TIME-OFFSET=-12.5,PRECISE=YES",
        ]);
        assert!(!a.manifest().allow_cache);
        assert_eq!(
            a.manifest().start,
            Some(Start {
                time_offset: -12.5,
                precise: true
            })
        );

        let a = assemble(&["#EXT-X-ALLOW-CACHE:maybe"]);
        assert!(a.manifest().allow_cache);
        assert_eq!(
            a.diagnostics().entries()[0].message,
            "defaulting allowCache to YES"
        );
    }

    #[test]
    fn test_server_control_defaults() {
        let a = assemble(&["#EXT-X-SERVER-CONTROL:CAN-SKIP-DATERANGES=YES,HOLD-BACK=9"]);
        let control = a.manifest().server_control.as_ref().unwrap();
        assert_eq!(control["canBlockReload"], AttributeValue::Bool(false));
        assert_eq!(control["holdBack"], AttributeValue::Number(9.0));
        assert_eq!(warnings(&a).len(), 1);
        assert!(warnings(&a)[0].contains("CAN-SKIP-UNTIL"));
    }

    #[test]
    fn test_part_inf_mirrors_target() {
        let a = assemble(&["#EXT-X-PART-INF:PART-TARGET=1.004"]);
        assert_eq!(a.manifest().part_target_duration, Some(1.004));
    }

    #[test]
    fn test_parts_and_preload_segment() {
        let a = assemble(&[
            "#EXT-X-MAP:URI=\"init.mp4\"",
            "#EXTINF:4,",
            r#"#EXT-X-PART:DURATION=2,URI="a.0.mp4",BYTERANGE=100,INDEPENDENT=YES"#,
            r#"#EXT-X-PART:DURATION=2,URI="a.1.mp4",BYTERANGE=50"#,
            "a.mp4",
            r#"#EXT-X-PART:DURATION=2,URI="b.0.mp4",BYTERANGE=70"#,
            r#"#EXT-X-PRELOAD-HINT:TYPE=PART,URI="b.1.mp4",BYTERANGE-LENGTH=30"#,
        ]);
        let m = a.manifest();

        let parts = &m.segments[0].parts;
        assert_eq!(parts.len(), 2);
        assert!(parts[0].independent());
        assert_eq!(parts[0].byterange, Some(ByteRange::new(100, Some(0))));
        assert_eq!(parts[1].byterange, Some(ByteRange::new(50, Some(100))));
        assert_eq!(parts[1].duration(), Some(2.0));

        let preload = m.preload_segment.as_ref().unwrap();
        assert_eq!(preload.parts[0].byterange, Some(ByteRange::new(70, Some(0))));
        assert_eq!(preload.preload_hints[0].hint_type(), Some("PART"));
        assert_eq!(
            preload.preload_hints[0].byterange,
            Some(ByteRange::new(30, Some(70)))
        );
        assert_eq!(preload.map.as_ref().unwrap().uri, "init.mp4");
    }

    #[test]
    fn test_no_preload_segment_without_parts() {
        let a = assemble(&["#EXTINF:4,", "a.ts", "#EXTINF:4,"]);
        assert!(a.manifest().preload_segment.is_none());
    }

    #[test]
    fn test_daterange() {
        let a = assemble(&[
            r#"#EXT-X-DATERANGE:ID="ad1",CLASS="com.example.ad",START-DATE="2024-01-01T00:00:00Z",DURATION=30,X-AD-ID="0x1F",X-COUNT=3"#,
            r#"#EXT-X-DATERANGE:START-DATE="2024-01-01T00:00:00Z""#,
            r#"#EXT-X-DATERANGE:ID="bad",START-DATE="soon""#,
        ]);
        let ranges = &a.manifest().date_ranges;
        assert_eq!(ranges.len(), 1);
        assert_eq!(ranges[0].id, "ad1");
        assert_eq!(ranges[0].duration, Some(30.0));
        assert_eq!(
            ranges[0].client_attributes["X-AD-ID"],
            AttributeValue::String("0x1F".to_string())
        );
        assert_eq!(ranges[0].client_attributes["X-COUNT"], AttributeValue::Number(3.0));

        let warnings = warnings(&a);
        assert_eq!(warnings[0], "ignoring daterange without ID");
        assert!(warnings[1].starts_with("ignoring daterange bad"));
    }

    #[test]
    fn test_define_and_substitute() {
        let options = ParseOptions::new()
            .with_uri(Url::parse("https://example.com/live.m3u8?token=xyz").unwrap())
            .with_definition("base", "https://cdn.example.com");
        let a = assemble_with(
            options,
            &[
                r#"#EXT-X-DEFINE:NAME="path",VALUE="video""#,
                r#"#EXT-X-DEFINE:IMPORT="base""#,
                r#"#EXT-X-DEFINE:QUERYPARAM="token""#,
                r#"#EXT-X-DEFINE:IMPORT="missing""#,
                r#"#EXT-X-MAP:URI="{$base}/{$path}/init.mp4""#,
                "#EXTINF:2,",
                "{$base}/{$path}/a.ts?t={$token}&u={$unknown}",
            ],
        );
        let m = a.manifest();
        assert_eq!(m.definitions.len(), 3);
        assert_eq!(
            m.segments[0].uri,
            "https://cdn.example.com/video/a.ts?t=xyz&u={$unknown}"
        );
        assert_eq!(
            m.segments[0].map.as_ref().unwrap().uri,
            "https://cdn.example.com/video/init.mp4"
        );
        assert_eq!(warnings(&a).len(), 1);
    }

    #[test]
    fn test_skip_and_rendition_reports() {
        let a = assemble(&[
            "#EXT-X-SKIP:SKIPPED-SEGMENTS=12,RECENTLY-REMOVED-DATERANGES=\"a\tb\"",
            r#"#EXT-X-RENDITION-REPORT:URI="../1M/waitForMSN.php",LAST-MSN=273,LAST-PART=2"#,
        ]);
        let m = a.manifest();
        let skip = m.skip.as_ref().unwrap();
        assert_eq!(skip.skipped_segments, Some(12));
        assert_eq!(skip.recently_removed_dateranges, vec!["a", "b"]);
        assert_eq!(m.rendition_reports[0].last_msn, Some(273));
        assert_eq!(m.rendition_reports[0].last_part, Some(2));
    }

    #[test]
    fn test_i_frame_playlist() {
        let a = assemble(&[
            r#"#EXT-X-I-FRAME-STREAM-INF:BANDWIDTH=86000,URI="iframe.m3u8""#,
            "#EXT-X-I-FRAME-STREAM-INF:BANDWIDTH=1",
        ]);
        let m = a.manifest();
        assert!(m.is_master_playlist());
        assert_eq!(m.i_frame_playlists[0].uri, "iframe.m3u8");
        assert_eq!(m.i_frame_playlists[0].attributes.get("BANDWIDTH"), Some("86000"));
        assert_eq!(warnings(&a), vec!["ignoring i-frame-playlist without URI"]);
    }

    #[test]
    fn test_custom_events() {
        let mut a = Assembler::new(ParseOptions::default());
        a.consume(Event::Custom {
            custom_type: "framerate".to_string(),
            data: "29.97".to_string(),
            segment: false,
        });
        a.consume(Event::Custom {
            custom_type: "timing".to_string(),
            data: "1511816599485".to_string(),
            segment: true,
        });
        a.consume(Event::Uri("a.ts".to_string()));
        a.consume(Event::Custom {
            custom_type: String::new(),
            data: String::new(),
            segment: false,
        });

        let m = a.manifest();
        assert_eq!(m.custom["framerate"], "29.97");
        assert_eq!(m.segments[0].custom["timing"], "1511816599485");
        assert!(a.diagnostics().has_errors());
    }

    #[test]
    fn test_empty_uri_is_internal_error() {
        let mut a = Assembler::new(ParseOptions::default());
        a.consume(Event::Uri(String::new()));
        assert!(a.manifest().segments.is_empty());
        assert!(a.diagnostics().has_errors());
    }

    #[test]
    fn test_missing_attribute_list() {
        let a = assemble(&["#EXT-X-STREAM-INF", "low.m3u8"]);
        assert!(!a.manifest().is_master_playlist());
        assert_eq!(a.manifest().segments[0].uri, "low.m3u8");
        assert_eq!(warnings(&a), vec!["ignoring stream-inf without attributes"]);
    }

    #[test]
    fn test_overflowing_byterange_is_dropped() {
        let a = assemble(&[
            "#EXTINF:4,",
            "#EXT-X-BYTERANGE:18446744073709551615@1",
            "a.ts",
            "#EXTINF:4,",
            "#EXT-X-BYTERANGE:10",
            "b.ts",
            r#"#EXT-X-PART:DURATION=1,URI="p.mp4",BYTERANGE=18446744073709551615@1"#,
        ]);

        let m = a.manifest();
        assert_eq!(m.segments[0].byterange, None);
        assert_eq!(m.segments[1].byterange, Some(ByteRange::new(10, Some(0))));
        assert_eq!(
            m.preload_segment.as_ref().unwrap().parts[0].byterange,
            None
        );

        let dropped: Vec<_> = a
            .diagnostics()
            .at_level(DiagnosticLevel::Warn)
            .filter(|d| d.code == Some("INVALID_BYTE_RANGE"))
            .map(|d| d.message.as_str())
            .collect();
        assert_eq!(
            dropped,
            vec!["ignoring invalid segment byte range", "ignoring invalid part byte range"]
        );
    }

    #[test]
    fn test_huge_durations_saturate_program_date_time() {
        let pdt = "2024-01-01T00:00:00Z";
        let millis = to_millis(&parse_date_time(pdt).unwrap());
        let pdt_line = format!("#EXT-X-PROGRAM-DATE-TIME:{}", pdt);

        let forward = assemble(&[
            pdt_line.as_str(),
            "#EXTINF:1e300,",
            "a.ts",
            "#EXTINF:4,",
            "b.ts",
        ]);
        let segments = &forward.manifest().segments;
        assert_eq!(segments[0].program_date_time, Some(millis));
        assert_eq!(segments[1].program_date_time, Some(i64::MAX));

        let backward = assemble(&[
            "#EXTINF:1e300,",
            "a.ts",
            "#EXTINF:1e300,",
            "b.ts",
            pdt_line.as_str(),
            "#EXTINF:4,",
            "c.ts",
        ]);
        let segments = &backward.manifest().segments;
        assert_eq!(segments[0].program_date_time, Some(i64::MIN));
        assert_eq!(segments[1].program_date_time, Some(millis - i64::MAX));
        assert_eq!(segments[2].program_date_time, Some(millis));
    }

    #[test]
    fn test_non_finite_part_target_is_rejected() {
        let a = assemble(&["#EXT-X-PART-INF:PART-TARGET=NaN"]);
        assert_eq!(a.manifest().part_target_duration, None);
        assert_eq!(
            warnings(&a),
            vec!["#EXT-X-PART-INF lacks required attribute PART-TARGET"]
        );
    }

    #[test]
    fn test_gap_and_bitrate() {
        let a = assemble(&[
            "#EXT-X-BITRATE:1500",
            "#EXTINF:4,",
            "a.ts",
            "#EXT-X-GAP",
            "#EXTINF:4,",
            "b.ts",
        ]);
        let segments = &a.manifest().segments;
        assert_eq!(segments[0].bitrate, Some(1500));
        assert!(!segments[0].gap);
        assert!(segments[1].gap);
        assert_eq!(segments[1].bitrate, None);
    }

    #[test]
    fn test_content_steering() {
        let a = assemble(&[
            r#"#EXT-X-CONTENT-STEERING:SERVER-URI="steer.json",PATHWAY-ID="CDN-A""#,
        ]);
        assert_eq!(
            a.manifest().content_steering,
            Some(ContentSteering {
                server_uri: "steer.json".to_string(),
                pathway_id: Some("CDN-A".to_string()),
            })
        );

        let a = assemble(&[r#"#EXT-X-CONTENT-STEERING:PATHWAY-ID="CDN-A""#]);
        assert!(a.manifest().content_steering.is_none());
        assert_eq!(
            warnings(&a),
            vec!["ignoring content steering without SERVER-URI"]
        );
    }

    #[test]
    fn test_duplicate_preload_hint_type_warns() {
        let a = assemble(&[
            r#"#EXT-X-PRELOAD-HINT:TYPE=PART,URI="a.1.mp4""#,
            r#"#EXT-X-PRELOAD-HINT:TYPE=PART,URI="a.2.mp4""#,
        ]);
        assert_eq!(
            a.manifest().preload_segment.as_ref().unwrap().preload_hints.len(),
            2
        );
        assert_eq!(
            warnings(&a),
            vec!["#EXT-X-PRELOAD-HINT has the same TYPE PART as an earlier hint for this segment"]
        );
    }

    #[test]
    fn test_define_redefinition_warns() {
        let a = assemble(&[
            r#"#EXT-X-DEFINE:NAME="host",VALUE="a.example""#,
            r#"#EXT-X-DEFINE:NAME="host",VALUE="b.example""#,
        ]);
        assert_eq!(a.manifest().definitions["host"], "b.example");
        assert_eq!(warnings(&a), vec!["#EXT-X-DEFINE redefines variable host"]);
    }

    #[test]
    fn test_key_format_attributes() {
        let a = assemble(&[
            r#"#EXT-X-KEY:METHOD=SAMPLE-AES,URI="skd://key",KEYFORMAT="com.apple.streamingkeydelivery",KEYFORMATVERSIONS="1""#,
            "#EXTINF:4,",
            "a.ts",
        ]);
        let key = a.manifest().segments[0].key.as_ref().unwrap();
        assert_eq!(key.method, KeyMethod::SampleAes);
        assert_eq!(key.keyformat.as_deref(), Some("com.apple.streamingkeydelivery"));
        assert_eq!(key.keyformatversions.as_deref(), Some("1"));
    }

    #[test]
    fn test_playlist_flags() {
        let a = assemble(&[
            "#EXT-X-PLAYLIST-TYPE:VOD",
            "#EXT-X-INDEPENDENT-SEGMENTS",
            "#EXT-X-I-FRAMES-ONLY",
        ]);
        let m = a.manifest();
        assert_eq!(m.playlist_type.as_deref(), Some("VOD"));
        assert!(m.independent_segments);
        assert!(m.i_frames_only);
    }

    #[test]
    fn test_cue_tags_stored_on_segments() {
        let a = assemble(&[
            "#EXT-X-CUE-OUT:30",
            "#EXTINF:10,",
            "ad1.ts",
            "#EXT-X-CUE-OUT-CONT:ElapsedTime=10,Duration=30",
            "#EXTINF:10,",
            "ad2.ts",
            "#EXT-X-CUE-IN",
            "#EXTINF:10,",
            "main.ts",
        ]);
        let segments = &a.manifest().segments;
        assert_eq!(segments[0].cue_out.as_deref(), Some("30"));
        assert_eq!(
            segments[1].cue_out_cont.as_deref(),
            Some("ElapsedTime=10,Duration=30")
        );
        assert_eq!(segments[2].cue_in.as_deref(), Some(""));
        assert!(segments[2].cue_out.is_none());
    }
}

use crate::Result;
use crate::hls::{Attributes, ByteRange, Key, date_time::seconds_to_millis};
use crate::manifest::{InitMap, Segment};
use std::mem;
use std::sync::Arc;

/// Carry-over state of a parse session.
///
/// Everything a playlist line can inherit from earlier lines lives here; the
/// manifest itself only ever grows.
#[derive(Debug, Clone, Default)]
pub struct ParserState {
    /// Segment being built by the tags seen since the last URI.
    pub current: Segment,

    /// Active encryption key.
    pub current_key: Option<Arc<Key>>,

    /// Active initialization section.
    pub current_map: Option<Arc<InitMap>>,

    /// Discontinuity counter.
    pub timeline: u64,

    /// End of the last segment byte range (for continuation).
    pub last_byterange_end: u64,

    /// End of the last part byte range; reset at every segment.
    pub last_part_byterange_end: u64,

    /// Variant waiting for its URI line.
    pub pending_variant: Option<Segment>,

    /// Program date-time, in ms, of the next segment to close.
    pub last_program_date_time: Option<i64>,

    /// Whether the media/discontinuity sequence defaults were reported.
    pub sequence_defaults_reported: bool,
}

impl ParserState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_pending_variant(&mut self, attributes: Attributes) {
        self.pending_variant = Some(Segment {
            attributes,
            ..Segment::default()
        });
    }

    pub fn take_pending_variant(&mut self) -> Option<Segment> {
        self.pending_variant.take()
    }

    pub fn update_key(&mut self, key: Key) {
        self.current_key = Some(Arc::new(key));
    }

    pub fn clear_key(&mut self) {
        self.current_key = None;
    }

    /// Make a new init section active. It keeps the key active right now.
    ///
    /// `byterange` must already be resolved.
    pub fn update_map(&mut self, uri: String, byterange: Option<ByteRange>) {
        self.current_map = Some(Arc::new(InitMap {
            uri,
            byterange,
            key: self.current_key.clone(),
        }));
    }

    /// Resolve a segment byte range against the cursor and attach it to the
    /// segment being built. On error neither the cursor nor the segment
    /// changes.
    pub fn set_byterange(&mut self, br: ByteRange) -> Result<ByteRange> {
        let br = br.with_continuation(self.last_byterange_end)?;
        self.last_byterange_end = br.end_offset().unwrap_or_default();
        self.current.byterange = Some(br);
        Ok(br)
    }

    /// Resolve a part (or part preload hint) byte range against the part
    /// cursor.
    pub fn resolve_part_byterange(&mut self, br: ByteRange) -> Result<ByteRange> {
        let br = br.with_continuation(self.last_part_byterange_end)?;
        self.last_part_byterange_end = br.end_offset().unwrap_or_default();
        Ok(br)
    }

    /// Anchor the program date-time baseline.
    pub fn set_program_date_time(&mut self, millis: i64) {
        self.last_program_date_time = Some(millis);
    }

    /// Close the segment being built under `uri` and start a fresh one.
    ///
    /// The closed segment picks up the active key, map and timeline, and is
    /// stamped with the program date-time baseline, which then moves past
    /// it.
    pub fn advance_segment(&mut self, uri: String) -> Segment {
        let mut segment = mem::take(&mut self.current);

        segment.uri = uri;
        if let Some(key) = &self.current_key {
            segment.key = Some(Arc::clone(key));
        }
        if let Some(map) = &self.current_map {
            segment.map = Some(Arc::clone(map));
        }
        segment.timeline = self.timeline;

        self.last_part_byterange_end = 0;

        if let Some(pdt) = self.last_program_date_time {
            segment.program_date_time = Some(pdt);
            self.last_program_date_time =
                Some(pdt.saturating_add(seconds_to_millis(segment.duration)));
        }

        segment
    }

    /// The unfinished segment, if it advertises parts or preload hints.
    pub fn take_preload_segment(&mut self) -> Option<Segment> {
        if !self.current.uri.is_empty() || !self.current.has_partial_content() {
            return None;
        }

        let mut segment = mem::take(&mut self.current);
        if segment.map.is_none() {
            segment.map = self.current_map.clone();
        }
        if segment.key.is_none() {
            segment.key = self.current_key.clone();
        }
        if segment.timeline == 0 {
            segment.timeline = self.timeline;
        }
        Some(segment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hls::KeyMethod;
    use crate::manifest::Part;

    fn key(uri: &str) -> Key {
        Key {
            method: KeyMethod::Aes128,
            uri: uri.to_string(),
            iv: None,
            keyformat: None,
            keyformatversions: None,
        }
    }

    #[test]
    fn test_byterange_continuation() {
        let mut state = ParserState::new();
        assert_eq!(
            state.set_byterange(ByteRange::new(100, None)).unwrap(),
            ByteRange::new(100, Some(0))
        );
        assert_eq!(
            state.set_byterange(ByteRange::new(50, None)).unwrap(),
            ByteRange::new(50, Some(100))
        );
        assert_eq!(
            state.set_byterange(ByteRange::new(10, Some(0))).unwrap(),
            ByteRange::new(10, Some(0))
        );
        assert_eq!(state.last_byterange_end, 10);
    }

    #[test]
    fn test_overflowing_byterange_leaves_cursor() {
        let mut state = ParserState::new();
        state.set_byterange(ByteRange::new(100, None)).unwrap();

        assert!(state.set_byterange(ByteRange::new(u64::MAX, Some(1))).is_err());
        assert_eq!(state.last_byterange_end, 100);
        assert_eq!(state.current.byterange, Some(ByteRange::new(100, Some(0))));

        assert!(state.resolve_part_byterange(ByteRange::new(u64::MAX, Some(1))).is_err());
        assert_eq!(state.last_part_byterange_end, 0);
    }

    #[test]
    fn test_part_cursor_resets_per_segment() {
        let mut state = ParserState::new();
        state.resolve_part_byterange(ByteRange::new(100, None)).unwrap();
        assert_eq!(
            state.resolve_part_byterange(ByteRange::new(20, None)).unwrap(),
            ByteRange::new(20, Some(100))
        );

        state.advance_segment("a.mp4".to_string());
        assert_eq!(
            state.resolve_part_byterange(ByteRange::new(20, None)).unwrap(),
            ByteRange::new(20, Some(0))
        );
    }

    #[test]
    fn test_map_captures_active_key() {
        let mut state = ParserState::new();
        state.update_key(key("k1"));
        state.update_map("init.mp4".to_string(), None);
        state.update_key(key("k2"));

        let map = state.current_map.as_ref().unwrap();
        assert_eq!(map.key.as_ref().unwrap().uri, "k1");
    }

    #[test]
    fn test_advance_segment_shares_key() {
        let mut state = ParserState::new();
        state.update_key(key("k"));
        state.timeline = 2;

        let first = state.advance_segment("1.ts".to_string());
        let second = state.advance_segment("2.ts".to_string());

        assert_eq!(first.uri, "1.ts");
        assert_eq!(first.timeline, 2);
        assert!(Arc::ptr_eq(
            first.key.as_ref().unwrap(),
            second.key.as_ref().unwrap()
        ));

        state.clear_key();
        assert!(state.advance_segment("3.ts".to_string()).key.is_none());
    }

    #[test]
    fn test_advance_segment_moves_program_date_time() {
        let mut state = ParserState::new();
        state.set_program_date_time(1_000);
        state.current.duration = 4.004;

        let segment = state.advance_segment("1.ts".to_string());
        assert_eq!(segment.program_date_time, Some(1_000));
        assert_eq!(state.last_program_date_time, Some(5_004));
    }

    #[test]
    fn test_program_date_time_saturates() {
        let mut state = ParserState::new();
        state.set_program_date_time(1_000);
        state.current.duration = 1e300;

        let segment = state.advance_segment("1.ts".to_string());
        assert_eq!(segment.program_date_time, Some(1_000));
        assert_eq!(state.last_program_date_time, Some(i64::MAX));

        state.current.duration = 4.0;
        state.advance_segment("2.ts".to_string());
        assert_eq!(state.last_program_date_time, Some(i64::MAX));
    }

    #[test]
    fn test_preload_segment_requires_partial_content() {
        let mut state = ParserState::new();
        assert!(state.take_preload_segment().is_none());

        state.timeline = 1;
        state.update_map("init.mp4".to_string(), None);
        state.current.parts.push(Part::default());

        let preload = state.take_preload_segment().unwrap();
        assert_eq!(preload.timeline, 1);
        assert_eq!(preload.map.as_ref().unwrap().uri, "init.mp4");
    }

    #[test]
    fn test_pending_variant() {
        let mut state = ParserState::new();
        state.set_pending_variant(Attributes::parse("BANDWIDTH=1"));
        let variant = state.take_pending_variant().unwrap();
        assert_eq!(variant.attributes.get("BANDWIDTH"), Some("1"));
        assert!(state.take_pending_variant().is_none());
    }
}

pub mod custom_parser;
pub mod tag_mapper;

use super::classifier::Event;
use std::borrow::Cow;
use std::fmt;

pub use custom_parser::RegexCustomParser;
pub use tag_mapper::RegexTagMapper;

/// Rewrites a `#` line before it is classified.
pub trait TagMapper: Send + Sync {
    fn matches(&self, line: &str) -> bool;

    fn map(&self, line: &str) -> String;
}

/// Claims non-standard lines and turns them into custom events.
pub trait CustomTagParser: Send + Sync {
    fn matches(&self, line: &str) -> bool;

    /// Key under which the data is stored on the manifest or segment.
    fn custom_type(&self) -> &str;

    /// Payload carried by the event.
    fn parse(&self, line: &str) -> String {
        line.to_string()
    }

    /// Attach to the segment being built instead of the manifest.
    fn is_segment_scoped(&self) -> bool {
        false
    }
}

/// Ordered tag mappers and custom parsers consulted before the built-in
/// tag table.
#[derive(Default)]
pub struct Extensions {
    tag_mappers: Vec<Box<dyn TagMapper>>,
    parsers: Vec<Box<dyn CustomTagParser>>,
}

impl Extensions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_tag_mapper(&mut self, mapper: impl TagMapper + 'static) {
        self.tag_mappers.push(Box::new(mapper));
    }

    pub fn add_parser(&mut self, parser: impl CustomTagParser + 'static) {
        self.parsers.push(Box::new(parser));
    }

    /// Run every matching mapper in registration order, each seeing the
    /// previous one's output.
    pub fn map_line<'a>(&self, line: &'a str) -> Cow<'a, str> {
        let mut line = Cow::Borrowed(line);
        for mapper in &self.tag_mappers {
            if mapper.matches(&line) {
                line = Cow::Owned(mapper.map(&line));
            }
        }
        line
    }

    /// First matching parser wins.
    pub fn parse_custom(&self, line: &str) -> Option<Event> {
        let parser = self.parsers.iter().find(|p| p.matches(line))?;
        Some(Event::Custom {
            custom_type: parser.custom_type().to_string(),
            data: parser.parse(line),
            segment: parser.is_segment_scoped(),
        })
    }
}

impl fmt::Debug for Extensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Extensions")
            .field("tag_mappers", &self.tag_mappers.len())
            .field("parsers", &self.parsers.len())
            .finish()
    }
}

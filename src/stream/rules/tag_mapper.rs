use super::TagMapper;
use crate::Result;
use regex::Regex;

type MapFn = dyn Fn(&str) -> String + Send + Sync;

/// Rewrites lines matching a regular expression.
pub struct RegexTagMapper {
    expression: Regex,
    map: Box<MapFn>,
}

impl RegexTagMapper {
    pub fn new(
        pattern: &str,
        map: impl Fn(&str) -> String + Send + Sync + 'static,
    ) -> Result<Self> {
        Ok(Self::from_regex(Regex::new(pattern)?, map))
    }

    pub fn from_regex(
        expression: Regex,
        map: impl Fn(&str) -> String + Send + Sync + 'static,
    ) -> Self {
        Self {
            expression,
            map: Box::new(map),
        }
    }
}

impl TagMapper for RegexTagMapper {
    fn matches(&self, line: &str) -> bool {
        self.expression.is_match(line)
    }

    fn map(&self, line: &str) -> String {
        (self.map)(line)
    }
}

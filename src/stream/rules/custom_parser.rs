use super::CustomTagParser;
use crate::Result;
use regex::Regex;

type DataParser = dyn Fn(&str) -> String + Send + Sync;

/// Claims lines matching a regular expression as a custom type.
pub struct RegexCustomParser {
    expression: Regex,
    custom_type: String,
    data_parser: Option<Box<DataParser>>,
    segment: bool,
}

impl RegexCustomParser {
    pub fn new(pattern: &str, custom_type: impl Into<String>) -> Result<Self> {
        Ok(Self::from_regex(Regex::new(pattern)?, custom_type))
    }

    pub fn from_regex(expression: Regex, custom_type: impl Into<String>) -> Self {
        Self {
            expression,
            custom_type: custom_type.into(),
            data_parser: None,
            segment: false,
        }
    }

    /// Transform the matched line before it is stored.
    pub fn with_data_parser(
        mut self,
        parser: impl Fn(&str) -> String + Send + Sync + 'static,
    ) -> Self {
        self.data_parser = Some(Box::new(parser));
        self
    }

    /// Store on the segment being built rather than on the manifest.
    pub fn segment_scoped(mut self) -> Self {
        self.segment = true;
        self
    }
}

impl CustomTagParser for RegexCustomParser {
    fn matches(&self, line: &str) -> bool {
        self.expression.is_match(line)
    }

    fn custom_type(&self) -> &str {
        &self.custom_type
    }

    fn parse(&self, line: &str) -> String {
        match &self.data_parser {
            Some(parser) => parser(line),
            None => line.to_string(),
        }
    }

    fn is_segment_scoped(&self) -> bool {
        self.segment
    }
}

use regex::{Captures, Regex};
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::sync::LazyLock;
use url::Url;

static VARIABLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\$([A-Za-z0-9_-]+)\}").expect("variable pattern is valid")
});

/// Session-level inputs consulted while parsing a playlist.
#[derive(Debug, Clone, Default)]
pub struct ParseOptions {
    /// Where the playlist was fetched from. Query parameters feed
    /// `EXT-X-DEFINE:QUERYPARAM`.
    pub uri: Option<Url>,

    /// Definitions of the parent playlist, for `EXT-X-DEFINE:IMPORT`.
    pub main_definitions: BTreeMap<String, String>,
}

impl ParseOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_uri(mut self, uri: Url) -> Self {
        self.uri = Some(uri);
        self
    }

    pub fn with_main_definitions(mut self, definitions: BTreeMap<String, String>) -> Self {
        self.main_definitions = definitions;
        self
    }

    pub fn with_definition(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.main_definitions.insert(name.into(), value.into());
        self
    }

    /// Decoded value of a query parameter of the playlist URI.
    pub fn query_param(&self, name: &str) -> Option<String> {
        self.uri
            .as_ref()?
            .query_pairs()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.into_owned())
    }
}

/// Replace `{$name}` placeholders with their definitions. Unknown names are
/// left as written.
pub fn substitute_variables<'a>(
    input: &'a str,
    definitions: &BTreeMap<String, String>,
) -> Cow<'a, str> {
    if definitions.is_empty() || !input.contains("{$") {
        return Cow::Borrowed(input);
    }

    VARIABLE.replace_all(input, |caps: &Captures| match definitions.get(&caps[1]) {
        Some(value) => value.clone(),
        None => caps[0].to_string(),
    })
}

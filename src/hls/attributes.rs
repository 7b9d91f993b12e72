use serde::Serialize;
use std::collections::BTreeMap;

/// Raw `KEY=VALUE` pairs from an HLS attribute list.
///
/// Values are always kept as strings; typed coercion is left to the tag that
/// owns the attribute.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Attributes(BTreeMap<String, String>);

impl Attributes {
    /// Parse the text after a tag's colon.
    ///
    /// Commas inside double quotes do not split. Fragments without `=` are
    /// skipped. Keys and values are trimmed, and one pair of surrounding quotes
    /// is removed from the value.
    pub fn parse(s: &str) -> Self {
        let mut attributes = BTreeMap::new();

        for fragment in split_unquoted(s) {
            let Some((key, value)) = fragment.split_once('=') else {
                continue;
            };
            let key = key.trim();
            if key.is_empty() {
                continue;
            }
            attributes.insert(key.to_string(), unquote(value.trim()).to_string());
        }

        Self(attributes)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.0.remove(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut String> {
        self.0.values_mut()
    }

    /// `YES` flags. Anything else, including absence, is false.
    pub fn flag(&self, key: &str) -> bool {
        self.get(key).is_some_and(|v| v.eq_ignore_ascii_case("YES"))
    }

    pub fn float(&self, key: &str) -> Option<f64> {
        self.get(key)
            .and_then(|v| v.parse::<f64>().ok())
            .filter(|f| f.is_finite())
    }

    pub fn integer(&self, key: &str) -> Option<u64> {
        self.get(key).and_then(|v| v.parse().ok())
    }
}

impl FromIterator<(String, String)> for Attributes {
    fn from_iter<T: IntoIterator<Item = (String, String)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

fn split_unquoted(s: &str) -> Vec<&str> {
    let mut fragments = Vec::new();
    let mut start = 0;
    let mut in_quotes = false;

    for (i, c) in s.char_indices() {
        match c {
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => {
                fragments.push(s[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }

    if start < s.len() {
        fragments.push(s[start..].trim());
    }

    fragments
}

fn unquote(value: &str) -> &str {
    let bytes = value.as_bytes();
    if bytes.len() >= 2
        && matches!(bytes[0], b'"' | b'\'')
        && matches!(bytes[bytes.len() - 1], b'"' | b'\'')
    {
        &value[1..value.len() - 1]
    } else {
        value
    }
}

//! Attribute-list handling for HLS tag lines.
//!
//! Tags such as `#EXT-X-KEY:METHOD=AES-128,URI="key.bin"` carry a
//! comma-separated list of `KEY=VALUE` pairs. Quoted values may themselves
//! contain commas (`CODECS="avc1.4d401f,mp4a.40.2"`), so the list is split
//! only on commas that sit outside double quotes.

use std::fmt;

/// A single `KEY=VALUE` pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub key: String,
    /// Value with surrounding quotes removed.
    pub value: String,
    /// Whether the value was written as a quoted-string.
    pub quoted: bool,
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.quoted {
            write!(f, "{}=\"{}\"", self.key, self.value)
        } else {
            write!(f, "{}={}", self.key, self.value)
        }
    }
}

/// Ordered attribute list. Keys keep their first-seen position; a repeated
/// key overwrites the earlier value in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttributeList {
    attributes: Vec<Attribute>,
}

impl AttributeList {
    /// Tokenize the part of a tag line after the first `:`.
    ///
    /// Pairs without a key or without a value are dropped.
    pub fn parse(input: &str) -> Self {
        let mut list = Self::default();

        for token in split_top_level(input) {
            let Some((key, value)) = token.split_once('=') else {
                continue;
            };

            let key = key.trim();
            let value = value.trim();
            let (value, quoted) = strip_quotes(value);

            if key.is_empty() || value.is_empty() {
                continue;
            }

            list.insert(Attribute {
                key: key.to_string(),
                value: value.to_string(),
                quoted,
            });
        }

        list
    }

    fn insert(&mut self, attribute: Attribute) {
        match self.attributes.iter_mut().find(|a| a.key == attribute.key) {
            Some(existing) => *existing = attribute,
            None => self.attributes.push(attribute),
        }
    }

    /// Look up the value for `key` (exact, case-sensitive match).
    pub fn get(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.key == key)
            .map(|a| a.value.as_str())
    }

    /// Replace the value of an existing `key` with a quoted-string.
    ///
    /// Returns `false` if the key is not present.
    pub fn set_quoted(&mut self, key: &str, value: String) -> bool {
        match self.attributes.iter_mut().find(|a| a.key == key) {
            Some(attribute) => {
                attribute.value = value;
                attribute.quoted = true;
                true
            }
            None => false,
        }
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.attributes.len()
    }

    #[cfg(test)]
    fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    #[cfg(test)]
    fn iter(&self) -> impl Iterator<Item = &Attribute> {
        self.attributes.iter()
    }
}

impl fmt::Display for AttributeList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, attribute) in self.attributes.iter().enumerate() {
            if idx > 0 {
                f.write_str(",")?;
            }
            write!(f, "{attribute}")?;
        }
        Ok(())
    }
}

/// Split on commas that are not inside a double-quoted section.
fn split_top_level(input: &str) -> Vec<&str> {
    let mut tokens = Vec::new();
    let mut in_quotes = false;
    let mut start = 0;

    for (idx, ch) in input.char_indices() {
        match ch {
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => {
                tokens.push(&input[start..idx]);
                start = idx + 1;
            }
            _ => {}
        }
    }
    tokens.push(&input[start..]);

    tokens
}

/// Remove one pair of surrounding double quotes, if present.
fn strip_quotes(value: &str) -> (&str, bool) {
    match value
        .strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
    {
        Some(inner) => (inner, true),
        None => (value, false),
    }
}

//! Caller-supplied upstream headers.
//!
//! The `headers` query parameter is a JSON object of header name to value.
//! It is forwarded on the upstream request and re-attached, as the original
//! string, to every proxied URL in a rewritten playlist.

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::warn;

/// Parsed header set, ordered by header name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderSet {
    headers: BTreeMap<String, String>,
}

impl HeaderSet {
    /// Parse the serialized header set.
    ///
    /// Returns `None` (and logs) when `raw` is not a JSON object. String
    /// values are taken verbatim, numbers and booleans are stringified, any
    /// other value type is skipped.
    pub fn parse(raw: &str) -> Option<Self> {
        let object = match serde_json::from_str::<Value>(raw) {
            Ok(Value::Object(object)) => object,
            Ok(other) => {
                warn!(
                    "Malformed scrape headers (expected a JSON object, got {}), using default",
                    json_kind(&other)
                );
                return None;
            }
            Err(e) => {
                warn!("Malformed scrape headers ({}), using default", e);
                return None;
            }
        };

        let headers = object
            .into_iter()
            .filter_map(|(name, value)| match value {
                Value::String(s) => Some((name, s)),
                Value::Number(n) => Some((name, n.to_string())),
                Value::Bool(b) => Some((name, b.to_string())),
                _ => None,
            })
            .collect();

        Some(Self { headers })
    }

    #[cfg(test)]
    fn get(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.headers.len()
    }

    /// Insert every entry into `map`, replacing existing values.
    ///
    /// Entries that are not valid HTTP header names or values are skipped.
    pub fn apply_to(&self, map: &mut HeaderMap) {
        for (name, value) in &self.headers {
            let parsed_name = HeaderName::from_bytes(name.as_bytes());
            let parsed_value = HeaderValue::from_str(value);

            match (parsed_name, parsed_value) {
                (Ok(name), Ok(value)) => {
                    map.insert(name, value);
                }
                _ => warn!("Skipping invalid scrape header {:?}", name),
            }
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

//! Playlist rewriting.
//!
//! Every reference inside a fetched playlist is replaced by a proxied URL
//! pointing back at this service, so that players fetch sub-playlists, init
//! segments, keys and media segments through the proxy as well.
//!
//! The rewrite works line by line on the raw text instead of going through a
//! full playlist parser: unknown tags and formatting survive untouched and the
//! output always has exactly as many lines as the input.

use super::{attributes::AttributeList, resolver::resolve};
use url::{Url, form_urlencoded};

/// Default entry path of the proxy route.
pub const DEFAULT_ENTRY_PATH: &str = "/v2";

const MAP_TAG_PREFIX: &str = "#EXT-X-MAP:URI=\"";
const URI_MARKER: &str = "URI=\"";

/// Rewrites playlist references into proxied URLs.
#[derive(Debug, Clone)]
pub struct PlaylistRewriter {
    entry_path: String,
}

impl Default for PlaylistRewriter {
    fn default() -> Self {
        Self::new(DEFAULT_ENTRY_PATH)
    }
}

impl PlaylistRewriter {
    /// Create a rewriter whose proxied URLs point at `entry_path`.
    pub fn new(entry_path: impl Into<String>) -> Self {
        Self {
            entry_path: entry_path.into(),
        }
    }

    /// Build the relative proxied URL for an already-resolved target.
    ///
    /// `headers` is the caller's serialized header set, attached unchanged.
    pub fn proxied_url(&self, target: &Url, headers: Option<&str>) -> String {
        let mut query = form_urlencoded::Serializer::new(String::new());
        query.append_pair("url", target.as_str());
        if let Some(headers) = headers {
            query.append_pair("headers", headers);
        }

        format!("{}?{}", self.entry_path, query.finish())
    }

    /// Rewrite a whole playlist fetched from `base`.
    ///
    /// Lines are split on `\n` and joined back with `\n`; a trailing `\r` on
    /// any line is preserved.
    pub fn rewrite(&self, playlist: &str, base: &Url, headers: Option<&str>) -> String {
        self.rewrite_counted(playlist, base, headers).0
    }

    /// Like [`rewrite`](Self::rewrite), also returning how many references
    /// were replaced.
    pub fn rewrite_counted(
        &self,
        playlist: &str,
        base: &Url,
        headers: Option<&str>,
    ) -> (String, usize) {
        let mut output = String::with_capacity(playlist.len() * 2);
        let mut references = 0;

        for (idx, raw_line) in playlist.split('\n').enumerate() {
            if idx > 0 {
                output.push('\n');
            }

            let (line, carriage_return) = match raw_line.strip_suffix('\r') {
                Some(line) => (line, "\r"),
                None => (raw_line, ""),
            };

            output.push_str(&self.rewrite_line(line, base, headers, &mut references));
            output.push_str(carriage_return);
        }

        (output, references)
    }

    /// Rewrite a single line (without its line terminator), adding the number
    /// of replaced references to `references`.
    fn rewrite_line(
        &self,
        line: &str,
        base: &Url,
        headers: Option<&str>,
        references: &mut usize,
    ) -> String {
        if line.trim().is_empty() {
            return line.to_string();
        }

        if !line.starts_with('#') {
            *references += 1;
            return self.proxy_reference(line, base, headers);
        }

        if line.starts_with(MAP_TAG_PREFIX) {
            *references += 1;
            return self.rewrite_map_tag(line, base, headers);
        }

        let lowered = line.to_ascii_lowercase();
        if lowered.contains("uri") || lowered.contains("url") {
            return self.rewrite_attributed_tag(line, base, headers, references);
        }

        line.to_string()
    }

    fn proxy_reference(&self, reference: &str, base: &Url, headers: Option<&str>) -> String {
        let target = resolve(reference, Some(base));
        self.proxied_url(&target, headers)
    }

    /// `#EXT-X-MAP:URI="init.mp4"`: swap the quoted value, keep the rest.
    fn rewrite_map_tag(&self, line: &str, base: &Url, headers: Option<&str>) -> String {
        let Some((uri, value_start, value_end)) = extract_quoted_uri(line) else {
            // Unterminated quote: everything after the marker is the reference.
            let uri = &line[MAP_TAG_PREFIX.len()..];
            return format!(
                "{}{}\"",
                MAP_TAG_PREFIX,
                self.proxy_reference(uri, base, headers)
            );
        };

        let proxied = self.proxy_reference(uri, base, headers);

        let mut result = String::with_capacity(line.len() + proxied.len());
        result.push_str(&line[..value_start]);
        result.push_str(&proxied);
        result.push_str(&line[value_end..]);
        result
    }

    /// Generic `#TAG:KEY=VALUE,...` line mentioning a URI or URL.
    fn rewrite_attributed_tag(
        &self,
        line: &str,
        base: &Url,
        headers: Option<&str>,
        references: &mut usize,
    ) -> String {
        let Some((top_key, attribute_list)) = line.split_once(':') else {
            return line.to_string();
        };

        let mut attributes = AttributeList::parse(attribute_list);
        if attributes.get("URI").is_none() && attributes.get("URL").is_none() {
            // Free-text mention only, e.g. an EXTINF title
            return line.to_string();
        }

        for key in ["URI", "URL"] {
            if let Some(reference) = attributes.get(key) {
                let proxied = self.proxy_reference(reference, base, headers);
                attributes.set_quoted(key, proxied);
                *references += 1;
            }
        }

        format!("{top_key}:{attributes}")
    }
}

/// Locate the value of the first `URI="..."` in `line`.
///
/// Returns the value and the byte range it occupies (quotes excluded).
fn extract_quoted_uri(line: &str) -> Option<(&str, usize, usize)> {
    let value_start = line.find(URI_MARKER)? + URI_MARKER.len();
    let value_len = line[value_start..].find('"')?;
    let value_end = value_start + value_len;

    Some((&line[value_start..value_end], value_start, value_end))
}

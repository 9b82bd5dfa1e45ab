//! Reference resolution for playlist entries.
//!
//! Turns whatever a playlist line points at (absolute, protocol-relative or
//! relative) into an absolute [`Url`]. Resolution never fails: anything that
//! cannot be parsed collapses to [`FALLBACK_URL`] so a single bad entry does
//! not take down the whole playlist.

use std::sync::LazyLock;
use tracing::debug;
use url::Url;

/// Placeholder returned when a reference cannot be resolved.
pub const FALLBACK_URL: &str = "https://example.com/";

static FALLBACK: LazyLock<Url> =
    LazyLock::new(|| Url::parse(FALLBACK_URL).expect("fallback URL is a valid absolute URL"));

/// Returns `true` for references of the form `http://...` or `https://...`
/// (scheme matched case-insensitively).
fn is_absolute_http(reference: &str) -> bool {
    let has_prefix = |prefix: &str| {
        reference
            .get(..prefix.len())
            .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
    };

    has_prefix("http://") || has_prefix("https://")
}

/// Resolve `reference` to an absolute URL.
///
/// Precedence:
/// 1. `http(s)://...` is parsed as-is.
/// 2. `//host/path` is treated as `https://host/path`.
/// 3. Anything else is joined onto the directory of `base`. A single leading
///    `/` is stripped first, so `/seg.ts` lands next to the playlist rather
///    than at the host root. Scheme, host, port, query and fragment of `base`
///    are kept.
/// 4. No `base` for a relative reference gives [`FALLBACK_URL`].
pub fn resolve(reference: &str, base: Option<&Url>) -> Url {
    if is_absolute_http(reference) {
        return parse_or_fallback(reference);
    }

    if reference.starts_with("//") {
        return parse_or_fallback(&format!("https:{reference}"));
    }

    let Some(base) = base else {
        debug!("No base URL to resolve relative reference {}", reference);
        return FALLBACK.clone();
    };

    let relative = reference.strip_prefix('/').unwrap_or(reference);

    let mut segments: Vec<&str> = base.path().split('/').collect();
    segments.pop();
    segments.push(relative);

    let mut resolved = base.clone();
    resolved.set_path(&segments.join("/"));
    resolved
}

fn parse_or_fallback(input: &str) -> Url {
    Url::parse(input).unwrap_or_else(|e| {
        debug!("Failed to parse reference {}: {}", input, e);
        FALLBACK.clone()
    })
}

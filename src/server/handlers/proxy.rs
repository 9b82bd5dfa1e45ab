use crate::{
    error::{ProxyError, Result},
    hls::is_playlist,
    metrics,
    server::{header_set::HeaderSet, state::AppState, target_validation::validate_target},
};
use axum::{
    body::Body,
    extract::{Query, State},
    http::{HeaderMap, HeaderValue, Method, header},
    response::Response,
};
use futures_util::TryStreamExt;
use std::time::Instant;
use tracing::{debug, info, warn};
use url::Url;

/// Response headers that describe the upstream connection, not the payload.
const HOP_BY_HOP: [header::HeaderName; 2] = [header::CONNECTION, header::TRANSFER_ENCODING];

/// Proxy an HLS playlist or segment.
///
/// Query parameters:
/// - `url`: absolute URL of the upstream resource (required)
/// - `headers`: JSON object of extra upstream request headers (optional)
///
/// Playlists are buffered and rewritten so every reference comes back through
/// this route; everything else is streamed through unchanged.
pub async fn proxy(
    State(state): State<AppState>,
    Query(params): Query<Vec<(String, String)>>,
    method: Method,
    request_headers: HeaderMap,
) -> Result<Response> {
    let start = Instant::now();

    let raw_target = first_param(&params, "url").ok_or(ProxyError::MissingUrl)?;
    let target = Url::parse(raw_target).map_err(|_| ProxyError::MalformedUrl)?;

    if state.config.block_private_targets {
        validate_target(&target)?;
    }

    let raw_headers = first_param(&params, "headers");
    let header_set = raw_headers.and_then(HeaderSet::parse);

    info!("Proxying {} {}", method, target);

    let is_head = method == Method::HEAD;

    let upstream_headers = build_upstream_headers(header_set.as_ref(), &request_headers);

    let response = state
        .http_client
        .request(method, target.clone())
        .headers(upstream_headers)
        .send()
        .await
        .inspect_err(|_| metrics::record_upstream_error())?;

    let status = response.status();
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);

    let mut headers = response.headers().clone();
    for name in HOP_BY_HOP {
        headers.remove(name);
    }
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );

    // HEAD carries no body to rewrite; upstream Content-Length stays accurate
    let (kind, body) = if !is_head && is_playlist(&target, content_type.as_deref()) {
        let text = response
            .text()
            .await
            .inspect_err(|_| metrics::record_upstream_error())?;

        let (rewritten, references) = state.rewriter.rewrite_counted(&text, &target, raw_headers);
        debug!(
            "Rewrote {} references in playlist from {} ({} lines)",
            references,
            target,
            rewritten.split('\n').count()
        );
        metrics::record_rewritten_references(references);

        // Body length changed
        headers.remove(header::CONTENT_LENGTH);

        ("playlist", Body::from(rewritten))
    } else {
        let stream = response.bytes_stream().inspect_err(|e| {
            metrics::record_upstream_error();
            warn!("Upstream body stream failed: {}", e);
        });

        ("passthrough", Body::from_stream(stream))
    };

    metrics::record_request(kind, status.as_u16());
    metrics::record_duration(kind, start);

    let mut proxied = Response::new(body);
    *proxied.status_mut() = status;
    *proxied.headers_mut() = headers;

    Ok(proxied)
}

/// Value of the first occurrence of `key`, treating an empty value as absent.
fn first_param<'a>(params: &'a [(String, String)], key: &str) -> Option<&'a str> {
    params
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
        .filter(|v| !v.is_empty())
}

/// Headers for the upstream request: the fixed CORS set, then the caller's
/// header set, then the inbound `Range` header.
fn build_upstream_headers(header_set: Option<&HeaderSet>, inbound: &HeaderMap) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("GET, HEAD, POST, PUT, DELETE, OPTIONS"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("Content-Type"),
    );

    if let Some(header_set) = header_set {
        header_set.apply_to(&mut headers);
    }

    if let Some(range) = inbound.get(header::RANGE) {
        headers.insert(header::RANGE, range.clone());
    }

    headers
}

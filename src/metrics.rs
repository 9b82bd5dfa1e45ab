//! Prometheus metrics.
//!
//! Recording goes through the `metrics` facade; the exporter handle renders
//! the text exposition served at `/metrics`.

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;
use std::time::Instant;
use tracing::warn;

static HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Install the global Prometheus recorder (once per process) and return its handle.
///
/// If another recorder is already installed, a detached recorder is used so
/// `/metrics` still renders.
pub fn init() -> PrometheusHandle {
    HANDLE
        .get_or_init(|| match PrometheusBuilder::new().install_recorder() {
            Ok(handle) => handle,
            Err(e) => {
                warn!("Prometheus recorder not installed: {}", e);
                PrometheusBuilder::new().build_recorder().handle()
            }
        })
        .clone()
}

/// Count a proxied request. `kind` is `playlist` or `passthrough`.
pub fn record_request(kind: &'static str, status: u16) {
    counter!(
        "m3u8_proxy_requests_total",
        "kind" => kind,
        "status" => status.to_string()
    )
    .increment(1);
}

pub fn record_duration(kind: &'static str, start: Instant) {
    histogram!("m3u8_proxy_request_duration_seconds", "kind" => kind)
        .record(start.elapsed().as_secs_f64());
}

pub fn record_upstream_error() {
    counter!("m3u8_proxy_upstream_errors_total").increment(1);
}

/// Number of references rewritten in one playlist.
pub fn record_rewritten_references(count: usize) {
    counter!("m3u8_proxy_playlist_references_total").increment(count as u64);
}

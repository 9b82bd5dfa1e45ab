use crate::{config::Config, hls::PlaylistRewriter};
use metrics_exporter_prometheus::PrometheusHandle;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<Config>,
    /// Shared HTTP client for connection pooling
    pub http_client: Client,
    /// Playlist rewriter bound to the configured proxy path
    pub rewriter: PlaylistRewriter,
    /// Renders the Prometheus exposition for `/metrics`
    pub metrics: PrometheusHandle,
}

impl AppState {
    /// Create a new AppState with the given configuration
    pub fn new(config: Config, metrics: PrometheusHandle) -> Self {
        // No request timeout: slow upstreams are the caller's to abandon.
        let http_client = Client::builder()
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(10)
            .build()
            .expect("Failed to create HTTP client");

        let rewriter = PlaylistRewriter::new(config.proxy_path.clone());

        Self {
            config: Arc::new(config),
            http_client,
            rewriter,
            metrics,
        }
    }
}

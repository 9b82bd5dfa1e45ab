//! HLS reverse proxy.
//!
//! Fetches a playlist or segment on behalf of a client. Playlists are
//! rewritten so every reference they contain is routed back through the
//! proxy, carrying forward any custom upstream headers the caller supplied.

pub mod config;
pub mod error;
pub mod hls;
pub mod metrics;
pub mod server;

pub mod attributes;
pub mod classify;
pub mod resolver;
pub mod rewriter;

pub use classify::is_playlist;
pub use resolver::resolve;
pub use rewriter::PlaylistRewriter;

use url::Url;

/// Path suffix that marks a playlist regardless of content type.
pub const PLAYLIST_EXTENSION: &str = ".m3u8";

/// Content-type spellings servers use for playlists, matched as lowercase
/// substrings. Segment types (`video/mp2t`, `video/mp4`) are not listed:
/// a binary body must never reach the text rewriter.
pub const PLAYLIST_CONTENT_TYPES: &[&str] = &[
    "application/x-mpegurl",
    "application/mpegurl",
    "application/vnd.apple.mpegurl",
    "audio/mpegurl",
    "audio/x-mpegurl",
    "video/x-mpegurl",
    "application/vnd.apple.mpegurl.audio",
    "application/vnd.apple.mpegurl.video",
];

/// Decide whether a fetched resource should go through the rewriter.
pub fn is_playlist(url: &Url, content_type: Option<&str>) -> bool {
    if url.path().ends_with(PLAYLIST_EXTENSION) {
        return true;
    }

    content_type.is_some_and(|ct| {
        let ct = ct.to_ascii_lowercase();
        PLAYLIST_CONTENT_TYPES
            .iter()
            .any(|known| ct.contains(known))
    })
}

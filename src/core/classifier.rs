//! Complete-asset URL classification
//!
//! Decides whether a candidate URL denotes a directly downloadable video
//! asset (progressive MP4 or a top-level HLS playlist) rather than a
//! transport-level fragment. Pure string matching, no I/O.

/// Substrings that mark a URL as a transport fragment: byte-range requests,
/// segment/chunk/part naming, MP4 `moof` boxes, transport-stream sequencing,
/// per-track naming, and DASH conventions.
const FRAGMENT_MARKERS: [&str; 13] = [
    "range=", "segment", "frag", "chunk", "part", "moof", "ts-", "sequence", "track", "/range/",
    "/seg-", "-seg", "dash",
];

/// Returns true when `url` points at a complete video asset.
///
/// Rejection markers take precedence: a URL containing both a fragment
/// marker and an `.mp4` suffix is rejected.
pub fn is_complete_asset(url: &str) -> bool {
    if FRAGMENT_MARKERS.iter().any(|marker| url.contains(marker)) {
        return false;
    }

    url.ends_with(".mp4")
        || url.contains("video/mp4")
        || url.contains("/mp4/")
        || url.ends_with(".m3u8")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plain_mp4() {
        assert!(is_complete_asset("https://x/video.mp4"));
        assert!(is_complete_asset("https://cdn.example.com/media/movie.mp4"));
    }

    #[test]
    fn accepts_hls_playlist() {
        assert!(is_complete_asset("https://x/playlist.m3u8"));
        assert!(is_complete_asset("https://host/path/master.m3u8"));
    }

    #[test]
    fn accepts_mp4_path_markers() {
        assert!(is_complete_asset("https://host/mp4/clip"));
        assert!(is_complete_asset("https://host/stream?type=video/mp4"));
    }

    #[test]
    fn rejects_fragment_markers_over_extension() {
        // Rejection takes precedence even with an .mp4 suffix
        assert!(!is_complete_asset("https://x/seg-003.mp4"));
        assert!(!is_complete_asset("https://host/video.mp4?range=0-1024"));
        assert!(!is_complete_asset("https://host/chunk_12.mp4"));
        assert!(!is_complete_asset("https://host/dash/init.mp4"));
        assert!(!is_complete_asset("https://host/track1/fragment.mp4"));
    }

    #[test]
    fn rejects_transport_segments() {
        assert!(!is_complete_asset("https://host/media/ts-000123"));
        assert!(!is_complete_asset("https://host/live/sequence/42"));
        assert!(!is_complete_asset("https://host/v/part-7.mp4"));
    }

    #[test]
    fn rejects_unrelated_urls() {
        assert!(!is_complete_asset("https://host/index.html"));
        assert!(!is_complete_asset("https://host/app.js"));
        assert!(!is_complete_asset("https://host/poster.jpg"));
    }
}

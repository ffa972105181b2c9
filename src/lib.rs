//! Video Capture - Core Library
//!
//! Drives a local Chrome/Chromium instance to load a page, trigger video
//! playback, observe network responses for direct video-media URLs
//! (progressive MP4 or HLS playlists), and download the discovered assets
//! with bounded retry.

pub mod browser;
pub mod core;
pub mod downloaders;
pub mod parsers;
pub mod utils;

// Re-export commonly used types
pub use crate::core::{
    classifier::is_complete_asset,
    config::CaptureConfig,
    discovery::Discovery,
    error::DownloadError,
    models::{DownloadOutcome, DownloadStatus, HlsStream, LinkSet, SessionContext},
    session::SessionDriver,
};
pub use crate::downloaders::{AssetDownloader, Downloader};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

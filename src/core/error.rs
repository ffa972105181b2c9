//! Error types for the download path
//!
//! The downloader reports failures through [`DownloadError`] so the discovery
//! loop can apply its bounded retry policy; orchestration-level code uses
//! `anyhow` with context instead.

use thiserror::Error;

/// Errors raised while fetching or persisting a single asset.
#[derive(Debug, Error)]
pub enum DownloadError {
    /// The server answered with a non-success status code.
    #[error("download failed with status code {code}")]
    Status { code: u16 },

    /// Transport-level failure (DNS, connection, TLS, body read).
    #[error("network error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Failure while writing the asset to disk.
    #[error("file system error: {0}")]
    Io(#[from] std::io::Error),

    /// A manifest line could not be resolved against its base URL.
    #[error("invalid URL in playlist: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

//! HTTP asset downloader
//!
//! Fetches one asset per call and routes on content: HLS playlists are
//! buffered, persisted as `playlist.m3u8` next to the destination, and parsed
//! into a segment URL list; everything else is streamed straight to disk.

use async_trait::async_trait;
use futures_util::{Stream, StreamExt};
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use std::path::{Path, PathBuf};
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use crate::core::error::DownloadError;
use crate::core::models::DownloadOutcome;
use crate::parsers::m3u8_parser::parse_segment_urls;

/// MIME type announcing an HLS playlist.
pub const HLS_CONTENT_TYPE: &str = "application/vnd.apple.mpegurl";

/// Single-asset download capability, behind a trait so the discovery loop's
/// retry policy can be exercised with an injected stub.
#[async_trait]
pub trait Downloader: Send + Sync {
    async fn download(&self, url: &str, dest: &Path) -> Result<DownloadOutcome, DownloadError>;
}

/// Reqwest-backed downloader. The body fetch itself carries no explicit
/// timeout; the transport's defaults apply.
pub struct AssetDownloader {
    client: Client,
}

impl AssetDownloader {
    pub fn new(user_agent: &str) -> Result<Self, DownloadError> {
        let client = Client::builder().user_agent(user_agent).build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Downloader for AssetDownloader {
    async fn download(&self, url: &str, dest: &Path) -> Result<DownloadOutcome, DownloadError> {
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(DownloadError::Status {
                code: status.as_u16(),
            });
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();
        debug!("content type: {}", content_type);

        if is_hls_manifest(url, &content_type) {
            info!("HLS stream detected: {}", url);
            let body = response.text().await?;
            persist_hls_playlist(url, dest, &body).await
        } else {
            save_body_stream(dest, response.bytes_stream()).await
        }
    }
}

/// Routing predicate between the HLS and direct-file download paths.
///
/// Only progressive files and HLS are distinguished; other adaptive manifest
/// formats go down the direct-file path unchanged.
fn is_hls_manifest(url: &str, content_type: &str) -> bool {
    url.ends_with(".m3u8") || content_type.contains(HLS_CONTENT_TYPE)
}

/// Persist a fetched playlist body as `playlist.m3u8` next to `dest` and
/// extract its segment URLs.
async fn persist_hls_playlist(
    url: &str,
    dest: &Path,
    body: &str,
) -> Result<DownloadOutcome, DownloadError> {
    let parent = dest
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    let playlist_path = parent.join("playlist.m3u8");
    tokio::fs::write(&playlist_path, body).await?;
    info!("HLS playlist saved to {}", playlist_path.display());

    let segment_urls = parse_segment_urls(body, url)?;
    info!("found {} HLS segments", segment_urls.len());

    Ok(DownloadOutcome::Hls {
        playlist_path,
        segment_urls,
    })
}

/// Stream a body to `dest`. On any failure mid-stream the partial file is
/// removed (cleanup errors are deliberately swallowed) and the original
/// error is returned.
async fn save_body_stream<B, E>(
    dest: &Path,
    stream: impl Stream<Item = Result<B, E>>,
) -> Result<DownloadOutcome, DownloadError>
where
    B: AsRef<[u8]>,
    E: Into<DownloadError>,
{
    if let Err(err) = stream_to_file(dest, stream).await {
        let _ = tokio::fs::remove_file(dest).await;
        return Err(err);
    }

    info!("file downloaded to {}", dest.display());
    Ok(DownloadOutcome::File(dest.to_path_buf()))
}

async fn stream_to_file<B, E>(
    dest: &Path,
    stream: impl Stream<Item = Result<B, E>>,
) -> Result<(), DownloadError>
where
    B: AsRef<[u8]>,
    E: Into<DownloadError>,
{
    let mut file = File::create(dest).await?;
    tokio::pin!(stream);

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(Into::<DownloadError>::into)?;
        file.write_all(chunk.as_ref()).await?;
    }

    file.flush().await?;
    Ok(())
}

//! Discovery loop policy: classification gate, dedup, filename derivation,
//! and bounded download retry.
//!
//! Candidate URLs arrive here from both network-response interception and
//! periodic DOM inspection. Each accepted URL is downloaded at most once per
//! session; an attempt sequence that exhausts its retries is terminal too.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{error, info, warn};
use url::Url;

use crate::core::classifier::is_complete_asset;
use crate::core::config::CaptureConfig;
use crate::core::models::{DownloadOutcome, DownloadStatus, HlsStream, SessionContext};
use crate::downloaders::Downloader;
use crate::utils::file_utils::{get_file_extension, sanitize_filename};

/// Filename used when a URL path has no basename.
const DEFAULT_BASENAME: &str = "video.mp4";

/// Extension used when a basename carries none.
const DEFAULT_EXTENSION: &str = ".mp4";

pub struct Discovery {
    downloader: Arc<dyn Downloader>,
    output_dir: PathBuf,
    download_files: bool,
    max_retries: usize,
    retry_delay: Duration,
}

impl Discovery {
    pub fn new(downloader: Arc<dyn Downloader>, config: &CaptureConfig) -> Self {
        Self {
            downloader,
            output_dir: config.output_dir.clone(),
            download_files: config.download_files,
            max_retries: config.max_retries,
            retry_delay: config.retry_delay(),
        }
    }

    /// Feed one candidate URL through the classifier and, when accepted and
    /// not yet handled, through the download policy.
    ///
    /// Returns the terminal status of the attempt sequence, or `None` when
    /// the URL was rejected, already handled, or downloads are disabled.
    pub async fn handle_candidate(
        &self,
        ctx: &mut SessionContext,
        url: &str,
    ) -> Option<DownloadStatus> {
        if !is_complete_asset(url) {
            return None;
        }

        if ctx.video_links.insert(url) {
            info!("complete video discovered: {}", url);
        }

        if !self.download_files || ctx.downloaded_urls.contains(url) {
            return None;
        }

        let filename = derive_filename(url, ctx.file_counter);
        let dest = self.output_dir.join(&filename);
        info!("downloading {} from {}", filename, url);

        let status = match self.download_with_retry(url, &dest).await {
            Some(DownloadOutcome::File(path)) => {
                ctx.video_files.push(path);
                DownloadStatus::Succeeded
            }
            Some(DownloadOutcome::Hls {
                playlist_path,
                segment_urls,
            }) => {
                ctx.hls_streams.push(HlsStream {
                    source_url: url.to_string(),
                    playlist_path,
                    segment_urls,
                });
                DownloadStatus::Succeeded
            }
            None => DownloadStatus::Exhausted,
        };

        // The attempt sequence is over either way: mark the URL handled and
        // advance the counter exactly once.
        ctx.downloaded_urls.insert(url.to_string());
        ctx.file_counter += 1;

        Some(status)
    }

    /// Attempt a download up to `max_retries` times with a fixed delay
    /// between failed attempts. Exhaustion is logged, not propagated.
    pub async fn download_with_retry(&self, url: &str, dest: &Path) -> Option<DownloadOutcome> {
        for attempt in 1..=self.max_retries {
            match self.downloader.download(url, dest).await {
                Ok(outcome) => return Some(outcome),
                Err(err) => {
                    warn!(
                        "download failed (attempt {}/{}): {}",
                        attempt, self.max_retries, err
                    );
                    if attempt < self.max_retries {
                        sleep(self.retry_delay).await;
                    }
                }
            }
        }

        error!("retries exhausted, skipping {}", url);
        None
    }
}

/// Derive a collision-free local filename for the given counter value:
/// `NNNN_<basename><ext>` with a four-digit zero-padded sequence number.
pub fn derive_filename(url: &str, counter: u64) -> String {
    let path = Url::parse(url)
        .map(|u| u.path().to_string())
        .unwrap_or_else(|_| url.to_string());

    let basename = Path::new(&path)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("");
    let basename = if basename.is_empty() {
        DEFAULT_BASENAME.to_string()
    } else {
        sanitize_filename(basename)
    };

    let ext = match get_file_extension(&basename) {
        Some(ext) => format!(".{ext}"),
        None => DEFAULT_EXTENSION.to_string(),
    };
    let stem = basename.strip_suffix(&ext).unwrap_or(&basename);

    format!("{counter:04}_{stem}{ext}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::DownloadError;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::tempdir;

    /// Test downloader that fails a configurable number of times before
    /// succeeding with a fixed outcome.
    struct FlakyDownloader {
        failures_before_success: usize,
        attempts: AtomicUsize,
    }

    impl FlakyDownloader {
        fn new(failures_before_success: usize) -> Self {
            Self {
                failures_before_success,
                attempts: AtomicUsize::new(0),
            }
        }

        fn attempts(&self) -> usize {
            self.attempts.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Downloader for FlakyDownloader {
        async fn download(
            &self,
            _url: &str,
            dest: &Path,
        ) -> Result<DownloadOutcome, DownloadError> {
            let attempt = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;
            if attempt <= self.failures_before_success {
                Err(DownloadError::Status { code: 503 })
            } else {
                Ok(DownloadOutcome::File(dest.to_path_buf()))
            }
        }
    }

    fn test_config(dir: &Path) -> CaptureConfig {
        let mut config = CaptureConfig::default();
        config.output_dir = dir.to_path_buf();
        config.retry_delay_ms = 1;
        config
    }

    #[test]
    fn filename_derivation() {
        assert_eq!(
            derive_filename("https://host/media/movie.mp4", 1),
            "0001_movie.mp4"
        );
        assert_eq!(
            derive_filename("https://host/media/clip.mp4?token=abc", 5),
            "0005_clip.mp4"
        );
        // No basename in the path
        assert_eq!(derive_filename("https://host/", 2), "0002_video.mp4");
        // No extension
        assert_eq!(derive_filename("https://host/stream/clip", 3), "0003_clip.mp4");
        // Playlist keeps its extension
        assert_eq!(
            derive_filename("https://host/live/playlist.m3u8", 12),
            "0012_playlist.m3u8"
        );
    }

    #[tokio::test]
    async fn succeeds_after_transient_failures() {
        let tmp = tempdir().unwrap();
        let downloader = Arc::new(FlakyDownloader::new(2));
        let discovery = Discovery::new(downloader.clone(), &test_config(tmp.path()));
        let mut ctx = SessionContext::new();

        let status = discovery
            .handle_candidate(&mut ctx, "https://host/clip.mp4")
            .await;

        assert_eq!(status, Some(DownloadStatus::Succeeded));
        assert_eq!(downloader.attempts(), 3);
        assert_eq!(ctx.video_files.len(), 1);
        assert_eq!(ctx.file_counter, 2);
        assert!(ctx.downloaded_urls.contains("https://host/clip.mp4"));
    }

    #[tokio::test]
    async fn exhaustion_is_terminal_and_does_not_propagate() {
        let tmp = tempdir().unwrap();
        let downloader = Arc::new(FlakyDownloader::new(usize::MAX));
        let discovery = Discovery::new(downloader.clone(), &test_config(tmp.path()));
        let mut ctx = SessionContext::new();

        let status = discovery
            .handle_candidate(&mut ctx, "https://host/clip.mp4")
            .await;

        assert_eq!(status, Some(DownloadStatus::Exhausted));
        assert_eq!(downloader.attempts(), 3);
        assert!(ctx.video_files.is_empty());
        // Exhausted sequences still consume the URL and the counter
        assert!(ctx.downloaded_urls.contains("https://host/clip.mp4"));
        assert_eq!(ctx.file_counter, 2);

        // Re-observing the URL later is a no-op
        let again = discovery
            .handle_candidate(&mut ctx, "https://host/clip.mp4")
            .await;
        assert_eq!(again, None);
        assert_eq!(downloader.attempts(), 3);
        assert_eq!(ctx.file_counter, 2);
    }

    #[tokio::test]
    async fn duplicate_submission_downloads_once() {
        let tmp = tempdir().unwrap();
        let downloader = Arc::new(FlakyDownloader::new(0));
        let discovery = Discovery::new(downloader.clone(), &test_config(tmp.path()));
        let mut ctx = SessionContext::new();

        let first = discovery
            .handle_candidate(&mut ctx, "https://host/clip.mp4")
            .await;
        let second = discovery
            .handle_candidate(&mut ctx, "https://host/clip.mp4")
            .await;

        assert_eq!(first, Some(DownloadStatus::Succeeded));
        assert_eq!(second, None);
        assert_eq!(downloader.attempts(), 1);
        assert_eq!(ctx.file_counter, 2);
        assert_eq!(ctx.video_links.len(), 1);
    }

    #[tokio::test]
    async fn rejected_urls_are_ignored() {
        let tmp = tempdir().unwrap();
        let downloader = Arc::new(FlakyDownloader::new(0));
        let discovery = Discovery::new(downloader.clone(), &test_config(tmp.path()));
        let mut ctx = SessionContext::new();

        let status = discovery
            .handle_candidate(&mut ctx, "https://host/seg-003.mp4")
            .await;

        assert_eq!(status, None);
        assert_eq!(downloader.attempts(), 0);
        assert!(ctx.video_links.is_empty());
        assert_eq!(ctx.file_counter, 1);
    }

    #[tokio::test]
    async fn download_disabled_still_records_links() {
        let tmp = tempdir().unwrap();
        let downloader = Arc::new(FlakyDownloader::new(0));
        let mut config = test_config(tmp.path());
        config.download_files = false;
        let discovery = Discovery::new(downloader.clone(), &config);
        let mut ctx = SessionContext::new();

        let status = discovery
            .handle_candidate(&mut ctx, "https://host/clip.mp4")
            .await;

        assert_eq!(status, None);
        assert_eq!(downloader.attempts(), 0);
        assert_eq!(ctx.video_links.len(), 1);
        assert_eq!(ctx.file_counter, 1);
    }

    #[tokio::test]
    async fn hls_outcome_recorded_as_stream() {
        struct HlsDownloader;

        #[async_trait]
        impl Downloader for HlsDownloader {
            async fn download(
                &self,
                _url: &str,
                dest: &Path,
            ) -> Result<DownloadOutcome, DownloadError> {
                Ok(DownloadOutcome::Hls {
                    playlist_path: dest.with_file_name("playlist.m3u8"),
                    segment_urls: vec!["https://host/a.ts".into(), "https://host/b.ts".into()],
                })
            }
        }

        let tmp = tempdir().unwrap();
        let discovery = Discovery::new(Arc::new(HlsDownloader), &test_config(tmp.path()));
        let mut ctx = SessionContext::new();

        let status = discovery
            .handle_candidate(&mut ctx, "https://host/live/playlist.m3u8")
            .await;

        assert_eq!(status, Some(DownloadStatus::Succeeded));
        assert_eq!(ctx.hls_streams.len(), 1);
        assert_eq!(ctx.hls_streams[0].segment_urls.len(), 2);
        assert_eq!(ctx.hls_streams[0].source_url, "https://host/live/playlist.m3u8");
        assert!(ctx.video_files.is_empty());
    }
}

//! Session driver
//!
//! Orchestrates one capture run end to end: browser launch, response
//! interception, navigation, play triggering (top level and embedded
//! frames), the bounded polling loop, and the final report.

use anyhow::{anyhow, Context, Result};
use chromiumoxide::cdp::browser_protocol::network::{
    EventRequestWillBeSent, EventResponseReceived,
};
use chromiumoxide::cdp::js_protocol::runtime::EventConsoleApiCalled;
use chromiumoxide::Page;
use futures::StreamExt;
use regex::Regex;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout};
use tracing::{debug, info, warn};

use crate::browser;
use crate::core::config::CaptureConfig;
use crate::core::discovery::Discovery;
use crate::core::models::SessionContext;
use crate::downloaders::AssetDownloader;
use crate::utils::file_utils::ensure_dir_exists;

/// Substrings that flag a request as potentially video-related, used only
/// for debug-mode traffic logging.
const TRAFFIC_HINTS: [&str; 6] = [".mp4", ".ts", ".m3u8", "video", "media", "stream"];

pub struct SessionDriver {
    config: CaptureConfig,
    discovery: Arc<Discovery>,
    manifest_re: Regex,
}

impl SessionDriver {
    pub fn new(config: CaptureConfig) -> Result<Self> {
        let downloader =
            AssetDownloader::new(&config.user_agent).context("failed to create HTTP client")?;
        let discovery = Arc::new(Discovery::new(Arc::new(downloader), &config));
        let manifest_re = Regex::new(r#"https?://[^"'\s]+\.m3u8[^"'\s]*"#)
            .expect("manifest regex is valid");

        Ok(Self {
            config,
            discovery,
            manifest_re,
        })
    }

    /// Run the capture session to completion.
    ///
    /// Only configuration problems (missing browser executable, no target
    /// URL) and browser launch failures are fatal; navigation and playback
    /// trouble degrade the session but never abort it.
    pub async fn run(&self) -> Result<()> {
        let target_url = self
            .config
            .target_url
            .clone()
            .ok_or_else(|| anyhow!("no target URL configured"))?;

        ensure_dir_exists(&self.config.output_dir)?;
        let executable = browser::resolve_browser_path(self.config.browser_path.as_deref())?;

        info!("launching browser...");
        let (mut chrome, handler_task) = browser::launch(&self.config, &executable).await?;

        let ctx = Arc::new(Mutex::new(SessionContext::new()));
        let mut listener_tasks: Vec<JoinHandle<()>> = Vec::new();

        let page = chrome
            .new_page("about:blank")
            .await
            .context("failed to open page")?;

        // Interception first, so responses fired during navigation are seen.
        listener_tasks.push(self.spawn_response_listener(&page, ctx.clone()).await?);
        if self.config.debug_mode {
            listener_tasks.push(spawn_request_listener(&page).await?);
            listener_tasks.push(spawn_console_listener(&page).await?);
        }

        self.navigate(&page, &target_url).await;
        self.start_playback(&page).await;

        // Embedded frames get the same treatment as the top-level page: the
        // frame URL is opened as its own page with its own listener.
        let mut frame_pages = Vec::new();
        for frame_url in browser::iframe_sources(&page).await {
            info!("opening embedded frame: {}", frame_url);
            match chrome.new_page(&frame_url).await {
                Ok(frame_page) => {
                    listener_tasks
                        .push(self.spawn_response_listener(&frame_page, ctx.clone()).await?);
                    if self.config.debug_mode {
                        listener_tasks.push(spawn_request_listener(&frame_page).await?);
                    }
                    self.start_playback(&frame_page).await;
                    frame_pages.push(frame_page);
                }
                Err(err) => warn!("failed to open frame {}: {}", frame_url, err),
            }
        }

        self.poll_for_media(&page, &frame_pages, &ctx).await;

        {
            let ctx = ctx.lock().await;
            self.write_report(&ctx).await?;
        }

        for task in listener_tasks {
            task.abort();
        }
        for frame_page in frame_pages {
            let _ = frame_page.close().await;
        }
        let _ = page.close().await;
        chrome.close().await.context("failed to close browser")?;
        handler_task.abort();

        info!("capture finished");
        Ok(())
    }

    /// Navigate with a bounded load timeout. Timeouts and navigation errors
    /// are logged and the session continues against whatever DOM loaded.
    async fn navigate(&self, page: &Page, target_url: &str) {
        info!("opening page: {}", target_url);

        let navigation = async {
            page.goto(target_url).await?;
            page.wait_for_navigation().await?;
            Ok::<(), chromiumoxide::error::CdpError>(())
        };

        match timeout(self.config.page_load_timeout(), navigation).await {
            Ok(Ok(())) => info!("page loaded"),
            Ok(Err(err)) => {
                warn!("page load failed: {err}; continuing to look for video elements")
            }
            Err(_) => warn!(
                "page load timed out after {}s; continuing to look for video elements",
                self.config.page_load_timeout_secs
            ),
        }
    }

    /// Fire the play triggers; failures are never fatal.
    async fn start_playback(&self, page: &Page) {
        match browser::trigger_playback(page).await {
            Ok(clicked) if clicked.is_empty() => info!("no play-like elements found"),
            Ok(clicked) => info!("triggered playback via {} selectors", clicked.len()),
            Err(err) => warn!("playback trigger failed: {err}"),
        }
    }

    /// Bounded polling loop: inspect the DOM of the main page and every
    /// opened frame, feed all candidates through the discovery loop, keep
    /// playback alive, and sleep until the next iteration.
    async fn poll_for_media(
        &self,
        page: &Page,
        frame_pages: &[Page],
        ctx: &Arc<Mutex<SessionContext>>,
    ) {
        let max_checks = self.config.max_checks();

        for check in 1..=max_checks {
            info!("[{}/{}] inspecting page for media...", check, max_checks);

            let mut candidates = browser::collect_media_urls(page).await;
            candidates.extend(browser::inline_script_manifests(page, &self.manifest_re).await);
            for frame_page in frame_pages {
                candidates.extend(browser::collect_media_urls(frame_page).await);
                candidates
                    .extend(browser::inline_script_manifests(frame_page, &self.manifest_re).await);
            }

            if candidates.is_empty() {
                debug!("no media elements found");
            }

            {
                let mut ctx = ctx.lock().await;
                for url in candidates {
                    self.discovery.handle_candidate(&mut ctx, &url).await;
                }
                if !ctx.video_links.is_empty() {
                    info!("captured {} complete video links so far", ctx.video_links.len());
                }
            }

            browser::nudge_playback(page).await;
            for frame_page in frame_pages {
                browser::nudge_playback(frame_page).await;
            }

            if check < max_checks {
                debug!("waiting {}s...", self.config.check_interval_secs);
                sleep(self.config.check_interval()).await;
            }
        }
    }

    /// Classify every intercepted response URL as it arrives.
    async fn spawn_response_listener(
        &self,
        page: &Page,
        ctx: Arc<Mutex<SessionContext>>,
    ) -> Result<JoinHandle<()>> {
        let mut events = page
            .event_listener::<EventResponseReceived>()
            .await
            .context("failed to register response listener")?;

        let discovery = self.discovery.clone();
        let debug_mode = self.config.debug_mode;

        Ok(tokio::spawn(async move {
            while let Some(event) = events.next().await {
                let url = event.response.url.clone();
                let mime = event.response.mime_type.clone();

                if debug_mode && looks_video_related(&url) {
                    debug!("potential video response: {} ({})", url, mime);
                }

                let mut ctx = ctx.lock().await;
                discovery.handle_candidate(&mut ctx, &url).await;
            }
        }))
    }

    /// Persist the link list, log the run summary, and print assembly hints
    /// for discovered HLS streams.
    async fn write_report(&self, ctx: &SessionContext) -> Result<()> {
        info!("captured {} complete video links in total", ctx.video_links.len());

        if !ctx.video_links.is_empty() {
            let lines: Vec<&str> = ctx.video_links.iter().collect();
            tokio::fs::write(&self.config.output_list, lines.join("\n"))
                .await
                .with_context(|| {
                    format!("failed to write link list {:?}", self.config.output_list)
                })?;
            info!("video links saved to {}", self.config.output_list.display());
        } else {
            info!("no complete video links found");
        }

        info!("downloaded {} video files", ctx.video_files.len());
        for file in &ctx.video_files {
            println!("- {}", file.display());
        }

        if !ctx.hls_streams.is_empty() {
            info!("discovered {} HLS streams", ctx.hls_streams.len());
            println!("To assemble an HLS stream into a single file, use ffmpeg:");
            for (index, stream) in ctx.hls_streams.iter().enumerate() {
                println!(
                    "ffmpeg -i \"{}\" -c copy \"{}/hls_video_{}.mp4\"",
                    stream.playlist_path.display(),
                    self.config.output_dir.display(),
                    index + 1
                );
            }
        }

        Ok(())
    }
}

/// Log video-related outgoing request URLs. Registered in debug mode only;
/// the response side is hinted from the response listener.
async fn spawn_request_listener(page: &Page) -> Result<JoinHandle<()>> {
    let mut events = page
        .event_listener::<EventRequestWillBeSent>()
        .await
        .context("failed to register request listener")?;

    Ok(tokio::spawn(async move {
        while let Some(event) = events.next().await {
            if looks_video_related(&event.request.url) {
                debug!("potential video request: {}", event.request.url);
            }
        }
    }))
}

/// Log browser console messages, for debugging pages that resist playback.
async fn spawn_console_listener(page: &Page) -> Result<JoinHandle<()>> {
    let mut events = page
        .event_listener::<EventConsoleApiCalled>()
        .await
        .context("failed to register console listener")?;

    Ok(tokio::spawn(async move {
        while let Some(event) = events.next().await {
            let message: Vec<String> = event
                .args
                .iter()
                .filter_map(|arg| arg.value.as_ref().map(|v| v.to_string()))
                .collect();
            debug!("browser console: {}", message.join(" "));
        }
    }))
}

fn looks_video_related(url: &str) -> bool {
    TRAFFIC_HINTS.iter().any(|hint| url.contains(hint))
}

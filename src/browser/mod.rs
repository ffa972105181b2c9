//! Chrome/Chromium session plumbing
//!
//! Launching the browser over CDP, locating the local executable, and the
//! in-page JavaScript used to trigger playback and harvest media URLs from
//! the DOM. All evaluation helpers are best-effort: a page that refuses to
//! cooperate yields empty results, never an aborted session.

use anyhow::{anyhow, Context, Result};
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::Page;
use futures::StreamExt;
use regex::Regex;
use std::path::{Path, PathBuf};
use tokio::task::JoinHandle;
use tracing::debug;

use crate::core::config::CaptureConfig;

/// Clicks play-like elements and calls `play()` on every `<video>`,
/// muting them so autoplay policies do not get in the way.
const PLAY_TRIGGER_JS: &str = r#"
    (function() {
        var clicked = [];

        var playSelectors = [
            'video', '.video-player', '.play-button', '.play-btn',
            '.vjs-big-play-button', '.ytp-play-button',
            '[class*="play"]', '[id*="play"]'
        ];
        for (var selector of playSelectors) {
            try {
                var elems = document.querySelectorAll(selector);
                elems.forEach(function(el) { el.click(); });
                if (elems.length > 0) { clicked.push(selector); }
            } catch (e) {}
        }

        document.querySelectorAll('video').forEach(function(v) {
            try {
                v.muted = true;
                v.playbackRate = 1.0;
                v.play();
                clicked.push('video.play()');
            } catch (e) {}
        });

        return clicked;
    })()
"#;

/// Collects candidate media URLs from `<video>` and `<source>` elements.
const COLLECT_SOURCES_JS: &str = r#"
    (function() {
        var urls = [];
        document.querySelectorAll('video').forEach(function(v) {
            if (v.src) { urls.push(v.src); }
            if (v.currentSrc) { urls.push(v.currentSrc); }
        });
        document.querySelectorAll('source').forEach(function(s) {
            if (s.src) { urls.push(s.src); }
        });
        return urls;
    })()
"#;

/// Concatenated text of every inline script, searched host-side for
/// manifest references.
const SCRIPT_TEXT_JS: &str = r#"
    Array.from(document.querySelectorAll('script')).map(s => s.textContent).join('\n')
"#;

/// Resumes any paused `<video>` elements.
const NUDGE_PLAYBACK_JS: &str = r#"
    (function() {
        document.querySelectorAll('video').forEach(function(v) {
            if (v.paused) { v.play().catch(function() {}); }
        });
        return true;
    })()
"#;

/// `src` of every iframe, including lazy-loading variants.
const IFRAME_SRCS_JS: &str = r#"
    Array.from(document.querySelectorAll('iframe'))
        .map(f => f.src || f.getAttribute('data-lazy-src') || f.getAttribute('data-src') || '')
        .filter(s => s.length > 0)
"#;

/// Default Chrome location for the host operating system.
pub fn default_browser_path() -> Option<PathBuf> {
    if cfg!(target_os = "macos") {
        Some(PathBuf::from(
            "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
        ))
    } else if cfg!(target_os = "windows") {
        Some(PathBuf::from(
            "C:\\Program Files\\Google\\Chrome\\Application\\chrome.exe",
        ))
    } else if cfg!(target_os = "linux") {
        Some(PathBuf::from("/usr/bin/google-chrome"))
    } else {
        None
    }
}

/// Resolve the browser executable, preferring the configured override.
///
/// A missing executable is a configuration error and fatal to the session.
pub fn resolve_browser_path(override_path: Option<&Path>) -> Result<PathBuf> {
    let candidate = match override_path {
        Some(p) => p.to_path_buf(),
        None => default_browser_path()
            .ok_or_else(|| anyhow!("no default browser location for this OS; set browser_path"))?,
    };

    if !candidate.exists() {
        return Err(anyhow!(
            "browser executable not found at {}; set browser_path in the configuration",
            candidate.display()
        ));
    }

    Ok(candidate)
}

/// Launch the browser and spawn its CDP event handler task.
pub async fn launch(
    config: &CaptureConfig,
    executable: &Path,
) -> Result<(Browser, JoinHandle<()>)> {
    let mut builder = BrowserConfig::builder()
        .chrome_executable(executable)
        .no_sandbox()
        .arg("--start-maximized")
        .arg("--autoplay-policy=no-user-gesture-required");

    if !config.headless {
        builder = builder.with_head();
    }

    let browser_config = builder
        .build()
        .map_err(|e| anyhow!("failed to build browser config: {e}"))?;

    let (browser, mut handler) = Browser::launch(browser_config)
        .await
        .context("failed to launch browser")?;

    let handler_task = tokio::spawn(async move { while handler.next().await.is_some() {} });

    Ok((browser, handler_task))
}

/// Click play-like elements and start media playback on the page.
/// Returns the selectors that matched something.
pub async fn trigger_playback(page: &Page) -> Result<Vec<String>> {
    let clicked = page
        .evaluate(PLAY_TRIGGER_JS)
        .await
        .context("playback trigger evaluation failed")?
        .into_value::<Vec<String>>()
        .unwrap_or_default();
    Ok(clicked)
}

/// Candidate media URLs from `<video>`/`<source>` elements. Best-effort.
pub async fn collect_media_urls(page: &Page) -> Vec<String> {
    match page.evaluate(COLLECT_SOURCES_JS).await {
        Ok(result) => result.into_value::<Vec<String>>().unwrap_or_default(),
        Err(err) => {
            debug!("media element inspection failed: {err}");
            Vec::new()
        }
    }
}

/// Manifest URLs referenced from inline scripts, extracted host-side with
/// `manifest_re`. Best-effort.
pub async fn inline_script_manifests(page: &Page, manifest_re: &Regex) -> Vec<String> {
    let script_text = match page.evaluate(SCRIPT_TEXT_JS).await {
        Ok(result) => result.into_value::<String>().unwrap_or_default(),
        Err(err) => {
            debug!("inline script inspection failed: {err}");
            return Vec::new();
        }
    };

    manifest_re
        .find_iter(&script_text)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Resume paused videos so playback keeps generating media traffic.
pub async fn nudge_playback(page: &Page) {
    if let Err(err) = page.evaluate(NUDGE_PLAYBACK_JS).await {
        debug!("playback nudge failed: {err}");
    }
}

/// `src` attributes of embedded frames, for recursing the play trigger.
pub async fn iframe_sources(page: &Page) -> Vec<String> {
    match page.evaluate(IFRAME_SRCS_JS).await {
        Ok(result) => result.into_value::<Vec<String>>().unwrap_or_default(),
        Err(err) => {
            debug!("iframe inspection failed: {err}");
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_path_known_for_supported_platforms() {
        // Linux, macOS and Windows all have a well-known Chrome location.
        if cfg!(any(
            target_os = "linux",
            target_os = "macos",
            target_os = "windows"
        )) {
            assert!(default_browser_path().is_some());
        }
    }

    #[test]
    fn missing_override_is_a_configuration_error() {
        let err = resolve_browser_path(Some(Path::new("/nonexistent/chrome-binary"))).unwrap_err();
        assert!(err.to_string().contains("not found"));
    }
}

//! Capture session configuration

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::utils::validation::validate_url;

/// Configuration for one capture run.
///
/// Loaded from a JSON file when present, otherwise defaults; individual
/// fields can be overridden from the command line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureConfig {
    /// Page to open. May come from the config file or the CLI.
    pub target_url: Option<String>,
    /// Total playback-simulation time in seconds.
    pub playback_duration_secs: u64,
    /// Interval between DOM inspections in seconds.
    pub check_interval_secs: u64,
    /// Directory downloaded assets are written to.
    pub output_dir: PathBuf,
    /// Path of the discovered-link list file.
    pub output_list: PathBuf,
    /// Whether discovered assets are downloaded (the link list is always
    /// written).
    pub download_files: bool,
    /// Run the browser without a visible window.
    pub headless: bool,
    /// Browser executable override; auto-detected per OS when unset.
    pub browser_path: Option<PathBuf>,
    /// Extra logging of potentially video-related traffic and browser
    /// console messages.
    pub debug_mode: bool,
    /// Maximum download attempts per URL.
    pub max_retries: usize,
    /// Fixed delay between failed attempts, in milliseconds.
    pub retry_delay_ms: u64,
    /// Page-load timeout in seconds; expiry is non-fatal.
    pub page_load_timeout_secs: u64,
    /// User agent sent with asset downloads.
    pub user_agent: String,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            target_url: None,
            playback_duration_secs: 3 * 60,
            check_interval_secs: 5,
            output_dir: PathBuf::from("./downloads"),
            output_list: PathBuf::from("video_links.txt"),
            download_files: true,
            headless: false,
            browser_path: None,
            debug_mode: false,
            max_retries: 3,
            retry_delay_ms: 1000,
            page_load_timeout_secs: 120,
            user_agent: format!("video-capture/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl CaptureConfig {
    /// Load configuration from `path`, or from the per-user config location
    /// when no path is given. A missing file yields defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config_path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::default_config_path()?,
        };

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)
                .with_context(|| format!("failed to read config file: {:?}", config_path))?;
            let config: CaptureConfig =
                serde_json::from_str(&content).with_context(|| "failed to parse config file")?;
            tracing::info!("loaded configuration from {:?}", config_path);
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Persist the configuration to the per-user config location.
    pub fn save(&self) -> Result<()> {
        let config_path = Self::default_config_path()?;

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create config directory: {:?}", parent))?;
        }

        let content =
            serde_json::to_string_pretty(self).with_context(|| "failed to serialize config")?;
        std::fs::write(&config_path, content)
            .with_context(|| format!("failed to write config file: {:?}", config_path))?;

        tracing::info!("saved configuration to {:?}", config_path);
        Ok(())
    }

    /// Per-user config file path.
    pub fn default_config_path() -> Result<PathBuf> {
        let project_dirs = ProjectDirs::from("com", "videocapture", "video-capture")
            .with_context(|| "failed to resolve project directories")?;
        Ok(project_dirs.config_dir().join("config.json"))
    }

    pub fn check_interval(&self) -> Duration {
        Duration::from_secs(self.check_interval_secs)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    pub fn page_load_timeout(&self) -> Duration {
        Duration::from_secs(self.page_load_timeout_secs)
    }

    /// Number of polling iterations: ceil(playback duration / interval).
    pub fn max_checks(&self) -> u64 {
        self.playback_duration_secs.div_ceil(self.check_interval_secs)
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<()> {
        if let Some(ref url) = self.target_url {
            validate_url(url)?;
        }

        if self.check_interval_secs == 0 {
            anyhow::bail!("check interval must be greater than 0");
        }

        if self.playback_duration_secs == 0 {
            anyhow::bail!("playback duration must be greater than 0");
        }

        if self.max_retries == 0 || self.max_retries > 10 {
            anyhow::bail!("max retries should be between 1 and 10");
        }

        if self.page_load_timeout_secs == 0 || self.page_load_timeout_secs > 600 {
            anyhow::bail!("page load timeout should be between 1 and 600 seconds");
        }

        Ok(())
    }
}

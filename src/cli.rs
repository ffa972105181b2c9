use clap::Parser;
use std::path::PathBuf;

use video_capture::CaptureConfig;

#[derive(Parser, Debug)]
#[command(
    name = "video-capture",
    about = "Capture and download video assets (MP4 / HLS) from a web page",
    version,
    author
)]
pub struct Args {
    /// Page URL to capture from (may also come from the config file)
    pub url: Option<String>,

    /// Directory downloaded assets are written to
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Total playback-simulation time in seconds
    #[arg(short, long)]
    pub duration: Option<u64>,

    /// Seconds between DOM inspections
    #[arg(short, long)]
    pub interval: Option<u64>,

    /// Run the browser without a visible window
    #[arg(long)]
    pub headless: bool,

    /// Only record discovered links, skip downloading
    #[arg(long)]
    pub no_download: bool,

    /// Browser executable path (auto-detected per OS when omitted)
    #[arg(long)]
    pub browser_path: Option<PathBuf>,

    /// Maximum download attempts per URL
    #[arg(long)]
    pub max_retries: Option<usize>,

    /// Configuration file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Enable verbose output (includes browser console and traffic hints)
    #[arg(short, long)]
    pub verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}

impl Args {
    /// Overlay command-line values onto a loaded configuration.
    pub fn apply(&self, config: &mut CaptureConfig) {
        if let Some(ref url) = self.url {
            config.target_url = Some(url.clone());
        }
        if let Some(ref dir) = self.output_dir {
            config.output_dir = dir.clone();
        }
        if let Some(duration) = self.duration {
            config.playback_duration_secs = duration;
        }
        if let Some(interval) = self.interval {
            config.check_interval_secs = interval;
        }
        if self.headless {
            config.headless = true;
        }
        if self.no_download {
            config.download_files = false;
        }
        if let Some(ref path) = self.browser_path {
            config.browser_path = Some(path.clone());
        }
        if let Some(retries) = self.max_retries {
            config.max_retries = retries;
        }
        if self.verbose {
            config.debug_mode = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_overrides_config() {
        let args = Args::parse_from([
            "video-capture",
            "https://example.com/watch",
            "--headless",
            "--no-download",
            "--duration",
            "60",
            "--max-retries",
            "5",
        ]);

        let mut config = CaptureConfig::default();
        args.apply(&mut config);

        assert_eq!(config.target_url.as_deref(), Some("https://example.com/watch"));
        assert!(config.headless);
        assert!(!config.download_files);
        assert_eq!(config.playback_duration_secs, 60);
        assert_eq!(config.max_retries, 5);
    }

    #[test]
    fn defaults_leave_config_untouched() {
        let args = Args::parse_from(["video-capture"]);
        let mut config = CaptureConfig::default();
        args.apply(&mut config);

        assert_eq!(config.target_url, None);
        assert!(!config.headless);
        assert!(config.download_files);
        assert_eq!(config.max_retries, 3);
    }
}

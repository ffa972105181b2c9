//! Tracing setup

use tracing_subscriber::EnvFilter;

/// Initialize the global tracing subscriber.
///
/// `--verbose` forces debug-level output, `--quiet` errors only; otherwise
/// `RUST_LOG` is honored with an info-level default for this crate.
pub fn init_tracing(verbose: bool, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| "video_capture=info".into())
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

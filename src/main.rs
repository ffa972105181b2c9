mod cli;

use clap::Parser;
use std::process;
use tracing::error;

use video_capture::utils::logging::init_tracing;
use video_capture::{CaptureConfig, SessionDriver};

#[tokio::main]
async fn main() {
    let args = cli::Args::parse();
    init_tracing(args.verbose, args.quiet);

    if let Err(err) = run(args).await {
        error!("capture failed: {err:#}");
        eprintln!("Error: {err:#}");
        process::exit(1);
    }
}

async fn run(args: cli::Args) -> anyhow::Result<()> {
    let mut config = CaptureConfig::load(args.config.as_deref())?;
    args.apply(&mut config);
    config.validate()?;

    let driver = SessionDriver::new(config)?;
    driver.run().await
}

//! CLI entry point for the OONI bulk downloader.

use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use ooni_downloader::{Pipeline, PipelineConfig, QueryParams};
use tracing::{debug, error, info};

mod cli;

use cli::Args;

#[tokio::main]
async fn main() -> ExitCode {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    // Priority: RUST_LOG env var > quiet flag > verbose flag > default (info)
    let default_level = if args.quiet {
        "error"
    } else {
        match args.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    debug!(?args, "CLI arguments parsed");

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            // Every error already renders its cause inline.
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<()> {
    let params: QueryParams = args.params.into_iter().collect();
    let config = PipelineConfig::new(args.base_url, params, args.output_directory)?;

    info!(
        listing_url = %config.listing_url(),
        workers = config.workers(),
        output_dir = %config.output_dir().display(),
        "OONI downloader starting"
    );

    let stats = Pipeline::new(config).run().await?;

    info!(
        pages = stats.pages(),
        files = stats.completed(),
        bytes = stats.bytes(),
        "Download complete"
    );

    Ok(())
}

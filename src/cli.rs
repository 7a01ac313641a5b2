//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::Parser;

use ooni_downloader::{DEFAULT_BASE_URL, QueryParams};

/// Grab a batch of measurement files from OONI's listing API.
///
/// Every PARAM is an HTTP GET parameter written as `key:value` and is
/// forwarded verbatim to the listing API. `limit:N` also sets the number of
/// concurrent downloads (default 100).
#[derive(Parser, Debug)]
#[command(name = "ooni-downloader")]
#[command(author, version, about)]
pub struct Args {
    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long)]
    pub quiet: bool,

    /// What folder should contain all of the pulled data files
    #[arg(long, default_value = "./")]
    pub output_directory: PathBuf,

    /// Listing endpoint the parameters are appended to
    #[arg(long, default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    /// HTTP GET parameters as `key:value` pairs
    #[arg(value_name = "PARAM", value_parser = parse_param)]
    pub params: Vec<(String, String)>,
}

fn parse_param(raw: &str) -> Result<(String, String), String> {
    QueryParams::parse_pair(raw).map_err(|e| e.to_string())
}

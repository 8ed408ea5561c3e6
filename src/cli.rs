use std::num::NonZeroU8;
use std::path::PathBuf;

use clap::Parser;

use segment_downloader::download::config::DEFAULT_URI;

/// Downloads a file over several concurrent range requests.
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct CliArgs {
    /// URI of the resource to download
    #[arg(short, long, default_value = DEFAULT_URI)]
    pub uri: String,

    /// Number of segments; overrides the config file
    #[arg(short, long)]
    pub concurrency: Option<NonZeroU8>,

    /// Output directory; overrides the config file
    #[arg(short, long)]
    pub dir: Option<PathBuf>,

    /// JSON config file
    #[arg(long)]
    pub config: Option<PathBuf>,

    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

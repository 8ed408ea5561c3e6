use anyhow::{bail, Context, Result};
use clap::Parser;
use log::warn;
use url::Url;

use segment_downloader::download::logger::setup_logger;
use segment_downloader::download::Config;
use segment_downloader::{DownloadRequest, Downloader};

use crate::cli::CliArgs;

mod cli;

#[tokio::main]
async fn main() {
    let args = CliArgs::parse();

    if let Err(err) = run(args).await {
        eprintln!("{:#}", err);
        std::process::exit(1);
    }
}

async fn run(args: CliArgs) -> Result<()> {
    let mut config = Config::load(args.config.as_deref())?;
    if let Some(concurrency) = args.concurrency {
        config.concurrency = concurrency;
    }
    if let Some(dir) = args.dir {
        config.download_dir = dir;
    }
    if args.log_file.is_some() {
        config.log_file = args.log_file;
    }

    setup_logger(config.log_level(), config.log_file.as_deref())?;

    let url = Url::parse(&args.uri).with_context(|| format!("Invalid URI: {}", args.uri))?;
    let request = DownloadRequest::from_url(url, &config.download_dir, config.concurrency);
    if request.target().exists() {
        bail!("File exists: {}", request.target().display());
    }

    let downloader = Downloader::from_config(&config)?;

    let cancel_token = downloader.cancel_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling download");
            cancel_token.cancel();
        }
    });

    let report = downloader
        .download(request)
        .await
        .context("Download failed")?;
    println!("Downloaded to {:?}", report.path);

    Ok(())
}

//! Downloads one HTTP resource as N concurrent byte ranges and stitches
//! them back into a single file.

pub mod download;

pub use download::{DownloadError, DownloadReport, DownloadRequest, Downloader};

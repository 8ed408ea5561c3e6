//!
//! # Segmented download
//!
//! Probe → plan → concurrent segment workers → reassembly.
//!

pub mod config;
pub mod coordinator;
pub mod downloader;
pub mod error;
pub mod logger;
pub mod plan;
pub mod prober;
pub mod reassembler;
pub mod request;
pub mod util;
pub mod worker;

pub use config::Config;
pub use coordinator::{DownloadCoordinator, DownloadReport};
pub use downloader::Downloader;
pub use error::{DownloadError, SegmentState};
pub use plan::{ChunkRange, RangePlan, Segment};
pub use prober::ResourceMetadata;
pub use request::DownloadRequest;

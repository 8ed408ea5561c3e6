use std::path::PathBuf;

use thiserror::Error;
use tokio::io;

/// 下载中发生的错误
#[derive(Error, Debug)]
pub enum DownloadError {
    /// The source does not serve byte ranges or does not report a usable size.
    #[error("Source does not support segmented download: {0}")]
    UnsupportedSource(String),

    #[error("Http request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Segment {index} range rejected: {reason}")]
    RangeUnsatisfiable { index: usize, reason: String },

    #[error("IOError: {0}")]
    Io(#[from] io::Error),

    #[error("Target file already exists: {}", .0.display())]
    TargetExists(PathBuf),

    /// Raised after every segment was fetched, while concatenating the stores.
    #[error("Reassembly of {} failed: {source}", .path.display())]
    Reassembly {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Download cancelled")]
    Cancelled,
}

impl DownloadError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, DownloadError::Cancelled)
    }

    pub(crate) fn range(index: usize, reason: impl Into<String>) -> Self {
        DownloadError::RangeUnsatisfiable {
            index,
            reason: reason.into(),
        }
    }
}

/// Lifecycle of one segment worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentState {
    Pending,
    Streaming,
    Succeeded,
    Failed,
    Cancelled,
}

impl SegmentState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, SegmentState::Pending | SegmentState::Streaming)
    }
}

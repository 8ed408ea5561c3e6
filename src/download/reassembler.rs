//!
//! Concatenates segment stores into the target file.
//!

use std::path::Path;

use log::{debug, info};
use tokio::fs::{self, File, OpenOptions};
use tokio::io::{self, AsyncWriteExt, BufWriter};

use crate::download::error::DownloadError;
use crate::download::plan::RangePlan;

/// Writes every store of `plan` into `target`, in index order, deleting each
/// store once copied. Returns the number of bytes written.
///
/// `target` must not exist. On a [`DownloadError::Reassembly`] error the
/// truncated target is left behind for the caller to discard.
pub async fn combine(target: &Path, plan: &RangePlan) -> Result<u64, DownloadError> {
    let output = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(target)
        .await
        .map_err(|err| match err.kind() {
            io::ErrorKind::AlreadyExists => DownloadError::TargetExists(target.to_path_buf()),
            _ => DownloadError::Io(err),
        })?;

    let reassembly_error = |source: io::Error| DownloadError::Reassembly {
        path: target.to_path_buf(),
        source,
    };

    let mut writer = BufWriter::new(output);
    let mut total = 0u64;

    // segments 按 index 升序，即按字节顺序
    for segment in &plan.segments {
        let mut input = File::open(&segment.store_path)
            .await
            .map_err(reassembly_error)?;
        let copied = io::copy(&mut input, &mut writer)
            .await
            .map_err(reassembly_error)?;
        writer.flush().await.map_err(reassembly_error)?;
        drop(input);

        fs::remove_file(&segment.store_path)
            .await
            .map_err(reassembly_error)?;

        debug!("Segment {} merged: {} bytes", segment.index, copied);
        total += copied;
    }

    writer.flush().await.map_err(reassembly_error)?;
    writer.get_ref().sync_all().await.map_err(reassembly_error)?;

    info!("Reassembled {} segments into {}", plan.len(), target.display());

    Ok(total)
}

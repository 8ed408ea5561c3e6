use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use futures_util::stream::FuturesUnordered;
use futures_util::StreamExt;
use log::{error, info, warn};
use reqwest::Client;
use tokio::fs;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::download::error::{DownloadError, SegmentState};
use crate::download::plan::{is_segment_store_name, RangePlan};
use crate::download::reassembler;
use crate::download::request::DownloadRequest;
use crate::download::util::clone_request;
use crate::download::worker::SegmentWorker;

/// A finished download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadReport {
    pub path: PathBuf,
    pub bytes: u64,
}

/// Runs one worker per segment, then either reassembles or rolls back.
///
/// The first real failure cancels every other worker. Cancelling the
/// `interrupt` token passed to [`DownloadCoordinator::new`] takes the same
/// path and yields [`DownloadError::Cancelled`].
pub struct DownloadCoordinator {
    request: DownloadRequest,
    plan: RangePlan,
    cancel_token: CancellationToken,
    workers: Vec<SegmentWorker>,
}

impl DownloadCoordinator {
    pub fn new(
        client: Client,
        request: DownloadRequest,
        plan: RangePlan,
        interrupt: &CancellationToken,
    ) -> Self {
        // 子 token：worker 失败只取消本次下载，外部中断会传递下来
        let cancel_token = interrupt.child_token();
        let total_size = plan.total_size;
        let workers = plan
            .segments
            .iter()
            .map(|segment| {
                SegmentWorker::new(
                    client.clone(),
                    segment.clone(),
                    total_size,
                    cancel_token.clone(),
                )
            })
            .collect();

        Self {
            request,
            plan,
            cancel_token,
            workers,
        }
    }

    pub fn plan(&self) -> &RangePlan {
        &self.plan
    }

    pub fn segment_states(&self) -> Vec<SegmentState> {
        self.workers.iter().map(SegmentWorker::state).collect()
    }

    pub fn subscribe(&self) -> Vec<watch::Receiver<SegmentState>> {
        self.workers.iter().map(SegmentWorker::subscribe).collect()
    }

    pub async fn run(&self) -> Result<DownloadReport, DownloadError> {
        let target = self.request.target();
        info!(
            "Downloading {} into {} with {} segments",
            self.request.url(),
            target.display(),
            self.plan.len()
        );

        if let Some(cause) = self.fetch_segments().await {
            self.purge_segment_stores().await;
            return Err(cause);
        }

        match reassembler::combine(target, &self.plan).await {
            Ok(bytes) => Ok(DownloadReport {
                path: target.to_path_buf(),
                bytes,
            }),
            Err(err) => {
                error!("Reassembly failed: {}", err);
                // 目标文件已存在时不能删除
                if matches!(err, DownloadError::Reassembly { .. }) {
                    remove_if_exists(target).await;
                }
                self.purge_segment_stores().await;
                Err(err)
            }
        }
    }

    /// Drives every worker to a terminal state; returns the cause of failure, if any.
    async fn fetch_segments(&self) -> Option<DownloadError> {
        let request = self.request.create_http_request();
        let mut futures_unordered = self
            .workers
            .iter()
            .map(|worker| {
                let request = clone_request(&request);
                async move { (worker.segment().index, worker.fetch(request).await) }
            })
            .collect::<FuturesUnordered<_>>();

        let mut first_error = None;
        while let Some((index, result)) = futures_unordered.next().await {
            match result {
                Ok(_) | Err(DownloadError::Cancelled) => {}
                Err(err) => {
                    if first_error.is_none() {
                        error!("Segment {} failed, cancelling download: {}", index, err);
                        self.cancel_token.cancel();
                        first_error = Some(err);
                    }
                }
            }
        }
        debug_assert!(self.workers.iter().all(|worker| worker.state().is_terminal()));

        first_error.or_else(|| {
            self.cancel_token
                .is_cancelled()
                .then_some(DownloadError::Cancelled)
        })
    }

    /// Removes the plan's stores and any other `<target>.<n>` left in the directory.
    async fn purge_segment_stores(&self) {
        for path in self.plan.store_paths() {
            remove_if_exists(path).await;
        }

        let target = self.request.target();
        let Some(target_name) = target.file_name().and_then(|name| name.to_str()) else {
            return;
        };
        let dir = match target.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        let mut entries = match fs::read_dir(dir).await {
            Ok(entries) => entries,
            Err(err) => {
                warn!("Cannot scan {} for segment stores: {}", dir.display(), err);
                return;
            }
        };
        while let Ok(Some(entry)) = entries.next_entry().await {
            let file_name = entry.file_name();
            let is_store = file_name
                .to_str()
                .map(|name| is_segment_store_name(target_name, name))
                .unwrap_or(false);
            if is_store {
                remove_if_exists(&entry.path()).await;
            }
        }
    }
}

async fn remove_if_exists(path: &Path) {
    match fs::remove_file(path).await {
        Ok(()) => {}
        Err(err) if err.kind() == ErrorKind::NotFound => {}
        Err(err) => warn!("Failed to remove {}: {}", path.display(), err),
    }
}

use bytes::Bytes;
use futures_util::StreamExt;
use headers::{ContentRange, HeaderMapExt};
use log::{debug, warn};
use reqwest::{Client, Request, Response, StatusCode};
use tokio::fs::OpenOptions;
use tokio::io::{AsyncWriteExt, BufWriter};
use tokio::select;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::download::error::{DownloadError, SegmentState};
use crate::download::plan::Segment;
use crate::download::util::clone_request;

/// Fetches one segment into its store.
pub struct SegmentWorker {
    client: Client,
    segment: Segment,
    // HEAD 探测到的文件大小，206 的 Content-Range 必须与之一致
    total_size: u64,
    cancel_token: CancellationToken,
    state: watch::Sender<SegmentState>,
}

impl SegmentWorker {
    pub fn new(
        client: Client,
        segment: Segment,
        total_size: u64,
        cancel_token: CancellationToken,
    ) -> Self {
        let (state, _) = watch::channel(SegmentState::Pending);
        Self {
            client,
            segment,
            total_size,
            cancel_token,
            state,
        }
    }

    pub fn segment(&self) -> &Segment {
        &self.segment
    }

    pub fn state(&self) -> SegmentState {
        *self.state.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<SegmentState> {
        self.state.subscribe()
    }

    /// Runs the fetch to a terminal state and returns the bytes written.
    ///
    /// The store is left on disk whatever the outcome.
    pub async fn fetch(&self, request: Request) -> Result<u64, DownloadError> {
        let result = self.execute(request).await;

        let state = match &result {
            Ok(len) => {
                debug!("Segment {} finished: {} bytes", self.segment.index, len);
                SegmentState::Succeeded
            }
            Err(DownloadError::Cancelled) => {
                debug!("Segment {} cancelled", self.segment.index);
                SegmentState::Cancelled
            }
            Err(err) => {
                warn!("Segment {} failed: {}", self.segment.index, err);
                SegmentState::Failed
            }
        };
        self.state.send_replace(state);

        result
    }

    async fn execute(&self, request: Request) -> Result<u64, DownloadError> {
        let index = self.segment.index;
        let range = self.segment.range;

        if self.cancel_token.is_cancelled() {
            return Err(DownloadError::Cancelled);
        }

        // 写入 range 头
        let mut range_request = clone_request(&request);
        let range_header = range
            .to_range_header()
            .ok_or_else(|| DownloadError::range(index, "empty range"))?;
        range_request.headers_mut().typed_insert(range_header);

        debug!("Segment {} requesting bytes={}-{}", index, range.start, range.end);
        let response = select! {
            biased;
            _ = self.cancel_token.cancelled() => return Err(DownloadError::Cancelled),
            response = self.client.execute(range_request) => response?,
        };
        self.check_response(&response)?;

        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&self.segment.store_path)
            .await?;
        let mut writer = BufWriter::new(file);
        self.state.send_replace(SegmentState::Streaming);

        let expected = range.len();
        let mut received = 0u64;
        let mut stream = response.bytes_stream();
        loop {
            let next = select! {
                biased;
                _ = self.cancel_token.cancelled() => return Err(DownloadError::Cancelled),
                next = stream.next() => next,
            };
            let bytes: Bytes = match next {
                Some(bytes) => bytes?,
                None => break,
            };

            received += bytes.len() as u64;
            if received > expected {
                return Err(DownloadError::range(
                    index,
                    format!("server sent more than the {} requested bytes", expected),
                ));
            }

            select! {
                biased;
                _ = self.cancel_token.cancelled() => return Err(DownloadError::Cancelled),
                written = writer.write_all(&bytes) => written?,
            }
        }

        if received != expected {
            return Err(DownloadError::range(
                index,
                format!("expected {} bytes, received {}", expected, received),
            ));
        }

        writer.flush().await?;

        Ok(received)
    }

    fn check_response(&self, response: &Response) -> Result<(), DownloadError> {
        let index = self.segment.index;
        let range = self.segment.range;

        match response.status() {
            StatusCode::PARTIAL_CONTENT => {}
            // 单个 segment 覆盖整个文件时，服务器可以直接返回 200
            StatusCode::OK if range.start == 0 && range.len() == self.total_size => return Ok(()),
            status => return Err(DownloadError::range(index, format!("HTTP {}", status))),
        }

        let content_range = response
            .headers()
            .typed_get::<ContentRange>()
            .ok_or_else(|| DownloadError::range(index, "206 without a valid Content-Range"))?;

        if content_range.bytes_range() != Some((range.start, range.end)) {
            return Err(DownloadError::range(
                index,
                format!(
                    "server sent {:?}, requested bytes {}-{}",
                    content_range.bytes_range(),
                    range.start,
                    range.end
                ),
            ));
        }
        if content_range.bytes_len() != Some(self.total_size) {
            return Err(DownloadError::range(
                index,
                format!(
                    "resource length changed: probed {}, server reports {:?}",
                    self.total_size,
                    content_range.bytes_len()
                ),
            ));
        }

        Ok(())
    }
}

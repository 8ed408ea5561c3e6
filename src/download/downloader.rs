use std::time::Duration;

use log::info;
use reqwest::Client;
use tokio::select;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::download::config::Config;
use crate::download::coordinator::{DownloadCoordinator, DownloadReport};
use crate::download::error::DownloadError;
use crate::download::plan::RangePlan;
use crate::download::prober::{self, ResourceMetadata};
use crate::download::request::DownloadRequest;

type DownloadResult = Result<DownloadReport, DownloadError>;

/// Entry point: probe, plan, fetch and reassemble one resource.
pub struct Downloader {
    // Client 内部拥有一个连接池且默认拥有一个 Arc 包裹，所以应尽量使用 clone 复用
    client: Client,
    // 外部中断（例如 Ctrl-C）
    cancel_token: CancellationToken,
}

impl Downloader {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            cancel_token: CancellationToken::new(),
        }
    }

    pub fn from_config(config: &Config) -> Result<Self, DownloadError> {
        let mut builder = Client::builder();
        if let Some(agent) = &config.user_agent {
            builder = builder.user_agent(agent.as_str());
        }
        if let Some(secs) = config.connect_timeout_secs {
            builder = builder.connect_timeout(Duration::from_secs(secs));
        }
        if let Some(secs) = config.read_timeout_secs {
            builder = builder.read_timeout(Duration::from_secs(secs));
        }

        Ok(Self::new(builder.build()?))
    }

    /// Token whose cancellation aborts the running download.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel_token.clone()
    }

    pub fn cancel(&self) {
        self.cancel_token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel_token.is_cancelled()
    }

    pub async fn probe(&self, url: &Url) -> Result<ResourceMetadata, DownloadError> {
        prober::probe(&self.client, url).await
    }

    pub async fn download(&self, request: DownloadRequest) -> DownloadResult {
        if self.is_cancelled() {
            return Err(DownloadError::Cancelled);
        }

        let metadata = select! {
            biased;
            _ = self.cancel_token.cancelled() => return Err(DownloadError::Cancelled),
            metadata = self.probe(request.url()) => metadata?,
        };
        let plan = RangePlan::new(request.target(), metadata.total_size, request.concurrency());

        let coordinator =
            DownloadCoordinator::new(self.client.clone(), request, plan, &self.cancel_token);
        let report = coordinator.run().await?;

        info!("Downloaded to {} ({} bytes)", report.path.display(), report.bytes);

        Ok(report)
    }
}

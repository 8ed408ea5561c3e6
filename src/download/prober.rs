use std::num::NonZeroU64;

use headers::{ContentLength, HeaderMapExt};
use log::debug;
use reqwest::header::ACCEPT_RANGES;
use reqwest::{Client, Request};
use url::Url;

use crate::download::error::DownloadError;

/// What the `HEAD` probe learned about the resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceMetadata {
    pub total_size: NonZeroU64,
}

/// Sends a single `HEAD` request and checks the source can serve byte ranges.
pub async fn probe(client: &Client, url: &Url) -> Result<ResourceMetadata, DownloadError> {
    let request = Request::new(reqwest::Method::HEAD, url.clone());
    let response = client.execute(request).await?;

    if !response.status().is_success() {
        return Err(DownloadError::UnsupportedSource(format!(
            "HEAD {} returned HTTP {}",
            url,
            response.status()
        )));
    }

    let headers = response.headers();
    let accepts_bytes = headers
        .get(ACCEPT_RANGES)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.trim().eq_ignore_ascii_case("bytes"))
        .unwrap_or(false);
    if !accepts_bytes {
        return Err(DownloadError::UnsupportedSource(
            "server does not accept byte ranges".to_string(),
        ));
    }

    let total_size = headers
        .typed_get::<ContentLength>()
        .and_then(|ContentLength(len)| NonZeroU64::new(len))
        .ok_or_else(|| {
            DownloadError::UnsupportedSource("missing or zero Content-Length".to_string())
        })?;

    debug!("Probed {}: {} bytes", url, total_size);

    Ok(ResourceMetadata { total_size })
}

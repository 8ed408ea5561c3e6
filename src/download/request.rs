use std::num::NonZeroU8;
use std::path::{Path, PathBuf};

use headers::HeaderMapExt;
use reqwest::Request;
use url::Url;

use crate::download::util::file_name_from_url;

/// One download: where from, where to, and how many segments.
#[derive(Debug, Clone)]
pub struct DownloadRequest {
    url: Url,
    target: PathBuf,
    concurrency: NonZeroU8,
}

impl DownloadRequest {
    pub fn new(url: Url, target: impl Into<PathBuf>, concurrency: NonZeroU8) -> Self {
        Self {
            url,
            target: target.into(),
            concurrency,
        }
    }

    /// Names the target after the last path segment of `url`, inside `dir`.
    pub fn from_url(url: Url, dir: &Path, concurrency: NonZeroU8) -> Self {
        let target = dir.join(file_name_from_url(&url));
        Self::new(url, target, concurrency)
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn target(&self) -> &Path {
        &self.target
    }

    pub fn concurrency(&self) -> NonZeroU8 {
        self.concurrency
    }

    /// Base `GET` request every segment worker clones and narrows with a `Range`.
    pub fn create_http_request(&self) -> Request {
        let mut request = Request::new(reqwest::Method::GET, self.url.clone());
        let header_map = request.headers_mut();

        header_map.insert(reqwest::header::ACCEPT, headers::HeaderValue::from_static("*/*"));
        header_map.typed_insert(headers::Connection::keep_alive());

        request
    }
}

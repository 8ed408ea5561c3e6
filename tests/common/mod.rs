#![allow(dead_code)]

use std::path::Path;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

/// Deterministic test payload.
pub fn content(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i * 31 % 251) as u8).collect()
}

/// Serves `Range: bytes=<start>-<end>` slices of a fixed body.
pub struct RangeResponder {
    content: Vec<u8>,
    delay: Option<Duration>,
}

impl RangeResponder {
    pub fn new(content: &[u8]) -> Self {
        Self {
            content: content.to_vec(),
            delay: None,
        }
    }

    pub fn delayed(content: &[u8], delay: Duration) -> Self {
        Self {
            content: content.to_vec(),
            delay: Some(delay),
        }
    }

    fn parse_range(&self, request: &Request) -> Option<(usize, usize)> {
        let value = request.headers.get("range")?.to_str().ok()?;
        let (start, end) = value.strip_prefix("bytes=")?.split_once('-')?;
        Some((start.parse().ok()?, end.parse().ok()?))
    }
}

impl Respond for RangeResponder {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let total = self.content.len();
        let template = match self.parse_range(request) {
            Some((start, end)) if start <= end && end < total => ResponseTemplate::new(206)
                .insert_header("Content-Range", format!("bytes {}-{}/{}", start, end, total))
                .set_body_bytes(self.content[start..=end].to_vec()),
            Some(_) => ResponseTemplate::new(416),
            None => ResponseTemplate::new(200).set_body_bytes(self.content.clone()),
        };

        match self.delay {
            Some(delay) => template.set_delay(delay),
            None => template,
        }
    }
}

/// `HEAD` answer advertising byte ranges and the body length.
pub fn head_template(content: &[u8]) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .insert_header("Accept-Ranges", "bytes")
        .insert_header("Content-Length", content.len().to_string())
        .set_body_bytes(content.to_vec())
}

/// A mock server exposing `content` at `/<file>` with range support.
pub async fn serve_ranged(content: &[u8], file: &str) -> MockServer {
    let server = MockServer::start().await;
    let route = format!("/{}", file);

    Mock::given(method("HEAD"))
        .and(path(route.as_str()))
        .respond_with(head_template(content))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(route.as_str()))
        .respond_with(RangeResponder::new(content))
        .mount(&server)
        .await;

    server
}

/// A server that sends `206` headers and the first bytes of every range, then stalls.
///
/// `total` is echoed as the resource length in `Content-Range`.
pub async fn serve_stalling(total: u64, sent: &'static [u8]) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            tokio::spawn(async move {
                let mut buf = [0u8; 4096];
                let n = socket.read(&mut buf).await.unwrap_or(0);
                let Some((start, end)) = requested_range(&buf[..n]) else {
                    return;
                };
                let head = format!(
                    concat!(
                        "HTTP/1.1 206 Partial Content\r\n",
                        "Content-Range: bytes {}-{}/{}\r\n",
                        "Content-Length: {}\r\n\r\n",
                    ),
                    start,
                    end,
                    total,
                    end - start + 1
                );
                let _ = socket.write_all(head.as_bytes()).await;
                let _ = socket.write_all(sent).await;
                let _ = socket.flush().await;
                tokio::time::sleep(Duration::from_secs(60)).await;
            });
        }
    });

    format!("http://{}/stall.bin", addr)
}

fn requested_range(raw: &[u8]) -> Option<(u64, u64)> {
    let text = String::from_utf8_lossy(raw);
    let value = text.lines().find_map(|line| {
        let (name, value) = line.split_once(':')?;
        name.trim().eq_ignore_ascii_case("range").then(|| value.trim().to_string())
    })?;
    let (start, end) = value.strip_prefix("bytes=")?.split_once('-')?;
    Some((start.parse().ok()?, end.parse().ok()?))
}

/// A server that accepts connections and never answers.
pub async fn serve_silent() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        while let Ok((socket, _)) = listener.accept().await {
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_secs(60)).await;
                drop(socket);
            });
        }
    });

    format!("http://{}/silent.bin", addr)
}

/// Names of `<target>.<n>` files left in `dir`.
pub fn leftover_stores(dir: &Path, target_name: &str) -> Vec<String> {
    std::fs::read_dir(dir)
        .unwrap()
        .filter_map(|entry| entry.ok())
        .filter_map(|entry| entry.file_name().to_str().map(str::to_string))
        .filter(|name| name.starts_with(&format!("{}.", target_name)))
        .collect()
}

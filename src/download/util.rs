use percent_encoding::percent_decode_str;
use reqwest::Request;
use url::Url;

const FALLBACK_FILE_NAME: &str = "index.html";

pub fn clone_request(request: &Request) -> Request {
    let mut req = Request::new(request.method().clone(), request.url().clone());
    *req.headers_mut() = request.headers().clone();
    *req.version_mut() = request.version();
    *req.timeout_mut() = request.timeout().map(Clone::clone);

    req
}

/// Last path segment of `url`, percent-decoded.
///
/// URLs whose path ends in `/` fall back to `index.html`.
pub fn file_name_from_url(url: &Url) -> String {
    url.path_segments()
        .and_then(|mut segments| segments.next_back())
        .map(|segment| percent_decode_str(segment).decode_utf8_lossy().to_string())
        .filter(|name| {
            !name.is_empty() && name != "." && name != ".." && !name.contains(['/', '\\'])
        })
        .unwrap_or_else(|| FALLBACK_FILE_NAME.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name(url: &str) -> String {
        file_name_from_url(&Url::parse(url).unwrap())
    }

    #[test]
    fn should_take_last_path_segment() {
        assert_eq!(name("https://example.com/files/archive.zip"), "archive.zip");
        assert_eq!(name("https://example.com/image.png?id=123"), "image.png");
        assert_eq!(name("https://example.com/my%20photo.jpg"), "my photo.jpg");
    }

    #[test]
    fn should_fall_back_without_file_name() {
        assert_eq!(name("https://www.example.com/"), "index.html");
        assert_eq!(name("https://example.com/a/%2F"), "index.html");
    }

    #[test]
    fn should_keep_request_headers_on_clone() {
        let url = Url::parse("http://localhost/file.bin").unwrap();
        let mut request = Request::new(reqwest::Method::GET, url);
        request
            .headers_mut()
            .insert(reqwest::header::ACCEPT, "*/*".parse().unwrap());

        let cloned = clone_request(&request);

        assert_eq!(cloned.url(), request.url());
        assert_eq!(cloned.headers().get(reqwest::header::ACCEPT).unwrap(), "*/*");
    }
}

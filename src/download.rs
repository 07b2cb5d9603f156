//! Static download responder
//!
//! Serves a file from a directory with a `Content-Disposition: attachment`
//! header so browsers save it instead of rendering it.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::header::{HeaderName, HeaderValue, CONTENT_DISPOSITION, IF_MODIFIED_SINCE, IF_NONE_MATCH, RANGE};
use hyper::{HeaderMap, Method, Request, Response};
use tokio::fs;

use crate::error::{Error, Result};
use crate::http::cache::Validators;
use crate::http::range::RangeParseResult;
use crate::http::{self, mime, response};

/// A file loaded for download
#[derive(Debug, Clone)]
pub struct Download {
    pub path: PathBuf,
    pub data: Bytes,
    pub content_type: &'static str,
    pub validators: Validators,
}

/// Load `dir/file_name` for download
///
/// Missing files, directories, and paths resolving outside `dir` all fail
/// with [`Error::NotFound`]; other filesystem failures surface as
/// [`Error::Io`].
pub async fn load_download(dir: impl AsRef<Path>, file_name: &str) -> Result<Download> {
    let dir = dir.as_ref();
    let path = dir.join(file_name);

    let dir_canonical = fs::canonicalize(dir)
        .await
        .map_err(|e| not_found_or_io(e, &path))?;
    let path_canonical = fs::canonicalize(&path)
        .await
        .map_err(|e| not_found_or_io(e, &path))?;
    if !path_canonical.starts_with(&dir_canonical) {
        return Err(Error::NotFound(path));
    }

    let metadata = fs::metadata(&path_canonical)
        .await
        .map_err(|e| not_found_or_io(e, &path))?;
    if !metadata.is_file() {
        return Err(Error::NotFound(path));
    }

    let data = fs::read(&path_canonical)
        .await
        .map_err(|e| not_found_or_io(e, &path))?;

    Ok(Download {
        content_type: mime::content_type_for(&path),
        validators: Validators::new(metadata.len(), metadata.modified().ok()),
        data: Bytes::from(data),
        path,
    })
}

/// Serve `dir/file_name` as an attachment named `display_name`
///
/// Honors `HEAD`, `If-None-Match`/`If-Modified-Since` (304) and a single
/// `Range` (206/416). A missing file yields 404, any other filesystem error
/// 500.
pub async fn download_static_file<B>(
    req: &Request<B>,
    dir: impl AsRef<Path>,
    file_name: &str,
    display_name: &str,
) -> Response<Full<Bytes>> {
    let download = match load_download(dir, file_name).await {
        Ok(d) => d,
        Err(Error::NotFound(_)) => return http::build_404_response(),
        Err(_) => return http::build_500_response(),
    };

    let mut response = build_download_response(&download, req.method(), req.headers());
    response
        .headers_mut()
        .insert(CONTENT_DISPOSITION, attachment_header(display_name));
    response
}

fn build_download_response(
    download: &Download,
    method: &Method,
    headers: &HeaderMap,
) -> Response<Full<Bytes>> {
    let is_head = *method == Method::HEAD;
    let total_size = download.data.len() as u64;

    if download
        .validators
        .is_not_modified(header_str(headers, IF_NONE_MATCH), header_str(headers, IF_MODIFIED_SINCE))
    {
        return http::build_304_response(&download.validators);
    }

    match http::parse_range_header(header_str(headers, RANGE), total_size) {
        RangeParseResult::Valid(range) => {
            #[allow(clippy::cast_possible_truncation)]
            let slice = download
                .data
                .slice(range.start as usize..=range.end as usize);
            response::build_partial_response(
                slice,
                download.content_type,
                &download.validators,
                range,
                total_size,
                is_head,
            )
        }
        RangeParseResult::NotSatisfiable => http::build_416_response(total_size),
        RangeParseResult::None => response::build_file_response(
            download.data.clone(),
            download.content_type,
            &download.validators,
            is_head,
        ),
    }
}

/// `attachment; filename"<name>"`
///
/// Quotes and control characters are dropped from the display name so the
/// header is always valid.
fn attachment_header(display_name: &str) -> HeaderValue {
    let name: String = display_name
        .chars()
        .filter(|c| *c != '"' && !c.is_control())
        .collect();
    HeaderValue::from_str(&format!("attachment; filename\"{name}\""))
        .unwrap_or_else(|_| HeaderValue::from_static("attachment"))
}

fn header_str(headers: &HeaderMap, name: HeaderName) -> Option<&str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

fn not_found_or_io(err: std::io::Error, path: &Path) -> Error {
    if err.kind() == ErrorKind::NotFound {
        Error::NotFound(path.to_path_buf())
    } else {
        Error::Io(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;
    use hyper::header::{CONTENT_LENGTH, CONTENT_RANGE, CONTENT_TYPE, ETAG};
    use hyper::StatusCode;

    fn fixture() -> (tempfile::TempDir, Vec<u8>) {
        let tmp = tempfile::tempdir().unwrap();
        let data: Vec<u8> = (0..=255u8).cycle().take(161_289).collect();
        std::fs::write(tmp.path().join("tanjiro.jpg"), &data).unwrap();
        (tmp, data)
    }

    fn get(headers: &[(&'static str, &str)]) -> Request<()> {
        let mut builder = Request::builder().method(Method::GET).uri("/");
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        builder.body(()).unwrap()
    }

    #[tokio::test]
    async fn test_download_sets_disposition_and_length() {
        let (tmp, data) = fixture();
        let response = download_static_file(&get(&[]), tmp.path(), "tanjiro.jpg", "Tanjiro.jpg").await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[CONTENT_DISPOSITION],
            "attachment; filename\"Tanjiro.jpg\""
        );
        assert_eq!(response.headers()[CONTENT_LENGTH], "161289");
        assert_eq!(response.headers()[CONTENT_TYPE], "image/jpeg");

        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(body.len(), 161_289);
        assert_eq!(&body[..], &data[..]);
    }

    #[tokio::test]
    async fn test_missing_file_is_404() {
        let tmp = tempfile::tempdir().unwrap();
        let response = download_static_file(&get(&[]), tmp.path(), "nope.txt", "nope.txt").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let err = load_download(tmp.path(), "nope.txt").await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[tokio::test]
    async fn test_escaping_the_directory_is_not_found() {
        let tmp = tempfile::tempdir().unwrap();
        let inner = tmp.path().join("public");
        std::fs::create_dir(&inner).unwrap();
        std::fs::write(tmp.path().join("secret.txt"), b"secret").unwrap();

        let err = load_download(&inner, "../secret.txt").await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[tokio::test]
    async fn test_directory_is_not_found() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::create_dir(tmp.path().join("sub")).unwrap();
        let err = load_download(tmp.path(), "sub").await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[tokio::test]
    async fn test_range_request() {
        let (tmp, data) = fixture();
        let req = get(&[("range", "bytes=10-19")]);
        let response = download_static_file(&req, tmp.path(), "tanjiro.jpg", "t.jpg").await;

        assert_eq!(response.status(), StatusCode::PARTIAL_CONTENT);
        assert_eq!(response.headers()[CONTENT_RANGE], "bytes 10-19/161289");
        assert!(response.headers().contains_key(CONTENT_DISPOSITION));
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], &data[10..20]);
    }

    #[tokio::test]
    async fn test_unsatisfiable_range() {
        let (tmp, _) = fixture();
        let req = get(&[("range", "bytes=999999-")]);
        let response = download_static_file(&req, tmp.path(), "tanjiro.jpg", "t.jpg").await;
        assert_eq!(response.status(), StatusCode::RANGE_NOT_SATISFIABLE);
    }

    #[tokio::test]
    async fn test_conditional_request() {
        let (tmp, _) = fixture();
        let first = download_static_file(&get(&[]), tmp.path(), "tanjiro.jpg", "t.jpg").await;
        let etag = first.headers()[ETAG].to_str().unwrap().to_string();

        let req = get(&[("if-none-match", etag.as_str())]);
        let second = download_static_file(&req, tmp.path(), "tanjiro.jpg", "t.jpg").await;
        assert_eq!(second.status(), StatusCode::NOT_MODIFIED);
    }

    #[tokio::test]
    async fn test_head_has_no_body() {
        let (tmp, _) = fixture();
        let req = Request::builder().method(Method::HEAD).body(()).unwrap();
        let response = download_static_file(&req, tmp.path(), "tanjiro.jpg", "t.jpg").await;
        assert_eq!(response.headers()[CONTENT_LENGTH], "161289");
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert!(body.is_empty());
    }

    #[test]
    fn test_attachment_header_drops_quotes() {
        assert_eq!(
            attachment_header("a\"b\nc.txt"),
            "attachment; filename\"abc.txt\""
        );
    }
}

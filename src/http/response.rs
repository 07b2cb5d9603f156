//! HTTP response building module
//!
//! Canned responses for file serving and the demo server. Builders never
//! fail: header values are all valid by construction, and a build error
//! falls back to an empty response of the same status.

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::header::{
    ACCEPT_RANGES, ALLOW, CACHE_CONTROL, CONTENT_LENGTH, CONTENT_RANGE, CONTENT_TYPE, ETAG,
    LAST_MODIFIED,
};
use hyper::http::response::Builder;
use hyper::{Response, StatusCode};

use super::cache::Validators;
use super::range::ByteRange;

/// Build 304 Not Modified response
pub fn build_304_response(validators: &Validators) -> Response<Full<Bytes>> {
    with_validators(Response::builder().status(StatusCode::NOT_MODIFIED), validators)
        .body(Full::new(Bytes::new()))
        .unwrap_or_else(|_| fallback(StatusCode::NOT_MODIFIED))
}

/// Build 404 Not Found response
pub fn build_404_response() -> Response<Full<Bytes>> {
    build_text_response(StatusCode::NOT_FOUND, "404 Not Found")
}

/// Build 405 Method Not Allowed response
pub fn build_405_response(allow: &str) -> Response<Full<Bytes>> {
    Response::builder()
        .status(StatusCode::METHOD_NOT_ALLOWED)
        .header(CONTENT_TYPE, "text/plain; charset=utf-8")
        .header(ALLOW, allow)
        .body(Full::new(Bytes::from_static(b"405 Method Not Allowed")))
        .unwrap_or_else(|_| fallback(StatusCode::METHOD_NOT_ALLOWED))
}

/// Build 408 Request Timeout response
pub fn build_408_response() -> Response<Full<Bytes>> {
    build_text_response(StatusCode::REQUEST_TIMEOUT, "408 Request Timeout")
}

/// Build 416 Range Not Satisfiable response
pub fn build_416_response(file_size: u64) -> Response<Full<Bytes>> {
    Response::builder()
        .status(StatusCode::RANGE_NOT_SATISFIABLE)
        .header(CONTENT_TYPE, "text/plain; charset=utf-8")
        .header(CONTENT_RANGE, format!("bytes */{file_size}"))
        .body(Full::new(Bytes::from_static(b"416 Range Not Satisfiable")))
        .unwrap_or_else(|_| fallback(StatusCode::RANGE_NOT_SATISFIABLE))
}

/// Build 500 Internal Server Error response
pub fn build_500_response() -> Response<Full<Bytes>> {
    build_text_response(StatusCode::INTERNAL_SERVER_ERROR, "500 Internal Server Error")
}

/// Build plain-text health check response
pub fn build_health_response(body: &'static str) -> Response<Full<Bytes>> {
    Response::builder()
        .status(StatusCode::OK)
        .header(CONTENT_TYPE, "text/plain; charset=utf-8")
        .header(CACHE_CONTROL, "no-cache")
        .body(Full::new(Bytes::from_static(body.as_bytes())))
        .unwrap_or_else(|_| fallback(StatusCode::OK))
}

/// Build a 200 response carrying a whole file
pub fn build_file_response(
    data: Bytes,
    content_type: &str,
    validators: &Validators,
    is_head: bool,
) -> Response<Full<Bytes>> {
    let content_length = data.len();
    let body = if is_head { Bytes::new() } else { data };

    with_validators(Response::builder().status(StatusCode::OK), validators)
        .header(CONTENT_TYPE, content_type)
        .header(CONTENT_LENGTH, content_length)
        .header(ACCEPT_RANGES, "bytes")
        .body(Full::new(body))
        .unwrap_or_else(|_| fallback(StatusCode::OK))
}

/// Build 206 Partial Content response; `data` is the already-sliced range
pub fn build_partial_response(
    data: Bytes,
    content_type: &str,
    validators: &Validators,
    range: ByteRange,
    total_size: u64,
    is_head: bool,
) -> Response<Full<Bytes>> {
    let body = if is_head { Bytes::new() } else { data };

    with_validators(Response::builder().status(StatusCode::PARTIAL_CONTENT), validators)
        .header(CONTENT_TYPE, content_type)
        .header(CONTENT_LENGTH, range.len())
        .header(CONTENT_RANGE, range.content_range(total_size))
        .header(ACCEPT_RANGES, "bytes")
        .body(Full::new(body))
        .unwrap_or_else(|_| fallback(StatusCode::PARTIAL_CONTENT))
}

fn build_text_response(status: StatusCode, text: &'static str) -> Response<Full<Bytes>> {
    Response::builder()
        .status(status)
        .header(CONTENT_TYPE, "text/plain; charset=utf-8")
        .body(Full::new(Bytes::from_static(text.as_bytes())))
        .unwrap_or_else(|_| fallback(status))
}

fn with_validators(builder: Builder, validators: &Validators) -> Builder {
    let builder = builder.header(ETAG, validators.etag.as_str());
    match &validators.last_modified {
        Some(date) => builder.header(LAST_MODIFIED, date.as_str()),
        None => builder,
    }
}

fn fallback(status: StatusCode) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(Bytes::new()));
    *response.status_mut() = status;
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    #[tokio::test]
    async fn test_file_response_head_keeps_length() {
        let validators = Validators::new(5, None);
        let response =
            build_file_response(Bytes::from_static(b"hello"), "text/plain", &validators, true);
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[CONTENT_LENGTH], "5");
        assert_eq!(response.headers()[ETAG], validators.etag.as_str());
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert!(body.is_empty());
    }

    #[test]
    fn test_partial_response_headers() {
        let validators = Validators::new(10, None);
        let response = build_partial_response(
            Bytes::from_static(b"234"),
            "application/octet-stream",
            &validators,
            ByteRange { start: 2, end: 4 },
            10,
            false,
        );
        assert_eq!(response.status(), StatusCode::PARTIAL_CONTENT);
        assert_eq!(response.headers()[CONTENT_LENGTH], "3");
        assert_eq!(response.headers()[CONTENT_RANGE], "bytes 2-4/10");
    }

    #[test]
    fn test_error_responses() {
        assert_eq!(build_404_response().status(), StatusCode::NOT_FOUND);
        assert_eq!(build_416_response(7).headers()[CONTENT_RANGE], "bytes */7");
        assert_eq!(build_405_response("GET, HEAD").headers()[ALLOW], "GET, HEAD");
    }
}

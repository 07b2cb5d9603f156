//! HTTP protocol layer module
//!
//! Protocol helpers shared by the download responder, the upload pipeline,
//! and the demo server: content types, sniffing, cache validators, ranges,
//! and canned responses.

pub mod cache;
pub mod mime;
pub mod range;
pub mod response;
pub mod sniff;

// Re-export commonly used types
pub use range::parse_range_header;
pub use response::{
    build_304_response, build_404_response, build_405_response, build_408_response,
    build_416_response, build_500_response, build_health_response,
};
pub use sniff::detect_content_type;

use hyper::header::CONTENT_LENGTH;
use hyper::HeaderMap;

/// Declared `Content-Length`, if present and well-formed
pub fn content_length(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok())
}

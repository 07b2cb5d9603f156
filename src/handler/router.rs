//! Request routing dispatch module
//!
//! Entry point for HTTP request processing: route matching, method
//! validation, dispatch to the endpoint, and access logging.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Instant;

use http_body_util::Full;
use hyper::body::{Body, Bytes};
use hyper::{Method, Request, Response, StatusCode};
use percent_encoding::percent_decode_str;

use super::endpoints;
use crate::config::AppState;
use crate::error::BoxError;
use crate::json::error_json;
use crate::logger::{self, AccessLogEntry};
use crate::http;

/// Resolved endpoint for a request path
#[derive(Debug, PartialEq, Eq)]
enum Route<'a> {
    Health,
    Upload,
    UploadOne,
    Slugify,
    Download(&'a str),
    NotFound,
}

impl Route<'_> {
    /// Methods the endpoint answers, as an `Allow` header value
    const fn allow(&self) -> &'static str {
        match self {
            Self::Health | Self::Download(_) => "GET, HEAD",
            Self::Upload | Self::UploadOne | Self::Slugify => "POST",
            Self::NotFound => "",
        }
    }

    fn accepts(&self, method: &Method) -> bool {
        match self {
            Self::Health | Self::Download(_) => *method == Method::GET || *method == Method::HEAD,
            Self::Upload | Self::UploadOne | Self::Slugify => *method == Method::POST,
            Self::NotFound => true,
        }
    }
}

fn resolve(path: &str) -> Route<'_> {
    match path {
        "/healthz" => Route::Health,
        "/upload" => Route::Upload,
        "/upload/one" => Route::UploadOne,
        "/slugify" => Route::Slugify,
        _ => match path.strip_prefix("/download/") {
            Some(name) if !name.is_empty() => Route::Download(name),
            _ => Route::NotFound,
        },
    }
}

/// Main entry point for HTTP request handling
pub async fn handle_request<B>(
    req: Request<B>,
    state: Arc<AppState>,
    peer_addr: SocketAddr,
) -> Result<Response<Full<Bytes>>, Infallible>
where
    B: Body<Data = Bytes> + Send + 'static,
    B::Error: Into<BoxError>,
{
    let started = Instant::now();
    let access_log = state.cached_access_log.load(Ordering::Relaxed);
    let mut entry = access_log.then(|| AccessLogEntry::from_request(&req, peer_addr));

    let response = dispatch(req, &state).await;

    if let Some(entry) = entry.as_mut() {
        entry.status = response.status().as_u16();
        entry.body_bytes = response.body().size_hint().exact().unwrap_or(0);
        entry.request_time = started.elapsed();
        logger::log_access(entry, &state.config.logging.access_log_format);
    }

    Ok(response)
}

async fn dispatch<B>(req: Request<B>, state: &AppState) -> Response<Full<Bytes>>
where
    B: Body<Data = Bytes> + Send + 'static,
    B::Error: Into<BoxError>,
{
    let path = req.uri().path().to_string();
    let route = resolve(&path);

    if !route.accepts(req.method()) {
        return http::build_405_response(route.allow());
    }

    match route {
        Route::Health => http::build_health_response("ok"),
        Route::Upload => endpoints::upload(req, state).await,
        Route::UploadOne => endpoints::upload_one(req, state).await,
        Route::Slugify => endpoints::slugify(req, state).await,
        // Names are matched against the decoded path segment
        Route::Download(name) => match percent_decode_str(name).decode_utf8() {
            Ok(name) => endpoints::download(&req, state, &name).await,
            Err(_) => not_found(),
        },
        Route::NotFound => not_found(),
    }
}

fn not_found() -> Response<Full<Bytes>> {
    error_json("not found", Some(StatusCode::NOT_FOUND))
        .unwrap_or_else(|_| http::build_404_response())
}

// Outbound JSON
// POSTs a serialized value to a remote URL through a pluggable transport

use std::future::Future;

use http_body_util::{BodyExt, Full};
use hyper::body::Bytes;
use hyper::header::CONTENT_TYPE;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;
use serde::Serialize;

use crate::error::{Error, Result};

/// Sends a request and returns the response with its body collected
pub trait Transport {
    fn send(
        &self,
        req: Request<Full<Bytes>>,
    ) -> impl Future<Output = Result<Response<Bytes>>> + Send;
}

/// Plain HTTP transport backed by the `hyper-util` pooled client
#[derive(Clone)]
pub struct HttpTransport {
    client: Client<HttpConnector, Full<Bytes>>,
}

impl HttpTransport {
    pub fn new() -> Self {
        Self {
            client: Client::builder(TokioExecutor::new()).build_http(),
        }
    }
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for HttpTransport {
    async fn send(&self, req: Request<Full<Bytes>>) -> Result<Response<Bytes>> {
        let response = self
            .client
            .request(req)
            .await
            .map_err(|e| Error::Transport(e.to_string()))?;
        let (parts, body) = response.into_parts();
        let body = body
            .collect()
            .await
            .map_err(|e| Error::Transport(e.to_string()))?
            .to_bytes();
        Ok(Response::from_parts(parts, body))
    }
}

/// POST `value` as JSON to `url` with a default [`HttpTransport`]
pub async fn push_json<T: Serialize + ?Sized>(
    url: &str,
    value: &T,
) -> Result<(Response<Bytes>, StatusCode)> {
    push_json_with(&HttpTransport::new(), url, value).await
}

/// POST `value` as JSON to `url` through `transport`
///
/// Any response is returned as-is, including non-2xx ones; only transport
/// failures are errors.
pub async fn push_json_with<X, T>(
    transport: &X,
    url: &str,
    value: &T,
) -> Result<(Response<Bytes>, StatusCode)>
where
    X: Transport,
    T: Serialize + ?Sized,
{
    let body = serde_json::to_vec(value).map_err(Error::Serialization)?;
    let req = Request::builder()
        .method(Method::POST)
        .uri(url)
        .header(CONTENT_TYPE, "application/json")
        .body(Full::new(Bytes::from(body)))
        .map_err(|e| Error::Transport(format!("invalid request to {url}: {e}")))?;

    let response = transport.send(req).await?;
    let status = response.status();
    Ok((response, status))
}

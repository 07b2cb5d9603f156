// JSON response writing
// The response envelope plus writers for arbitrary values, errors, and successes

use std::fmt::Display;

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::header::{HeaderValue, CONTENT_TYPE};
use hyper::{HeaderMap, Response, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};

/// Envelope used for JSON error and success bodies
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonResponse {
    pub error: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// Serialize `value` into a JSON response with `status`
///
/// Each header name in `headers` replaces any value already set for it.
/// `Content-Type: application/json` is always set last.
pub fn write_json<T: Serialize + ?Sized>(
    status: StatusCode,
    value: &T,
    headers: Option<&HeaderMap>,
) -> Result<Response<Full<Bytes>>> {
    let body = serde_json::to_vec(value).map_err(Error::Serialization)?;
    let mut response = Response::builder()
        .status(status)
        .body(Full::new(Bytes::from(body)))?;

    if let Some(extra) = headers {
        let target = response.headers_mut();
        for name in extra.keys() {
            target.remove(name);
            for value in extra.get_all(name) {
                target.append(name, value.clone());
            }
        }
    }

    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    Ok(response)
}

/// Error envelope carrying `err`'s message, 400 unless `status` is given
pub fn error_json<E: Display + ?Sized>(
    err: &E,
    status: Option<StatusCode>,
) -> Result<Response<Full<Bytes>>> {
    let payload = JsonResponse {
        error: true,
        message: err.to_string(),
        data: None,
    };
    write_json(status.unwrap_or(StatusCode::BAD_REQUEST), &payload, None)
}

/// Success envelope with `data`
pub fn success_json<T: Serialize + ?Sized>(
    status: StatusCode,
    message: &str,
    data: &T,
) -> Result<Response<Full<Bytes>>> {
    let payload = JsonResponse {
        error: false,
        message: message.to_string(),
        data: Some(serde_json::to_value(data).map_err(Error::Serialization)?),
    };
    write_json(status, &payload, None)
}

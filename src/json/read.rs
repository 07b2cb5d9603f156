// JSON request decoding
// Reads a size-limited body and decodes exactly one value, classifying failures

use http_body_util::{BodyExt, LengthLimitError, Limited};
use hyper::body::{Body, Bytes};
use hyper::Request;
use serde::de::DeserializeOwned;
use serde_json::error::Category;

use crate::config::Tools;
use crate::error::{BoxError, Error, Result};
use crate::http::content_length;

impl Tools {
    /// Decode the body of `req` as a single JSON value
    ///
    /// The body is capped at [`Tools::max_json_size`]; a larger declared or
    /// actual body fails with [`Error::PayloadTooLarge`].
    pub async fn read_json<T, B>(&self, req: Request<B>) -> Result<T>
    where
        T: DeserializeOwned,
        B: Body<Data = Bytes>,
        B::Error: Into<BoxError>,
    {
        let limit = self.max_json_size();
        if content_length(req.headers()).is_some_and(|len| len > limit) {
            return Err(Error::PayloadTooLarge { limit });
        }

        let body = Limited::new(req.into_body(), usize::try_from(limit).unwrap_or(usize::MAX))
            .collect()
            .await
            .map_err(|e| {
                if e.downcast_ref::<LengthLimitError>().is_some() {
                    Error::PayloadTooLarge { limit }
                } else {
                    Error::Body(e.to_string())
                }
            })?
            .to_bytes();

        decode_json(&body, self.allow_unknown_fields)
    }
}

/// Decode exactly one JSON value from an already-buffered body
///
/// # Examples
/// ```
/// use toolbox::{decode_json, Error};
///
/// let n: u32 = decode_json(b" 42 ", false).unwrap();
/// assert_eq!(n, 42);
/// assert!(matches!(decode_json::<u32>(b"1 2", false), Err(Error::MultipleValues)));
/// ```
pub fn decode_json<T: DeserializeOwned>(bytes: &[u8], allow_unknown_fields: bool) -> Result<T> {
    if bytes.iter().all(|b| is_json_whitespace(*b)) {
        return Err(Error::EmptyBody);
    }

    let mut de = serde_json::Deserializer::from_slice(bytes);
    let mut unknown: Option<String> = None;
    let decoded = {
        let mut record = |path: serde_ignored::Path<'_>| {
            if unknown.is_none() {
                unknown = Some(path.to_string());
            }
        };
        let tracked = serde_ignored::Deserializer::new(&mut de, &mut record);
        serde_path_to_error::deserialize(tracked)
    };

    let value: T = decoded.map_err(|err| {
        let path = err.path().to_string();
        // "." is the document root
        let field = (path != ".").then_some(path);
        classify(bytes, field, err.into_inner())
    })?;

    if !allow_unknown_fields {
        if let Some(key) = unknown {
            return Err(Error::UnknownField(key));
        }
    }

    de.end().map_err(|_| Error::MultipleValues)?;
    Ok(value)
}

fn classify(bytes: &[u8], field: Option<String>, err: serde_json::Error) -> Error {
    let offset = byte_offset(bytes, err.line(), err.column());
    match err.classify() {
        Category::Syntax => Error::MalformedSyntax { offset },
        Category::Eof => Error::TruncatedInput,
        Category::Data => Error::TypeMismatch { field, offset },
        Category::Io => Error::Body(err.to_string()),
    }
}

/// Convert serde_json's 1-based line/column into a byte offset
fn byte_offset(bytes: &[u8], line: usize, column: usize) -> u64 {
    let line_start: usize = bytes
        .split_inclusive(|b| *b == b'\n')
        .take(line.saturating_sub(1))
        .map(<[u8]>::len)
        .sum();
    (line_start + column) as u64
}

const fn is_json_whitespace(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | b'\r')
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::Full;
    use hyper::header::{HeaderValue, CONTENT_LENGTH};
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Foo {
        foo: String,
    }

    #[derive(Debug, Deserialize)]
    struct Nested {
        #[allow(dead_code)]
        inner: Inner,
    }

    #[derive(Debug, Deserialize)]
    struct Inner {
        #[allow(dead_code)]
        count: u32,
    }

    fn request(body: &'static str) -> Request<Full<Bytes>> {
        Request::builder()
            .method("POST")
            .body(Full::new(Bytes::from_static(body.as_bytes())))
            .unwrap()
    }

    #[tokio::test]
    async fn test_read_json_good() {
        let tools = Tools::default();
        let foo: Foo = tools.read_json(request(r#"{"foo":"bar"}"#)).await.unwrap();
        assert_eq!(foo.foo, "bar");
    }

    #[tokio::test]
    async fn test_read_json_too_large() {
        let tools = Tools {
            max_json_size: 2,
            ..Tools::default()
        };
        let err = tools
            .read_json::<Foo, _>(request(r#"{"foo":"bar"}"#))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::PayloadTooLarge { limit: 2 }));
        assert_eq!(err.to_string(), "body must not be larger than 2 bytes");
    }

    #[tokio::test]
    async fn test_read_json_declared_length_too_large() {
        let tools = Tools {
            max_json_size: 8,
            ..Tools::default()
        };
        let mut req = request(r#"{"foo":"bar"}"#);
        req.headers_mut()
            .insert(CONTENT_LENGTH, HeaderValue::from_static("13"));
        let err = tools.read_json::<Foo, _>(req).await.unwrap_err();
        assert!(matches!(err, Error::PayloadTooLarge { .. }));
    }

    #[tokio::test]
    async fn test_read_json_empty() {
        let err = Tools::default()
            .read_json::<Foo, _>(request(""))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::EmptyBody));
        assert!(matches!(decode_json::<Foo>(b" \n\t", false), Err(Error::EmptyBody)));
    }

    #[test]
    fn test_malformed_syntax_offset() {
        let err = decode_json::<Foo>(br#"{"foo":}"#, false).unwrap_err();
        assert!(matches!(err, Error::MalformedSyntax { offset: 8 }));

        let err = decode_json::<Foo>(b"{\n\"foo\":}", false).unwrap_err();
        assert!(matches!(err, Error::MalformedSyntax { offset: 9 }));
    }

    #[test]
    fn test_truncated_input() {
        let err = decode_json::<Foo>(br#"{"foo":"b"#, false).unwrap_err();
        assert!(matches!(err, Error::TruncatedInput));
    }

    #[test]
    fn test_type_mismatch_names_field() {
        let err = decode_json::<Foo>(br#"{"foo":1}"#, false).unwrap_err();
        match err {
            Error::TypeMismatch { field, .. } => assert_eq!(field.as_deref(), Some("foo")),
            other => panic!("unexpected error: {other}"),
        }

        let err = decode_json::<Nested>(br#"{"inner":{"count":"x"}}"#, false).unwrap_err();
        assert_eq!(
            err.to_string(),
            "body contains incorrect JSON type for field \"inner.count\""
        );
    }

    #[test]
    fn test_type_mismatch_at_root() {
        let err = decode_json::<Foo>(br#""text""#, false).unwrap_err();
        assert!(matches!(err, Error::TypeMismatch { field: None, .. }));
    }

    #[test]
    fn test_unknown_field() {
        let err = decode_json::<Foo>(br#"{"foo":"1","bar":2}"#, false).unwrap_err();
        assert!(matches!(&err, Error::UnknownField(key) if key == "bar"));

        let foo: Foo = decode_json(br#"{"foo":"1","bar":2}"#, true).unwrap();
        assert_eq!(foo.foo, "1");
    }

    #[test]
    fn test_unknown_nested_field_path() {
        let err =
            decode_json::<Nested>(br#"{"inner":{"count":1,"extra":true}}"#, false).unwrap_err();
        assert!(matches!(&err, Error::UnknownField(key) if key == "inner.extra"));
    }

    #[tokio::test]
    async fn test_read_json_unknown_fields_setting() {
        let body = r#"{"foo":"1","bar":2}"#;

        let err = Tools::default()
            .read_json::<Foo, _>(request(body))
            .await
            .unwrap_err();
        assert!(matches!(&err, Error::UnknownField(key) if key == "bar"));

        let tools = Tools {
            allow_unknown_fields: true,
            ..Tools::default()
        };
        let foo: Foo = tools.read_json(request(body)).await.unwrap();
        assert_eq!(foo.foo, "1");
    }

    #[test]
    fn test_multiple_values() {
        let err = decode_json::<Foo>(br#"{"foo":"2"}{"alpha":"beta"}"#, false).unwrap_err();
        assert!(matches!(err, Error::MultipleValues));

        let foo: Foo = decode_json(b"{\"foo\":\"2\"}\n\n", false).unwrap();
        assert_eq!(foo.foo, "2");
    }
}

//! Demo endpoints built on the toolkit

use http_body_util::Full;
use hyper::body::{Body, Bytes};
use hyper::{Request, Response, StatusCode};
use serde::Deserialize;
use serde_json::json;

use crate::config::AppState;
use crate::download::download_static_file;
use crate::error::{BoxError, Error, Result};
use crate::http;
use crate::json::{error_json, success_json, write_json, JsonResponse};
use crate::logger;
use crate::slug;
use crate::upload::UploadOptions;

#[derive(Debug, Deserialize)]
struct SlugRequest {
    text: String,
}

/// `POST /upload`
pub async fn upload<B>(req: Request<B>, state: &AppState) -> Response<Full<Bytes>>
where
    B: Body<Data = Bytes> + Send + 'static,
    B::Error: Into<BoxError>,
{
    match state
        .tools
        .upload_files(req, &state.upload_dir, UploadOptions::default())
        .await
    {
        Ok(files) => respond(success_json(
            StatusCode::OK,
            &format!("{} file(s) uploaded", files.len()),
            &files,
        )),
        Err(partial) => {
            logger::log_warning(&format!(
                "Upload stopped after {} file(s): {}",
                partial.uploaded.len(),
                partial.error
            ));
            // Report what was stored before the failure
            let payload = JsonResponse {
                error: true,
                message: partial.error.to_string(),
                data: if partial.uploaded.is_empty() {
                    None
                } else {
                    serde_json::to_value(&partial.uploaded).ok()
                },
            };
            respond(write_json(partial.error.status_code(), &payload, None))
        }
    }
}

/// `POST /upload/one`
pub async fn upload_one<B>(req: Request<B>, state: &AppState) -> Response<Full<Bytes>>
where
    B: Body<Data = Bytes> + Send + 'static,
    B::Error: Into<BoxError>,
{
    match state
        .tools
        .upload_one_file(req, &state.upload_dir, UploadOptions::default())
        .await
    {
        Ok(file) => respond(success_json(StatusCode::OK, "file uploaded", &file)),
        Err(err) => fail(&err),
    }
}

/// `POST /slugify` with `{"text": "..."}`
pub async fn slugify<B>(req: Request<B>, state: &AppState) -> Response<Full<Bytes>>
where
    B: Body<Data = Bytes>,
    B::Error: Into<BoxError>,
{
    let result = async {
        let body: SlugRequest = state.tools.read_json(req).await?;
        slug::slugify(&body.text)
    }
    .await;

    match result {
        Ok(slug) => respond(success_json(StatusCode::OK, "slug created", &json!({ "slug": slug }))),
        Err(err) => fail(&err),
    }
}

/// `GET|HEAD /download/<name>`
pub async fn download<B>(req: &Request<B>, state: &AppState, name: &str) -> Response<Full<Bytes>> {
    download_static_file(req, &state.download_dir, name, name).await
}

fn fail(err: &Error) -> Response<Full<Bytes>> {
    respond(error_json(err, Some(err.status_code())))
}

fn respond(result: Result<Response<Full<Bytes>>>) -> Response<Full<Bytes>> {
    result.unwrap_or_else(|e| {
        logger::log_error(&format!("Failed to build response: {e}"));
        http::build_500_response()
    })
}

#[cfg(test)]
mod tests {
    use crate::config::{AppState, Config};
    use crate::handler::handle_request;
    use crate::json::JsonResponse;
    use http_body_util::{BodyExt, Full};
    use hyper::body::Bytes;
    use hyper::header::{ALLOW, CONTENT_DISPOSITION, CONTENT_TYPE};
    use hyper::{Method, Request, Response, StatusCode};
    use std::sync::Arc;

    const BOUNDARY: &str = "endpoint-boundary";

    fn state(tmp: &tempfile::TempDir) -> Arc<AppState> {
        let mut config = Config::load_from("does-not-exist/toolbox").unwrap();
        config.logging.access_log = false;
        config.storage.upload_dir = tmp.path().join("up").to_string_lossy().into_owned();
        config.storage.download_dir = tmp.path().join("static").to_string_lossy().into_owned();
        config.tools.allowed_file_types = vec!["image/png".to_string()];
        Arc::new(AppState::new(&config))
    }

    async fn call(state: &Arc<AppState>, req: Request<Full<Bytes>>) -> Response<Full<Bytes>> {
        handle_request(req, Arc::clone(state), "127.0.0.1:1".parse().unwrap())
            .await
            .unwrap()
    }

    async fn envelope(response: Response<Full<Bytes>>) -> JsonResponse {
        let body = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&body).unwrap()
    }

    fn upload_request(path: &str, file_name: &str, content: &[u8]) -> Request<Full<Bytes>> {
        let mut body = format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{file_name}\"\r\n\r\n"
        )
        .into_bytes();
        body.extend_from_slice(content);
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
        Request::builder()
            .method(Method::POST)
            .uri(path)
            .header(CONTENT_TYPE, format!("multipart/form-data; boundary={BOUNDARY}"))
            .body(Full::new(Bytes::from(body)))
            .unwrap()
    }

    #[tokio::test]
    async fn test_upload_endpoint() {
        let tmp = tempfile::tempdir().unwrap();
        let state = state(&tmp);
        let png = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR-pixels";

        let response = call(&state, upload_request("/upload", "pic.png", png)).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = envelope(response).await;
        assert!(!body.error);
        let files = body.data.unwrap();
        assert_eq!(files[0]["original_file_name"], "pic.png");
        assert_eq!(files[0]["file_size"], png.len());
    }

    #[tokio::test]
    async fn test_upload_rejected_type_is_415() {
        let tmp = tempfile::tempdir().unwrap();
        let state = state(&tmp);

        let response = call(&state, upload_request("/upload/one", "a.txt", b"hello")).await;
        assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
        let body = envelope(response).await;
        assert!(body.error);
        assert!(body.message.contains("not permitted"));
    }

    #[tokio::test]
    async fn test_slugify_endpoint() {
        let tmp = tempfile::tempdir().unwrap();
        let state = state(&tmp);

        let req = Request::builder()
            .method(Method::POST)
            .uri("/slugify")
            .body(Full::new(Bytes::from_static(br#"{"text":"Hello, World!"}"#)))
            .unwrap();
        let body = envelope(call(&state, req).await).await;
        assert_eq!(body.data.unwrap()["slug"], "hello-world");

        let req = Request::builder()
            .method(Method::POST)
            .uri("/slugify")
            .body(Full::new(Bytes::from_static(br#"{"text":"!!!"}"#)))
            .unwrap();
        let response = call(&state, req).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(envelope(response).await.error);
    }

    #[tokio::test]
    async fn test_download_endpoint() {
        let tmp = tempfile::tempdir().unwrap();
        let state = state(&tmp);
        std::fs::create_dir_all(&state.download_dir).unwrap();
        std::fs::write(state.download_dir.join("notes.txt"), b"notes").unwrap();

        let req = Request::get("/download/notes.txt").body(Full::default()).unwrap();
        let response = call(&state, req).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[CONTENT_DISPOSITION],
            "attachment; filename\"notes.txt\""
        );
    }

    #[tokio::test]
    async fn test_download_decodes_path_segment() {
        let tmp = tempfile::tempdir().unwrap();
        let state = state(&tmp);
        std::fs::create_dir_all(&state.download_dir).unwrap();
        std::fs::write(state.download_dir.join("my file.txt"), b"spaced").unwrap();
        std::fs::write(tmp.path().join("secret.txt"), b"secret").unwrap();

        let req = Request::get("/download/my%20file.txt").body(Full::default()).unwrap();
        let response = call(&state, req).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[CONTENT_DISPOSITION],
            "attachment; filename\"my file.txt\""
        );

        let req = Request::get("/download/..%2Fsecret.txt").body(Full::default()).unwrap();
        assert_eq!(call(&state, req).await.status(), StatusCode::NOT_FOUND);

        let req = Request::get("/download/%FF.txt").body(Full::default()).unwrap();
        assert_eq!(call(&state, req).await.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_unknown_route_and_wrong_method() {
        let tmp = tempfile::tempdir().unwrap();
        let state = state(&tmp);

        let response = call(&state, Request::get("/nope").body(Full::default()).unwrap()).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(envelope(response).await.message, "not found");

        let response = call(&state, Request::get("/upload").body(Full::default()).unwrap()).await;
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(response.headers()[ALLOW], "POST");
    }
}

//! Error types shared by every toolkit operation

use std::path::PathBuf;

use hyper::StatusCode;

use crate::upload::UploadedFile;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("filesystem error: {0}")]
    Io(#[from] std::io::Error),

    #[error("body must not be larger than {limit} bytes")]
    PayloadTooLarge { limit: u64 },

    #[error("invalid multipart body: {0}")]
    InvalidMultipart(String),

    #[error("the uploaded file type is not permitted ({detected})")]
    UnsupportedFileType { detected: String },

    #[error("no file was uploaded")]
    NoFileUploaded,

    #[error("empty string")]
    EmptyInput,

    #[error("after removing characters, slug is zero length")]
    EmptyResult,

    #[error("body contains badly-formed JSON (at character {offset})")]
    MalformedSyntax { offset: u64 },

    #[error("body contains badly-formed JSON")]
    TruncatedInput,

    #[error("{}", type_mismatch_message(.field.as_deref(), .offset))]
    TypeMismatch { field: Option<String>, offset: u64 },

    #[error("body must not be empty")]
    EmptyBody,

    #[error("body contains unknown key \"{0}\"")]
    UnknownField(String),

    #[error("body must contain only one JSON value")]
    MultipleValues,

    #[error("failed to read request body: {0}")]
    Body(String),

    #[error("failed to serialize JSON: {0}")]
    Serialization(#[source] serde_json::Error),

    #[error("request to remote failed: {0}")]
    Transport(String),

    #[error("file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("failed to build response: {0}")]
    Http(#[from] hyper::http::Error),
}

#[allow(clippy::trivially_copy_pass_by_ref)]
fn type_mismatch_message(field: Option<&str>, offset: &u64) -> String {
    match field {
        Some(name) => format!("body contains incorrect JSON type for field \"{name}\""),
        None => format!("body contains incorrect JSON type (at character {offset})"),
    }
}

impl Error {
    /// HTTP status a handler would typically answer with for this error
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            Self::UnsupportedFileType { .. } => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Io(_) | Self::Serialization(_) | Self::Http(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Self::Transport(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

/// Failure of a multi-file upload
///
/// Carries the records for parts persisted before the failing one. A
/// non-empty `uploaded` does not mean the batch was complete; the files it
/// names are still on disk and left for the caller to keep or clean up.
#[derive(Debug, thiserror::Error)]
#[error("{error}")]
pub struct PartialUpload {
    pub uploaded: Vec<UploadedFile>,
    #[source]
    pub error: Error,
}

impl PartialUpload {
    pub(crate) const fn new(uploaded: Vec<UploadedFile>, error: Error) -> Self {
        Self { uploaded, error }
    }
}

impl From<PartialUpload> for Error {
    fn from(partial: PartialUpload) -> Self {
        partial.error
    }
}

//! Multipart upload pipeline
//!
//! Streams every file part of a `multipart/form-data` request to disk,
//! sniffing the first bytes of each part against the configured allow-list
//! before anything is written.

use std::io::ErrorKind;
use std::path::Path;

use http_body_util::BodyExt;
use hyper::body::{Body, Bytes};
use hyper::header::CONTENT_TYPE;
use hyper::Request;
use multer::{Constraints, Field, Multipart, SizeLimit};
use serde::{Deserialize, Serialize};
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;

use crate::config::Tools;
use crate::error::{BoxError, Error, PartialUpload, Result};
use crate::fs::create_dir_if_not_exist;
use crate::http::content_length;
use crate::http::sniff::{detect_content_type, SNIFF_LEN};
use crate::random::random_string;

/// Length of the random stem given to renamed uploads
const RENAMED_STEM_LEN: usize = 25;

/// Attempts at finding an unused random name before giving up
const CREATE_ATTEMPTS: usize = 3;

/// Record of one persisted upload part
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedFile {
    pub new_file_name: String,
    pub original_file_name: String,
    pub file_size: u64,
}

/// Per-call upload behavior
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadOptions {
    /// Store parts under a random name keeping the original extension
    pub rename: bool,
}

impl Default for UploadOptions {
    fn default() -> Self {
        Self { rename: true }
    }
}

impl Tools {
    /// Persist every file part of `req` into `dir`
    ///
    /// Parts are handled in the order they arrive. The first failure stops
    /// the batch; the returned [`PartialUpload`] still lists the files that
    /// were written before it.
    pub async fn upload_files<B>(
        &self,
        req: Request<B>,
        dir: impl AsRef<Path>,
        options: UploadOptions,
    ) -> std::result::Result<Vec<UploadedFile>, PartialUpload>
    where
        B: Body<Data = Bytes> + Send + 'static,
        B::Error: Into<BoxError>,
    {
        let mut uploaded = Vec::new();
        match self
            .upload_into(req, dir.as_ref(), options, &mut uploaded)
            .await
        {
            Ok(()) => Ok(uploaded),
            Err(error) => Err(PartialUpload::new(uploaded, error)),
        }
    }

    /// Persist the file parts of `req` and return the first record
    ///
    /// Fails with [`Error::NoFileUploaded`] when the form carried no file.
    pub async fn upload_one_file<B>(
        &self,
        req: Request<B>,
        dir: impl AsRef<Path>,
        options: UploadOptions,
    ) -> Result<UploadedFile>
    where
        B: Body<Data = Bytes> + Send + 'static,
        B::Error: Into<BoxError>,
    {
        self.upload_files(req, dir, options)
            .await?
            .into_iter()
            .next()
            .ok_or(Error::NoFileUploaded)
    }

    async fn upload_into<B>(
        &self,
        req: Request<B>,
        dir: &Path,
        options: UploadOptions,
        uploaded: &mut Vec<UploadedFile>,
    ) -> Result<()>
    where
        B: Body<Data = Bytes> + Send + 'static,
        B::Error: Into<BoxError>,
    {
        create_dir_if_not_exist(dir).await?;

        let limit = self.max_file_size();
        if content_length(req.headers()).is_some_and(|len| len > limit) {
            return Err(Error::PayloadTooLarge { limit });
        }

        let content_type = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| Error::InvalidMultipart("missing content type".to_string()))?;
        let boundary = multer::parse_boundary(content_type)
            .map_err(|e| Error::InvalidMultipart(e.to_string()))?;

        let constraints =
            Constraints::new().size_limit(SizeLimit::new().whole_stream(limit));
        let mut multipart =
            Multipart::with_constraints(req.into_body().into_data_stream(), boundary, constraints);

        while let Some(mut field) = multipart.next_field().await.map_err(multipart_error)? {
            // Parts without a file name are plain form values
            let Some(original) = field
                .file_name()
                .map(base_name)
                .filter(|name| !name.is_empty())
                .map(str::to_string)
            else {
                continue;
            };

            let mut head = Vec::new();
            let mut head_len = 0;
            while head_len < SNIFF_LEN {
                match field.chunk().await.map_err(multipart_error)? {
                    Some(chunk) => {
                        head_len += chunk.len();
                        head.push(chunk);
                    }
                    None => break,
                }
            }

            let detected = detect_content_type(&sniff_prefix(&head));
            if !self.is_allowed_type(detected) {
                return Err(Error::UnsupportedFileType {
                    detected: detected.to_string(),
                });
            }

            let (new_file_name, file) =
                create_destination(dir, &original, options.rename).await?;

            let file_size = match write_part(file, head, &mut field).await {
                Ok(size) => size,
                Err(err) => {
                    // Only the file created for this part is removed
                    let _ = tokio::fs::remove_file(dir.join(&new_file_name)).await;
                    return Err(err);
                }
            };

            uploaded.push(UploadedFile {
                new_file_name,
                original_file_name: original,
                file_size,
            });
        }

        Ok(())
    }
}

/// Write the sniffed head, then the rest of the part; the handle is closed on return
async fn write_part(mut file: File, head: Vec<Bytes>, field: &mut Field<'_>) -> Result<u64> {
    let mut file_size = 0;
    for chunk in head {
        file.write_all(&chunk).await?;
        file_size += chunk.len() as u64;
    }
    while let Some(chunk) = field.chunk().await.map_err(multipart_error)? {
        file.write_all(&chunk).await?;
        file_size += chunk.len() as u64;
    }
    file.flush().await?;
    Ok(file_size)
}

/// Final path component of a client-supplied file name
fn base_name(name: &str) -> &str {
    name.rsplit(['/', '\\']).next().unwrap_or(name)
}

/// Extension including the dot, or empty
fn extension(name: &str) -> &str {
    name.rfind('.').map_or("", |i| &name[i..])
}

fn sniff_prefix(chunks: &[Bytes]) -> Vec<u8> {
    let mut prefix = Vec::with_capacity(SNIFF_LEN);
    for chunk in chunks {
        let take = (SNIFF_LEN - prefix.len()).min(chunk.len());
        prefix.extend_from_slice(&chunk[..take]);
        if prefix.len() == SNIFF_LEN {
            break;
        }
    }
    prefix
}

/// Create the destination file exclusively, returning its name
async fn create_destination(dir: &Path, original: &str, rename: bool) -> Result<(String, File)> {
    if !rename {
        let file = create_new(&dir.join(original)).await?;
        return Ok((original.to_string(), file));
    }

    let ext = extension(original);
    let mut attempt = 1;
    loop {
        let name = format!("{}{ext}", random_string(RENAMED_STEM_LEN));
        match create_new(&dir.join(&name)).await {
            Ok(file) => return Ok((name, file)),
            Err(e) if e.kind() == ErrorKind::AlreadyExists && attempt < CREATE_ATTEMPTS => {
                attempt += 1;
            }
            Err(e) => return Err(e.into()),
        }
    }
}

async fn create_new(path: &Path) -> std::io::Result<File> {
    OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .await
}

fn multipart_error(err: multer::Error) -> Error {
    match err {
        multer::Error::StreamSizeExceeded { limit }
        | multer::Error::FieldSizeExceeded { limit, .. } => Error::PayloadTooLarge { limit },
        multer::Error::StreamReadFailed(e) => Error::Body(e.to_string()),
        other => Error::InvalidMultipart(other.to_string()),
    }
}

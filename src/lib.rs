//! Helper toolkit for hyper-based HTTP services
//!
//! Provides multipart file uploads with content sniffing, strict JSON request
//! decoding, JSON response helpers, an outbound JSON pusher, slug creation,
//! random identifiers, and an attachment download responder.
//!
//! All configurable behavior hangs off [`Tools`], which the caller owns and
//! shares by reference:
//!
//! ```
//! use toolbox::Tools;
//!
//! let tools = Tools {
//!     allowed_file_types: vec!["image/png".to_string()],
//!     ..Tools::default()
//! };
//! assert_eq!(tools.max_json_size(), 1024 * 1024);
//! assert_eq!(toolbox::slugify("Hello, World!").unwrap(), "hello-world");
//! ```

pub mod config;
pub mod download;
pub mod error;
pub mod fs;
pub mod handler;
pub mod http;
pub mod json;
pub mod logger;
pub mod random;
pub mod server;
pub mod slug;
pub mod upload;

pub use config::Tools;
pub use download::{download_static_file, load_download};
pub use error::{Error, PartialUpload, Result};
pub use fs::create_dir_if_not_exist;
pub use json::{
    decode_json, error_json, push_json, push_json_with, success_json, write_json, JsonResponse,
    Transport,
};
pub use random::random_string;
pub use slug::slugify;
pub use upload::{UploadOptions, UploadedFile};

//! JSON helpers
//!
//! Strict request decoding, the response envelope and writers, and an
//! outbound JSON pusher.

mod push;
mod read;
mod write;

pub use push::{push_json, push_json_with, HttpTransport, Transport};
pub use read::decode_json;
pub use write::{error_json, success_json, write_json, JsonResponse};

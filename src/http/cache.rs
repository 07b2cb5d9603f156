//! HTTP cache validators for served files
//!
//! Provides `ETag`/`Last-Modified` generation from file metadata and
//! conditional request evaluation.

use std::time::SystemTime;

use chrono::{DateTime, Utc};

/// IMF-fixdate, the only date format servers should emit
const HTTP_DATE_FORMAT: &str = "%a, %d %b %Y %H:%M:%S GMT";

/// Validators describing one version of a file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Validators {
    /// Quoted weak `ETag`, e.g. `W/"1f-65a1b2c3"`
    pub etag: String,
    /// `Last-Modified` header value, if the modification time is known
    pub last_modified: Option<String>,
    modified: Option<DateTime<Utc>>,
}

impl Validators {
    /// Build validators from a file's size and modification time
    pub fn new(len: u64, modified: Option<SystemTime>) -> Self {
        // HTTP dates have whole-second precision
        let modified = modified
            .map(DateTime::<Utc>::from)
            .and_then(|t| DateTime::<Utc>::from_timestamp(t.timestamp(), 0));
        let etag = match modified {
            Some(t) => format!("W/\"{len:x}-{:x}\"", t.timestamp()),
            None => format!("W/\"{len:x}\""),
        };
        Self {
            etag,
            last_modified: modified.map(|t| t.format(HTTP_DATE_FORMAT).to_string()),
            modified,
        }
    }

    /// Whether a conditional GET can be answered with 304
    ///
    /// `If-None-Match` takes precedence; `If-Modified-Since` is only consulted
    /// when no entity tag was sent.
    pub fn is_not_modified(
        &self,
        if_none_match: Option<&str>,
        if_modified_since: Option<&str>,
    ) -> bool {
        if let Some(client_etags) = if_none_match {
            return check_etag_match(client_etags, &self.etag);
        }
        match (if_modified_since.and_then(parse_http_date), self.modified) {
            (Some(since), Some(modified)) => modified <= since,
            _ => false,
        }
    }
}

/// Weak comparison of an `If-None-Match` list against an `ETag`
///
/// Supports a single tag, a comma-separated list, and `*`.
pub fn check_etag_match(if_none_match: &str, etag: &str) -> bool {
    let ours = etag.trim_start_matches("W/");
    if_none_match.split(',').map(str::trim).any(|candidate| {
        candidate == "*" || candidate.trim_start_matches("W/") == ours
    })
}

/// Parse an IMF-fixdate (`Sun, 06 Nov 1994 08:49:37 GMT`)
pub fn parse_http_date(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc2822(value.trim())
        .ok()
        .map(|t| t.with_timezone(&Utc))
}

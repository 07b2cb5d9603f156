// Configuration types module
// Defines the toolkit settings and the demo server configuration

use serde::{Deserialize, Serialize};

/// Default upload limit: 1 GiB
pub const DEFAULT_MAX_FILE_SIZE: u64 = 1024 * 1024 * 1024;

/// Default JSON body limit: 1 MiB
pub const DEFAULT_MAX_JSON_SIZE: u64 = 1024 * 1024;

/// Toolkit settings shared by every operation
///
/// Zero-valued size limits fall back to the defaults at the point of use, so
/// a `Tools` built with `..Default::default()` or deserialized from a partial
/// config behaves the same as one with explicit limits.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct Tools {
    /// Maximum size of a whole multipart body in bytes
    pub max_file_size: u64,
    /// MIME types accepted by uploads, matched case-insensitively; empty allows all
    pub allowed_file_types: Vec<String>,
    /// Maximum size of a JSON request body in bytes
    pub max_json_size: u64,
    /// Accept JSON object keys the target type does not declare
    pub allow_unknown_fields: bool,
}

impl Default for Tools {
    fn default() -> Self {
        Self {
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            allowed_file_types: Vec::new(),
            max_json_size: DEFAULT_MAX_JSON_SIZE,
            allow_unknown_fields: false,
        }
    }
}

/// Demo server configuration
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub performance: PerformanceConfig,
    #[serde(default)]
    pub tools: Tools,
    pub storage: StorageConfig,
}

/// Server configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
}

/// Logging configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    pub access_log: bool,
    /// Access log format (combined, common, json, or custom pattern)
    #[serde(default = "default_access_log_format")]
    pub access_log_format: String,
    /// Access log file path (optional, stdout if not set)
    #[serde(default)]
    pub access_log_file: Option<String>,
    /// Error log file path (optional, stderr if not set)
    #[serde(default)]
    pub error_log_file: Option<String>,
}

#[allow(clippy::missing_const_for_fn)]
fn default_access_log_format() -> String {
    "combined".to_string()
}

/// Performance configuration
#[derive(Debug, Deserialize, Clone)]
pub struct PerformanceConfig {
    pub keep_alive_timeout: u64,
    pub read_timeout: u64,
    pub write_timeout: u64,
    pub max_connections: Option<u64>,
}

/// Where the demo endpoints read and write files
#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    pub upload_dir: String,
    pub download_dir: String,
}

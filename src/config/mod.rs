// Configuration module entry point
// Toolkit settings plus the layered file/env configuration of the demo server

mod state;
mod types;

use std::net::SocketAddr;

pub use state::AppState;
pub use types::{
    Config, LoggingConfig, PerformanceConfig, ServerConfig, StorageConfig, Tools,
    DEFAULT_MAX_FILE_SIZE, DEFAULT_MAX_JSON_SIZE,
};

/// Default config file name (without extension)
pub const DEFAULT_CONFIG_PATH: &str = "toolbox";

impl Tools {
    /// Effective multipart limit in bytes
    pub const fn max_file_size(&self) -> u64 {
        if self.max_file_size == 0 {
            DEFAULT_MAX_FILE_SIZE
        } else {
            self.max_file_size
        }
    }

    /// Effective JSON body limit in bytes
    pub const fn max_json_size(&self) -> u64 {
        if self.max_json_size == 0 {
            DEFAULT_MAX_JSON_SIZE
        } else {
            self.max_json_size
        }
    }

    /// Check a sniffed MIME type against the allow-list
    pub fn is_allowed_type(&self, detected: &str) -> bool {
        self.allowed_file_types.is_empty()
            || self
                .allowed_file_types
                .iter()
                .any(|allowed| allowed.eq_ignore_ascii_case(detected))
    }
}

impl Config {
    /// Load configuration from the default `toolbox.toml`
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::load_from(DEFAULT_CONFIG_PATH)
    }

    /// Load configuration from specified file path (without extension)
    ///
    /// The file is optional; `TOOLBOX_*` environment variables override it
    /// (e.g. `TOOLBOX_SERVER__PORT=9000`).
    pub fn load_from(config_path: &str) -> Result<Self, config::ConfigError> {
        #[allow(clippy::cast_possible_wrap)]
        let settings = config::Config::builder()
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(
                config::Environment::with_prefix("TOOLBOX")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8080)?
            .set_default("logging.access_log", true)?
            .set_default("logging.access_log_format", "combined")?
            .set_default("performance.keep_alive_timeout", 75)?
            .set_default("performance.read_timeout", 30)?
            .set_default("performance.write_timeout", 30)?
            .set_default("tools.max_file_size", DEFAULT_MAX_FILE_SIZE as i64)?
            .set_default("tools.max_json_size", DEFAULT_MAX_JSON_SIZE as i64)?
            .set_default("tools.allow_unknown_fields", false)?
            .set_default("storage.upload_dir", "./uploads")?
            .set_default("storage.download_dir", "./static")?
            .build()?;

        settings.try_deserialize()
    }

    pub fn get_socket_addr(&self) -> Result<SocketAddr, String> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|e| format!("Invalid address: {e}"))
    }
}

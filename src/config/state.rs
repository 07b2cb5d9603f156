// Application state module
// Shared, read-only state handed to every connection of the demo server

use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tokio::sync::Notify;

use super::types::{Config, Tools};

/// Application state
pub struct AppState {
    pub config: Config,
    pub tools: Tools,
    pub upload_dir: PathBuf,
    pub download_dir: PathBuf,

    // Cached config values for fast access without locks
    pub cached_access_log: Arc<AtomicBool>,

    /// Notified once when the server should stop accepting connections
    pub shutdown_signal: Arc<Notify>,
}

impl AppState {
    pub fn new(config: &Config) -> Self {
        Self {
            config: config.clone(),
            tools: config.tools.clone(),
            upload_dir: PathBuf::from(&config.storage.upload_dir),
            download_dir: PathBuf::from(&config.storage.download_dir),
            cached_access_log: Arc::new(AtomicBool::new(config.logging.access_log)),
            shutdown_signal: Arc::new(Notify::new()),
        }
    }
}

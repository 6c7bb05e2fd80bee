//! Configuration structures and defaults for the registry.

use super::background::BackgroundCompletionSignal;
use super::dispatch::CallbackQueue;
use crate::engine::TransferEngine;
use crate::http::HttpClientConfig;
use crate::storage::FileStore;

use std::env::current_dir;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Configuration structure for the registry.
#[derive(Clone)]
pub struct RegistryConfig {
    /// Directory where to store the downloaded files.
    pub directory: PathBuf,
    /// HTTP client settings of the default engine.
    pub http: HttpClientConfig,
    /// Engine performing the transfers. `None` selects the HTTP engine.
    pub engine: Option<Arc<dyn TransferEngine>>,
    /// Filesystem collaborator. `None` selects the local filesystem.
    pub file_store: Option<Arc<dyn FileStore>>,
    /// Where callbacks run. `None` selects a serial queue.
    pub callback_queue: Option<CallbackQueue>,
    /// Slot fired once background transfers are drained.
    pub background_signal: BackgroundCompletionSignal,
}

impl fmt::Debug for RegistryConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistryConfig")
            .field("directory", &self.directory)
            .field("http", &self.http)
            .field("engine", &self.engine.is_some())
            .field("file_store", &self.file_store.is_some())
            .field("callback_queue", &self.callback_queue)
            .field("background_signal", &self.background_signal)
            .finish()
    }
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            directory: current_dir().unwrap_or_default(),
            http: HttpClientConfig::default(),
            engine: None,
            file_store: None,
            callback_queue: None,
            background_signal: BackgroundCompletionSignal::global(),
        }
    }
}

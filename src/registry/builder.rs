//! Builder pattern implementation for creating [`DownloadRegistry`] instances.
//!
//! # Examples
//!
//! ```rust,no_run
//! use convoy::RegistryBuilder;
//! use std::path::PathBuf;
//!
//! # #[tokio::main]
//! # async fn main() -> convoy::Result<()> {
//! let registry = RegistryBuilder::new()
//!     .directory(PathBuf::from("./downloads"))
//!     .build()?;
//! # Ok(())
//! # }
//! ```

use super::background::BackgroundCompletionSignal;
use super::config::RegistryConfig;
use super::dispatch::CallbackQueue;
use super::registry::DownloadRegistry;
use crate::engine::TransferEngine;
use crate::error::Result;
use crate::http::{HttpClientConfig, HttpEngine};
use crate::storage::{FileStore, LocalFileStore};

use std::path::PathBuf;
use std::sync::Arc;

/// A builder used to create a [`DownloadRegistry`].
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    config: RegistryConfig,
}

impl RegistryBuilder {
    /// Creates a builder with the default options.
    pub fn new() -> Self {
        RegistryBuilder::default()
    }

    /// Sets the directory where to store the downloads.
    pub fn directory(mut self, directory: PathBuf) -> Self {
        self.config.directory = directory;
        self
    }

    /// Sets the HTTP client settings of the default engine.
    pub fn http_config(mut self, http: HttpClientConfig) -> Self {
        self.config.http = http;
        self
    }

    /// Use `engine` instead of the HTTP engine.
    pub fn engine(mut self, engine: Arc<dyn TransferEngine>) -> Self {
        self.config.engine = Some(engine);
        self
    }

    /// Use `file_store` instead of the local filesystem.
    pub fn file_store(mut self, file_store: Arc<dyn FileStore>) -> Self {
        self.config.file_store = Some(file_store);
        self
    }

    /// Set where observer callbacks run.
    pub fn callback_queue(mut self, queue: CallbackQueue) -> Self {
        self.config.callback_queue = Some(queue);
        self
    }

    /// Use `signal` instead of the process-wide background slot.
    pub fn background_signal(mut self, signal: BackgroundCompletionSignal) -> Self {
        self.config.background_signal = signal;
        self
    }

    /// Create the [`DownloadRegistry`] with the specified options.
    ///
    /// Without an explicit engine this must be called from within a tokio
    /// runtime, which the HTTP engine spawns its transfers on.
    pub fn build(self) -> Result<DownloadRegistry> {
        let config = self.config;
        let engine: Arc<dyn TransferEngine> = match config.engine.clone() {
            Some(engine) => engine,
            None => Arc::new(HttpEngine::from_current(config.http.clone())?),
        };
        let file_store: Arc<dyn FileStore> = match config.file_store.clone() {
            Some(file_store) => file_store,
            None => Arc::new(LocalFileStore::new()),
        };
        let queue = match config.callback_queue.clone() {
            Some(queue) => queue,
            None => CallbackQueue::serial()?,
        };

        Ok(DownloadRegistry::new(config, engine, file_store, queue))
    }
}

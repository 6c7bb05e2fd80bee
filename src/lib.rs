//! Convoy coordinates HTTP(S) downloads shared by several callers.
//!
//! Requests for a download already in flight join the running transfer
//! instead of starting another one; every caller gets its own progress,
//! remaining-time and completion callbacks.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use convoy::{DownloadRequest, RegistryBuilder};
//! use std::path::PathBuf;
//!
//! # #[tokio::main]
//! # async fn main() -> convoy::Result<()> {
//! let registry = RegistryBuilder::new()
//!     .directory(PathBuf::from("output"))
//!     .build()?;
//!
//! registry.request(
//!     DownloadRequest::new("https://github.com/seanmonstar/reqwest/archive/refs/tags/v0.11.9.zip")
//!         .on_progress(|fraction| println!("{:.0}%", fraction * 100.0))
//!         .on_complete(|completed| println!("completed: {completed}")),
//! )?;
//! # Ok(())
//! # }
//! ```
//!
//! # Module Organization
//!
//! - [`download`] - Download requests, keys, path resolution and progress metrics
//! - [`registry`] - The `DownloadRegistry`, its builder and callback dispatch
//! - [`engine`] - The transfer engine boundary
//! - [`http`] - The default HTTP transfer engine
//! - [`storage`] - The filesystem boundary
//! - [`progress`] - Terminal progress bars
//! - [`error`] - Centralized error handling with the `Error` enum

pub mod download;
pub mod engine;
pub mod error;
pub mod http;
pub mod progress;
pub mod registry;
pub mod storage;

pub use download::{DownloadKey, DownloadRequest, PathResolver, ProgressSample};
pub use engine::{EventSink, TransferEngine, TransferEvent, TransferId, TransferRequest};
pub use error::{Error, Result};
pub use http::{create_http_client, HttpClientConfig, HttpEngine};
pub use progress::{ProgressBarOpts, ProgressDisplay};
pub use registry::{
    BackgroundCompletionSignal, CallbackQueue, DownloadRegistry, ObserverToken, RegistryBuilder,
    RegistryConfig,
};
pub use storage::{FileStore, LocalFileStore};

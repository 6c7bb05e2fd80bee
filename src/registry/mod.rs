//! Registry module containing the download coordinator.
//!
//! # Overview
//!
//! - `registry` - the [`DownloadRegistry`] and its event dispatch
//! - `handle` - transfer handles, observers and observer tokens
//! - `builder` - [`RegistryBuilder`] for configuring a registry
//! - `config` - configuration structure and defaults
//! - `dispatch` - the [`CallbackQueue`] observer callbacks run on
//! - `background` - the [`BackgroundCompletionSignal`] slot
//!
//! # Examples
//!
//! ```rust
//! use convoy::engine::{EventSink, TransferEngine, TransferId, TransferRequest};
//! use convoy::{BackgroundCompletionSignal, CallbackQueue, DownloadRequest, RegistryBuilder};
//! use std::sync::Arc;
//!
//! struct Idle;
//!
//! impl TransferEngine for Idle {
//!     fn start(&self, _request: TransferRequest, _events: EventSink) -> convoy::Result<()> {
//!         Ok(())
//!     }
//!     fn cancel(&self, _id: TransferId) {}
//! }
//!
//! # fn main() -> convoy::Result<()> {
//! let dir = std::env::temp_dir().join("convoy-doc");
//! let registry = RegistryBuilder::new()
//!     .directory(dir)
//!     .engine(Arc::new(Idle))
//!     .callback_queue(CallbackQueue::inline())
//!     .background_signal(BackgroundCompletionSignal::new())
//!     .build()?;
//!
//! registry.request(DownloadRequest::new("https://example.com/a.zip"))?;
//! registry.request(DownloadRequest::new("https://example.com/a.zip"))?;
//! assert_eq!(registry.current_downloads().len(), 1);
//!
//! registry.cancel_all();
//! assert!(registry.current_downloads().is_empty());
//! # Ok(())
//! # }
//! ```

pub mod background;
pub mod builder;
pub mod config;
pub mod dispatch;
pub mod handle;
#[allow(clippy::module_inception)]
pub mod registry;

pub use background::{BackgroundCallback, BackgroundCompletionSignal};
pub use builder::RegistryBuilder;
pub use config::RegistryConfig;
pub use dispatch::CallbackQueue;
pub use handle::{ObserverId, ObserverToken};
pub use registry::DownloadRegistry;

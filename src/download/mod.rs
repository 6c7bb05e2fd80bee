//! Download module describing what to download and where it goes.
//!
//! # Overview
//!
//! - [`target`] - identifier keys and local path resolution
//! - [`request`] - download requests and observer callbacks
//! - [`sample`] - derived progress metrics (fraction and remaining time)
//!
//! # Examples
//!
//! ```rust
//! use convoy::download::{DownloadKey, PathResolver};
//! use std::path::PathBuf;
//!
//! let resolver = PathResolver::new(PathBuf::from("downloads"));
//! let plain = resolver.resolve("https://example.com/file.zip", None, None)?;
//! let named = resolver.resolve("https://example.com/file.zip", Some("copy.zip"), None)?;
//! assert_eq!(plain.key, DownloadKey::for_url("https://example.com/file.zip")?);
//! assert_ne!(plain.key, named.key);
//! # Ok::<(), convoy::Error>(())
//! ```

pub mod request;
pub mod sample;
pub mod target;

pub use request::{
    Callbacks, CompletionCallback, DownloadRequest, ProgressCallback, RemainingTimeCallback,
};
pub use sample::ProgressSample;
pub use target::{file_name_from_url, DownloadKey, PathResolver, ResolvedTarget};

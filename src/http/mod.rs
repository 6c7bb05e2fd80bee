//! HTTP module containing the default transfer engine.
//!
//! # Overview
//!
//! - [`client`] - HTTP client creation and middleware configuration
//! - [`engine`] - [`HttpEngine`], streaming transfers to disk
//!
//! # Examples
//!
//! ```rust,no_run
//! use convoy::http::{HttpClientConfig, HttpEngine};
//! use convoy::RegistryBuilder;
//! use std::sync::Arc;
//!
//! # #[tokio::main]
//! # async fn main() -> convoy::Result<()> {
//! let engine = HttpEngine::from_current(HttpClientConfig::default())?;
//! let registry = RegistryBuilder::new().engine(Arc::new(engine)).build()?;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod engine;

pub use client::{create_http_client, HttpClientConfig};
pub use engine::{staging_path, HttpEngine};

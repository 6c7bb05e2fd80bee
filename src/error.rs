//! Error handling for the Convoy library.
//!
//! This module provides centralized error handling for every fallible operation
//! of the crate. Only a few of these errors ever reach a caller synchronously:
//! transfer failures discovered while a download is in flight are reported
//! through the completion callbacks instead.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can happen when using Convoy.
#[derive(Error, Debug)]
pub enum Error {
    /// Error from an underlying system.
    ///
    /// This variant captures broken internal invariants, such as a second
    /// handle being inserted for a key that is already tracked.
    #[error("Internal error: {0}")]
    Internal(String),

    /// Error from the underlying URL parser or the expected URL format.
    ///
    /// Returned when a URL cannot be parsed or when no file name can be
    /// derived from it.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Another download in flight writes to the same local file.
    #[error("Destination in use: {0:?}")]
    DestinationInUse(PathBuf),

    /// The transfer engine reported a failure.
    #[error("Transfer failed: {0}")]
    TransferFailed(String),

    /// I/O Error.
    ///
    /// Wraps standard I/O errors raised while preparing directories or
    /// writing the transferred bytes to disk.
    #[error("I/O error")]
    IOError {
        #[from]
        source: io::Error,
    },

    /// Error from the Reqwest library.
    #[error("Reqwest Error")]
    Reqwest {
        #[from]
        source: reqwest::Error,
    },

    /// Error from the HTTP middleware stack.
    #[error("Middleware Error")]
    Middleware {
        #[from]
        source: reqwest_middleware::Error,
    },
}

/// Result type alias for operations that can fail with a Convoy error.
pub type Result<T> = std::result::Result<T, Error>;

//! Download requests and their callbacks.
//!
//! A [`DownloadRequest`] describes what to download and carries the callbacks
//! of the observer that asks for it. Every callback is optional; a request
//! without any still starts (or joins) the transfer.
//!
//! # Examples
//!
//! ```rust
//! use convoy::download::DownloadRequest;
//!
//! let request = DownloadRequest::new("https://example.com/file.zip")
//!     .directory("archives")
//!     .on_progress(|fraction| println!("{:.0}%", fraction * 100.0))
//!     .on_remaining_time(|seconds| println!("{seconds}s left"))
//!     .on_complete(|completed| println!("done: {completed}"))
//!     .background(true);
//! ```

use std::fmt;
use std::sync::Arc;

/// Callback receiving the completed fraction of a transfer, in `[0.0, 1.0]`.
pub type ProgressCallback = Arc<dyn Fn(f64) + Send + Sync>;
/// Callback receiving the estimated remaining time, in seconds.
pub type RemainingTimeCallback = Arc<dyn Fn(u64) + Send + Sync>;
/// Callback receiving `true` when the file reached its final location.
pub type CompletionCallback = Arc<dyn Fn(bool) + Send + Sync>;

/// The callbacks one observer attaches to a download.
#[derive(Clone, Default)]
pub struct Callbacks {
    pub(crate) progress: Option<ProgressCallback>,
    pub(crate) remaining_time: Option<RemainingTimeCallback>,
    pub(crate) completion: Option<CompletionCallback>,
}

impl fmt::Debug for Callbacks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callbacks")
            .field("progress", &self.progress.is_some())
            .field("remaining_time", &self.remaining_time.is_some())
            .field("completion", &self.completion.is_some())
            .finish()
    }
}

/// Represents a request to download a file.
#[derive(Debug, Clone)]
pub struct DownloadRequest {
    pub(crate) url: String,
    pub(crate) file_name: Option<String>,
    pub(crate) directory: Option<String>,
    pub(crate) background: bool,
    pub(crate) callbacks: Callbacks,
}

impl DownloadRequest {
    /// Creates a new [`DownloadRequest`] for `url`.
    ///
    /// The file name is derived from the last path segment of the URL unless
    /// [`DownloadRequest::file_name`] is used.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            file_name: None,
            directory: None,
            background: false,
            callbacks: Callbacks::default(),
        }
    }

    /// Store the file under an explicit name.
    pub fn file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = Some(file_name.into());
        self
    }

    /// Store the file in a sub-directory of the registry directory.
    pub fn directory(mut self, directory: impl Into<String>) -> Self {
        self.directory = Some(directory.into());
        self
    }

    /// Ask for the transfer to continue while the host is in the background.
    pub fn background(mut self, background: bool) -> Self {
        self.background = background;
        self
    }

    /// Set the progress callback.
    pub fn on_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(f64) + Send + Sync + 'static,
    {
        self.callbacks.progress = Some(Arc::new(callback));
        self
    }

    /// Set the remaining-time callback.
    ///
    /// It only fires while the total size of the transfer is known.
    pub fn on_remaining_time<F>(mut self, callback: F) -> Self
    where
        F: Fn(u64) + Send + Sync + 'static,
    {
        self.callbacks.remaining_time = Some(Arc::new(callback));
        self
    }

    /// Set the completion callback.
    pub fn on_complete<F>(mut self, callback: F) -> Self
    where
        F: Fn(bool) + Send + Sync + 'static,
    {
        self.callbacks.completion = Some(Arc::new(callback));
        self
    }

    /// Run `callback` after the progress callback already set, if any.
    pub fn also_on_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(f64) + Send + Sync + 'static,
    {
        let chained: ProgressCallback = match self.callbacks.progress.take() {
            Some(first) => Arc::new(move |fraction: f64| {
                first(fraction);
                callback(fraction);
            }),
            None => Arc::new(callback),
        };
        self.callbacks.progress = Some(chained);
        self
    }

    /// Run `callback` after the remaining-time callback already set, if any.
    pub fn also_on_remaining_time<F>(mut self, callback: F) -> Self
    where
        F: Fn(u64) + Send + Sync + 'static,
    {
        let chained: RemainingTimeCallback = match self.callbacks.remaining_time.take() {
            Some(first) => Arc::new(move |seconds: u64| {
                first(seconds);
                callback(seconds);
            }),
            None => Arc::new(callback),
        };
        self.callbacks.remaining_time = Some(chained);
        self
    }

    /// Run `callback` after the completion callback already set, if any.
    pub fn also_on_complete<F>(mut self, callback: F) -> Self
    where
        F: Fn(bool) + Send + Sync + 'static,
    {
        let chained: CompletionCallback = match self.callbacks.completion.take() {
            Some(first) => Arc::new(move |completed: bool| {
                first(completed);
                callback(completed);
            }),
            None => Arc::new(callback),
        };
        self.callbacks.completion = Some(chained);
        self
    }

    /// URL of the file to download.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Explicit file name, if any.
    pub fn explicit_file_name(&self) -> Option<&str> {
        self.file_name.as_deref()
    }

    /// Sub-directory, if any.
    pub fn directory_name(&self) -> Option<&str> {
        self.directory.as_deref()
    }

    /// Whether background mode was asked for.
    pub fn is_background(&self) -> bool {
        self.background
    }

    /// A short human readable label: the explicit file name, or the URL.
    pub fn label(&self) -> &str {
        self.file_name.as_deref().unwrap_or(&self.url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn test_defaults() {
        let request = DownloadRequest::new("https://example.com/file.zip");
        assert_eq!(request.url(), "https://example.com/file.zip");
        assert!(request.explicit_file_name().is_none());
        assert!(request.directory_name().is_none());
        assert!(!request.is_background());
        assert!(request.callbacks.progress.is_none());
        assert_eq!(request.label(), "https://example.com/file.zip");
    }

    #[test]
    fn test_chained_callbacks_run_in_order() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let (first, second) = (calls.clone(), calls.clone());
        let request = DownloadRequest::new("https://example.com/file.zip")
            .on_complete(move |ok| first.lock().unwrap().push(("first", ok)))
            .also_on_complete(move |ok| second.lock().unwrap().push(("second", ok)));

        (request.callbacks.completion.unwrap())(true);
        assert_eq!(*calls.lock().unwrap(), vec![("first", true), ("second", true)]);
    }

    #[test]
    fn test_also_without_existing_callback() {
        let request =
            DownloadRequest::new("https://example.com/file.zip").also_on_progress(|_| {});
        assert!(request.callbacks.progress.is_some());
    }

    #[test]
    fn test_debug_hides_closures() {
        let request = DownloadRequest::new("https://example.com/file.zip").on_progress(|_| {});
        let debug = format!("{:?}", request);
        assert!(debug.contains("progress: true"));
        assert!(debug.contains("completion: false"));
    }
}

//! Transfer handles and their observers.

use crate::download::{Callbacks, DownloadKey, ResolvedTarget};
use crate::engine::TransferId;
use crate::registry::dispatch::run_isolated;

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Identifies one observer within a registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObserverId(pub u64);

/// Returned by [`DownloadRegistry::request`], names the attached observer.
///
/// [`DownloadRegistry::request`]: crate::DownloadRegistry::request
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObserverToken {
    key: DownloadKey,
    id: ObserverId,
}

impl ObserverToken {
    pub(crate) fn new(key: DownloadKey, id: ObserverId) -> Self {
        Self { key, id }
    }

    /// Key of the download the observer is attached to.
    pub fn key(&self) -> &DownloadKey {
        &self.key
    }

    /// Identity of the observer.
    pub fn id(&self) -> ObserverId {
        self.id
    }
}

/// One caller's callbacks attached to a handle.
///
/// Clones share the detached flag: once the observer is cancelled, no clone
/// queued for later delivery fires anymore.
#[derive(Clone)]
pub(crate) struct Observer {
    id: ObserverId,
    callbacks: Callbacks,
    detached: Arc<AtomicBool>,
}

impl fmt::Debug for Observer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observer")
            .field("id", &self.id)
            .field("callbacks", &self.callbacks)
            .field("detached", &self.is_detached())
            .finish()
    }
}

impl Observer {
    pub(crate) fn new(id: ObserverId, callbacks: Callbacks) -> Self {
        Self {
            id,
            callbacks,
            detached: Arc::new(AtomicBool::new(false)),
        }
    }

    pub(crate) fn id(&self) -> ObserverId {
        self.id
    }

    pub(crate) fn detach(&self) {
        self.detached.store(true, Ordering::SeqCst);
    }

    pub(crate) fn is_detached(&self) -> bool {
        self.detached.load(Ordering::SeqCst)
    }

    pub(crate) fn wants_remaining_time(&self) -> bool {
        self.callbacks.remaining_time.is_some()
    }

    pub(crate) fn notify_progress(&self, fraction: f64) {
        if let (Some(callback), false) = (&self.callbacks.progress, self.is_detached()) {
            run_isolated("progress", || callback(fraction));
        }
    }

    pub(crate) fn notify_remaining_time(&self, seconds: u64) {
        if let (Some(callback), false) = (&self.callbacks.remaining_time, self.is_detached()) {
            run_isolated("remaining time", || callback(seconds));
        }
    }

    pub(crate) fn notify_completion(&self, completed: bool) {
        if let (Some(callback), false) = (&self.callbacks.completion, self.is_detached()) {
            run_isolated("completion", || callback(completed));
        }
    }
}

/// One in-flight transfer and the observers sharing it.
#[derive(Debug)]
pub(crate) struct TransferHandle {
    key: DownloadKey,
    transfer: TransferId,
    file_name: String,
    directory: Option<String>,
    local_path: PathBuf,
    started_at: Instant,
    background: bool,
    observers: Vec<Observer>,
}

impl TransferHandle {
    pub(crate) fn new(
        target: ResolvedTarget,
        transfer: TransferId,
        background: bool,
        first: Observer,
    ) -> Self {
        Self {
            key: target.key,
            transfer,
            file_name: target.file_name,
            directory: target.directory,
            local_path: target.local_path,
            started_at: Instant::now(),
            background,
            observers: vec![first],
        }
    }

    pub(crate) fn key(&self) -> &DownloadKey {
        &self.key
    }

    pub(crate) fn transfer(&self) -> TransferId {
        self.transfer
    }

    pub(crate) fn file_name(&self) -> &str {
        &self.file_name
    }

    pub(crate) fn directory(&self) -> Option<&str> {
        self.directory.as_deref()
    }

    pub(crate) fn local_path(&self) -> &Path {
        &self.local_path
    }

    pub(crate) fn started_at(&self) -> Instant {
        self.started_at
    }

    pub(crate) fn is_background(&self) -> bool {
        self.background
    }

    pub(crate) fn observers(&self) -> &[Observer] {
        &self.observers
    }

    pub(crate) fn into_observers(self) -> Vec<Observer> {
        self.observers
    }

    /// Append an observer. Background eligibility is upgraded, never lowered.
    pub(crate) fn attach(&mut self, observer: Observer, background: bool) {
        self.background |= background;
        self.observers.push(observer);
    }

    /// Remove an observer, marking it detached. Returns `false` if unknown.
    pub(crate) fn detach(&mut self, id: ObserverId) -> bool {
        match self.observers.iter().position(|o| o.id() == id) {
            Some(index) => {
                self.observers.remove(index).detach();
                true
            }
            None => false,
        }
    }

    pub(crate) fn has_observer(&self, id: ObserverId) -> bool {
        self.observers.iter().any(|o| o.id() == id)
    }

    pub(crate) fn detach_all(&self) {
        self.observers.iter().for_each(Observer::detach);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::download::PathResolver;
    use std::sync::Mutex;

    fn handle(background: bool) -> TransferHandle {
        let target = PathResolver::new(PathBuf::from("/base"))
            .resolve("https://x/y/a.zip", None, Some("dir"))
            .unwrap();
        TransferHandle::new(
            target,
            TransferId(7),
            background,
            Observer::new(ObserverId(1), Callbacks::default()),
        )
    }

    #[test]
    fn test_new_handle() {
        let handle = handle(false);
        assert_eq!(handle.transfer(), TransferId(7));
        assert_eq!(handle.file_name(), "a.zip");
        assert_eq!(handle.directory(), Some("dir"));
        assert_eq!(handle.local_path(), Path::new("/base/dir/a.zip"));
        assert_eq!(handle.key().url(), "https://x/y/a.zip");
        assert_eq!(handle.observers().len(), 1);
    }

    #[test]
    fn test_background_upgrade_on_any_true() {
        let mut handle = handle(false);
        handle.attach(Observer::new(ObserverId(2), Callbacks::default()), true);
        assert!(handle.is_background());
        handle.attach(Observer::new(ObserverId(3), Callbacks::default()), false);
        assert!(handle.is_background());
    }

    #[test]
    fn test_detach_marks_observer() {
        let mut handle = handle(false);
        let second = Observer::new(ObserverId(2), Callbacks::default());
        handle.attach(second.clone(), false);

        assert!(handle.detach(ObserverId(2)));
        assert!(second.is_detached());
        assert!(!handle.has_observer(ObserverId(2)));
        assert!(!handle.detach(ObserverId(2)));
        assert!(handle.has_observer(ObserverId(1)));
    }

    #[test]
    fn test_detached_observer_is_silent() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let sink = calls.clone();
        let callbacks = Callbacks {
            completion: Some(Arc::new(move |ok: bool| sink.lock().unwrap().push(ok))),
            ..Callbacks::default()
        };
        let observer = Observer::new(ObserverId(1), callbacks);

        observer.notify_completion(true);
        observer.detach();
        observer.notify_completion(false);
        assert_eq!(*calls.lock().unwrap(), vec![true]);
    }

    #[test]
    fn test_panicking_callback_is_contained() {
        let callbacks = Callbacks {
            progress: Some(Arc::new(|_: f64| panic!("observer failure"))),
            ..Callbacks::default()
        };
        Observer::new(ObserverId(1), callbacks).notify_progress(0.5);
    }
}

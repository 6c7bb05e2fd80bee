//! The download registry.
//!
//! The registry keeps one transfer handle per download key, so that every
//! request for a download already in flight joins the running transfer
//! instead of starting another one. It receives the engine's events, derives
//! the progress fraction and remaining time, and fans them out to the
//! observers of the handle on the callback queue.
//!
//! # Examples
//!
//! ```rust,no_run
//! use convoy::{DownloadRequest, RegistryBuilder};
//! use std::path::PathBuf;
//!
//! # #[tokio::main]
//! # async fn main() -> convoy::Result<()> {
//! let registry = RegistryBuilder::new()
//!     .directory(PathBuf::from("./downloads"))
//!     .build()?;
//!
//! let token = registry.request(
//!     DownloadRequest::new("https://example.com/file.zip")
//!         .on_progress(|fraction| println!("{:.0}%", fraction * 100.0))
//!         .on_complete(|completed| println!("completed: {completed}")),
//! )?;
//!
//! assert!(registry.is_attached(&token));
//! # Ok(())
//! # }
//! ```

use super::background::BackgroundCompletionSignal;
use super::config::RegistryConfig;
use super::dispatch::CallbackQueue;
use super::handle::{Observer, ObserverId, ObserverToken, TransferHandle};
use crate::download::{DownloadKey, DownloadRequest, PathResolver, ProgressSample, ResolvedTarget};
use crate::engine::{
    EventSink, TransferEngine, TransferEvent, TransferEventHandler, TransferId, TransferRequest,
};
use crate::error::{Error, Result};
use crate::storage::FileStore;

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use tracing::{debug, warn};

/// Handles indexed by key and by transfer.
#[derive(Debug, Default)]
struct Table {
    handles: HashMap<DownloadKey, TransferHandle>,
    transfers: HashMap<TransferId, DownloadKey>,
    /// A background-eligible handle was tracked since the signal last fired.
    background_armed: bool,
}

impl Table {
    fn insert(&mut self, handle: TransferHandle) -> Result<()> {
        if self.handles.contains_key(handle.key()) {
            return Err(Error::Internal(format!(
                "a transfer is already tracked for {}",
                handle.key()
            )));
        }
        if let Some(other) = self.writing_to(handle.local_path()) {
            return Err(Error::DestinationInUse(other.local_path().to_path_buf()));
        }
        self.background_armed |= handle.is_background();
        self.transfers.insert(handle.transfer(), handle.key().clone());
        self.handles.insert(handle.key().clone(), handle);
        Ok(())
    }

    fn writing_to(&self, local_path: &Path) -> Option<&TransferHandle> {
        self.handles
            .values()
            .find(|handle| handle.local_path() == local_path)
    }

    fn remove(&mut self, key: &DownloadKey) -> Option<TransferHandle> {
        let handle = self.handles.remove(key)?;
        self.transfers.remove(&handle.transfer());
        Some(handle)
    }

    fn remove_transfer(&mut self, id: TransferId) -> Option<TransferHandle> {
        let key = self.transfers.remove(&id)?;
        self.handles.remove(&key)
    }

    fn by_transfer(&self, id: TransferId) -> Option<&TransferHandle> {
        self.transfers.get(&id).and_then(|key| self.handles.get(key))
    }

    fn has_background(&self) -> bool {
        self.handles.values().any(TransferHandle::is_background)
    }

    /// Disarm the background signal if the cycle is over. Returns whether it
    /// should fire.
    fn take_background_drained(&mut self) -> bool {
        if !self.background_armed || self.has_background() {
            return false;
        }
        self.background_armed = false;
        true
    }

    fn drain(&mut self) -> Vec<TransferHandle> {
        self.transfers.clear();
        self.handles.drain().map(|(_, handle)| handle).collect()
    }
}

struct Shared {
    config: RegistryConfig,
    resolver: PathResolver,
    engine: Arc<dyn TransferEngine>,
    file_store: Arc<dyn FileStore>,
    queue: CallbackQueue,
    table: Mutex<Table>,
    next_transfer: AtomicU64,
    next_observer: AtomicU64,
}

impl Shared {
    fn table(&self) -> MutexGuard<'_, Table> {
        self.table.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn signal(&self) -> &BackgroundCompletionSignal {
        &self.config.background_signal
    }

    fn fire_background_signal(&self) {
        let signal = self.signal().clone();
        self.queue.submit(move || {
            if !signal.invoke() {
                debug!("Background transfers drained, no completion handler set");
            }
        });
    }

    fn on_progress(&self, id: TransferId, bytes_written: u64, total_bytes: Option<u64>) {
        let (observers, started_at) = match self.table().by_transfer(id) {
            Some(handle) => (handle.observers().to_vec(), handle.started_at()),
            None => {
                debug!("Ignoring progress of untracked transfer {}", id);
                return;
            }
        };

        let sample = ProgressSample::new(bytes_written, total_bytes, started_at.elapsed());
        let Some(fraction) = sample.fraction() else {
            return;
        };
        let remaining = match observers.iter().any(Observer::wants_remaining_time) {
            true => sample.remaining_seconds(),
            false => None,
        };

        self.queue.submit(move || {
            for observer in &observers {
                observer.notify_progress(fraction);
            }
            if let Some(seconds) = remaining {
                for observer in &observers {
                    observer.notify_remaining_time(seconds);
                }
            }
        });
    }

    fn on_finished(&self, id: TransferId, result: Result<PathBuf>) {
        let (handle, drained) = {
            let mut table = self.table();
            let Some(handle) = table.remove_transfer(id) else {
                drop(table);
                self.discard_untracked(id, result);
                return;
            };
            let drained = handle.is_background() && table.take_background_drained();
            (handle, drained)
        };

        let completed = match result {
            Ok(staged) => match self
                .file_store
                .move_to_final_location(&staged, handle.local_path())
            {
                Ok(()) => {
                    debug!("{} stored at {:?}", handle.key(), handle.local_path());
                    true
                }
                Err(e) => {
                    warn!(
                        "Failed to move {:?} to {:?}: {}",
                        staged,
                        handle.local_path(),
                        e
                    );
                    false
                }
            },
            Err(e) => {
                warn!("Download of {} failed: {}", handle.key(), e);
                false
            }
        };

        let observers = handle.into_observers();
        self.queue.submit(move || {
            for observer in &observers {
                observer.notify_completion(completed);
            }
        });

        if drained {
            debug!("Last background transfer finished");
            self.fire_background_signal();
        }
    }

    /// A cancelled transfer still finished: drop what it wrote.
    fn discard_untracked(&self, id: TransferId, result: Result<PathBuf>) {
        debug!("Ignoring completion of untracked transfer {}", id);
        if let Ok(staged) = result {
            if self.file_store.delete(&staged) {
                debug!("Removed {:?} of untracked transfer {}", staged, id);
            }
        }
    }
}

impl TransferEventHandler for Shared {
    fn handle_event(&self, event: TransferEvent) {
        match event {
            TransferEvent::Progress {
                id,
                bytes_written,
                total_bytes,
            } => self.on_progress(id, bytes_written, total_bytes),
            TransferEvent::Finished { id, result } => self.on_finished(id, result),
        }
    }
}

/// Coordinates downloads: one transfer per key, any number of observers.
///
/// Cloning yields another handle on the same registry.
#[derive(Clone)]
pub struct DownloadRegistry {
    shared: Arc<Shared>,
}

impl fmt::Debug for DownloadRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DownloadRegistry")
            .field("config", &self.shared.config)
            .field("active", &self.shared.table().handles.len())
            .finish()
    }
}

impl DownloadRegistry {
    pub(crate) fn new(
        config: RegistryConfig,
        engine: Arc<dyn TransferEngine>,
        file_store: Arc<dyn FileStore>,
        queue: CallbackQueue,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                resolver: PathResolver::new(config.directory.clone()),
                config,
                engine,
                file_store,
                queue,
                table: Mutex::new(Table::default()),
                next_transfer: AtomicU64::new(1),
                next_observer: AtomicU64::new(1),
            }),
        }
    }

    /// Gets the directory where files are stored.
    pub fn directory(&self) -> &Path {
        self.shared.resolver.base_directory()
    }

    /// Gets the registry configuration.
    pub fn config(&self) -> &RegistryConfig {
        &self.shared.config
    }

    /// Gets the background completion slot used by this registry.
    pub fn background_signal(&self) -> &BackgroundCompletionSignal {
        self.shared.signal()
    }

    /// Request a download.
    ///
    /// If the same download is already in flight, the request's callbacks are
    /// attached to it and no new transfer starts. The returned token names the
    /// attached observer.
    ///
    /// Fails synchronously only when no key or path can be derived from the
    /// request, or when the transfer cannot be started. Failures of the
    /// transfer itself are reported through the completion callback.
    pub fn request(&self, request: DownloadRequest) -> Result<ObserverToken> {
        let shared = &self.shared;
        let target = shared.resolver.resolve(
            &request.url,
            request.file_name.as_deref(),
            request.directory.as_deref(),
        )?;
        let observer_id = ObserverId(shared.next_observer.fetch_add(1, Ordering::Relaxed));
        let token = ObserverToken::new(target.key.clone(), observer_id);
        let observer = Observer::new(observer_id, request.callbacks);

        let transfer = {
            let mut table = shared.table();
            if let Some(handle) = table.handles.get_mut(&target.key) {
                debug!(
                    "Attaching observer to the download of {} ({} in {:?})",
                    target.key,
                    handle.file_name(),
                    handle.directory()
                );
                handle.attach(observer, request.background);
                table.background_armed |= request.background;
                return Ok(token);
            }

            let transfer = TransferId(shared.next_transfer.fetch_add(1, Ordering::Relaxed));
            table.insert(TransferHandle::new(
                target.clone(),
                transfer,
                request.background,
                observer,
            ))?;
            transfer
        };

        if let Err(e) = self.start_transfer(&target, transfer, request.background) {
            warn!("Could not start the download of {}: {}", target.key, e);
            self.abandon(transfer, observer_id);
            return Err(e);
        }
        Ok(token)
    }

    fn start_transfer(
        &self,
        target: &ResolvedTarget,
        transfer: TransferId,
        background: bool,
    ) -> Result<()> {
        if let Some(directory) = target.local_path.parent() {
            self.shared.file_store.ensure_directory(directory)?;
        }

        debug!("Starting transfer {} for {}", transfer, target.key);
        let shared = Arc::downgrade(&self.shared);
        let handler: Weak<dyn TransferEventHandler> = shared;
        let events = EventSink::new(handler);
        self.shared.engine.start(
            TransferRequest {
                id: transfer,
                url: target.url.clone(),
                destination: target.local_path.clone(),
                background,
            },
            events,
        )
    }

    /// Drop a handle whose transfer could not start.
    ///
    /// Observers that joined in the meantime learn about it as a failure; the
    /// requester gets the error instead.
    fn abandon(&self, transfer: TransferId, requester: ObserverId) {
        let Some(handle) = self.shared.table().remove_transfer(transfer) else {
            return;
        };
        let others: Vec<Observer> = handle
            .into_observers()
            .into_iter()
            .filter(|observer| observer.id() != requester)
            .collect();
        if !others.is_empty() {
            self.shared.queue.submit(move || {
                for observer in &others {
                    observer.notify_completion(false);
                }
            });
        }
    }

    /// Cancel every download. No completion callback fires for them.
    pub fn cancel_all(&self) {
        let handles = self.shared.table().drain();
        for handle in handles {
            debug!("Cancelling the download of {}", handle.key());
            handle.detach_all();
            self.shared.engine.cancel(handle.transfer());
        }
    }

    /// Cancel the download of `key`. No completion callback fires for it.
    ///
    /// Returns `false` if nothing was downloading under that key.
    pub fn cancel(&self, key: &DownloadKey) -> bool {
        let Some(handle) = self.shared.table().remove(key) else {
            return false;
        };
        debug!("Cancelling the download of {}", key);
        handle.detach_all();
        self.shared.engine.cancel(handle.transfer());
        true
    }

    /// Cancel the download of `url` stored under its derived file name.
    pub fn cancel_url(&self, url: &str) -> bool {
        DownloadKey::for_url(url)
            .map(|key| self.cancel(&key))
            .unwrap_or(false)
    }

    /// Detach one observer. Its callbacks no longer fire.
    ///
    /// When the last observer of a download detaches, the transfer is
    /// cancelled. Returns `false` if the observer was not attached.
    pub fn detach(&self, token: &ObserverToken) -> bool {
        let removed = {
            let mut table = self.shared.table();
            let Some(handle) = table.handles.get_mut(token.key()) else {
                return false;
            };
            if !handle.detach(token.id()) {
                return false;
            }
            match handle.observers().is_empty() {
                true => table.remove(token.key()),
                false => None,
            }
        };

        if let Some(handle) = removed {
            debug!("Last observer of {} detached, cancelling", handle.key());
            self.shared.engine.cancel(handle.transfer());
        }
        true
    }

    /// Whether a download is in flight under `key`.
    pub fn is_downloading(&self, key: &DownloadKey) -> bool {
        self.shared.table().handles.contains_key(key)
    }

    /// Whether `url`, stored under its derived file name, is downloading.
    pub fn is_url_downloading(&self, url: &str) -> bool {
        DownloadKey::for_url(url)
            .map(|key| self.is_downloading(&key))
            .unwrap_or(false)
    }

    /// Whether the observer named by `token` is still attached to a download.
    pub fn is_attached(&self, token: &ObserverToken) -> bool {
        self.shared
            .table()
            .handles
            .get(token.key())
            .is_some_and(|handle| handle.has_observer(token.id()))
    }

    /// Keys of the downloads currently in flight.
    pub fn current_downloads(&self) -> Vec<DownloadKey> {
        self.shared.table().handles.keys().cloned().collect()
    }

    /// Final location of a download in flight.
    pub fn local_path(&self, key: &DownloadKey) -> Option<PathBuf> {
        self.shared
            .table()
            .handles
            .get(key)
            .map(|handle| handle.local_path().to_path_buf())
    }

    /// The platform reports that background transfer processing is over.
    ///
    /// Fires the background completion signal when background downloads were
    /// tracked since it last fired and none is still in flight. Returns whether
    /// it fired. The signal fires once per cycle, whether from here or from the
    /// completion of the last background download.
    pub fn background_events_finished(&self) -> bool {
        if !self.shared.table().take_background_drained() {
            debug!("No finished background cycle to report");
            return false;
        }
        self.shared.fire_background_signal();
        true
    }

    /// Local path of a file in the registry directory.
    pub fn local_path_for_file(&self, file_name: &str, directory: Option<&str>) -> PathBuf {
        self.shared.resolver.local_path_for_file(file_name, directory)
    }

    /// Whether the file `url` is stored as exists.
    pub fn file_exists_for_url(&self, url: &str, directory: Option<&str>) -> bool {
        self.shared
            .resolver
            .local_path_for_url(url, directory)
            .map(|path| self.shared.file_store.exists(&path))
            .unwrap_or(false)
    }

    /// Whether a file named `file_name` exists.
    pub fn file_exists_with_name(&self, file_name: &str, directory: Option<&str>) -> bool {
        self.shared
            .file_store
            .exists(&self.local_path_for_file(file_name, directory))
    }

    /// Delete the file `url` is stored as. Returns whether a file was removed.
    pub fn delete_file_for_url(&self, url: &str, directory: Option<&str>) -> bool {
        self.shared
            .resolver
            .local_path_for_url(url, directory)
            .map(|path| self.shared.file_store.delete(&path))
            .unwrap_or(false)
    }

    /// Delete the file named `file_name`. Returns whether a file was removed.
    pub fn delete_file_with_name(&self, file_name: &str, directory: Option<&str>) -> bool {
        self.shared
            .file_store
            .delete(&self.local_path_for_file(file_name, directory))
    }
}

#![allow(dead_code)]

use convoy::engine::{EventSink, TransferEngine, TransferId, TransferRequest};
use convoy::http::staging_path;
use convoy::{
    BackgroundCompletionSignal, CallbackQueue, DownloadRegistry, DownloadRequest, Error,
    RegistryBuilder, Result,
};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

// Common test constants
pub const TEST_URL: &str = "https://x/y/a.zip";
pub const TEST_OTHER_URL: &str = "https://x/y/b.zip";
pub const TEST_PAYLOAD: &[u8] = b"payload";

/// Creates a temporary directory for testing purposes
pub fn create_temp_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temporary directory")
}

// === Scripted engine ===

/// Engine recording what the registry asks for; tests drive its events.
#[derive(Default)]
pub struct MockEngine {
    started: Mutex<Vec<TransferRequest>>,
    sinks: Mutex<HashMap<TransferId, EventSink>>,
    cancelled: Mutex<Vec<TransferId>>,
    refuse_next: AtomicBool,
}

impl MockEngine {
    /// Make the next `start` fail.
    pub fn refuse_next_start(&self) {
        self.refuse_next.store(true, Ordering::SeqCst);
    }

    pub fn started(&self) -> Vec<TransferRequest> {
        self.started.lock().unwrap().clone()
    }

    pub fn start_count(&self) -> usize {
        self.started.lock().unwrap().len()
    }

    pub fn cancelled(&self) -> Vec<TransferId> {
        self.cancelled.lock().unwrap().clone()
    }

    /// Id of the most recently started transfer.
    pub fn last_id(&self) -> TransferId {
        self.started
            .lock()
            .unwrap()
            .last()
            .map(|request| request.id)
            .expect("No transfer was started")
    }

    fn sink(&self, id: TransferId) -> EventSink {
        self.sinks
            .lock()
            .unwrap()
            .get(&id)
            .cloned()
            .expect("Unknown transfer")
    }

    fn destination(&self, id: TransferId) -> PathBuf {
        self.started
            .lock()
            .unwrap()
            .iter()
            .find(|request| request.id == id)
            .map(|request| request.destination.clone())
            .expect("Unknown transfer")
    }

    pub fn progress(&self, id: TransferId, written: u64, total: Option<u64>) {
        self.sink(id).progress(id, written, total);
    }

    /// Write the payload to the staging file and report success.
    pub fn succeed(&self, id: TransferId) {
        let staged = staging_path(&self.destination(id), id);
        std::fs::write(&staged, TEST_PAYLOAD).expect("Failed to write staging file");
        self.sink(id).finished(id, Ok(staged));
    }

    /// Report success without writing anything.
    pub fn succeed_without_file(&self, id: TransferId) {
        let staged = staging_path(&self.destination(id), id);
        self.sink(id).finished(id, Ok(staged));
    }

    pub fn fail(&self, id: TransferId) {
        self.sink(id)
            .finished(id, Err(Error::TransferFailed("connection reset".into())));
    }
}

impl TransferEngine for MockEngine {
    fn start(&self, request: TransferRequest, events: EventSink) -> Result<()> {
        if self.refuse_next.swap(false, Ordering::SeqCst) {
            return Err(Error::TransferFailed("refused".into()));
        }
        self.sinks.lock().unwrap().insert(request.id, events);
        self.started.lock().unwrap().push(request);
        Ok(())
    }

    fn cancel(&self, id: TransferId) {
        self.cancelled.lock().unwrap().push(id);
    }
}

// === Registry helpers ===

/// Registry on a mock engine, running callbacks inline, with a private
/// background slot.
pub fn create_test_registry(dir: &Path) -> (DownloadRegistry, Arc<MockEngine>) {
    create_test_registry_with_signal(dir, BackgroundCompletionSignal::new())
}

pub fn create_test_registry_with_signal(
    dir: &Path,
    signal: BackgroundCompletionSignal,
) -> (DownloadRegistry, Arc<MockEngine>) {
    let engine = Arc::new(MockEngine::default());
    let registry = RegistryBuilder::new()
        .directory(dir.to_path_buf())
        .engine(engine.clone())
        .callback_queue(CallbackQueue::inline())
        .background_signal(signal)
        .build()
        .expect("Failed to build registry");
    (registry, engine)
}

// === Callback recording ===

/// Ordered log of the callbacks observers received.
#[derive(Clone, Default)]
pub struct EventLog(Arc<Mutex<Vec<String>>>);

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, entry: String) {
        self.0.lock().unwrap().push(entry);
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    pub fn with_prefix(&self, prefix: &str) -> Vec<String> {
        self.entries()
            .into_iter()
            .filter(|entry| entry.starts_with(prefix))
            .collect()
    }

    /// Attach progress, remaining-time and completion callbacks tagged `tag`.
    pub fn observe(&self, tag: &str, request: DownloadRequest) -> DownloadRequest {
        let (progress, remaining, complete) = (self.clone(), self.clone(), self.clone());
        let (t1, t2, t3) = (tag.to_string(), tag.to_string(), tag.to_string());
        request
            .on_progress(move |fraction| progress.push(format!("{t1}:progress:{fraction}")))
            .on_remaining_time(move |seconds| remaining.push(format!("{t2}:remaining:{seconds}")))
            .on_complete(move |completed| complete.push(format!("{t3}:complete:{completed}")))
    }

    /// Attach only a completion callback tagged `tag`.
    pub fn observe_completion(&self, tag: &str, request: DownloadRequest) -> DownloadRequest {
        let log = self.clone();
        let tag = tag.to_string();
        request.on_complete(move |completed| log.push(format!("{tag}:complete:{completed}")))
    }
}

// === Assertion Helpers ===

/// Asserts that no staging file is left in `dir`
pub fn assert_no_staging_files(dir: &Path) {
    let leftovers: Vec<PathBuf> = std::fs::read_dir(dir)
        .expect("Failed to read directory")
        .map(|entry| entry.expect("Failed to read entry").path())
        .filter(|path| path.to_string_lossy().ends_with(".part"))
        .collect();
    assert!(leftovers.is_empty(), "Staging files left behind: {:?}", leftovers);
}

/// Asserts that a file exists at the given path with the test payload
pub fn assert_payload_at(path: &Path) {
    let content = std::fs::read(path).unwrap_or_else(|_| panic!("File should exist at {:?}", path));
    assert_eq!(content, TEST_PAYLOAD, "Unexpected content at {:?}", path);
}

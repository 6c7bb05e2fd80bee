//! The default [`TransferEngine`], streaming downloads over HTTP(S).
//!
//! Each transfer runs as a tokio task. The body is written chunk by chunk to
//! a staging file next to the destination (`<destination>.<id>.part`), with a
//! progress event after every chunk. On success the staging path is reported
//! and the registry moves it into place.

use super::client::{create_http_client, HttpClientConfig};
use crate::engine::{EventSink, TransferEngine, TransferId, TransferRequest};
use crate::error::{Error, Result};

use futures::stream::StreamExt;
use reqwest::Url;
use reqwest_middleware::ClientWithMiddleware;
use std::collections::{HashMap, HashSet};
use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::{fs, fs::OpenOptions, io::AsyncWriteExt};
use tracing::{debug, warn};

/// Suffix of the staging file of a transfer.
pub const STAGING_SUFFIX: &str = ".part";

struct ActiveTransfer {
    task: JoinHandle<()>,
    staging: PathBuf,
}

#[derive(Default)]
struct Transfers {
    active: HashMap<TransferId, ActiveTransfer>,
    /// Cancelled before `start` was called for them.
    cancelled: HashSet<TransferId>,
}

type SharedTransfers = Arc<Mutex<Transfers>>;

fn lock(transfers: &SharedTransfers) -> MutexGuard<'_, Transfers> {
    transfers.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Downloads over HTTP(S) with `reqwest`.
#[derive(Clone)]
pub struct HttpEngine {
    client: ClientWithMiddleware,
    runtime: Handle,
    transfers: SharedTransfers,
}

impl fmt::Debug for HttpEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpEngine")
            .field("active", &self.active_transfers())
            .finish()
    }
}

impl HttpEngine {
    /// Creates an engine spawning its transfers on `runtime`.
    pub fn new(config: HttpClientConfig, runtime: Handle) -> Result<Self> {
        Ok(Self::with_client(create_http_client(config)?, runtime))
    }

    /// Creates an engine on the runtime of the caller.
    pub fn from_current(config: HttpClientConfig) -> Result<Self> {
        let runtime = Handle::try_current().map_err(|e| {
            Error::Internal(format!("the HTTP engine needs a tokio runtime: {}", e))
        })?;
        Self::new(config, runtime)
    }

    /// Creates an engine using an already configured client.
    pub fn with_client(client: ClientWithMiddleware, runtime: Handle) -> Self {
        Self {
            client,
            runtime,
            transfers: Arc::new(Mutex::new(Transfers::default())),
        }
    }

    /// Number of transfers currently running.
    pub fn active_transfers(&self) -> usize {
        lock(&self.transfers).active.len()
    }
}

impl TransferEngine for HttpEngine {
    /// Spawns the transfer, unless it was cancelled before it started.
    fn start(&self, request: TransferRequest, events: EventSink) -> Result<()> {
        let id = request.id;
        // Holding the lock across the spawn keeps the task from removing its
        // entry before it was inserted.
        let mut transfers = lock(&self.transfers);
        if transfers.cancelled.remove(&id) {
            debug!("Transfer {} was cancelled before it started", id);
            return Ok(());
        }

        let staging = staging_path(&request.destination, id);
        debug!(
            "Fetching {} into {:?} (background: {})",
            request.url, staging, request.background
        );

        let client = self.client.clone();
        let shared = self.transfers.clone();
        let url = request.url;
        let task_staging = staging.clone();
        let task = self.runtime.spawn(async move {
            let result = fetch(&client, &url, &task_staging, id, &events).await;
            if result.is_err() {
                let _ = fs::remove_file(&task_staging).await;
            }
            lock(&shared).active.remove(&id);
            events.finished(id, result.map(|()| task_staging));
        });
        transfers.active.insert(id, ActiveTransfer { task, staging });
        Ok(())
    }

    /// Aborts the transfer and removes its staging file.
    ///
    /// An id that is not running yet is remembered, and a later `start` for it
    /// does nothing.
    fn cancel(&self, id: TransferId) {
        let transfer = {
            let mut transfers = lock(&self.transfers);
            match transfers.active.remove(&id) {
                Some(transfer) => transfer,
                None => {
                    transfers.cancelled.insert(id);
                    return;
                }
            }
        };
        debug!("Aborting transfer {}", id);
        transfer.task.abort();
        if let Err(e) = std::fs::remove_file(&transfer.staging) {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!("Failed to remove {:?}: {}", transfer.staging, e);
            }
        }
    }
}

/// Staging path of transfer `id` writing to `destination`.
///
/// Unique per transfer, so that two transfers never share a staging file.
pub fn staging_path(destination: &Path, id: TransferId) -> PathBuf {
    let mut name = OsString::from(destination.as_os_str());
    name.push(format!(".{}{}", id.0, STAGING_SUFFIX));
    PathBuf::from(name)
}

/// Fetches a file and writes it to disk.
async fn fetch(
    client: &ClientWithMiddleware,
    url: &Url,
    staging: &Path,
    id: TransferId,
    events: &EventSink,
) -> Result<()> {
    let res = client.get(url.as_str()).send().await?;
    res.error_for_status_ref()?;
    let total = res.content_length();

    if let Some(dir) = staging.parent() {
        fs::create_dir_all(dir).await?;
    }
    debug!("Creating staging file {:?}", staging);
    let mut file = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(staging)
        .await?;

    let mut written: u64 = 0;
    let mut stream = res.bytes_stream();
    while let Some(item) = stream.next().await {
        let mut chunk = item?;
        written += chunk.len() as u64;
        file.write_all_buf(&mut chunk).await?;
        events.progress(id, written, total);
    }
    file.flush().await?;

    debug!("Transfer {} wrote {} bytes", id, written);
    Ok(())
}

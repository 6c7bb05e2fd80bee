//! The execution context observer callbacks run on.
//!
//! Engines report events from their own threads. The registry never runs
//! observer callbacks there: it submits them to a [`CallbackQueue`]. The
//! default serial queue runs every job, in submission order, on one dedicated
//! thread, which plays the part of a UI "main" thread for callers that need
//! one.

use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::thread;
use tokio::sync::mpsc;
use tracing::{debug, warn};

type Job = Box<dyn FnOnce() + Send>;

#[derive(Clone)]
enum Mode {
    Inline,
    Serial(mpsc::UnboundedSender<Job>),
}

/// Where observer callbacks are executed.
#[derive(Clone)]
pub struct CallbackQueue {
    mode: Mode,
}

impl fmt::Debug for CallbackQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mode = match self.mode {
            Mode::Inline => "inline",
            Mode::Serial(_) => "serial",
        };
        f.debug_struct("CallbackQueue").field("mode", &mode).finish()
    }
}

impl CallbackQueue {
    /// Run callbacks directly on the thread delivering the event.
    pub fn inline() -> Self {
        Self { mode: Mode::Inline }
    }

    /// Run callbacks in order on a dedicated thread.
    ///
    /// The thread exits once every clone of the queue is dropped.
    pub fn serial() -> crate::Result<Self> {
        let (tx, mut rx) = mpsc::unbounded_channel::<Job>();
        thread::Builder::new()
            .name("convoy-callbacks".into())
            .spawn(move || {
                while let Some(job) = rx.blocking_recv() {
                    run_isolated("queued job", job);
                }
                debug!("Callback queue closed");
            })?;
        Ok(Self {
            mode: Mode::Serial(tx),
        })
    }

    /// Whether callbacks run on the delivering thread.
    pub fn is_inline(&self) -> bool {
        matches!(self.mode, Mode::Inline)
    }

    /// Submit a job.
    pub fn submit<F>(&self, job: F)
    where
        F: FnOnce() + Send + 'static,
    {
        match &self.mode {
            Mode::Inline => {
                run_isolated("inline job", job);
            }
            Mode::Serial(tx) => {
                if let Err(mpsc::error::SendError(job)) = tx.send(Box::new(job)) {
                    warn!("Callback thread is gone, running job inline");
                    run_isolated("orphaned job", job);
                }
            }
        }
    }
}

/// Run `f`, containing any panic it raises.
///
/// Returns `false` if `f` panicked.
pub(crate) fn run_isolated<F: FnOnce()>(what: &str, f: F) -> bool {
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(()) => true,
        Err(payload) => {
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".into());
            warn!("Observer callback ({}) panicked: {}", what, message);
            false
        }
    }
}

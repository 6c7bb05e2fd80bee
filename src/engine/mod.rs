//! The boundary with the transfer engine.
//!
//! A [`TransferEngine`] performs the network I/O of a download. The registry
//! hands it a [`TransferRequest`] and an [`EventSink`]; the engine reports byte
//! progress and the final outcome through the sink, from whichever thread it
//! runs its transfers on.
//!
//! The default engine is [`crate::http::HttpEngine`]. Implementing the trait
//! directly is how tests and hosts with their own transport plug in:
//!
//! ```rust
//! use convoy::engine::{EventSink, TransferEngine, TransferId, TransferRequest};
//! use convoy::Result;
//!
//! struct Noop;
//!
//! impl TransferEngine for Noop {
//!     fn start(&self, request: TransferRequest, events: EventSink) -> Result<()> {
//!         events.finished(request.id, Ok(request.destination));
//!         Ok(())
//!     }
//!
//!     fn cancel(&self, _id: TransferId) {}
//! }
//! ```

use crate::error::Error;

use reqwest::Url;
use std::fmt;
use std::path::PathBuf;
use std::sync::Weak;

/// Identifies one transfer running in an engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TransferId(pub u64);

impl fmt::Display for TransferId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// What an engine needs to start a transfer.
#[derive(Debug, Clone)]
pub struct TransferRequest {
    /// Identity of the transfer, used in every event about it.
    pub id: TransferId,
    /// URL to fetch.
    pub url: Url,
    /// Final location of the file.
    ///
    /// Engines may write elsewhere and report the staging path on success;
    /// the registry moves it into place.
    pub destination: PathBuf,
    /// Advisory: keep going while the host is in the background.
    pub background: bool,
}

/// An event reported by an engine.
#[derive(Debug)]
pub enum TransferEvent {
    /// Bytes were written.
    Progress {
        id: TransferId,
        bytes_written: u64,
        total_bytes: Option<u64>,
    },
    /// The transfer ended. On success, carries the path of the written file.
    Finished {
        id: TransferId,
        result: Result<PathBuf, Error>,
    },
}

impl TransferEvent {
    /// The transfer this event is about.
    pub fn id(&self) -> TransferId {
        match self {
            TransferEvent::Progress { id, .. } | TransferEvent::Finished { id, .. } => *id,
        }
    }
}

/// Receives the events of an engine.
pub trait TransferEventHandler: Send + Sync {
    /// Handle one event. Called on the engine's threads.
    fn handle_event(&self, event: TransferEvent);
}

/// Channel through which an engine reports its events.
///
/// The sink does not keep its receiver alive: once the registry is dropped,
/// events are discarded.
#[derive(Clone)]
pub struct EventSink {
    handler: Weak<dyn TransferEventHandler>,
}

impl fmt::Debug for EventSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventSink")
            .field("connected", &(self.handler.strong_count() > 0))
            .finish()
    }
}

impl EventSink {
    /// Creates a sink delivering to `handler`.
    pub fn new(handler: Weak<dyn TransferEventHandler>) -> Self {
        Self { handler }
    }

    /// Deliver an event.
    pub fn send(&self, event: TransferEvent) {
        match self.handler.upgrade() {
            Some(handler) => handler.handle_event(event),
            None => tracing::debug!("Dropping event for transfer {}: receiver gone", event.id()),
        }
    }

    /// Report that `bytes_written` bytes out of `total_bytes` were written.
    pub fn progress(&self, id: TransferId, bytes_written: u64, total_bytes: Option<u64>) {
        self.send(TransferEvent::Progress {
            id,
            bytes_written,
            total_bytes,
        });
    }

    /// Report the end of a transfer.
    pub fn finished(&self, id: TransferId, result: Result<PathBuf, Error>) {
        self.send(TransferEvent::Finished { id, result });
    }
}

/// Performs the network side of downloads.
pub trait TransferEngine: Send + Sync {
    /// Start a transfer. Must return without waiting for the transfer.
    ///
    /// Events may be delivered before this returns.
    fn start(&self, request: TransferRequest, events: EventSink) -> crate::Result<()>;

    /// Stop a transfer. Unknown ids are ignored.
    fn cancel(&self, id: TransferId);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct Recorder(Mutex<Vec<TransferId>>);

    impl TransferEventHandler for Recorder {
        fn handle_event(&self, event: TransferEvent) {
            self.0.lock().unwrap().push(event.id());
        }
    }

    #[test]
    fn test_sink_delivers_events() {
        let recorder = Arc::new(Recorder::default());
        let handler: Arc<dyn TransferEventHandler> = recorder.clone();
        let sink = EventSink::new(Arc::downgrade(&handler));

        sink.progress(TransferId(1), 10, Some(100));
        sink.finished(TransferId(2), Err(Error::TransferFailed("boom".into())));

        assert_eq!(*recorder.0.lock().unwrap(), vec![TransferId(1), TransferId(2)]);
    }

    #[test]
    fn test_sink_outlived_by_engine() {
        let handler: Arc<dyn TransferEventHandler> = Arc::new(Recorder::default());
        let sink = EventSink::new(Arc::downgrade(&handler));
        drop(handler);

        // Must not panic.
        sink.progress(TransferId(1), 10, None);
        assert!(format!("{:?}", sink).contains("connected: false"));
    }
}

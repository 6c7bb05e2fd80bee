//! The background completion signal.
//!
//! A single slot holding at most one callback, invoked once every
//! background-mode transfer has finished. The slot is replaced by [`set`] and
//! stays set after an invocation, so one callback serves every background
//! session of the process.
//!
//! [`set`]: BackgroundCompletionSignal::set

use std::fmt;
use std::sync::{Arc, Mutex, OnceLock, PoisonError};

/// Callback stored in a [`BackgroundCompletionSignal`].
pub type BackgroundCallback = Arc<dyn Fn() + Send + Sync>;

/// Single-slot callback fired when background transfers are drained.
///
/// Cloning yields another handle on the same slot.
#[derive(Clone, Default)]
pub struct BackgroundCompletionSignal {
    slot: Arc<Mutex<Option<BackgroundCallback>>>,
}

impl fmt::Debug for BackgroundCompletionSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackgroundCompletionSignal")
            .field("set", &self.is_set())
            .finish()
    }
}

impl BackgroundCompletionSignal {
    /// Creates an empty, private slot.
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide slot, used by registries unless told otherwise.
    pub fn global() -> Self {
        static GLOBAL: OnceLock<BackgroundCompletionSignal> = OnceLock::new();
        GLOBAL.get_or_init(BackgroundCompletionSignal::new).clone()
    }

    /// Store `callback`, replacing the previous one.
    pub fn set<F>(&self, callback: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = Some(Arc::new(callback));
    }

    /// Empty the slot.
    pub fn clear(&self) {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }

    /// Whether a callback is stored.
    pub fn is_set(&self) -> bool {
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Run the stored callback, if any. Returns whether one ran.
    pub fn invoke(&self) -> bool {
        // Clone out of the lock so the callback may call `set` itself.
        let callback = self
            .slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        match callback {
            Some(callback) => {
                callback();
                true
            }
            None => false,
        }
    }
}

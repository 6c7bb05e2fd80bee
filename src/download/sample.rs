//! Derived progress metrics.
//!
//! A [`ProgressSample`] captures one progress report of a transfer and turns it
//! into the values observers receive: the completed fraction and the estimated
//! remaining time, both of which are only defined when the total size is known.

use std::time::Duration;

/// One progress report of a transfer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressSample {
    /// Bytes written so far.
    pub bytes_written: u64,
    /// Expected total size, when the server announced one.
    pub total_bytes: Option<u64>,
    /// Time elapsed since the transfer started.
    pub elapsed: Duration,
}

impl ProgressSample {
    /// Create a new [`ProgressSample`].
    pub fn new(bytes_written: u64, total_bytes: Option<u64>, elapsed: Duration) -> Self {
        Self {
            bytes_written,
            total_bytes,
            elapsed,
        }
    }

    fn known_total(&self) -> Option<u64> {
        self.total_bytes.filter(|total| *total > 0)
    }

    /// Fraction complete in `[0.0, 1.0]`, or `None` when the total is unknown.
    pub fn fraction(&self) -> Option<f64> {
        let total = self.known_total()?;
        Some((self.bytes_written as f64 / total as f64).clamp(0.0, 1.0))
    }

    /// Average transfer rate in bytes per second, or `None` before any time
    /// has elapsed.
    pub fn bytes_per_sec(&self) -> Option<f64> {
        let elapsed = self.elapsed.as_secs_f64();
        if elapsed <= 0.0 {
            return None;
        }
        Some(self.bytes_written as f64 / elapsed)
    }

    /// Estimated remaining seconds, rounded to the nearest second.
    ///
    /// `None` when the total is unknown, no time has elapsed or nothing was
    /// written yet.
    pub fn remaining_seconds(&self) -> Option<u64> {
        let total = self.known_total()?;
        let rate = self.bytes_per_sec().filter(|rate| *rate > 0.0)?;
        let remaining = total.saturating_sub(self.bytes_written);
        Some((remaining as f64 / rate).round() as u64)
    }
}

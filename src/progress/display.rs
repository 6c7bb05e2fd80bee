//! Terminal progress bars for registry downloads.
//!
//! [`ProgressDisplay::track`] adds a progress bar observer to a
//! [`DownloadRequest`], next to whatever callbacks the request already has.
//! Every request attached to the same download can be tracked; each gets its
//! own bar.
//!
//! # Examples
//!
//! ```rust
//! use convoy::download::DownloadRequest;
//! use convoy::progress::{ProgressBarOpts, ProgressDisplay};
//!
//! let display = ProgressDisplay::new(ProgressBarOpts::hidden());
//! let request = display.track(
//!     DownloadRequest::new("https://example.com/file.zip")
//!         .on_complete(|completed| println!("completed: {completed}")),
//! );
//! ```

use crate::download::DownloadRequest;
use crate::progress::ProgressBarOpts;

use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget};

/// Resolution of the bars: fractions are shown in tenths of a percent.
const SCALE: u64 = 1000;

/// Coordinates the progress bars of several downloads.
#[derive(Debug, Clone)]
pub struct ProgressDisplay {
    multi: MultiProgress,
    opts: ProgressBarOpts,
}

impl Default for ProgressDisplay {
    fn default() -> Self {
        Self::new(ProgressBarOpts::default())
    }
}

impl ProgressDisplay {
    /// Create a new progress display.
    pub fn new(opts: ProgressBarOpts) -> Self {
        let multi = match opts.is_enabled() {
            true => MultiProgress::new(),
            false => MultiProgress::with_draw_target(ProgressDrawTarget::hidden()),
        };
        Self { multi, opts }
    }

    /// Get the multi-progress instance, to print above the bars.
    pub fn multi(&self) -> &MultiProgress {
        &self.multi
    }

    /// Attach a progress bar to `request`.
    pub fn track(&self, request: DownloadRequest) -> DownloadRequest {
        let bar = self.multi.add(self.opts.clone().to_progress_bar(SCALE));
        let label = request.label().to_string();
        bar.set_message(label.clone());

        let (on_progress, on_remaining, on_complete) = (bar.clone(), bar.clone(), bar);
        let clear = self.opts.clear;
        request
            .also_on_progress(move |fraction| on_progress.set_position(scaled(fraction)))
            .also_on_remaining_time(move |seconds| {
                on_remaining.set_message(format!("{} ({}s left)", label, seconds))
            })
            .also_on_complete(move |completed| finish(&on_complete, completed, clear))
    }
}

fn scaled(fraction: f64) -> u64 {
    (fraction.clamp(0.0, 1.0) * SCALE as f64).round() as u64
}

fn finish(bar: &ProgressBar, completed: bool, clear: bool) {
    match (completed, clear) {
        (true, true) => bar.finish_and_clear(),
        (true, false) => bar.finish(),
        (false, _) => bar.abandon_with_message("failed"),
    }
}

//! Progress module containing progress bar functionality.
//!
//! - `style` - progress bar styling options and templates
//! - `display` - progress bars attached to download requests

pub(crate) mod display;
pub(crate) mod style;

pub use display::ProgressDisplay;
pub use style::ProgressBarOpts;

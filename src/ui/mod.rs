//! Terminal output helpers
//!
//! Consistent step/section formatting with a plain fallback for CI.

pub mod context;
pub mod output;
pub mod progress;

pub use context::UiContext;
pub use output::*;
pub use progress::TaskSpinner;

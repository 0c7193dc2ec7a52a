//! # ov-viz
//!
//! Visualization data artifacts for `overlay`.
//!
//! This crate is intentionally dependency-light and focuses on emitting
//! plot-friendly JSON structures (arrays instead of nested objects).

#![warn(missing_docs)]
#![warn(clippy::all)]

/// Error type shared by artifact builders.
pub mod error;

/// Normalized overlay + ratio artifacts (reference vs compared histograms).
pub mod overlay;

pub use error::{Error, Result};
pub use overlay::{
    ComparedSeries, HistogramSeries, OverlayArtifact, OverlayInputMeta, OverlayMeta,
    OverlayOptions, RatioPolicy,
};

/// Crate version recorded in artifact metadata.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

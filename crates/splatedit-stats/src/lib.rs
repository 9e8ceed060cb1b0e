//! splatedit-stats - Summary statistics for point-cloud cleanup
//!
//! The outlier detector in `splatedit-core` reduces every point to a single
//! number (its mean distance to its nearest neighbours) and then needs the
//! distribution of those numbers:
//!
//! - **SummaryStats**: count, mean, population variance/std-dev, min, max
//! - **Thresholds**: `mean + k * std_dev` cut-offs for one-sided outlier tests
//! - **RobustStats**: median, MAD and robust z-scores

pub mod summary;

pub use summary::*;

// Setup UniFFI when the feature is enabled
#[cfg(feature = "uniffi")]
uniffi::setup_scaffolding!();

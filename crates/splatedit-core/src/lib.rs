//! splatedit-core - Core editing engine for splat point clouds
//!
//! This crate provides the CPU-side data structures behind an interactive
//! point-cloud editor: finding the point under a cursor, and recording which
//! points a tool touched without storing one entry per point.
//!
//! # Key Components
//!
//! - **PointIndex**: balanced kd-tree with filtered nearest, k-nearest and radius queries
//! - **SelectionSet**: run-length packed index set built from a predicate scan
//! - **SortedIdPredicate**: turns a sorted id list into a one-shot scan predicate
//! - **StateOp / EditHistory**: undoable select, hide and delete edits over per-point state
//! - **identify_outliers**: statistical outlier removal driven by k-nearest distances
//!
//! Everything here is synchronous and single-threaded. A built `PointIndex`
//! and any `SelectionSet` are immutable and can be shared across threads.
//!
//! # Example
//!
//! ```
//! use splatedit_core::{PointIndex, SelectionSet};
//!
//! let index = PointIndex::build(&[0.0, 5.0, 10.0], &[0.0; 3], &[0.0; 3]).unwrap();
//! let hit = index.find_nearest([4.0, 0.0, 0.0]);
//! assert_eq!(hit.index, Some(1));
//!
//! let set = SelectionSet::from_predicate(10, |i: usize| matches!(i, 2..=4 | 7)).unwrap();
//! assert_eq!(set.iter().collect::<Vec<_>>(), vec![2, 3, 4, 7]);
//! ```

pub mod config;
pub mod error;
pub mod outliers;
pub mod selection;
pub mod spatial;

pub use config::*;
pub use error::{ConfigError, Result, SelectionError, SpatialError, SplatEditError};
pub use outliers::{identify_outliers, OutlierReport};
pub use selection::*;
pub use spatial::*;

// Setup UniFFI when the feature is enabled
#[cfg(feature = "uniffi")]
uniffi::setup_scaffolding!();

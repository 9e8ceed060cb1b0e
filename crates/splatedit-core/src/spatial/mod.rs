//! Spatial indexing for point-cloud queries
//!
//! Provides a balanced kd-tree over a static cloud for:
//! - Nearest point search with an acceptance filter (picking, brushing)
//! - k-nearest neighbours (outlier statistics)
//! - Radius queries (sphere selection)

pub mod kdtree;

pub use kdtree::{Nearest, Neighbor, NodeId, PointIndex, SpatialNode};

//! kd-tree spatial index
//!
//! A kd-tree splits the cloud at the median along x, y, z in turn (axis =
//! depth mod 3). Nodes live in a flat arena and refer to their children by
//! [`NodeId`], so a built index is plain data: immutable, `Send + Sync`, and
//! safe to query from many threads at once.
//!
//! Queries descend into the child on the query's side of each splitting plane
//! first, then visit the far child only while the plane is no further away
//! than the best candidate so far.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::config::{IndexConfig, PartitionStrategy};
use crate::error::SpatialError;

/// Position of a node in the tree's arena
pub type NodeId = u32;

/// Largest number of points an index can hold (indices fit in 31 bits)
pub const MAX_POINTS: usize = 1 << 31;

const AXIS_NAMES: [&str; 3] = ["x", "y", "z"];

/// One tree node: a point and up to two children
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SpatialNode {
    /// Point index into the cloud
    pub index: u32,
    /// Subtree with coordinates at or below this point on the node's axis
    pub left: Option<NodeId>,
    /// Subtree with coordinates at or above this point on the node's axis
    pub right: Option<NodeId>,
}

impl SpatialNode {
    fn leaf(index: u32) -> Self {
        Self {
            index,
            left: None,
            right: None,
        }
    }
}

/// Result of a nearest point query
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Nearest {
    /// Closest accepted point, `None` when the filter rejected everything
    pub index: Option<usize>,
    /// Squared distance to that point, `f32::INFINITY` when not found
    pub distance_sq: f32,
    /// Nodes visited by the search
    pub visited: usize,
}

impl Nearest {
    /// Index reported by [`index_or_sentinel`](Self::index_or_sentinel) when nothing matched
    pub const NOT_FOUND_INDEX: i64 = -1;

    fn not_found(visited: usize) -> Self {
        Self {
            index: None,
            distance_sq: f32::INFINITY,
            visited,
        }
    }

    /// Whether an accepted point was found
    pub fn is_found(&self) -> bool {
        self.index.is_some()
    }

    /// The found index, or -1
    pub fn index_or_sentinel(&self) -> i64 {
        self.index.map_or(Self::NOT_FOUND_INDEX, |i| i as i64)
    }
}

/// A point returned by k-nearest search
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Neighbor {
    pub index: usize,
    pub distance_sq: f32,
}

/// Max-heap entry for k-nearest search; the worst candidate sits on top
#[derive(Clone, Copy, Debug)]
struct Candidate {
    distance_sq: f32,
    index: usize,
}

impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Candidate {}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        self.distance_sq
            .total_cmp(&other.distance_sq)
            .then(self.index.cmp(&other.index))
    }
}

/// Running best for nearest search
struct Best {
    index: Option<usize>,
    distance_sq: f32,
}

impl Best {
    /// Closer wins; on equal distance the lower index wins
    fn offer(&mut self, index: usize, distance_sq: f32) {
        let better = distance_sq < self.distance_sq
            || (distance_sq == self.distance_sq && self.index.map_or(true, |b| index < b));
        if better {
            self.index = Some(index);
            self.distance_sq = distance_sq;
        }
    }
}

/// Balanced kd-tree over a static 3D point cloud
#[derive(Clone, Debug)]
pub struct PointIndex {
    coords: [Vec<f32>; 3],
    nodes: Vec<SpatialNode>,
    root: NodeId,
    depth: usize,
}

impl PointIndex {
    /// Build an index from parallel coordinate arrays
    pub fn build(x: &[f32], y: &[f32], z: &[f32]) -> Result<Self, SpatialError> {
        Self::build_with_config(x, y, z, &IndexConfig::default())
    }

    /// Build an index from `[x, y, z]` triples
    pub fn from_points(points: &[[f32; 3]]) -> Result<Self, SpatialError> {
        let x: Vec<f32> = points.iter().map(|p| p[0]).collect();
        let y: Vec<f32> = points.iter().map(|p| p[1]).collect();
        let z: Vec<f32> = points.iter().map(|p| p[2]).collect();
        Self::build(&x, &y, &z)
    }

    /// Build an index with custom configuration
    ///
    /// Every coordinate must be finite; a NaN or infinite value fails with
    /// [`SpatialError::InvalidArgument`].
    pub fn build_with_config(
        x: &[f32],
        y: &[f32],
        z: &[f32],
        config: &IndexConfig,
    ) -> Result<Self, SpatialError> {
        if x.len() != y.len() || x.len() != z.len() {
            return Err(SpatialError::InvalidArgument(format!(
                "coordinate arrays differ in length: x={}, y={}, z={}",
                x.len(),
                y.len(),
                z.len()
            )));
        }

        let n = x.len();
        if n == 0 {
            return Err(SpatialError::EmptyIndex);
        }
        if n > MAX_POINTS {
            return Err(SpatialError::InvalidArgument(format!(
                "{} points exceeds the limit of {}",
                n, MAX_POINTS
            )));
        }
        for (axis, values) in [x, y, z].into_iter().enumerate() {
            if let Some(i) = values.iter().position(|v| !v.is_finite()) {
                return Err(SpatialError::InvalidArgument(format!(
                    "point {} has non-finite {} coordinate {}",
                    i,
                    AXIS_NAMES[axis],
                    values[i]
                )));
            }
        }

        let mut builder = TreeBuilder {
            coords: [x, y, z],
            nodes: Vec::with_capacity(n),
            partition: config.partition,
            depth: 0,
        };
        let mut indices: Vec<u32> = (0..n as u32).collect();
        let root = builder.build(&mut indices, 0);
        let TreeBuilder { nodes, depth, .. } = builder;

        tracing::debug!(
            points = n,
            depth,
            partition = ?config.partition,
            "Built point index"
        );

        Ok(Self {
            coords: [x.to_vec(), y.to_vec(), z.to_vec()],
            nodes,
            root,
            depth,
        })
    }

    /// Find the point closest to `point`
    pub fn find_nearest(&self, point: [f32; 3]) -> Nearest {
        self.find_nearest_filtered(point, |_| true)
    }

    /// Find the closest point for which `filter` returns true
    ///
    /// Returns a not-found result (index `None`, distance infinity) when the
    /// filter rejects every point. Among equidistant points the lowest index wins.
    pub fn find_nearest_filtered<F>(&self, point: [f32; 3], mut filter: F) -> Nearest
    where
        F: FnMut(usize) -> bool,
    {
        let mut best = Best {
            index: None,
            distance_sq: f32::INFINITY,
        };
        let mut visited = 0;
        self.nearest_recursive(self.root, 0, point, &mut filter, &mut best, &mut visited);

        match best.index {
            Some(index) => Nearest {
                index: Some(index),
                distance_sq: best.distance_sq,
                visited,
            },
            None => Nearest::not_found(visited),
        }
    }

    fn nearest_recursive<F>(
        &self,
        node_id: NodeId,
        depth: usize,
        query: [f32; 3],
        filter: &mut F,
        best: &mut Best,
        visited: &mut usize,
    ) where
        F: FnMut(usize) -> bool,
    {
        let node = self.nodes[node_id as usize];
        let (plane, near, far) = self.split(&node, depth, query);
        *visited += 1;

        if let Some(near) = near {
            self.nearest_recursive(near, depth + 1, query, filter, best, visited);
        }

        let index = node.index as usize;
        if filter(index) {
            best.offer(index, self.distance_sq(index, query));
        }

        if let Some(far) = far {
            if plane * plane <= best.distance_sq {
                self.nearest_recursive(far, depth + 1, query, filter, best, visited);
            }
        }
    }

    /// Find the `k` closest points accepted by `filter`, nearest first
    ///
    /// Ties are ordered by index. Returns fewer than `k` neighbours when the
    /// filter accepts fewer points.
    pub fn find_k_nearest<F>(&self, point: [f32; 3], k: usize, mut filter: F) -> Vec<Neighbor>
    where
        F: FnMut(usize) -> bool,
    {
        if k == 0 {
            return Vec::new();
        }

        let mut heap = BinaryHeap::with_capacity(k + 1);
        self.knn_recursive(self.root, 0, point, k, &mut filter, &mut heap);

        heap.into_sorted_vec()
            .into_iter()
            .map(|c| Neighbor {
                index: c.index,
                distance_sq: c.distance_sq,
            })
            .collect()
    }

    fn knn_recursive<F>(
        &self,
        node_id: NodeId,
        depth: usize,
        query: [f32; 3],
        k: usize,
        filter: &mut F,
        heap: &mut BinaryHeap<Candidate>,
    ) where
        F: FnMut(usize) -> bool,
    {
        let node = self.nodes[node_id as usize];
        let (plane, near, far) = self.split(&node, depth, query);

        if let Some(near) = near {
            self.knn_recursive(near, depth + 1, query, k, filter, heap);
        }

        let index = node.index as usize;
        if filter(index) {
            let candidate = Candidate {
                distance_sq: self.distance_sq(index, query),
                index,
            };
            if heap.len() < k {
                heap.push(candidate);
            } else if heap.peek().is_some_and(|worst| candidate < *worst) {
                heap.pop();
                heap.push(candidate);
            }
        }

        if let Some(far) = far {
            let within_bound = heap.len() < k
                || heap
                    .peek()
                    .is_some_and(|worst| plane * plane <= worst.distance_sq);
            if within_bound {
                self.knn_recursive(far, depth + 1, query, k, filter, heap);
            }
        }
    }

    /// Find every point accepted by `filter` within `radius`, in ascending index order
    pub fn find_within_radius<F>(&self, point: [f32; 3], radius: f32, mut filter: F) -> Vec<u32>
    where
        F: FnMut(usize) -> bool,
    {
        // also rejects NaN
        if !(radius >= 0.0) {
            return Vec::new();
        }

        let mut results = Vec::new();
        self.radius_recursive(
            self.root,
            0,
            point,
            radius * radius,
            &mut filter,
            &mut results,
        );
        results.sort_unstable();
        results
    }

    fn radius_recursive<F>(
        &self,
        node_id: NodeId,
        depth: usize,
        query: [f32; 3],
        radius_sq: f32,
        filter: &mut F,
        results: &mut Vec<u32>,
    ) where
        F: FnMut(usize) -> bool,
    {
        let node = self.nodes[node_id as usize];
        let (plane, near, far) = self.split(&node, depth, query);

        if let Some(near) = near {
            self.radius_recursive(near, depth + 1, query, radius_sq, filter, results);
        }

        let index = node.index as usize;
        if self.distance_sq(index, query) <= radius_sq && filter(index) {
            results.push(node.index);
        }

        if let Some(far) = far {
            if plane * plane <= radius_sq {
                self.radius_recursive(far, depth + 1, query, radius_sq, filter, results);
            }
        }
    }

    /// Signed distance to the node's splitting plane, then the (near, far) children
    fn split(
        &self,
        node: &SpatialNode,
        depth: usize,
        query: [f32; 3],
    ) -> (f32, Option<NodeId>, Option<NodeId>) {
        let axis = depth % 3;
        let plane = query[axis] - self.coords[axis][node.index as usize];
        if plane > 0.0 {
            (plane, node.right, node.left)
        } else {
            (plane, node.left, node.right)
        }
    }

    fn distance_sq(&self, index: usize, query: [f32; 3]) -> f32 {
        let dx = self.coords[0][index] - query[0];
        let dy = self.coords[1][index] - query[1];
        let dz = self.coords[2][index] - query[2];
        dx * dx + dy * dy + dz * dz
    }

    /// Position of a point
    pub fn position(&self, index: usize) -> Option<[f32; 3]> {
        Some([
            *self.coords[0].get(index)?,
            *self.coords[1].get(index)?,
            *self.coords[2].get(index)?,
        ])
    }

    /// Get the number of points in the index
    pub fn len(&self) -> usize {
        self.coords[0].len()
    }

    /// Always false: an index holds at least one point
    pub fn is_empty(&self) -> bool {
        self.coords[0].is_empty()
    }

    /// Number of nodes in the arena (one per point)
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Depth of the deepest node, root at 0
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Root of the tree
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// The node arena
    pub fn nodes(&self) -> &[SpatialNode] {
        &self.nodes
    }

    /// Splitting axis used at `depth` (0 = x, 1 = y, 2 = z)
    pub fn axis_at(depth: usize) -> usize {
        depth % 3
    }
}

/// Recursive median-split construction into a node arena
struct TreeBuilder<'a> {
    coords: [&'a [f32]; 3],
    nodes: Vec<SpatialNode>,
    partition: PartitionStrategy,
    depth: usize,
}

impl TreeBuilder<'_> {
    fn push(&mut self, index: u32, depth: usize) -> NodeId {
        self.depth = self.depth.max(depth);
        let id = self.nodes.len() as NodeId;
        self.nodes.push(SpatialNode::leaf(index));
        id
    }

    /// Build the subtree for `indices` (never empty) and return its root
    fn build(&mut self, indices: &mut [u32], depth: usize) -> NodeId {
        let values = self.coords[depth % 3];
        let by_axis = |a: &u32, b: &u32| values[*a as usize].total_cmp(&values[*b as usize]);

        match indices.len() {
            1 => self.push(indices[0], depth),
            2 => {
                indices.sort_unstable_by(by_axis);
                let id = self.push(indices[0], depth);
                let right = self.push(indices[1], depth + 1);
                self.nodes[id as usize].right = Some(right);
                id
            }
            3 => {
                indices.sort_unstable_by(by_axis);
                let id = self.push(indices[1], depth);
                let left = self.push(indices[0], depth + 1);
                let right = self.push(indices[2], depth + 1);
                let node = &mut self.nodes[id as usize];
                node.left = Some(left);
                node.right = Some(right);
                id
            }
            4 => {
                indices.sort_unstable_by(by_axis);
                let id = self.push(indices[1], depth);
                let left = self.push(indices[0], depth + 1);
                let right = self.build(&mut indices[2..], depth + 1);
                let node = &mut self.nodes[id as usize];
                node.left = Some(left);
                node.right = Some(right);
                id
            }
            len => {
                let mid = len / 2;
                match self.partition {
                    PartitionStrategy::Sort => indices.sort_unstable_by(by_axis),
                    PartitionStrategy::Select => {
                        indices.select_nth_unstable_by(mid, by_axis);
                    }
                }

                let id = self.push(indices[mid], depth);
                let (lower, upper) = indices.split_at_mut(mid);
                let left = self.build(lower, depth + 1);
                let right = self.build(&mut upper[1..], depth + 1);
                let node = &mut self.nodes[id as usize];
                node.left = Some(left);
                node.right = Some(right);
                id
            }
        }
    }
}

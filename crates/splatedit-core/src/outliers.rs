//! Statistical outlier detection
//!
//! Each candidate point is scored by its mean distance to its `neighbors`
//! nearest fellow candidates. Points scoring more than `std_ratio` standard
//! deviations above the mean score are outliers. Locked points help shape the
//! statistics but are never reported.

use splatedit_stats::SummaryStats;

use crate::config::{OutlierConfig, OutlierMode};
use crate::error::{Result, SpatialError};
use crate::selection::{BitOp, SelectionSet, SplatState, StateOp, StateOpKind};
use crate::spatial::PointIndex;

/// Outcome of [`identify_outliers`]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutlierReport {
    /// Points judged to be outliers
    pub outliers: SelectionSet,
    /// Candidate points that were scored
    pub total_processed: usize,
    /// Number of outliers
    pub total_outliers: usize,
}

impl OutlierReport {
    fn skipped(total_processed: usize) -> Self {
        Self {
            outliers: SelectionSet::new(),
            total_processed,
            total_outliers: 0,
        }
    }

    /// Edit that deletes the reported outliers
    pub fn into_delete_op(self) -> StateOp {
        StateOp::new(
            StateOpKind::DeleteOutliers,
            self.outliers,
            SplatState::DELETED,
            BitOp::Set,
        )
    }
}

/// Find statistical outliers among the points of a cloud
///
/// `state` holds one [`SplatState`] byte per point. Deleted points and points
/// with non-finite coordinates are never candidates.
pub fn identify_outliers(
    x: &[f32],
    y: &[f32],
    z: &[f32],
    state: &[u8],
    config: &OutlierConfig,
) -> Result<OutlierReport> {
    config.validate()?;

    let n = x.len();
    if y.len() != n || z.len() != n || state.len() != n {
        return Err(SpatialError::InvalidArgument(format!(
            "point arrays differ in length: x={}, y={}, z={}, state={}",
            n,
            y.len(),
            z.len(),
            state.len()
        ))
        .into());
    }

    let keep = SplatState::SELECTED | SplatState::LOCKED;
    let mut candidates = Vec::new();
    let (mut cx, mut cy, mut cz) = (Vec::new(), Vec::new(), Vec::new());

    for i in 0..n {
        let flags = SplatState::from_bits_truncate(state[i]);
        if flags.contains(SplatState::DELETED) {
            continue;
        }
        if config.mode == OutlierMode::Selection && !flags.intersects(keep) {
            continue;
        }
        if !(x[i].is_finite() && y[i].is_finite() && z[i].is_finite()) {
            continue;
        }

        candidates.push(i as u32);
        cx.push(x[i]);
        cy.push(y[i]);
        cz.push(z[i]);
    }

    let k = config.neighbors as usize;
    if candidates.len() < k + 1 {
        tracing::warn!(
            candidates = candidates.len(),
            neighbors = k,
            "Too few points for outlier detection"
        );
        return Ok(OutlierReport::skipped(candidates.len()));
    }

    let index = PointIndex::build(&cx, &cy, &cz)?;

    let scores: Vec<f64> = (0..candidates.len())
        .map(|local| {
            let point = [cx[local], cy[local], cz[local]];
            let neighbors = index.find_k_nearest(point, k, |j| j != local);
            if neighbors.is_empty() {
                return 0.0;
            }
            let total: f64 = neighbors
                .iter()
                .map(|nb| f64::from(nb.distance_sq).sqrt())
                .sum();
            total / neighbors.len() as f64
        })
        .collect();

    let stats = SummaryStats::from_data(&scores);
    let outlier_ids: Vec<u32> = scores
        .iter()
        .zip(&candidates)
        .filter(|&(&score, &id)| {
            stats.is_above(score, config.std_ratio)
                && !SplatState::from_bits_truncate(state[id as usize])
                    .contains(SplatState::LOCKED)
        })
        .map(|(_, &id)| id)
        .collect();

    let outliers = SelectionSet::from_sorted_indices(&outlier_ids)?;

    tracing::info!(
        processed = candidates.len(),
        outliers = outlier_ids.len(),
        threshold = stats.upper_threshold(config.std_ratio),
        "Outlier detection finished"
    );

    Ok(OutlierReport {
        outliers,
        total_processed: candidates.len(),
        total_outliers: outlier_ids.len(),
    })
}

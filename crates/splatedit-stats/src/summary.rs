//! Summary statistics over a stream of samples
//!
//! Values are accumulated in a single pass (Welford's update), so callers can
//! feed per-point measurements straight from an iterator without collecting
//! them first. Non-finite samples are counted as missing and otherwise ignored.
//!
//! Order statistics (median, MAD) need the whole sample and live in
//! [`RobustStats`].

use serde::{Deserialize, Serialize};

/// Summary statistics for a numeric sample
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "uniffi", derive(uniffi::Record))]
pub struct SummaryStats {
    /// Number of finite values
    pub count: u64,
    /// Number of NaN/infinite values that were skipped
    pub missing: u64,
    /// Minimum value
    pub min: f64,
    /// Maximum value
    pub max: f64,
    /// Mean (average)
    pub mean: f64,
    /// Population variance (divides by `count`)
    pub variance: f64,
    /// Population standard deviation
    pub std_dev: f64,
}

/// Running accumulator behind [`SummaryStats`]
#[derive(Debug, Clone, Copy)]
pub struct SummaryAccumulator {
    count: u64,
    missing: u64,
    min: f64,
    max: f64,
    mean: f64,
    m2: f64,
}

impl SummaryAccumulator {
    /// Create an empty accumulator
    pub fn new() -> Self {
        Self {
            count: 0,
            missing: 0,
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
            mean: 0.0,
            m2: 0.0,
        }
    }

    /// Add one sample
    pub fn push(&mut self, x: f64) {
        if !x.is_finite() {
            self.missing += 1;
            return;
        }

        self.count += 1;
        let delta = x - self.mean;
        self.mean += delta / self.count as f64;
        self.m2 += delta * (x - self.mean);
        self.min = self.min.min(x);
        self.max = self.max.max(x);
    }

    /// Finish accumulation
    pub fn finish(&self) -> SummaryStats {
        if self.count == 0 {
            return SummaryStats::empty(self.missing);
        }

        let variance = self.m2 / self.count as f64;
        SummaryStats {
            count: self.count,
            missing: self.missing,
            min: self.min,
            max: self.max,
            mean: self.mean,
            variance,
            std_dev: variance.sqrt(),
        }
    }
}

impl Default for SummaryAccumulator {
    fn default() -> Self {
        Self::new()
    }
}

impl Extend<f64> for SummaryAccumulator {
    fn extend<I: IntoIterator<Item = f64>>(&mut self, iter: I) {
        for x in iter {
            self.push(x);
        }
    }
}

impl SummaryStats {
    /// Compute summary statistics from a slice
    pub fn from_data(data: &[f64]) -> Self {
        Self::from_samples(data.iter().copied())
    }

    /// Compute summary statistics from any stream of samples
    pub fn from_samples<I: IntoIterator<Item = f64>>(samples: I) -> Self {
        let mut acc = SummaryAccumulator::new();
        acc.extend(samples);
        acc.finish()
    }

    /// Statistics of an empty sample (all NaN)
    fn empty(missing: u64) -> Self {
        Self {
            count: 0,
            missing,
            min: f64::NAN,
            max: f64::NAN,
            mean: f64::NAN,
            variance: f64::NAN,
            std_dev: f64::NAN,
        }
    }

    /// Whether no finite sample was seen
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Get the range (max - min)
    pub fn range(&self) -> f64 {
        self.max - self.min
    }

    /// Compute z-score for a value; zero when the sample has no spread
    pub fn zscore(&self, x: f64) -> f64 {
        if self.std_dev == 0.0 {
            return 0.0;
        }
        (x - self.mean) / self.std_dev
    }

    /// One-sided cut-off `mean + k * std_dev`
    pub fn upper_threshold(&self, k: f64) -> f64 {
        self.mean + k * self.std_dev
    }

    /// Whether `x` lies strictly above [`upper_threshold`](Self::upper_threshold)
    pub fn is_above(&self, x: f64, k: f64) -> bool {
        x > self.upper_threshold(k)
    }
}

/// Median and median absolute deviation of a sample
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "uniffi", derive(uniffi::Record))]
pub struct RobustStats {
    /// Number of finite values
    pub count: u64,
    /// Median
    pub median: f64,
    /// Median absolute deviation from the median
    pub mad: f64,
}

/// Scale that makes the MAD comparable to a standard deviation for normal data
const MAD_SCALE: f64 = 1.4826;

impl RobustStats {
    /// Compute median and MAD, skipping non-finite values
    pub fn from_data(data: &[f64]) -> Self {
        let mut sorted: Vec<f64> = data.iter().copied().filter(|x| x.is_finite()).collect();
        if sorted.is_empty() {
            return Self {
                count: 0,
                median: f64::NAN,
                mad: f64::NAN,
            };
        }

        sorted.sort_unstable_by(f64::total_cmp);
        let median = median_of_sorted(&sorted);

        let mut deviations: Vec<f64> = sorted.iter().map(|x| (x - median).abs()).collect();
        deviations.sort_unstable_by(f64::total_cmp);
        let mad = median_of_sorted(&deviations);

        Self {
            count: sorted.len() as u64,
            median,
            mad,
        }
    }

    /// Robust z-score `(x - median) / (1.4826 * MAD)`; zero when the MAD is zero
    pub fn robust_zscore(&self, x: f64) -> f64 {
        if self.mad == 0.0 {
            return 0.0;
        }
        (x - self.median) / (MAD_SCALE * self.mad)
    }
}

fn median_of_sorted(sorted: &[f64]) -> f64 {
    let n = sorted.len();
    if n % 2 == 0 {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    } else {
        sorted[n / 2]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_summary_stats_basic() {
        let data: Vec<f64> = (1..=10).map(|x| x as f64).collect();
        let stats = SummaryStats::from_data(&data);

        assert_eq!(stats.count, 10);
        assert_eq!(stats.min, 1.0);
        assert_eq!(stats.max, 10.0);
        assert!((stats.mean - 5.5).abs() < 1e-10);
        assert!((stats.variance - 8.25).abs() < 1e-10);
    }

    #[test]
    fn test_summary_stats_with_nan() {
        let data = vec![1.0, 2.0, f64::NAN, 4.0, f64::INFINITY, 5.0];
        let stats = SummaryStats::from_data(&data);

        assert_eq!(stats.count, 4);
        assert_eq!(stats.missing, 2);
        assert_eq!(stats.min, 1.0);
        assert_eq!(stats.max, 5.0);
    }

    #[test]
    fn test_empty_sample() {
        let stats = SummaryStats::from_data(&[]);
        assert!(stats.is_empty());
        assert!(stats.mean.is_nan());
        assert!(!stats.is_above(1.0, 2.0));
    }

    #[test]
    fn test_constant_sample_has_no_spread() {
        let stats = SummaryStats::from_data(&[3.0; 8]);
        assert_eq!(stats.std_dev, 0.0);
        assert_eq!(stats.zscore(10.0), 0.0);
        assert_eq!(stats.upper_threshold(2.0), 3.0);
    }

    #[rstest]
    #[case(0.0, 3.0)]
    #[case(1.0, 3.0 + 2.0_f64.sqrt())]
    #[case(2.0, 3.0 + 2.0 * 2.0_f64.sqrt())]
    fn test_upper_threshold(#[case] k: f64, #[case] expected: f64) {
        // mean 3, population variance 2
        let stats = SummaryStats::from_data(&[1.0, 2.0, 3.0, 4.0, 5.0]);
        assert!((stats.upper_threshold(k) - expected).abs() < 1e-10);
    }

    #[test]
    fn test_streaming_matches_slice() {
        let data = [0.5, 7.25, 3.0, 3.0, 11.0, -2.0];
        let mut acc = SummaryAccumulator::new();
        for &x in &data {
            acc.push(x);
        }
        let streamed = acc.finish();
        let direct = SummaryStats::from_data(&data);

        assert_eq!(streamed.count, direct.count);
        assert!((streamed.mean - direct.mean).abs() < 1e-12);
        assert!((streamed.variance - direct.variance).abs() < 1e-12);
    }

    #[rstest]
    #[case(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0], 5.5, 2.5)]
    #[case(&[3.0, 1.0, 2.0], 2.0, 1.0)]
    #[case(&[1.0, 1.0, 2.0, 2.0, 4.0, 6.0, 9.0], 2.0, 1.0)]
    fn test_median_and_mad(#[case] data: &[f64], #[case] median: f64, #[case] mad: f64) {
        let robust = RobustStats::from_data(data);
        assert_eq!(robust.count, data.len() as u64);
        assert_eq!(robust.median, median);
        assert_eq!(robust.mad, mad);
    }

    #[test]
    fn test_robust_ignores_non_finite() {
        let robust = RobustStats::from_data(&[f64::NAN, 4.0, f64::NEG_INFINITY, 2.0, 9.0]);
        assert_eq!(robust.count, 3);
        assert_eq!(robust.median, 4.0);
        assert_eq!(robust.mad, 2.0);

        let empty = RobustStats::from_data(&[f64::NAN]);
        assert_eq!(empty.count, 0);
        assert!(empty.median.is_nan());
    }

    #[test]
    fn test_robust_zscore() {
        let robust = RobustStats::from_data(&[1.0, 2.0, 3.0, 4.0, 5.0]);
        assert!((robust.robust_zscore(5.0) - 2.0 / 1.4826).abs() < 1e-12);
        assert_eq!(RobustStats::from_data(&[7.0; 4]).robust_zscore(100.0), 0.0);
    }
}

//! Summary statistics that tolerate missing values.
//!
//! Log-transformed expression values are `NaN` wherever the transform is
//! undefined, and survival inputs use `NaN` for unknown lifetimes. The
//! summaries here skip `NaN` entries and report how many were skipped, so a
//! caller can tell "no data" apart from "all data missing".

use serde::Serialize;

/// Summary of the non-`NaN` values of a sample.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DescriptiveStats {
    /// Number of values summarised (excluding `NaN`).
    pub count: usize,
    /// Number of `NaN` values skipped.
    pub missing: usize,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    /// Middle value, or the mean of the two middle values for even counts.
    pub median: f64,
    /// Sample variance (`n - 1` denominator); zero for a single value.
    pub variance: f64,
    pub std_dev: f64,
}

impl DescriptiveStats {
    /// Summarises `values`, skipping `NaN`.
    ///
    /// Returns `None` when no value is left after skipping.
    ///
    /// # Examples
    ///
    /// ```
    /// use exprkit_stats::descriptive::DescriptiveStats;
    ///
    /// let stats = DescriptiveStats::from_values([4.0, f64::NAN, 1.0, 3.0, 2.0]).unwrap();
    /// assert_eq!(stats.count, 4);
    /// assert_eq!(stats.missing, 1);
    /// assert_eq!(stats.median, 2.5);
    /// assert!((stats.mean - 2.5).abs() < 1e-12);
    ///
    /// assert_eq!(DescriptiveStats::from_values([f64::NAN]), None);
    /// ```
    #[expect(clippy::cast_precision_loss)]
    #[must_use]
    pub fn from_values<I>(values: I) -> Option<Self>
    where
        I: IntoIterator<Item = f64>,
    {
        let mut present = vec![];
        let mut missing = 0;
        // Welford's running mean and sum of squared deviations
        let (mut mean, mut m2) = (0.0, 0.0);
        let (mut min, mut max) = (f64::INFINITY, f64::NEG_INFINITY);
        for value in values {
            if value.is_nan() {
                missing += 1;
                continue;
            }
            present.push(value);
            let delta = value - mean;
            mean += delta / present.len() as f64;
            m2 += delta * (value - mean);
            min = min.min(value);
            max = max.max(value);
        }

        let count = present.len();
        if count == 0 {
            return None;
        }
        let variance = if count > 1 {
            m2 / (count - 1) as f64
        } else {
            0.0
        };

        Some(Self {
            count,
            missing,
            min,
            max,
            mean,
            median: median_of(&mut present),
            variance,
            std_dev: variance.sqrt(),
        })
    }

    /// Difference between the largest and smallest value.
    #[must_use]
    pub fn range(&self) -> f64 {
        self.max - self.min
    }
}

fn median_of(values: &mut [f64]) -> f64 {
    let len = values.len();
    let mid = len / 2;
    let (lower, &mut upper, _) = values.select_nth_unstable_by(mid, f64::total_cmp);
    if len % 2 == 0 {
        let below = lower.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        (below + upper) / 2.0
    } else {
        upper
    }
}

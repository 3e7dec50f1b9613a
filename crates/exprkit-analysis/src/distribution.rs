//! Per-sample summaries of log-count distributions.
//!
//! Comparing these summaries before and after normalization shows whether
//! the samples have been brought onto a common scale: after quantile
//! normalization every sample reports the same percentiles.

use exprkit_stats::{
    descriptive::DescriptiveStats,
    percentiles::{PercentileError, Percentiles},
};
use serde::Serialize;

use crate::table::ExpressionTable;

/// Percentiles reported when the caller does not choose any.
pub const DEFAULT_PERCENTILES: [f64; 5] = [5.0, 25.0, 50.0, 75.0, 95.0];

/// Distribution of `log2(count + 1)` within one sample.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SampleDistribution {
    pub sample: String,
    /// `None` when the table has no genes.
    pub stats: Option<DescriptiveStats>,
    /// `None` when the table has no genes.
    pub percentiles: Option<Percentiles>,
}

impl SampleDistribution {
    /// Summarises every sample (column) of `table`.
    ///
    /// Fails if a requested percentile is outside `0..=100`, even when the
    /// table has no genes.
    ///
    /// # Examples
    ///
    /// ```
    /// use exprkit_analysis::{distribution::SampleDistribution, table::ExpressionTable};
    /// use ndarray::array;
    ///
    /// let table = ExpressionTable::new(
    ///     vec!["g1".into(), "g2".into()],
    ///     vec!["s1".into()],
    ///     array![[1.0], [7.0]],
    /// )
    /// .unwrap();
    /// // log2 values are 1 and 3
    /// let dists = SampleDistribution::from_table(&table, &[50.0]).unwrap();
    /// assert_eq!(dists[0].percentiles.as_ref().unwrap().get(50.0), Some(2.0));
    /// ```
    pub fn from_table(
        table: &ExpressionTable,
        percentile_points: &[f64],
    ) -> Result<Vec<Self>, PercentileError> {
        if let Some(&percentile) = percentile_points
            .iter()
            .find(|p| !(0.0..=100.0).contains(*p))
        {
            return Err(PercentileError::OutOfRange { percentile });
        }

        table
            .samples()
            .iter()
            .zip(table.counts().columns())
            .map(|(sample, counts)| {
                let log_counts = counts.mapv(|count| (count + 1.0).log2()).to_vec();
                let percentiles = if log_counts.is_empty() {
                    None
                } else {
                    Some(Percentiles::compute(&log_counts, percentile_points)?)
                };
                Ok::<_, PercentileError>(Self {
                    sample: sample.clone(),
                    stats: DescriptiveStats::from_values(log_counts),
                    percentiles,
                })
            })
            .collect()
    }
}

/// Largest difference between samples at any shared percentile.
///
/// Zero means every sample reports identical percentiles. Samples without
/// percentiles (empty tables) are ignored.
#[must_use]
pub fn max_percentile_spread(distributions: &[SampleDistribution]) -> f64 {
    let Some(first) = distributions.iter().find_map(|d| d.percentiles.as_ref()) else {
        return 0.0;
    };
    first
        .iter()
        .map(|(p, _)| {
            let values = distributions
                .iter()
                .filter_map(|d| d.percentiles.as_ref()?.get(p));
            let (lo, hi) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
                (lo.min(v), hi.max(v))
            });
            if lo <= hi { hi - lo } else { 0.0 }
        })
        .fold(0.0, f64::max)
}

#[cfg(test)]
mod tests {
    use ndarray::array;

    use super::*;
    use crate::normalize;

    fn table() -> ExpressionTable {
        ExpressionTable::new(
            vec!["g1".into(), "g2".into(), "g3".into(), "g4".into()],
            vec!["shallow".into(), "deep".into()],
            array![[0.0, 10.0], [3.0, 60.0], [15.0, 250.0], [7.0, 1000.0]],
        )
        .unwrap()
    }

    #[test]
    fn test_raw_samples_differ() {
        let dists = SampleDistribution::from_table(&table(), &DEFAULT_PERCENTILES).unwrap();
        assert_eq!(dists.len(), 2);
        assert_eq!(dists[0].sample, "shallow");
        assert_eq!(dists[0].stats.as_ref().unwrap().max, 4.0);
        assert!(max_percentile_spread(&dists) > 1.0);
    }

    #[test]
    fn test_quantile_normalized_samples_agree() {
        let normalized = normalize::quantile_normalize(&table()).unwrap();
        let dists = SampleDistribution::from_table(&normalized, &DEFAULT_PERCENTILES).unwrap();
        assert_eq!(max_percentile_spread(&dists), 0.0);
    }

    #[test]
    fn test_empty_table() {
        let empty = table().filter_genes(|_, _| false);
        let dists = SampleDistribution::from_table(&empty, &[50.0]).unwrap();
        assert!(dists.iter().all(|d| d.stats.is_none() && d.percentiles.is_none()));
        assert_eq!(max_percentile_spread(&dists), 0.0);
        assert_eq!(max_percentile_spread(&[]), 0.0);
    }

    #[test]
    fn test_rejects_invalid_percentile_points() {
        let err = SampleDistribution::from_table(&table(), &[50.0, 150.0]).unwrap_err();
        assert_eq!(err, PercentileError::OutOfRange { percentile: 150.0 });

        let empty = table().filter_genes(|_, _| false);
        assert!(SampleDistribution::from_table(&empty, &[-1.0]).is_err());
    }
}

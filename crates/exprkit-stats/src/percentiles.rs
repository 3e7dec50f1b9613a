//! Percentiles by linear interpolation between order statistics.
//!
//! For `n` sorted values the `p`-th percentile sits at fractional position
//! `h = (n - 1) * p / 100`; the result interpolates between the values at
//! `floor(h)` and `ceil(h)`. This is the default method of R (`type = 7`) and
//! NumPy, so summaries can be checked against either.

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, derive_more::Display, derive_more::Error)]
pub enum PercentileError {
    #[display("cannot take percentiles of an empty sample")]
    Empty,
    #[display("percentile {percentile} is outside 0..=100")]
    OutOfRange { percentile: f64 },
}

/// Requested percentiles of one sample.
///
/// # Examples
///
/// ```
/// use exprkit_stats::percentiles::Percentiles;
///
/// let values = [10.0, 40.0, f64::NAN, 20.0, 30.0];
/// let percentiles = Percentiles::compute(&values, &[0.0, 50.0, 100.0]).unwrap();
///
/// assert_eq!(percentiles.get(50.0), Some(25.0));
/// assert_eq!(percentiles.get(100.0), Some(40.0));
/// assert_eq!(percentiles.get(90.0), None);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Percentiles {
    /// `(percentile, value)` in the order requested.
    points: Vec<(f64, f64)>,
}

impl Percentiles {
    /// Computes each of `percentiles` over the non-`NaN` entries of `values`.
    pub fn compute(values: &[f64], percentiles: &[f64]) -> Result<Self, PercentileError> {
        let mut sorted = values
            .iter()
            .copied()
            .filter(|v| !v.is_nan())
            .collect::<Vec<_>>();
        sorted.sort_by(f64::total_cmp);

        let points = percentiles
            .iter()
            .map(|&p| Ok((p, interpolate(&sorted, p)?)))
            .collect::<Result<_, _>>()?;
        Ok(Self { points })
    }

    #[must_use]
    pub fn get(&self, percentile: f64) -> Option<f64> {
        self.points
            .iter()
            .find(|(p, _)| p.total_cmp(&percentile).is_eq())
            .map(|&(_, value)| value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.points.iter().copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Interpolated `percentile` of ascending, `NaN`-free `sorted` values.
///
/// # Examples
///
/// ```
/// use exprkit_stats::percentiles::interpolate;
///
/// let sorted = [1.0, 2.0, 3.0, 4.0];
/// assert_eq!(interpolate(&sorted, 50.0).unwrap(), 2.5);
/// assert_eq!(interpolate(&sorted, 0.0).unwrap(), 1.0);
/// assert!(interpolate(&[], 50.0).is_err());
/// ```
#[expect(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
pub fn interpolate(sorted: &[f64], percentile: f64) -> Result<f64, PercentileError> {
    if !(0.0..=100.0).contains(&percentile) {
        return Err(PercentileError::OutOfRange { percentile });
    }
    let last = sorted.len().checked_sub(1).ok_or(PercentileError::Empty)?;

    let position = last as f64 * percentile / 100.0;
    let lo = position.floor() as usize;
    let hi = (lo + 1).min(last);
    let frac = position - position.floor();
    Ok(sorted[lo] + frac * (sorted[hi] - sorted[lo]))
}

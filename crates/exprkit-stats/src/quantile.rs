//! Quantile normalization of expression count matrices.
//!
//! Matrices follow the expression convention: rows are genes (features) and
//! columns are samples. Quantile normalization forces every column to share
//! one value distribution, the "average column" obtained by sorting each
//! column and averaging the sorted columns row by row.
//!
//! # Algorithm
//!
//! For a count matrix `X` of shape `M x N`:
//!
//! 1. `L = log2(X + 1)`
//! 2. sort every column of `L` ascending
//! 3. `Q[i]` = mean of the i-th smallest log value across samples
//! 4. rank every column of `X` (see [`rank`](crate::rank) for the tie rule)
//! 5. `LogXn[r, c] = Q[rank[r, c]]`
//! 6. `Xn = round(2^LogXn - 1)`, clamped at zero
//!
//! # Examples
//!
//! ```
//! use exprkit_stats::quantile::quantile_normalize;
//! use ndarray::array;
//!
//! let counts = array![[0.0, 10.0], [3.0, 1.0], [7.0, 3.0]];
//! let normalized = quantile_normalize(counts.view()).unwrap();
//!
//! assert_eq!(normalized.dim(), (3, 2));
//! let mut first = normalized.column(0).to_vec();
//! let mut second = normalized.column(1).to_vec();
//! first.sort_unstable();
//! second.sort_unstable();
//! assert_eq!(first, second);
//! ```

use ndarray::{Array1, Array2, ArrayView2};

use crate::rank;

/// Errors raised by quantile normalization.
#[derive(Debug, Clone, PartialEq, derive_more::Display, derive_more::Error)]
pub enum QuantileNormalizeError {
    #[display("expression matrix must have at least one gene and one sample, got {rows}x{cols}")]
    Shape { rows: usize, cols: usize },
    #[display("invalid value {value} at gene {row}, sample {col}")]
    Domain { row: usize, col: usize, value: f64 },
}

/// Quantile normalization result with its intermediate arrays.
///
/// [`quantile_normalize`] returns only [`counts`](Self::counts); this type
/// keeps the log-space pieces for inspection and plotting.
#[derive(Debug, Clone, PartialEq)]
pub struct QuantileNormalization {
    /// Target distribution in `log2(x + 1)` space, ascending, one entry per gene.
    pub quantiles: Array1<f64>,
    /// Rank of every input value within its column.
    pub ranks: Array2<usize>,
    /// `quantiles[ranks[r, c]]` for every entry.
    pub log_normalized: Array2<f64>,
    /// Normalized integer counts.
    pub counts: Array2<u64>,
}

impl QuantileNormalization {
    /// Quantile normalizes a count matrix.
    ///
    /// Counts must be finite and non-negative. The input is not modified.
    ///
    /// # Examples
    ///
    /// ```
    /// use exprkit_stats::quantile::QuantileNormalization;
    /// use ndarray::array;
    ///
    /// let counts = array![[1.0, 3.0], [3.0, 15.0]];
    /// let result = QuantileNormalization::from_counts(counts.view()).unwrap();
    ///
    /// // log2(1+1) = 1, log2(3+1) = 2, log2(15+1) = 4
    /// assert_eq!(result.quantiles.to_vec(), vec![1.5, 3.0]);
    /// assert_eq!(result.ranks, array![[0, 0], [1, 1]]);
    /// ```
    pub fn from_counts(counts: ArrayView2<'_, f64>) -> Result<Self, QuantileNormalizeError> {
        check_shape(counts)?;
        check_values(counts, |value| value >= 0.0)?;

        let log_counts = counts.mapv(|value| (value + 1.0).log2());
        let quantiles = sorted_column_means(log_counts.view());
        let ranks = rank::column_ranks(counts);
        let log_normalized = ranks.mapv(|r| quantiles[r]);
        let counts = log_normalized.mapv(log_to_count);

        Ok(Self {
            quantiles,
            ranks,
            log_normalized,
            counts,
        })
    }
}

/// Quantile normalizes a count matrix in `log2(x + 1)` space and returns
/// integer counts of the same shape.
///
/// Fails with [`QuantileNormalizeError::Shape`] for a matrix without rows or
/// columns and [`QuantileNormalizeError::Domain`] for negative, `NaN` or
/// infinite entries.
pub fn quantile_normalize(
    counts: ArrayView2<'_, f64>,
) -> Result<Array2<u64>, QuantileNormalizeError> {
    QuantileNormalization::from_counts(counts).map(|result| result.counts)
}

/// Quantile normalizes an arbitrary finite matrix without any transform.
///
/// Every entry is replaced by the mean of the values sharing its rank across
/// columns.
///
/// # Examples
///
/// ```
/// use exprkit_stats::quantile::quantile_normalize_values;
/// use ndarray::array;
///
/// let values = array![[2.0, 4.0], [1.0, 6.0]];
/// let normalized = quantile_normalize_values(values.view()).unwrap();
/// assert_eq!(normalized, array![[4.0, 2.5], [2.5, 4.0]]);
/// ```
pub fn quantile_normalize_values(
    values: ArrayView2<'_, f64>,
) -> Result<Array2<f64>, QuantileNormalizeError> {
    check_shape(values)?;
    check_values(values, |_| true)?;

    let quantiles = sorted_column_means(values);
    let ranks = rank::column_ranks(values);
    Ok(ranks.mapv(|r| quantiles[r]))
}

/// Computes the quantile vector (row-wise mean of the column-sorted matrix).
pub fn quantile_vector(values: ArrayView2<'_, f64>) -> Result<Array1<f64>, QuantileNormalizeError> {
    check_shape(values)?;
    check_values(values, |_| true)?;
    Ok(sorted_column_means(values))
}

#[expect(clippy::cast_precision_loss)]
fn sorted_column_means(values: ArrayView2<'_, f64>) -> Array1<f64> {
    let (rows, cols) = values.dim();
    let mut sums = Array1::<f64>::zeros(rows);
    for column in values.columns() {
        let mut sorted = column.to_vec();
        sorted.sort_by(f64::total_cmp);
        sums += &Array1::from(sorted);
    }
    sums / cols as f64
}

#[expect(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn log_to_count(log_value: f64) -> u64 {
    let count = (log_value.exp2() - 1.0).round();
    // `-0.0` and tiny negatives from floating error at the zero boundary
    if count > 0.0 { count as u64 } else { 0 }
}

fn check_shape(values: ArrayView2<'_, f64>) -> Result<(), QuantileNormalizeError> {
    let (rows, cols) = values.dim();
    if rows == 0 || cols == 0 {
        return Err(QuantileNormalizeError::Shape { rows, cols });
    }
    Ok(())
}

fn check_values<F>(values: ArrayView2<'_, f64>, valid: F) -> Result<(), QuantileNormalizeError>
where
    F: Fn(f64) -> bool,
{
    match values
        .indexed_iter()
        .find(|(_, value)| !value.is_finite() || !valid(**value))
    {
        Some(((row, col), &value)) => Err(QuantileNormalizeError::Domain { row, col, value }),
        None => Ok(()),
    }
}

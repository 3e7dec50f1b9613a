//! Ranking of values within a sample.
//!
//! Ranks are 0-based positions in ascending order. Tied values share the mean
//! of the positions they occupy, so `[3.0, 1.0, 1.0]` ranks as `[2.0, 0.5, 0.5]`.
//!
//! Quantile normalization needs integer ranks to index the quantile vector.
//! [`rounded_ranks`] rounds the average rank to the nearest integer, with
//! halves rounded away from zero (`0.5 -> 1`, `2.5 -> 3`). Two tie groups can
//! therefore collapse onto the same integer, and a tie group never spreads
//! over several quantiles. Both effects are accepted approximations; data
//! without ties is ranked exactly.

use ndarray::{Array1, Array2, ArrayView2};

/// Computes 0-based average ranks of `values`.
///
/// The sort is stable and uses [`f64::total_cmp`], so `-0.0` and `0.0` end up
/// adjacent and are treated as ties. `NaN` values are ordered last and never
/// tie with anything.
///
/// # Examples
///
/// ```
/// use exprkit_stats::rank::average_ranks;
///
/// assert_eq!(average_ranks(&[30.0, 10.0, 20.0]), vec![2.0, 0.0, 1.0]);
/// assert_eq!(average_ranks(&[4.0, 1.0, 4.0, 2.0]), vec![2.5, 0.0, 2.5, 1.0]);
/// ```
#[expect(clippy::cast_precision_loss)]
#[must_use]
pub fn average_ranks(values: &[f64]) -> Vec<f64> {
    let mut order = (0..values.len()).collect::<Vec<_>>();
    order.sort_by(|&a, &b| values[a].total_cmp(&values[b]));

    let mut ranks = vec![0.0; values.len()];
    let mut start = 0;
    while start < order.len() {
        let value = values[order[start]];
        let mut end = start + 1;
        // sorted ascending, so `<=` only holds for equal values
        while end < order.len() && values[order[end]] <= value {
            end += 1;
        }
        let rank = (start + end - 1) as f64 / 2.0;
        for &idx in &order[start..end] {
            ranks[idx] = rank;
        }
        start = end;
    }
    ranks
}

/// Computes 0-based ranks of `values`, rounding tied averages to the nearest
/// integer.
///
/// # Examples
///
/// ```
/// use exprkit_stats::rank::rounded_ranks;
///
/// // the two 4.0s occupy positions 2 and 3, mean 2.5 rounds to 3
/// assert_eq!(rounded_ranks(&[4.0, 1.0, 4.0, 2.0]), vec![3, 0, 3, 1]);
/// ```
#[expect(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
#[must_use]
pub fn rounded_ranks(values: &[f64]) -> Vec<usize> {
    average_ranks(values)
        .into_iter()
        .map(|rank| rank.round() as usize)
        .collect()
}

/// Ranks every column of `matrix` independently.
///
/// The result has the shape of `matrix`; each entry holds the rounded rank of
/// the corresponding value within its column.
#[must_use]
pub fn column_ranks(matrix: ArrayView2<'_, f64>) -> Array2<usize> {
    let mut ranks = Array2::<usize>::zeros(matrix.dim());
    for (col, column) in matrix.columns().into_iter().enumerate() {
        let values = column.to_vec();
        ranks
            .column_mut(col)
            .assign(&Array1::from(rounded_ranks(&values)));
    }
    ranks
}

#[cfg(test)]
mod tests {
    use ndarray::array;

    use super::*;

    #[test]
    fn test_empty_values() {
        assert!(average_ranks(&[]).is_empty());
        assert!(rounded_ranks(&[]).is_empty());
    }

    #[test]
    fn test_distinct_values_are_permutation() {
        let values = [0.3, 9.0, 1.5, 7.25, 0.0];
        let mut ranks = rounded_ranks(&values);
        assert_eq!(ranks, vec![1, 4, 2, 3, 0]);
        ranks.sort_unstable();
        assert_eq!(ranks, (0..values.len()).collect::<Vec<_>>());
    }

    #[test]
    fn test_ties_share_mean_position() {
        let ranks = average_ranks(&[5.0, 5.0, 5.0, 1.0]);
        assert_eq!(ranks, vec![2.0, 2.0, 2.0, 0.0]);
    }

    #[test]
    fn test_half_ranks_round_up() {
        // positions 0 and 1 tie -> 0.5 -> 1
        assert_eq!(rounded_ranks(&[2.0, 2.0, 3.0]), vec![1, 1, 2]);
    }

    #[test]
    fn test_signed_zero_ties() {
        assert_eq!(average_ranks(&[0.0, -0.0, 1.0]), vec![0.5, 0.5, 2.0]);
    }

    #[test]
    fn test_ranks_stay_in_bounds() {
        let values = [1.0, 1.0, 1.0, 1.0, 1.0];
        let ranks = rounded_ranks(&values);
        assert!(ranks.iter().all(|&r| r < values.len()));
    }

    #[test]
    fn test_column_ranks() {
        let matrix = array![[5.0, 4.0, 3.0], [2.0, 1.0, 4.0], [3.0, 4.0, 6.0], [4.0, 2.0, 8.0]];
        let ranks = column_ranks(matrix.view());
        assert_eq!(ranks, array![[3, 3, 0], [0, 0, 1], [1, 3, 2], [2, 1, 3]]);
    }
}

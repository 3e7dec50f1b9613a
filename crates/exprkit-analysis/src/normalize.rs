//! Between-sample normalization of expression tables.
//!
//! Raw counts are not comparable across samples: a sample sequenced twice as
//! deeply has roughly twice the counts for every gene, and longer genes
//! collect more reads than shorter ones at the same expression level.
//!
//! - [`counts_per_million`] divides by library size
//! - [`rpkm`] divides by library size and gene length
//! - [`quantile_normalize`] forces every sample onto the same distribution
//!
//! Every function returns a new table with the same labels.

use std::collections::HashMap;

use exprkit_stats::quantile::{self, QuantileNormalizeError};
use log::debug;
use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::table::{ExpressionTable, TableError};

#[derive(Debug, derive_more::Display, derive_more::Error, derive_more::From)]
pub enum NormalizeError {
    #[display("RPKM requires a gene length table")]
    NoLengthTable,
    #[display("no length known for gene '{gene}'")]
    MissingLength { gene: String },
    #[display("invalid length {length} for gene '{gene}'")]
    InvalidLength { gene: String, length: f64 },
    #[display("sample '{sample}' has library size {size}")]
    LibrarySize { sample: String, size: f64 },
    #[display("{_0}")]
    #[from]
    Quantile(QuantileNormalizeError),
    #[display("{_0}")]
    #[from]
    Table(TableError),
}

/// Gene lengths in bases, keyed by gene id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GeneLengths {
    lengths: HashMap<String, f64>,
}

impl GeneLengths {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a length, returning the previous one for `gene` if any.
    pub fn insert(&mut self, gene: String, length: f64) -> Option<f64> {
        self.lengths.insert(gene, length)
    }

    #[must_use]
    pub fn get(&self, gene: &str) -> Option<f64> {
        self.lengths.get(gene).copied()
    }

    #[must_use]
    pub fn contains(&self, gene: &str) -> bool {
        self.lengths.contains_key(gene)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lengths.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lengths.is_empty()
    }
}

impl FromIterator<(String, f64)> for GeneLengths {
    fn from_iter<T: IntoIterator<Item = (String, f64)>>(iter: T) -> Self {
        Self {
            lengths: iter.into_iter().collect(),
        }
    }
}

/// Normalization applied by the [`pipeline`](crate::pipeline).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NormalizationMethod {
    /// Quantile normalization in `log2(x + 1)` space.
    #[default]
    Quantile,
    /// Counts per million mapped reads.
    Cpm,
    /// Reads per kilobase of transcript per million mapped reads.
    Rpkm,
    /// Keep raw counts.
    None,
}

impl NormalizationMethod {
    /// Applies the method to `table`. RPKM requires `lengths`.
    pub fn apply(
        self,
        table: &ExpressionTable,
        lengths: Option<&GeneLengths>,
    ) -> Result<ExpressionTable, NormalizeError> {
        match self {
            Self::Quantile => quantile_normalize(table),
            Self::Cpm => counts_per_million(table),
            Self::Rpkm => rpkm(table, lengths.ok_or(NormalizeError::NoLengthTable)?),
            Self::None => Ok(table.clone()),
        }
    }
}

/// Scales every sample to one million total counts.
///
/// # Examples
///
/// ```
/// use exprkit_analysis::{normalize::counts_per_million, table::ExpressionTable};
/// use ndarray::array;
///
/// let table = ExpressionTable::new(
///     vec!["g1".into(), "g2".into()],
///     vec!["s1".into()],
///     array![[1.0], [3.0]],
/// )
/// .unwrap();
/// let cpm = counts_per_million(&table).unwrap();
/// assert_eq!(cpm.counts().column(0).to_vec(), vec![250_000.0, 750_000.0]);
/// ```
pub fn counts_per_million(table: &ExpressionTable) -> Result<ExpressionTable, NormalizeError> {
    let library_sizes = library_sizes(table)?;
    let mut scaled = table.counts().to_owned();
    for (mut column, size) in scaled.columns_mut().into_iter().zip(&library_sizes) {
        column.mapv_inplace(|count| count * 1e6 / size);
    }
    debug!("scaled {} samples to counts per million", table.n_samples());
    Ok(table.with_counts(scaled)?)
}

/// Computes RPKM: `1e9 * count / (gene_length * library_size)`.
///
/// Every gene in `table` must have a positive, finite length.
pub fn rpkm(
    table: &ExpressionTable,
    lengths: &GeneLengths,
) -> Result<ExpressionTable, NormalizeError> {
    let gene_lengths = table
        .genes()
        .iter()
        .map(|gene| {
            let length = lengths
                .get(gene)
                .ok_or_else(|| NormalizeError::MissingLength { gene: gene.clone() })?;
            if !length.is_finite() || length <= 0.0 {
                return Err(NormalizeError::InvalidLength {
                    gene: gene.clone(),
                    length,
                });
            }
            Ok(length)
        })
        .collect::<Result<Vec<_>, _>>()?;
    let library_sizes = library_sizes(table)?;

    let counts = table.counts();
    let scaled = Array2::from_shape_fn(counts.dim(), |(row, col)| {
        1e9 * counts[[row, col]] / (gene_lengths[row] * library_sizes[col])
    });
    debug!(
        "computed RPKM for {} genes x {} samples",
        table.n_genes(),
        table.n_samples()
    );
    Ok(table.with_counts(scaled)?)
}

/// Quantile normalizes a table (see [`exprkit_stats::quantile`]).
pub fn quantile_normalize(table: &ExpressionTable) -> Result<ExpressionTable, NormalizeError> {
    let normalized = quantile::quantile_normalize(table.counts())?;
    #[expect(clippy::cast_precision_loss)]
    let counts = normalized.mapv(|count| count as f64);
    debug!(
        "quantile normalized {} genes x {} samples",
        table.n_genes(),
        table.n_samples()
    );
    Ok(table.with_counts(counts)?)
}

fn library_sizes(table: &ExpressionTable) -> Result<Vec<f64>, NormalizeError> {
    table
        .library_sizes()
        .iter()
        .zip(table.samples())
        .map(|(&size, sample)| {
            if size > 0.0 && size.is_finite() {
                Ok(size)
            } else {
                Err(NormalizeError::LibrarySize {
                    sample: sample.clone(),
                    size,
                })
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use ndarray::array;

    use super::*;

    fn table() -> ExpressionTable {
        ExpressionTable::new(
            vec!["short".into(), "long".into()],
            vec!["a".into(), "b".into()],
            array![[10.0, 30.0], [90.0, 170.0]],
        )
        .unwrap()
    }

    fn lengths() -> GeneLengths {
        [("short".to_owned(), 500.0), ("long".to_owned(), 2000.0)]
            .into_iter()
            .collect()
    }

    #[test]
    fn test_cpm_columns_sum_to_million() {
        let cpm = counts_per_million(&table()).unwrap();
        for size in cpm.library_sizes() {
            assert!((size - 1e6).abs() < 1e-6);
        }
        assert_eq!(cpm.counts()[[0, 0]], 100_000.0);
    }

    #[test]
    fn test_rpkm_hand_computed() {
        let result = rpkm(&table(), &lengths()).unwrap();
        // 1e9 * 10 / (500 * 100) = 200_000
        assert!((result.counts()[[0, 0]] - 200_000.0).abs() < 1e-6);
        // 1e9 * 170 / (2000 * 200) = 425_000
        assert!((result.counts()[[1, 1]] - 425_000.0).abs() < 1e-6);
    }

    #[test]
    fn test_rpkm_missing_length() {
        let partial: GeneLengths = [("short".to_owned(), 500.0)].into_iter().collect();
        let err = rpkm(&table(), &partial).unwrap_err();
        assert_eq!(err.to_string(), "no length known for gene 'long'");

        let method = NormalizationMethod::Rpkm;
        assert!(matches!(
            method.apply(&table(), None),
            Err(NormalizeError::NoLengthTable)
        ));
    }

    #[test]
    fn test_rpkm_invalid_length() {
        let zero: GeneLengths = [("short".to_owned(), 0.0), ("long".to_owned(), 1.0)]
            .into_iter()
            .collect();
        assert!(matches!(
            rpkm(&table(), &zero),
            Err(NormalizeError::InvalidLength { .. })
        ));
    }

    #[test]
    fn test_empty_library_rejected() {
        let table = ExpressionTable::new(
            vec!["g".into()],
            vec!["a".into(), "empty".into()],
            array![[3.0, 0.0]],
        )
        .unwrap();
        let err = counts_per_million(&table).unwrap_err();
        assert_eq!(err.to_string(), "sample 'empty' has library size 0");
    }

    #[test]
    fn test_quantile_keeps_labels() {
        let normalized = quantile_normalize(&table()).unwrap();
        assert_eq!(normalized.genes(), table().genes());
        assert_eq!(normalized.samples(), table().samples());
        assert!(normalized.counts().iter().all(|&c| c >= 0.0 && c.fract() == 0.0));
    }

    #[test]
    fn test_quantile_rejects_empty_table() {
        let empty = table().filter_genes(|_, _| false);
        assert!(matches!(
            quantile_normalize(&empty),
            Err(NormalizeError::Quantile(QuantileNormalizeError::Shape { rows: 0, cols: 2 }))
        ));
    }

    #[test]
    fn test_method_serde_names() {
        let method: NormalizationMethod = serde_json::from_str("\"rpkm\"").unwrap();
        assert_eq!(method, NormalizationMethod::Rpkm);
        assert_eq!(
            serde_json::to_string(&NormalizationMethod::Quantile).unwrap(),
            "\"quantile\""
        );
        assert_eq!(
            NormalizationMethod::None.apply(&table(), None).unwrap(),
            table()
        );
    }
}

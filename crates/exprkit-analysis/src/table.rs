//! Labelled expression count tables.
//!
//! An [`ExpressionTable`] pairs a count matrix (genes x samples) with the
//! gene identifiers labelling its rows and the sample identifiers labelling
//! its columns. The numerical core in `exprkit-stats` works on bare matrices;
//! this type keeps the labels attached while the matrix moves through
//! filtering and normalization.

use std::collections::{HashMap, HashSet};

use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};

/// Whether an identifier labels a gene (row) or a sample (column).
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display)]
pub enum IdKind {
    #[display("gene")]
    Gene,
    #[display("sample")]
    Sample,
}

#[derive(Debug, Clone, PartialEq, derive_more::Display, derive_more::Error)]
pub enum TableError {
    #[display("{kind} labels ({labels}) do not match matrix dimension ({dim})")]
    Shape {
        kind: IdKind,
        labels: usize,
        dim: usize,
    },
    #[display("duplicate {kind} id '{id}'")]
    DuplicateId { kind: IdKind, id: String },
    #[display("unknown {kind} id '{id}'")]
    UnknownId { kind: IdKind, id: String },
    #[display("invalid count {value} for gene '{gene}' in sample '{sample}'")]
    InvalidCount {
        gene: String,
        sample: String,
        value: f64,
    },
}

/// Count matrix with gene (row) and sample (column) identifiers.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpressionTable {
    genes: Vec<String>,
    samples: Vec<String>,
    counts: Array2<f64>,
}

impl ExpressionTable {
    /// Creates a table, checking that labels match the matrix shape and are unique.
    ///
    /// Counts must be finite and non-negative.
    ///
    /// # Examples
    ///
    /// ```
    /// use exprkit_analysis::table::ExpressionTable;
    /// use ndarray::array;
    ///
    /// let table = ExpressionTable::new(
    ///     vec!["TP53".into(), "BRCA1".into()],
    ///     vec!["s1".into(), "s2".into(), "s3".into()],
    ///     array![[10.0, 0.0, 4.0], [1.0, 2.0, 3.0]],
    /// )
    /// .unwrap();
    /// assert_eq!(table.n_genes(), 2);
    /// assert_eq!(table.library_sizes().to_vec(), vec![11.0, 2.0, 7.0]);
    /// ```
    pub fn new(
        genes: Vec<String>,
        samples: Vec<String>,
        counts: Array2<f64>,
    ) -> Result<Self, TableError> {
        check_labels(IdKind::Gene, &genes, counts.nrows())?;
        check_labels(IdKind::Sample, &samples, counts.ncols())?;
        if let Some(((row, col), &value)) = counts
            .indexed_iter()
            .find(|(_, value)| !value.is_finite() || **value < 0.0)
        {
            return Err(TableError::InvalidCount {
                gene: genes[row].clone(),
                sample: samples[col].clone(),
                value,
            });
        }
        Ok(Self {
            genes,
            samples,
            counts,
        })
    }

    #[must_use]
    pub fn genes(&self) -> &[String] {
        &self.genes
    }

    #[must_use]
    pub fn samples(&self) -> &[String] {
        &self.samples
    }

    #[must_use]
    pub fn counts(&self) -> ArrayView2<'_, f64> {
        self.counts.view()
    }

    #[must_use]
    pub fn n_genes(&self) -> usize {
        self.genes.len()
    }

    #[must_use]
    pub fn n_samples(&self) -> usize {
        self.samples.len()
    }

    /// Counts of one sample, `None` for an unknown sample id.
    #[must_use]
    pub fn sample_counts(&self, sample: &str) -> Option<ArrayView1<'_, f64>> {
        let col = self.samples.iter().position(|s| s == sample)?;
        Some(self.counts.column(col))
    }

    /// Total counts per sample (column sums).
    #[must_use]
    pub fn library_sizes(&self) -> Array1<f64> {
        self.counts.sum_axis(Axis(0))
    }

    /// Replaces the matrix, keeping the labels.
    pub fn with_counts(&self, counts: Array2<f64>) -> Result<Self, TableError> {
        Self::new(self.genes.clone(), self.samples.clone(), counts)
    }

    /// Returns the rows for `genes`, in the given order.
    pub fn select_genes<S>(&self, genes: &[S]) -> Result<Self, TableError>
    where
        S: AsRef<str>,
    {
        let index = self
            .genes
            .iter()
            .enumerate()
            .map(|(row, gene)| (gene.as_str(), row))
            .collect::<HashMap<_, _>>();
        let rows = genes
            .iter()
            .map(|gene| {
                index
                    .get(gene.as_ref())
                    .copied()
                    .ok_or_else(|| TableError::UnknownId {
                        kind: IdKind::Gene,
                        id: gene.as_ref().to_owned(),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Self::new(
            genes.iter().map(|g| g.as_ref().to_owned()).collect(),
            self.samples.clone(),
            self.counts.select(Axis(0), &rows),
        )
    }

    /// Keeps the genes for which `keep(gene_id, counts_across_samples)` holds.
    #[must_use]
    pub fn filter_genes<F>(&self, mut keep: F) -> Self
    where
        F: FnMut(&str, ArrayView1<'_, f64>) -> bool,
    {
        let rows = self
            .genes
            .iter()
            .zip(self.counts.rows())
            .enumerate()
            .filter(|(_, (gene, counts))| keep(gene.as_str(), counts.view()))
            .map(|(row, _)| row)
            .collect::<Vec<_>>();

        Self {
            genes: rows.iter().map(|&row| self.genes[row].clone()).collect(),
            samples: self.samples.clone(),
            counts: self.counts.select(Axis(0), &rows),
        }
    }
}

fn check_labels(kind: IdKind, labels: &[String], dim: usize) -> Result<(), TableError> {
    if labels.len() != dim {
        return Err(TableError::Shape {
            kind,
            labels: labels.len(),
            dim,
        });
    }
    let mut seen = HashSet::new();
    if let Some(dup) = labels.iter().find(|id| !seen.insert(id.as_str())) {
        return Err(TableError::DuplicateId {
            kind,
            id: dup.clone(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use ndarray::array;

    use super::*;

    fn ids(names: &[&str]) -> Vec<String> {
        names.iter().map(|&s| s.to_owned()).collect()
    }

    fn sample_table() -> ExpressionTable {
        ExpressionTable::new(
            ids(&["g1", "g2", "g3"]),
            ids(&["a", "b"]),
            array![[1.0, 2.0], [0.0, 0.0], [5.0, 7.0]],
        )
        .unwrap()
    }

    #[test]
    fn test_shape_mismatch() {
        let counts = array![[1.0, 2.0], [3.0, 4.0]];
        let err = ExpressionTable::new(ids(&["g1"]), ids(&["a", "b"]), counts).unwrap_err();
        assert_eq!(
            err,
            TableError::Shape {
                kind: IdKind::Gene,
                labels: 1,
                dim: 2
            }
        );
        assert_eq!(
            err.to_string(),
            "gene labels (1) do not match matrix dimension (2)"
        );
    }

    #[test]
    fn test_duplicate_sample() {
        let err =
            ExpressionTable::new(ids(&["g1"]), ids(&["a", "a"]), array![[1.0, 2.0]]).unwrap_err();
        assert_eq!(
            err,
            TableError::DuplicateId {
                kind: IdKind::Sample,
                id: "a".into()
            }
        );
    }

    #[test]
    fn test_rejects_invalid_counts() {
        for bad in [-3.0, f64::NAN, f64::INFINITY] {
            let err = ExpressionTable::new(ids(&["g1", "g2"]), ids(&["a"]), array![[1.0], [bad]])
                .unwrap_err();
            assert!(matches!(
                err,
                TableError::InvalidCount { ref gene, ref sample, .. } if gene == "g2" && sample == "a"
            ));
        }
        let err = sample_table()
            .with_counts(array![[1.0, -0.5], [0.0, 0.0], [5.0, 7.0]])
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid count -0.5 for gene 'g1' in sample 'b'"
        );
        // negative zero is a valid zero count
        assert!(sample_table().with_counts(array![[-0.0, 0.0], [0.0, 0.0], [1.0, 1.0]]).is_ok());
    }

    #[test]
    fn test_select_genes_reorders() {
        let table = sample_table();
        let selected = table.select_genes(&["g3", "g1"]).unwrap();
        assert_eq!(selected.genes(), &["g3".to_owned(), "g1".to_owned()]);
        assert_eq!(selected.counts(), array![[5.0, 7.0], [1.0, 2.0]]);
        assert!(matches!(
            table.select_genes(&["nope"]),
            Err(TableError::UnknownId { kind: IdKind::Gene, .. })
        ));
    }

    #[test]
    fn test_filter_genes() {
        let table = sample_table();
        let expressed = table.filter_genes(|_, counts| counts.sum() > 0.0);
        assert_eq!(expressed.genes(), &ids(&["g1", "g3"]));
        assert_eq!(expressed.n_samples(), 2);

        let none = table.filter_genes(|_, _| false);
        assert_eq!(none.n_genes(), 0);
        assert_eq!(none.counts().dim(), (0, 2));
    }

    #[test]
    fn test_sample_counts() {
        let table = sample_table();
        assert_eq!(table.sample_counts("b").unwrap().to_vec(), vec![2.0, 0.0, 7.0]);
        assert!(table.sample_counts("z").is_none());
    }
}

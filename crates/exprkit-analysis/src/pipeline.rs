//! End-to-end exploratory workflow.
//!
//! ```text
//! counts ──filter──> expressed genes ──normalize──> normalized table
//!    │                                                     │
//!    └──> raw distributions              normalized distributions
//!
//! patients + cluster labels ──> survival curves per cluster
//! ```
//!
//! The pipeline is configured through [`PipelineConfig`], usually read from
//! JSON, and produces a [`PipelineReport`] that serializes to JSON.
//!
//! # Configuration
//!
//! ```json
//! {
//!   "normalization": "quantile",
//!   "min_mean_count": 5.0,
//!   "percentiles": [5.0, 50.0, 95.0]
//! }
//! ```
//!
//! Every field is optional; see [`PipelineConfig::default`].

use std::{fs, io, path::Path};

use exprkit_stats::{kaplan_meier::KaplanMeierCurve, percentiles::PercentileError};
use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::{
    distribution::{self, DEFAULT_PERCENTILES, SampleDistribution},
    normalize::{GeneLengths, NormalizationMethod, NormalizeError},
    survival::{PatientTable, SurvivalGroupError, SurvivalGroups},
    table::ExpressionTable,
};

#[derive(Debug, derive_more::Display, derive_more::Error, derive_more::From)]
pub enum PipelineError {
    #[display("failed to read config: {_0}")]
    #[from]
    ConfigIo(io::Error),
    #[display("invalid config: {_0}")]
    #[from]
    Config(serde_json::Error),
    #[display("normalization failed: {_0}")]
    #[from]
    Normalize(NormalizeError),
    #[display("invalid percentile request: {_0}")]
    #[from]
    Percentile(PercentileError),
    #[display("survival analysis failed: {_0}")]
    #[from]
    Survival(SurvivalGroupError),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Between-sample normalization.
    pub normalization: NormalizationMethod,
    /// Genes whose mean raw count across samples is below this are dropped.
    pub min_mean_count: f64,
    /// Percentiles reported in the distribution summaries.
    pub percentiles: Vec<f64>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            normalization: NormalizationMethod::Quantile,
            min_mean_count: 0.0,
            percentiles: DEFAULT_PERCENTILES.to_vec(),
        }
    }
}

impl PipelineConfig {
    pub fn from_json(json: &str) -> Result<Self, PipelineError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_path<P>(path: P) -> Result<Self, PipelineError>
    where
        P: AsRef<Path>,
    {
        Self::from_json(&fs::read_to_string(path)?)
    }
}

/// Tables the pipeline runs on.
#[derive(Debug, Clone, Copy)]
pub struct PipelineInputs<'a> {
    pub counts: &'a ExpressionTable,
    /// Required for RPKM.
    pub gene_lengths: Option<&'a GeneLengths>,
    /// Survival curves are computed only when both patients and labels are given.
    pub patients: Option<&'a PatientTable>,
    /// One cluster label per sample of `counts`, in the same order.
    pub labels: Option<&'a [String]>,
}

impl<'a> PipelineInputs<'a> {
    #[must_use]
    pub fn new(counts: &'a ExpressionTable) -> Self {
        Self {
            counts,
            gene_lengths: None,
            patients: None,
            labels: None,
        }
    }
}

/// Survival curve of one cluster in serializable form.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupSurvivalReport {
    pub label: String,
    pub population: usize,
    pub censored: usize,
    pub times: Vec<f64>,
    pub fractions: Vec<f64>,
    pub kaplan_meier: KaplanMeierCurve,
    pub median_km: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PipelineReport {
    pub normalization: NormalizationMethod,
    pub genes_loaded: usize,
    pub genes_kept: usize,
    pub samples: usize,
    pub raw_distributions: Vec<SampleDistribution>,
    pub normalized_distributions: Vec<SampleDistribution>,
    /// Largest between-sample percentile difference after normalization.
    pub normalized_spread: f64,
    pub survival: Vec<GroupSurvivalReport>,
    #[serde(skip)]
    pub normalized: ExpressionTable,
}

/// Runs filtering, normalization, distribution summaries and survival grouping.
///
/// # Examples
///
/// ```
/// use exprkit_analysis::{
///     io::read_counts,
///     pipeline::{self, PipelineConfig, PipelineInputs},
/// };
///
/// let counts = read_counts("gene,a,b\ng1,4,40\ng2,0,1\ng3,9,20\n".as_bytes(), b',').unwrap();
/// let config = PipelineConfig::from_json(r#"{ "min_mean_count": 1.0 }"#).unwrap();
/// let report = pipeline::run(&config, PipelineInputs::new(&counts)).unwrap();
///
/// assert_eq!(report.genes_kept, 2);
/// assert_eq!(report.normalized_spread, 0.0);
/// ```
pub fn run(
    config: &PipelineConfig,
    inputs: PipelineInputs<'_>,
) -> Result<PipelineReport, PipelineError> {
    let raw = inputs.counts;
    #[expect(clippy::cast_precision_loss)]
    let n_samples = raw.n_samples().max(1) as f64;
    let mut expressed =
        raw.filter_genes(|_, counts| counts.sum() / n_samples >= config.min_mean_count);
    info!(
        "kept {} of {} genes with mean count >= {}",
        expressed.n_genes(),
        raw.n_genes(),
        config.min_mean_count
    );

    if config.normalization == NormalizationMethod::Rpkm
        && let Some(lengths) = inputs.gene_lengths
    {
        let with_length = expressed.filter_genes(|gene, _| lengths.contains(gene));
        let dropped = expressed.n_genes() - with_length.n_genes();
        if dropped > 0 {
            warn!("dropping {dropped} genes without a known length");
        }
        expressed = with_length;
    }

    let normalized = config
        .normalization
        .apply(&expressed, inputs.gene_lengths)?;
    let raw_distributions = SampleDistribution::from_table(&expressed, &config.percentiles)?;
    let normalized_distributions =
        SampleDistribution::from_table(&normalized, &config.percentiles)?;
    let normalized_spread = distribution::max_percentile_spread(&normalized_distributions);
    info!(
        "normalized with {:?}, max percentile spread {normalized_spread:.3}",
        config.normalization
    );

    let survival = match (inputs.patients, inputs.labels) {
        (Some(patients), Some(labels)) => survival_reports(patients, raw.samples(), labels)?,
        _ => vec![],
    };

    Ok(PipelineReport {
        normalization: config.normalization,
        genes_loaded: raw.n_genes(),
        genes_kept: normalized.n_genes(),
        samples: normalized.n_samples(),
        raw_distributions,
        normalized_distributions,
        normalized_spread,
        survival,
        normalized,
    })
}

fn survival_reports(
    patients: &PatientTable,
    samples: &[String],
    labels: &[String],
) -> Result<Vec<GroupSurvivalReport>, SurvivalGroupError> {
    let groups = SurvivalGroups::from_labels(patients, samples, labels)?;
    Ok(groups
        .map
        .into_iter()
        .map(|(label, group)| GroupSurvivalReport {
            label,
            population: group.curve.population(),
            censored: group.censored_count,
            times: group.curve.times().to_vec(),
            fractions: group.curve.fractions(),
            kaplan_meier: group.kaplan_meier,
            median_km: group.median_km,
        })
        .collect())
}

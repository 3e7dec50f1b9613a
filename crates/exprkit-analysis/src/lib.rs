//! Exploratory analysis of gene-expression count tables.
//!
//! This crate wraps the numerical core of [`exprkit_stats`] with labelled
//! tables, file loaders and a configurable workflow.
//!
//! # Overview
//!
//! 1. **Load Tables** ([`io`]): counts, gene lengths and patient survival records
//! 2. **Filter and Normalize** ([`normalize`]): CPM, RPKM or quantile normalization
//! 3. **Summarise Distributions** ([`distribution::SampleDistribution`]): compare
//!    samples before and after normalization
//! 4. **Survival by Cluster** ([`survival::SurvivalGroups`]): one survival curve per
//!    cluster label
//!
//! [`pipeline::run`] chains these steps according to a JSON
//! [`pipeline::PipelineConfig`].
//!
//! # Examples
//!
//! ```no_run
//! use exprkit_analysis::{
//!     io,
//!     pipeline::{self, PipelineConfig, PipelineInputs},
//! };
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//!
//! let config = PipelineConfig::from_path("config.json")?;
//! let counts = io::load_counts("counts.tsv")?;
//! let patients = io::load_patients("patients.csv")?;
//! let labels = vec!["0".to_owned(); counts.n_samples()];
//!
//! let inputs = PipelineInputs {
//!     patients: Some(&patients),
//!     labels: Some(labels.as_slice()),
//!     ..PipelineInputs::new(&counts)
//! };
//! let report = pipeline::run(&config, inputs)?;
//! println!("{}", serde_json::to_string_pretty(&report)?);
//! # Ok(())
//! # }
//! ```
//!
//! Logging goes through the [`log`] facade; install any logger (for example
//! `env_logger`) to see progress messages.

pub mod distribution;
pub mod io;
pub mod normalize;
pub mod pipeline;
pub mod survival;
pub mod table;

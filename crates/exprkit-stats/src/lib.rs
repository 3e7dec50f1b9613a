//! Numerical core for exploratory gene-expression analysis.
//!
//! Matrices follow the expression convention: rows are genes and columns are
//! samples. Every function here is pure: it reads its arguments, allocates
//! its result and never mutates the input, so independent calls may run on
//! any number of threads without coordination.
//!
//! - **Ranking**: 0-based average ranks with rounded ties
//! - **Quantile normalization**: give every sample the same count distribution
//! - **Survival curves**: empirical step function for right-censored lifetimes
//! - **Kaplan-Meier**: product-limit survival estimate
//! - **Descriptive statistics** and **percentiles** for distribution summaries
//!
//! # Modules
//!
//! - [`rank`]: per-column ranking used by quantile normalization
//! - [`quantile`]: quantile normalization in `log2(x + 1)` space
//! - [`survival`]: survival step function with `1/N` steps
//! - [`kaplan_meier`]: Kaplan-Meier estimator and median survival
//! - [`descriptive`]: `NaN`-skipping min, max, mean, median, variance
//! - [`percentiles`]: interpolated percentiles with typed errors
//!
//! # Examples
//!
//! ## Quantile normalization
//!
//! ```
//! use exprkit_stats::quantile::quantile_normalize;
//! use ndarray::array;
//!
//! let counts = array![[5.0, 40.0], [120.0, 3.0], [0.0, 900.0]];
//! let normalized = quantile_normalize(counts.view()).unwrap();
//! assert_eq!(normalized.dim(), counts.dim());
//! ```
//!
//! ## Survival curve
//!
//! ```
//! use exprkit_stats::survival::SurvivalCurve;
//!
//! let lifetimes = [2.0, 1.0, 1.0, f64::NAN];
//! let curve = SurvivalCurve::from_lifetimes(&lifetimes, None).unwrap();
//! for (time, fraction) in curve.iter() {
//!     println!("{time:>5.1} {fraction:.2}");
//! }
//! ```

pub mod descriptive;
pub mod kaplan_meier;
pub mod percentiles;
pub mod quantile;
pub mod rank;
pub mod survival;

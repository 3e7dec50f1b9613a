//! Survival step function for right-censored lifetimes.
//!
//! [`SurvivalCurve`] turns a list of lifetimes into the fraction of the
//! population still alive over time. Every observed death lowers the curve by
//! `1/N`, where `N` is the population size *including* censored individuals.
//! Censored individuals never trigger a step, so they are counted as alive at
//! every plotted time and the curve does not necessarily reach zero.
//!
//! This is the simple empirical curve used for exploratory plots. For an
//! estimator that redistributes censored mass, see
//! [`KaplanMeierCurve`](crate::kaplan_meier::KaplanMeierCurve).
//!
//! # Examples
//!
//! ```
//! use exprkit_stats::survival::SurvivalCurve;
//!
//! // NaN marks a lifetime that was never observed (censored)
//! let curve = SurvivalCurve::from_lifetimes(&[2.0, 1.0, 1.0, f64::NAN], None).unwrap();
//!
//! assert_eq!(curve.times(), &[0.0, 1.0, 1.0, 2.0]);
//! assert_eq!(curve.fractions(), vec![1.0, 0.75, 0.5, 0.25]);
//! ```

/// Errors raised while building a [`SurvivalCurve`].
#[derive(Debug, Clone, PartialEq, derive_more::Display, derive_more::Error)]
pub enum SurvivalCurveError {
    #[display("survival curve requires at least one observation")]
    EmptyPopulation,
    #[display("got {censored} censoring flags for {lifetimes} lifetimes")]
    Shape { lifetimes: usize, censored: usize },
    #[display("invalid lifetime {value} at index {index}")]
    Domain { index: usize, value: f64 },
}

/// Right-continuous survival step function.
///
/// Holds the step times `xs = [0, t1, t2, ...]` (observed event times in
/// ascending order) and the population size. Fractions are derived on
/// demand: the fraction after step `i` is `1 - i/N`.
#[derive(Debug, Clone, PartialEq)]
pub struct SurvivalCurve {
    times: Vec<f64>,
    population: usize,
}

impl SurvivalCurve {
    /// Builds the survival curve of a population.
    ///
    /// # Arguments
    ///
    /// * `lifetimes` - Time until event for each individual. `NaN` marks a
    ///   censored individual.
    /// * `censored` - Optional flags marking additional right-censored
    ///   individuals, parallel to `lifetimes`.
    ///
    /// # Errors
    ///
    /// * [`SurvivalCurveError::EmptyPopulation`] if `lifetimes` is empty
    /// * [`SurvivalCurveError::Shape`] if `censored` has a different length
    /// * [`SurvivalCurveError::Domain`] for negative or infinite lifetimes
    ///
    /// # Examples
    ///
    /// ```
    /// use exprkit_stats::survival::SurvivalCurve;
    ///
    /// let lifetimes = [5.0, 3.0, 8.0];
    /// let censored = [false, true, false];
    /// let curve = SurvivalCurve::from_lifetimes(&lifetimes, Some(&censored)).unwrap();
    ///
    /// assert_eq!(curve.times(), &[0.0, 5.0, 8.0]);
    /// assert_eq!(curve.population(), 3);
    /// ```
    pub fn from_lifetimes(
        lifetimes: &[f64],
        censored: Option<&[bool]>,
    ) -> Result<Self, SurvivalCurveError> {
        if lifetimes.is_empty() {
            return Err(SurvivalCurveError::EmptyPopulation);
        }
        if let Some(flags) = censored
            && flags.len() != lifetimes.len()
        {
            return Err(SurvivalCurveError::Shape {
                lifetimes: lifetimes.len(),
                censored: flags.len(),
            });
        }
        if let Some((index, &value)) = lifetimes
            .iter()
            .enumerate()
            .find(|(_, t)| !t.is_nan() && (**t < 0.0 || t.is_infinite()))
        {
            return Err(SurvivalCurveError::Domain { index, value });
        }

        let mut times = vec![0.0];
        times.extend(
            lifetimes
                .iter()
                .enumerate()
                .filter(|&(idx, t)| !t.is_nan() && !censored.is_some_and(|flags| flags[idx]))
                .map(|(_, &t)| t),
        );
        times[1..].sort_by(f64::total_cmp);

        Ok(Self {
            times,
            population: lifetimes.len(),
        })
    }

    /// Step times, starting with `0.0`.
    #[must_use]
    pub fn times(&self) -> &[f64] {
        &self.times
    }

    /// Survival fraction at each step time, starting with `1.0`.
    #[must_use]
    pub fn fractions(&self) -> Vec<f64> {
        self.iter().map(|(_, fraction)| fraction).collect()
    }

    /// Iterates over `(time, fraction)` pairs.
    ///
    /// The iterator is lazy and cloneable; every call starts over and yields
    /// the same sequence.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = (f64, f64)> + Clone + '_ {
        self.times
            .iter()
            .enumerate()
            .map(|(step, &time)| (time, self.fraction_after(step)))
    }

    /// Number of points in the step function (observed events + 1).
    #[must_use]
    pub fn len(&self) -> usize {
        self.times.len()
    }

    /// Always `false`: the curve contains at least the starting point.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// Population size, including censored individuals.
    #[must_use]
    pub fn population(&self) -> usize {
        self.population
    }

    /// Number of observed (non-censored) events.
    #[must_use]
    pub fn observed_events(&self) -> usize {
        self.times.len() - 1
    }

    /// Evaluates the step function at `time`.
    ///
    /// Steps are right-continuous: an event at `t` is already counted at `t`.
    /// Times before zero (and `NaN`) evaluate to `1.0`.
    ///
    /// # Examples
    ///
    /// ```
    /// use exprkit_stats::survival::SurvivalCurve;
    ///
    /// let curve = SurvivalCurve::from_lifetimes(&[2.0, 1.0, 1.0, f64::NAN], None).unwrap();
    /// assert_eq!(curve.survival_at(0.5), 1.0);
    /// assert_eq!(curve.survival_at(1.0), 0.5);
    /// assert_eq!(curve.survival_at(10.0), 0.25);
    /// ```
    #[must_use]
    pub fn survival_at(&self, time: f64) -> f64 {
        let steps = self.times[1..].partition_point(|&t| t <= time);
        self.fraction_after(steps)
    }

    #[expect(clippy::cast_precision_loss)]
    fn fraction_after(&self, step: usize) -> f64 {
        1.0 - step as f64 / self.population as f64
    }
}

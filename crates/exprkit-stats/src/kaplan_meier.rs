//! Kaplan-Meier product-limit estimator for right-censored survival times.

/// Kaplan-Meier (product-limit) survival estimate.
///
/// Unlike [`SurvivalCurve`](crate::survival::SurvivalCurve), which steps by
/// `1/N` at every death, the Kaplan-Meier estimator removes censored
/// individuals from the risk set once their follow-up ends, so later deaths
/// weigh more heavily.
///
/// The curve stores parallel vectors, one entry per distinct event time:
/// - event time
/// - survival probability just after that time
/// - number of individuals at risk just before that time
/// - number of deaths at that time
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
pub struct KaplanMeierCurve {
    /// Distinct times at which at least one death was observed, ascending.
    pub times: Vec<f64>,
    /// Survival probability at each event time, in `[0.0, 1.0]`.
    pub survival_prob: Vec<f64>,
    /// Individuals still under observation at each event time.
    pub at_risk: Vec<usize>,
    /// Deaths observed at each event time.
    pub events: Vec<usize>,
}

impl KaplanMeierCurve {
    /// Estimates the survival function from `(time, is_censored)` pairs.
    ///
    /// Observations whose time is `NaN` carry no follow-up information and
    /// are ignored. At tied times, deaths are counted before censoring, so
    /// individuals censored at `t` are still at risk at `t`.
    ///
    /// # Examples
    ///
    /// ```
    /// use exprkit_stats::kaplan_meier::KaplanMeierCurve;
    ///
    /// let observations = [(1.0, false), (2.0, true), (3.0, false), (4.0, false)];
    /// let curve = KaplanMeierCurve::from_observations(&observations);
    ///
    /// assert_eq!(curve.times, vec![1.0, 3.0, 4.0]);
    /// assert_eq!(curve.at_risk, vec![4, 2, 1]);
    /// assert_eq!(curve.survival_prob, vec![0.75, 0.375, 0.0]);
    /// ```
    #[expect(clippy::cast_precision_loss)]
    #[must_use]
    pub fn from_observations(observations: &[(f64, bool)]) -> Self {
        let mut sorted = observations
            .iter()
            .copied()
            .filter(|(time, _)| !time.is_nan())
            .collect::<Vec<_>>();
        sorted.sort_by(|a, b| a.0.total_cmp(&b.0));

        let mut curve = Self::default();
        let mut at_risk = sorted.len();
        let mut survival = 1.0;

        for group in sorted.chunk_by(|a, b| a.0 <= b.0 && b.0 <= a.0) {
            let events = group.iter().filter(|(_, censored)| !censored).count();
            if events > 0 {
                survival *= 1.0 - events as f64 / at_risk as f64;
                curve.times.push(group[0].0);
                curve.survival_prob.push(survival);
                curve.at_risk.push(at_risk);
                curve.events.push(events);
            }
            at_risk -= group.len();
        }

        curve
    }

    /// Returns the median survival time.
    ///
    /// The median is where the survival probability first drops to 50% or
    /// below, linearly interpolated from the previous event time. `None` if
    /// the curve never reaches 50%.
    ///
    /// # Examples
    ///
    /// ```
    /// use exprkit_stats::kaplan_meier::KaplanMeierCurve;
    ///
    /// let curve = KaplanMeierCurve::from_observations(&[(10.0, false), (20.0, false)]);
    /// assert_eq!(curve.median_survival(), Some(10.0));
    ///
    /// let censored = KaplanMeierCurve::from_observations(&[(10.0, true), (20.0, true)]);
    /// assert_eq!(censored.median_survival(), None);
    /// ```
    #[must_use]
    pub fn median_survival(&self) -> Option<f64> {
        let idx = self.survival_prob.iter().position(|&p| p <= 0.5)?;
        if idx == 0 {
            return Some(self.times[0]);
        }
        let (t0, t1) = (self.times[idx - 1], self.times[idx]);
        let (s0, s1) = (self.survival_prob[idx - 1], self.survival_prob[idx]);
        Some(t0 + (0.5 - s0) / (s1 - s0) * (t1 - t0))
    }

    /// Survival probability at `time`; `1.0` before the first event.
    #[must_use]
    pub fn survival_at(&self, time: f64) -> f64 {
        match self.times.partition_point(|&t| t <= time) {
            0 => 1.0,
            n => self.survival_prob[n - 1],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_observations() {
        let curve = KaplanMeierCurve::from_observations(&[]);
        assert!(curve.times.is_empty());
        assert_eq!(curve.median_survival(), None);
        assert_eq!(curve.survival_at(5.0), 1.0);
    }

    #[test]
    fn test_without_censoring_matches_empirical_curve() {
        let observations = [(2.0, false), (1.0, false), (1.0, false), (3.0, false)];
        let curve = KaplanMeierCurve::from_observations(&observations);
        assert_eq!(curve.times, vec![1.0, 2.0, 3.0]);
        assert_eq!(curve.events, vec![2, 1, 1]);
        assert_eq!(curve.survival_prob, vec![0.5, 0.25, 0.0]);
    }

    #[test]
    fn test_censored_at_event_time_still_at_risk() {
        let observations = [(1.0, false), (1.0, true), (2.0, false)];
        let curve = KaplanMeierCurve::from_observations(&observations);
        assert_eq!(curve.at_risk, vec![3, 1]);
        assert!((curve.survival_prob[0] - 2.0 / 3.0).abs() < 1e-12);
        assert_eq!(curve.survival_prob[1], 0.0);
    }

    #[test]
    fn test_nan_times_ignored() {
        let observations = [(f64::NAN, true), (4.0, false), (8.0, true)];
        let curve = KaplanMeierCurve::from_observations(&observations);
        assert_eq!(curve.times, vec![4.0]);
        assert_eq!(curve.at_risk, vec![2]);
        assert_eq!(curve.survival_prob, vec![0.5]);
    }

    #[test]
    fn test_median_interpolates() {
        let observations = [(1.0, false), (2.0, true), (3.0, false), (4.0, false)];
        let curve = KaplanMeierCurve::from_observations(&observations);
        let median = curve.median_survival().unwrap();
        assert!((median - (1.0 + 2.0 * (0.25 / 0.375))).abs() < 1e-12);
    }

    #[test]
    fn test_survival_at_is_step_function() {
        let curve = KaplanMeierCurve::from_observations(&[(10.0, false), (20.0, false)]);
        assert_eq!(curve.survival_at(5.0), 1.0);
        assert_eq!(curve.survival_at(10.0), 0.5);
        assert_eq!(curve.survival_at(15.0), 0.5);
        assert_eq!(curve.survival_at(25.0), 0.0);
    }

    #[test]
    fn test_serializes_parallel_vectors() {
        let curve = KaplanMeierCurve::from_observations(&[(1.0, false), (2.0, true), (3.0, false)]);
        let json = serde_json::to_value(&curve).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "times": [1.0, 3.0],
                "survival_prob": [1.0 - 1.0 / 3.0, 0.0],
                "at_risk": [3, 1],
                "events": [1, 1],
            })
        );
    }
}

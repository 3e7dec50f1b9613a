//! Patient survival grouped by sample clusters.
//!
//! The typical question is whether patients whose tumour samples fall in
//! different expression clusters survive differently. Clustering itself
//! happens elsewhere; this module takes one label per sample, looks up each
//! sample's patient record, and builds one survival curve per label.
//!
//! # Right-Censored Data
//!
//! A patient who is still alive at the end of follow-up is right-censored:
//! we only know they lived at least `lifetime`. A patient with an unknown
//! lifetime (`NaN`) is censored too.
//!
//! ```text
//! dead:   |----x     (event observed at lifetime)
//! alive:  |------->  (censored at lifetime)
//! ```
//!
//! Each group carries both the empirical [`SurvivalCurve`] (steps of `1/N`)
//! and the censoring-aware [`KaplanMeierCurve`].
//!
//! # Examples
//!
//! ```
//! use exprkit_analysis::survival::{Patient, PatientTable, SurvivalGroups};
//!
//! let patients: PatientTable = [
//!     ("s1".to_owned(), Patient { lifetime: 5.0, dead: true }),
//!     ("s2".to_owned(), Patient { lifetime: 9.0, dead: false }),
//!     ("s3".to_owned(), Patient { lifetime: 2.0, dead: true }),
//! ]
//! .into_iter()
//! .collect();
//!
//! let groups = SurvivalGroups::from_labels(&patients, &["s1", "s2", "s3"], &[0, 0, 1]).unwrap();
//! assert_eq!(groups.map[&0].curve.fractions(), vec![1.0, 0.5]);
//! assert_eq!(groups.map[&1].curve.times(), &[0.0, 2.0]);
//! ```

use std::collections::BTreeMap;

use exprkit_stats::{
    kaplan_meier::KaplanMeierCurve,
    survival::{SurvivalCurve, SurvivalCurveError},
};
use log::warn;
use serde::{Deserialize, Serialize};

#[derive(Debug, derive_more::Display, derive_more::Error, derive_more::From)]
pub enum SurvivalGroupError {
    #[display("got {labels} cluster labels for {samples} samples")]
    Shape { samples: usize, labels: usize },
    #[display("{_0}")]
    #[from]
    Curve(SurvivalCurveError),
}

/// Survival record of one patient.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Patient {
    /// Follow-up time; `NaN` if unknown.
    pub lifetime: f64,
    /// Whether death was observed.
    pub dead: bool,
}

impl Patient {
    #[must_use]
    pub fn is_censored(&self) -> bool {
        !self.dead || self.lifetime.is_nan()
    }
}

/// Patient records keyed by sample id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PatientTable {
    patients: BTreeMap<String, Patient>,
}

impl PatientTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, sample: String, patient: Patient) -> Option<Patient> {
        self.patients.insert(sample, patient)
    }

    #[must_use]
    pub fn get(&self, sample: &str) -> Option<&Patient> {
        self.patients.get(sample)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.patients.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.patients.is_empty()
    }
}

impl FromIterator<(String, Patient)> for PatientTable {
    fn from_iter<T: IntoIterator<Item = (String, Patient)>>(iter: T) -> Self {
        Self {
            patients: iter.into_iter().collect(),
        }
    }
}

/// Survival of one group of samples.
#[derive(Debug, Clone)]
pub struct SurvivalGroup {
    /// Samples in the group that have a patient record.
    pub samples: Vec<String>,
    /// Number of censored patients.
    pub censored_count: usize,
    /// Empirical step function.
    pub curve: SurvivalCurve,
    /// Kaplan-Meier estimate.
    pub kaplan_meier: KaplanMeierCurve,
    /// Kaplan-Meier median survival, if the estimate reaches 50%.
    pub median_km: Option<f64>,
}

impl SurvivalGroup {
    /// Builds the survival curves of `(sample, patient)` pairs.
    pub fn from_patients(members: &[(String, Patient)]) -> Result<Self, SurvivalCurveError> {
        let lifetimes = members.iter().map(|(_, p)| p.lifetime).collect::<Vec<_>>();
        let censored = members.iter().map(|(_, p)| !p.dead).collect::<Vec<_>>();
        let curve = SurvivalCurve::from_lifetimes(&lifetimes, Some(&censored))?;

        let observations = members
            .iter()
            .map(|(_, p)| (p.lifetime, !p.dead))
            .collect::<Vec<_>>();
        let kaplan_meier = KaplanMeierCurve::from_observations(&observations);
        let median_km = kaplan_meier.median_survival();

        Ok(Self {
            samples: members.iter().map(|(s, _)| s.clone()).collect(),
            censored_count: members.iter().filter(|(_, p)| p.is_censored()).count(),
            curve,
            kaplan_meier,
            median_km,
        })
    }
}

/// Survival curves keyed by group.
#[derive(Debug, Clone)]
pub struct SurvivalGroups<K> {
    pub map: BTreeMap<K, SurvivalGroup>,
}

impl<K> SurvivalGroups<K>
where
    K: Ord,
{
    /// Groups `samples` by a key computed from each sample's position and id.
    ///
    /// Samples without a patient record are skipped with a warning. Groups
    /// whose samples are all skipped do not appear in the result.
    pub fn collect_by_group<S, F>(
        patients: &PatientTable,
        samples: &[S],
        mut group: F,
    ) -> Result<Self, SurvivalGroupError>
    where
        S: AsRef<str>,
        F: FnMut(usize, &str) -> K,
    {
        let mut members: BTreeMap<K, Vec<(String, Patient)>> = BTreeMap::new();
        let mut missing = 0;
        for (idx, sample) in samples.iter().enumerate() {
            let sample = sample.as_ref();
            let Some(patient) = patients.get(sample) else {
                missing += 1;
                continue;
            };
            members
                .entry(group(idx, sample))
                .or_default()
                .push((sample.to_owned(), *patient));
        }
        if missing > 0 {
            warn!(
                "{missing} of {} samples have no patient record",
                samples.len()
            );
        }

        let map = members
            .into_iter()
            .map(|(key, members)| Ok((key, SurvivalGroup::from_patients(&members)?)))
            .collect::<Result<_, SurvivalCurveError>>()?;
        Ok(Self { map })
    }
}

impl<K> SurvivalGroups<K>
where
    K: Ord + Clone,
{
    /// Groups `samples` by the label at the same position in `labels`.
    pub fn from_labels<S>(
        patients: &PatientTable,
        samples: &[S],
        labels: &[K],
    ) -> Result<Self, SurvivalGroupError>
    where
        S: AsRef<str>,
    {
        if samples.len() != labels.len() {
            return Err(SurvivalGroupError::Shape {
                samples: samples.len(),
                labels: labels.len(),
            });
        }
        Self::collect_by_group(patients, samples, |idx, _| labels[idx].clone())
    }
}

use exprkit_stats::{
    kaplan_meier::KaplanMeierCurve,
    quantile::{QuantileNormalization, quantile_normalize},
    rank::column_ranks,
    survival::SurvivalCurve,
};
use ndarray::{Array2, array};
use rand::{Rng as _, SeedableRng as _};
use rand_distr::{Distribution as _, Poisson};
use rand_pcg::Pcg64;

fn poisson_matrix(rows: usize, cols: usize, seed: u64) -> Array2<f64> {
    let mut rng = Pcg64::seed_from_u64(seed);
    Array2::from_shape_fn((rows, cols), |(_, col)| {
        // samples with different sequencing depth
        #[expect(clippy::cast_precision_loss)]
        let lambda = 5.0 * (col + 1) as f64;
        Poisson::new(lambda).unwrap().sample(&mut rng)
    })
}

#[test]
fn normalization_preserves_order_within_samples() {
    let counts = poisson_matrix(300, 4, 17);
    let normalized = quantile_normalize(counts.view()).unwrap();

    for col in 0..counts.ncols() {
        for a in 0..counts.nrows() {
            for b in 0..counts.nrows() {
                if counts[[a, col]] < counts[[b, col]] {
                    assert!(normalized[[a, col]] <= normalized[[b, col]]);
                }
                if counts[[a, col]] == counts[[b, col]] {
                    assert_eq!(normalized[[a, col]], normalized[[b, col]]);
                }
            }
        }
    }
}

#[test]
fn quantiles_are_ascending_and_indexed_by_rank() {
    let counts = poisson_matrix(120, 3, 23);
    let result = QuantileNormalization::from_counts(counts.view()).unwrap();

    assert!(result.quantiles.windows(2).into_iter().all(|w| w[0] <= w[1]));
    assert_eq!(result.ranks, column_ranks(counts.view()));
    for ((row, col), &log_value) in result.log_normalized.indexed_iter() {
        assert_eq!(log_value, result.quantiles[result.ranks[[row, col]]]);
    }
}

#[test]
fn deeper_samples_no_longer_dominate() {
    let counts = array![[2.0, 20.0], [4.0, 40.0], [8.0, 80.0], [16.0, 160.0]];
    let normalized = quantile_normalize(counts.view()).unwrap();
    assert_eq!(normalized.column(0), normalized.column(1));
}

#[test]
fn survival_curve_is_monotone_step_function() {
    let mut rng = Pcg64::seed_from_u64(31);
    let lifetimes = (0..200)
        .map(|_| {
            if rng.random_bool(0.1) {
                f64::NAN
            } else {
                rng.random_range(0.0..365.0)
            }
        })
        .collect::<Vec<_>>();
    let censored = (0..200).map(|_| rng.random_bool(0.2)).collect::<Vec<_>>();
    let curve = SurvivalCurve::from_lifetimes(&lifetimes, Some(&censored)).unwrap();

    let points = curve.iter().collect::<Vec<_>>();
    assert_eq!(points[0], (0.0, 1.0));
    for pair in points.windows(2) {
        assert!(pair[0].0 <= pair[1].0);
        assert!(pair[0].1 > pair[1].1);
    }
    let (_, last) = points[points.len() - 1];
    assert!(last >= 0.0);
    assert_eq!(curve.population(), 200);
    assert_eq!(curve.iter().collect::<Vec<_>>(), points);
}

#[test]
fn kaplan_meier_agrees_with_empirical_curve_without_censoring() {
    let lifetimes = [3.0, 1.0, 4.0, 1.0, 5.0, 9.0, 2.0, 6.0];
    let curve = SurvivalCurve::from_lifetimes(&lifetimes, None).unwrap();
    let observations = lifetimes.iter().map(|&t| (t, false)).collect::<Vec<_>>();
    let km = KaplanMeierCurve::from_observations(&observations);

    for time in [0.5, 1.0, 2.5, 4.0, 5.5, 9.0, 12.0] {
        assert!((curve.survival_at(time) - km.survival_at(time)).abs() < 1e-12);
    }
}

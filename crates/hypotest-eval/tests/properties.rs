use hypotest_eval::correction::{benjamini_hochberg, bonferroni, holm};
use hypotest_eval::descriptive::rank;
use hypotest_eval::special::{
    chi_squared_cdf, chi_squared_quantile, incomplete_beta, normal_cdf, normal_quantile, t_cdf, t_quantile,
};
use hypotest_eval::{RankTestOptions, TTestOptions, mann_whitney, t_test};
use proptest::prelude::*;

fn mean(v: &[f64]) -> f64 {
    v.iter().sum::<f64>() / v.len() as f64
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(300))]

    #[test]
    fn normal_quantile_roundtrip(p in 0.01_f64..=0.99) {
        let z = normal_quantile(p).unwrap();
        let back = normal_cdf(z);
        prop_assert!((back - p).abs() < 1e-4, "p={p} -> z={z} -> {back}");
    }

    #[test]
    fn t_cdf_is_half_at_zero(df in 0.5_f64..500.0) {
        prop_assert_eq!(t_cdf(0.0, df), 0.5);
    }

    #[test]
    fn t_quantile_roundtrip(df in 1_u32..=200, p in 0.01_f64..=0.99) {
        let df = f64::from(df);
        let t = t_quantile(df, p).unwrap();
        let back = t_cdf(t, df);
        prop_assert!((back - p).abs() < 1e-4, "df={df} p={p} -> t={t} -> {back}");
    }

    #[test]
    fn chi_squared_quantile_roundtrip(df in 1_u32..=60, p in 0.01_f64..=0.99) {
        let df = f64::from(df);
        let x = chi_squared_quantile(df, p).unwrap();
        prop_assert!(x > 0.0);
        prop_assert!((chi_squared_cdf(x, df) - p).abs() < 1e-5);
    }

    #[test]
    fn incomplete_beta_bounds_and_monotone(
        a in 0.1_f64..50.0,
        b in 0.1_f64..50.0,
        x in 0.0_f64..=1.0,
        dx in 0.0_f64..0.2,
    ) {
        prop_assert_eq!(incomplete_beta(a, b, 0.0), 0.0);
        prop_assert_eq!(incomplete_beta(a, b, 1.0), 1.0);
        let lo = incomplete_beta(a, b, x);
        let hi = incomplete_beta(a, b, (x + dx).min(1.0));
        prop_assert!((0.0..=1.0).contains(&lo));
        prop_assert!(hi >= lo - 1e-9, "I({x}) = {lo} > I({}) = {hi}", x + dx);
    }

    #[test]
    fn corrections_preserve_shape_and_order(p in proptest::collection::vec(0.0_f64..=1.0, 1..40)) {
        let bonf = bonferroni(&p).unwrap();
        let hol = holm(&p).unwrap();
        let bh = benjamini_hochberg(&p).unwrap();
        for adjusted in [&bonf, &hol, &bh] {
            prop_assert_eq!(adjusted.len(), p.len());
            prop_assert!(adjusted.iter().all(|x| (0.0..=1.0).contains(x)));
            prop_assert!(adjusted.iter().zip(&p).all(|(a, raw)| *a >= *raw - 1e-15));
        }
        prop_assert!(mean(&bonf) >= mean(&hol) - 1e-12);
        prop_assert!(mean(&hol) >= mean(&bh) - 1e-12);
    }

    #[test]
    fn ranks_sum_to_triangular_number(data in proptest::collection::vec(-50_i32..50, 1..60)) {
        let values: Vec<f64> = data.iter().map(|&v| f64::from(v)).collect();
        let n = values.len() as f64;
        let total: f64 = rank(&values).iter().sum();
        prop_assert!((total - n * (n + 1.0) / 2.0).abs() < 1e-9);
    }

    #[test]
    fn two_sample_p_values_are_probabilities(
        a in proptest::collection::vec(-1e3_f64..1e3, 2..=25),
        b in proptest::collection::vec(-1e3_f64..1e3, 2..=25),
    ) {
        let t = t_test(&a, &b, &TTestOptions::default()).unwrap();
        prop_assert!((0.0..=1.0).contains(&t.p_value), "t p = {}", t.p_value);
        let u = mann_whitney(&a, &b, &RankTestOptions::default()).unwrap();
        prop_assert!((0.0..=1.0).contains(&u.p_value), "u p = {}", u.p_value);
        prop_assert!(u.statistic >= 0.0);
        prop_assert!(u.statistic <= (a.len() * b.len()) as f64 / 2.0);
    }
}

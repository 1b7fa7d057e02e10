//! Meta crate that re-exports the hypotest building blocks. Depend on this
//! crate and opt into layers with feature flags; the underlying crates stay
//! reachable as [`common`] and [`eval`] for deeper integration.
//!
//! ```
//! use hypotest::{TTestOptions, t_test};
//!
//! let control = [5.1, 4.9, 5.3, 5.0, 5.2];
//! let treated = [6.2, 6.0, 6.4, 5.9, 6.1];
//! let result = t_test(&control, &treated, &TTestOptions::default())?;
//! assert!(result.p_value < 0.05);
//! # Ok::<(), hypotest::StatError>(())
//! ```

#[cfg(feature = "common")]
pub use hypotest_common as common;

#[cfg(feature = "eval")]
pub use hypotest_eval as eval;

#[cfg(feature = "common")]
pub use hypotest_common::{
    Alternative, Center, ConfidenceInterval, CorrectionMethod, EffectSize, EffectSizeKind,
    IntervalMethod, IntervalStatistic, Magnitude, MetaValue, Metadata, StatError, StatErrorKind,
    StatResult, TestKind, TestResult,
};

#[cfg(feature = "eval")]
pub use hypotest_eval::{
    AnovaOptions, AnovaTable, CompareOptions, CorrectionResult, DiagnosticOptions, IntervalEstimate,
    IntervalOptions, LeveneOptions, NormalityScreen, PowerDesign, PowerOptions, RankTestOptions,
    TTestOptions, adjust, benjamini_hochberg, bonferroni, bootstrap_difference, bootstrap_with_rng,
    compare_groups, compare_two, confidence_interval, holm, kruskal_wallis, levene, mann_whitney,
    minimum_detectable_effect, normality_screen, one_sample_t_test, one_way_anova, paired_t_test, run,
    run_named, shapiro_wilk, t_test, variance_ratio_test, wilcoxon_one_sample, wilcoxon_signed_rank,
};

#[cfg(feature = "eval")]
pub use hypotest_eval::correction::adjusted_p_values;
#[cfg(feature = "eval")]
pub use hypotest_eval::interval::bootstrap_difference_with_rng;
#[cfg(feature = "eval")]
pub use hypotest_eval::power::{power, sample_size};

#[cfg(all(test, feature = "eval"))]
mod tests {
    use super::*;

    const A: [f64; 8] = [5.1, 4.9, 5.3, 5.0, 5.2, 4.8, 5.4, 5.1];
    const B: [f64; 8] = [6.2, 6.0, 6.4, 5.9, 6.1, 6.3, 5.8, 6.5];

    #[test]
    fn planning_surface_is_reachable() {
        let opts = PowerOptions::default();
        let n = sample_size(0.5, &opts).unwrap();
        assert_eq!(n, 63);
        assert!(power(0.5, n, &opts).unwrap() >= 0.78);
        assert!(minimum_detectable_effect(n, &opts).unwrap() < 0.5);
    }

    #[test]
    fn correction_surface_is_reachable() {
        let p = [0.01, 0.03, 0.04, 0.20];
        let bonf = bonferroni(&p).unwrap();
        let hol = holm(&p).unwrap();
        let bh = benjamini_hochberg(&p).unwrap();
        assert_eq!(adjusted_p_values(&p, CorrectionMethod::Holm).unwrap(), hol);
        assert!(bonf[1] >= hol[1] && hol[1] >= bh[1]);
    }

    #[test]
    fn rank_and_resampling_surface_is_reachable() {
        let diffs: Vec<f64> = B.iter().zip(&A).map(|(b, a)| b - a).collect();
        let r = wilcoxon_one_sample(&diffs, 0.0, &RankTestOptions::default()).unwrap();
        assert_eq!(r.test, TestKind::WilcoxonSignedRank);
        assert!(r.p_value < 0.05);

        use rand::SeedableRng;
        let opts = IntervalOptions::default().with_iterations(500);
        let mut rng = rand::rngs::SmallRng::seed_from_u64(7);
        let one = bootstrap_with_rng(&A, &opts, &mut rng).unwrap();
        assert!(one.interval.contains(one.estimate));
        let mut rng = rand::rngs::SmallRng::seed_from_u64(7);
        let diff = bootstrap_difference_with_rng(&B, &A, &opts, &mut rng).unwrap();
        assert!(diff.interval.lower > 0.0);
        assert!(normality_screen(&A).normal);
    }
}

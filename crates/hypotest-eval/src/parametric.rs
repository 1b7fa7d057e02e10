//! Parametric location tests: independent, paired and one-sample t-tests and
//! one-way ANOVA.
//!
//! Degenerate inputs resolve to sentinels instead of errors:
//! - zero standard error: t = 0 and p = 1 when the means agree, otherwise
//!   t = ±∞ and the p-value of an infinitely extreme statistic;
//! - zero within-group variance in ANOVA: F = 0 and p = 1 when the group
//!   means agree, otherwise F = ∞ and p = 0.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use hypotest_common::{
    Alternative, ConfidenceInterval, Metadata, StatError, StatResult, TestKind, TestResult,
    ensure_finite,
};

use crate::descriptive::{mean, variance};
use crate::effect_size::{self, eta_omega_squared};
use crate::report::{interpretation, validate_alpha, validate_confidence_level};
use crate::special::{f_cdf, t_cdf, t_quantile};

/// Options for every t-test flavour.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TTestOptions {
    pub alternative: Alternative,
    /// Level of the reported interval; `1 - confidence_level` is the alpha used
    /// in the interpretation string.
    pub confidence_level: f64,
    /// Pooled (Student) instead of Welch statistic for independent samples.
    pub equal_variance: bool,
}

impl Default for TTestOptions {
    fn default() -> Self {
        Self {
            alternative: Alternative::TwoSided,
            confidence_level: 0.95,
            equal_variance: false,
        }
    }
}

impl TTestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_alternative(mut self, alternative: Alternative) -> Self {
        self.alternative = alternative;
        self
    }

    pub fn with_confidence_level(mut self, level: f64) -> Self {
        self.confidence_level = level;
        self
    }

    pub fn with_equal_variance(mut self, equal_variance: bool) -> Self {
        self.equal_variance = equal_variance;
        self
    }

    pub fn alpha(&self) -> f64 {
        1.0 - self.confidence_level
    }

    pub fn validate(&self) -> StatResult<()> {
        validate_confidence_level(self.confidence_level)
    }
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnovaOptions {
    /// Significance threshold used in the interpretation string.
    pub alpha: f64,
}

impl Default for AnovaOptions {
    fn default() -> Self {
        Self { alpha: 0.05 }
    }
}

impl AnovaOptions {
    pub fn with_alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self
    }

    pub fn validate(&self) -> StatResult<()> {
        validate_alpha(self.alpha)
    }
}

/// p-value of a t statistic under the requested alternative.
pub fn t_p_value(t: f64, df: f64, alternative: Alternative) -> f64 {
    if t.is_nan() {
        return 1.0;
    }
    let p = match alternative {
        Alternative::TwoSided => 2.0 * t_cdf(-t.abs(), df),
        Alternative::Less => t_cdf(t, df),
        Alternative::Greater => 1.0 - t_cdf(t, df),
    };
    p.clamp(0.0, 1.0)
}

fn t_statistic(diff: f64, se: f64) -> f64 {
    if se > 0.0 {
        diff / se
    } else if diff == 0.0 {
        0.0
    } else {
        diff.signum() * f64::INFINITY
    }
}

/// Two-sided interval `estimate ± t_crit(df) * se`.
fn t_interval(estimate: f64, se: f64, df: f64, level: f64) -> ConfidenceInterval {
    let t_crit = t_quantile(df, 1.0 - (1.0 - level) / 2.0).unwrap_or(f64::INFINITY);
    let half = if se > 0.0 { t_crit * se } else { 0.0 };
    ConfidenceInterval::new(estimate - half, estimate + half, level)
}

fn check_sample(context: &'static str, data: &[f64], min: usize) -> StatResult<()> {
    if data.len() < min {
        return Err(StatError::insufficient(context, min, data.len()));
    }
    ensure_finite("sample", data)
}

/// Independent-samples t-test (Welch by default, pooled with `equal_variance`).
///
/// Both statistics are computed; the one not selected is kept in metadata
/// (`t_pooled`/`df_pooled`, `t_welch`/`df_welch`). Effect size is Cohen's d.
pub fn t_test(a: &[f64], b: &[f64], opts: &TTestOptions) -> StatResult<TestResult> {
    #[cfg(feature = "tracing")]
    let _span = tracing::info_span!("t_test", n1 = a.len(), n2 = b.len()).entered();
    opts.validate()?;
    check_sample("independent t-test", a, 2)?;
    check_sample("independent t-test", b, 2)?;

    let n1 = a.len() as f64;
    let n2 = b.len() as f64;
    let mean1 = mean(a).unwrap_or(0.0);
    let mean2 = mean(b).unwrap_or(0.0);
    let var1 = variance(a).unwrap_or(0.0);
    let var2 = variance(b).unwrap_or(0.0);
    let diff = mean1 - mean2;

    // Pooled (Student)
    let df_pooled = n1 + n2 - 2.0;
    let sp2 = ((n1 - 1.0) * var1 + (n2 - 1.0) * var2) / df_pooled;
    let se_pooled = (sp2 * (1.0 / n1 + 1.0 / n2)).sqrt();
    let t_pooled = t_statistic(diff, se_pooled);

    // Welch-Satterthwaite
    let s1_n = var1 / n1;
    let s2_n = var2 / n2;
    let se_welch = (s1_n + s2_n).sqrt();
    let df_denom = s1_n.powi(2) / (n1 - 1.0) + s2_n.powi(2) / (n2 - 1.0);
    let df_welch = if df_denom > 0.0 {
        (s1_n + s2_n).powi(2) / df_denom
    } else {
        df_pooled
    };
    let t_welch = t_statistic(diff, se_welch);

    let (kind, t, df, se) = if opts.equal_variance {
        (TestKind::StudentT, t_pooled, df_pooled, se_pooled)
    } else {
        (TestKind::WelchT, t_welch, df_welch, se_welch)
    };

    #[cfg(feature = "tracing")]
    if se == 0.0 {
        tracing::debug!(mean_diff = diff, "t_test_zero_standard_error");
    }

    let p = t_p_value(t, df, opts.alternative);
    let effect = effect_size::cohens_d(a, b)?;
    let ci = t_interval(diff, se, df, opts.confidence_level);

    let metadata = Metadata::new()
        .with("df", df)
        .with("n1", a.len())
        .with("n2", b.len())
        .with("mean1", mean1)
        .with("mean2", mean2)
        .with("var1", var1)
        .with("var2", var2)
        .with("mean_diff", diff)
        .with("std_error", se)
        .with("t_pooled", t_pooled)
        .with("df_pooled", df_pooled)
        .with("t_welch", t_welch)
        .with("df_welch", df_welch)
        .with("equal_variance", opts.equal_variance)
        .with("alternative", opts.alternative.as_str());

    Ok(TestResult::new(kind, t, p)
        .with_interpretation(interpretation(kind, p, opts.alpha(), Some(&effect)))
        .with_effect_size(effect)
        .with_confidence_interval(ci)
        .with_metadata(metadata))
}

/// Paired t-test on the differences `a[i] - b[i]`.
pub fn paired_t_test(a: &[f64], b: &[f64], opts: &TTestOptions) -> StatResult<TestResult> {
    #[cfg(feature = "tracing")]
    let _span = tracing::info_span!("paired_t_test", n = a.len()).entered();
    opts.validate()?;
    if a.len() != b.len() {
        return Err(StatError::length_mismatch("paired t-test", a.len(), b.len()));
    }
    check_sample("paired t-test", a, 2)?;
    ensure_finite("sample", b)?;

    let diffs: Vec<f64> = a.iter().zip(b).map(|(x, y)| x - y).collect();
    let n = diffs.len() as f64;
    let mean_diff = mean(&diffs).unwrap_or(0.0);
    let sd_diff = variance(&diffs).unwrap_or(0.0).sqrt();
    let se = sd_diff / n.sqrt();
    let df = n - 1.0;
    let t = t_statistic(mean_diff, se);
    let p = t_p_value(t, df, opts.alternative);
    let effect = effect_size::paired_cohens_d(a, b)?;
    let ci = t_interval(mean_diff, se, df, opts.confidence_level);

    let metadata = Metadata::new()
        .with("df", df)
        .with("n", diffs.len())
        .with("mean1", mean(a).unwrap_or(0.0))
        .with("mean2", mean(b).unwrap_or(0.0))
        .with("mean_diff", mean_diff)
        .with("sd_diff", sd_diff)
        .with("std_error", se)
        .with("alternative", opts.alternative.as_str());

    let kind = TestKind::PairedT;
    Ok(TestResult::new(kind, t, p)
        .with_interpretation(interpretation(kind, p, opts.alpha(), Some(&effect)))
        .with_effect_size(effect)
        .with_confidence_interval(ci)
        .with_metadata(metadata))
}

/// One-sample t-test of `mean(data) == mu`. The interval brackets the mean.
pub fn one_sample_t_test(data: &[f64], mu: f64, opts: &TTestOptions) -> StatResult<TestResult> {
    #[cfg(feature = "tracing")]
    let _span = tracing::info_span!("one_sample_t_test", n = data.len()).entered();
    opts.validate()?;
    check_sample("one-sample t-test", data, 2)?;
    if !mu.is_finite() {
        return Err(StatError::invalid("mu", mu, "hypothesised mean must be finite"));
    }

    let n = data.len() as f64;
    let m = mean(data).unwrap_or(0.0);
    let sd = variance(data).unwrap_or(0.0).sqrt();
    let se = sd / n.sqrt();
    let df = n - 1.0;
    let t = t_statistic(m - mu, se);
    let p = t_p_value(t, df, opts.alternative);
    let d = if sd > 0.0 { (m - mu) / sd } else { 0.0 };
    let effect = hypotest_common::EffectSize::CohensD {
        value: d,
        interpretation: effect_size::interpret_d(d),
    };
    let ci = t_interval(m, se, df, opts.confidence_level);

    let metadata = Metadata::new()
        .with("df", df)
        .with("n", data.len())
        .with("mean", m)
        .with("mu", mu)
        .with("sd", sd)
        .with("std_error", se)
        .with("alternative", opts.alternative.as_str());

    let kind = TestKind::OneSampleT;
    Ok(TestResult::new(kind, t, p)
        .with_interpretation(interpretation(kind, p, opts.alpha(), Some(&effect)))
        .with_effect_size(effect)
        .with_confidence_interval(ci)
        .with_metadata(metadata))
}

/// Sum-of-squares decomposition for a one-way layout.
#[derive(Debug, Clone, PartialEq)]
pub struct AnovaTable {
    pub group_means: Vec<f64>,
    pub group_sizes: Vec<usize>,
    pub grand_mean: f64,
    pub ss_between: f64,
    pub ss_within: f64,
    pub ss_total: f64,
    pub df_between: f64,
    pub df_within: f64,
    pub ms_between: f64,
    pub ms_within: f64,
    pub f: f64,
    pub p_value: f64,
}

impl AnovaTable {
    /// Builds the table; needs ≥ 2 groups, no empty group, and `N > k`.
    pub fn from_groups<S: AsRef<[f64]>>(context: &'static str, groups: &[S]) -> StatResult<Self> {
        let k = groups.len();
        if k < 2 {
            return Err(StatError::insufficient(context, 2, k));
        }
        let mut group_means = Vec::with_capacity(k);
        let mut group_sizes = Vec::with_capacity(k);
        let mut total = 0.0;
        for g in groups {
            let g = g.as_ref();
            if g.is_empty() {
                return Err(StatError::insufficient(context, 1, 0));
            }
            ensure_finite("sample", g)?;
            total += g.iter().sum::<f64>();
            group_means.push(mean(g).unwrap_or(0.0));
            group_sizes.push(g.len());
        }
        let n_total: usize = group_sizes.iter().sum();
        if n_total <= k {
            return Err(StatError::insufficient(context, k + 1, n_total));
        }
        let grand_mean = total / n_total as f64;

        let mut ss_between = 0.0;
        let mut ss_within = 0.0;
        for (g, (&m, &n)) in groups.iter().zip(group_means.iter().zip(&group_sizes)) {
            ss_between += n as f64 * (m - grand_mean).powi(2);
            ss_within += g.as_ref().iter().map(|x| (x - m).powi(2)).sum::<f64>();
        }
        let ss_total = ss_between + ss_within;
        let df_between = (k - 1) as f64;
        let df_within = (n_total - k) as f64;
        let ms_between = ss_between / df_between;
        let ms_within = ss_within / df_within;

        let (f, p_value) = if ms_within > 0.0 {
            let f = ms_between / ms_within;
            (f, (1.0 - f_cdf(f, df_between, df_within)).clamp(0.0, 1.0))
        } else if ms_between > 0.0 {
            (f64::INFINITY, 0.0)
        } else {
            (0.0, 1.0)
        };

        Ok(Self {
            group_means,
            group_sizes,
            grand_mean,
            ss_between,
            ss_within,
            ss_total,
            df_between,
            df_within,
            ms_between,
            ms_within,
            f,
            p_value,
        })
    }

    pub fn n_total(&self) -> usize {
        self.group_sizes.iter().sum()
    }

    pub(crate) fn metadata(&self) -> Metadata {
        Metadata::new()
            .with("df", self.df_between)
            .with("df_between", self.df_between)
            .with("df_within", self.df_within)
            .with("ss_between", self.ss_between)
            .with("ss_within", self.ss_within)
            .with("ss_total", self.ss_total)
            .with("ms_between", self.ms_between)
            .with("ms_within", self.ms_within)
            .with("grand_mean", self.grand_mean)
            .with("group_means", self.group_means.clone())
            .with(
                "group_sizes",
                self.group_sizes.iter().map(|&n| n as f64).collect::<Vec<_>>(),
            )
            .with("k", self.group_sizes.len())
            .with("n_total", self.n_total())
    }
}

/// Classic one-way ANOVA with η² / ω² effect sizes.
pub fn one_way_anova<S: AsRef<[f64]>>(groups: &[S], opts: &AnovaOptions) -> StatResult<TestResult> {
    #[cfg(feature = "tracing")]
    let _span = tracing::info_span!("one_way_anova", groups = groups.len()).entered();
    opts.validate()?;
    let table = AnovaTable::from_groups("one-way ANOVA", groups)?;
    let effect = eta_omega_squared(
        table.ss_between,
        table.ss_total,
        table.df_between,
        table.ms_within,
    );
    let kind = TestKind::OneWayAnova;
    Ok(TestResult::new(kind, table.f, table.p_value)
        .with_interpretation(interpretation(kind, table.p_value, opts.alpha, Some(&effect)))
        .with_effect_size(effect)
        .with_metadata(table.metadata()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use hypotest_common::{EffectSize, Magnitude, StatErrorKind};

    const A: [f64; 5] = [5.1, 4.9, 5.3, 5.0, 5.2];
    const B: [f64; 5] = [6.2, 6.0, 6.4, 5.9, 6.1];

    #[test]
    fn welch_detects_shifted_means() {
        let r = t_test(&A, &B, &TTestOptions::default()).unwrap();
        assert_eq!(r.test, TestKind::WelchT);
        assert!(r.p_value < 0.05);
        assert!(r.statistic < 0.0);
        let ci = r.confidence_interval.unwrap();
        assert!(ci.upper < 0.0);
        assert!(ci.contains(r.metadata.number("mean_diff").unwrap()));
        assert!(r.effect_size.unwrap().value() < 0.0);
    }

    #[test]
    fn pooled_and_welch_agree_with_equal_sizes() {
        let welch = t_test(&A, &B, &TTestOptions::default()).unwrap();
        let pooled = t_test(&A, &B, &TTestOptions::default().with_equal_variance(true)).unwrap();
        assert_eq!(pooled.test, TestKind::StudentT);
        // equal n: identical t, different df
        assert!((welch.statistic - pooled.statistic).abs() < 1e-12);
        assert_eq!(pooled.degrees_of_freedom(), Some(8.0));
        assert!(welch.degrees_of_freedom().unwrap() <= 8.0);
    }

    #[test]
    fn textbook_welch_values() {
        let a = [19.8, 20.4, 19.6, 17.8, 18.5, 18.9, 18.3, 18.9, 19.5, 22.0];
        let b = [28.2, 26.6, 20.1, 23.3, 25.2, 22.1, 17.7, 27.6, 20.6, 13.7, 23.2, 17.5, 20.6, 18.0, 23.9, 21.6, 24.3, 20.4, 23.9, 13.3];
        let r = t_test(&a, &b, &TTestOptions::default()).unwrap();
        assert!((r.statistic - (-2.2255)).abs() < 1e-3);
        assert!((r.degrees_of_freedom().unwrap() - 24.5246).abs() < 1e-3);
        assert!((r.p_value - 0.0355).abs() < 1e-3);
    }

    #[test]
    fn one_sided_alternatives_split_the_tail() {
        let two = t_test(&A, &B, &TTestOptions::default()).unwrap();
        let less = t_test(&A, &B, &TTestOptions::default().with_alternative(Alternative::Less)).unwrap();
        let greater =
            t_test(&A, &B, &TTestOptions::default().with_alternative(Alternative::Greater)).unwrap();
        assert!((less.p_value - two.p_value / 2.0).abs() < 1e-12);
        assert!((less.p_value + greater.p_value - 1.0).abs() < 1e-12);
    }

    #[test]
    fn zero_variance_groups_resolve_to_sentinels() {
        let same = t_test(&[3.0, 3.0, 3.0], &[3.0, 3.0], &TTestOptions::default()).unwrap();
        assert_eq!(same.statistic, 0.0);
        assert_eq!(same.p_value, 1.0);

        let apart = t_test(&[3.0, 3.0, 3.0], &[5.0, 5.0], &TTestOptions::default()).unwrap();
        assert_eq!(apart.statistic, f64::NEG_INFINITY);
        assert_eq!(apart.p_value, 0.0);
        let ci = apart.confidence_interval.unwrap();
        assert_eq!((ci.lower, ci.upper), (-2.0, -2.0));
    }

    #[test]
    fn too_few_observations() {
        let err = t_test(&[1.0], &B, &TTestOptions::default()).unwrap_err();
        assert_eq!(err.kind(), StatErrorKind::InsufficientData);
        let err = t_test(&A, &B, &TTestOptions::default().with_confidence_level(1.5)).unwrap_err();
        assert_eq!(err.kind(), StatErrorKind::InvalidArgument);
    }

    #[test]
    fn paired_test_uses_differences() {
        let before = [200.0, 190.0, 210.0, 220.0, 205.0, 195.0];
        let after = [192.0, 185.0, 200.0, 214.0, 198.0, 191.0];
        let r = paired_t_test(&before, &after, &TTestOptions::default()).unwrap();
        assert_eq!(r.test, TestKind::PairedT);
        assert!(r.statistic > 0.0);
        assert!(r.p_value < 0.01);
        assert_eq!(r.degrees_of_freedom(), Some(5.0));
        assert!(matches!(r.effect_size, Some(EffectSize::PairedCohensD { .. })));
    }

    #[test]
    fn paired_test_rejects_unequal_lengths() {
        let err = paired_t_test(&A, &B[..4], &TTestOptions::default()).unwrap_err();
        assert!(matches!(err, StatError::LengthMismatch { left: 5, right: 4, .. }));
    }

    #[test]
    fn paired_constant_shift_is_degenerate() {
        let r = paired_t_test(&[2.0, 3.0, 4.0], &[1.0, 2.0, 3.0], &TTestOptions::default()).unwrap();
        assert_eq!(r.statistic, f64::INFINITY);
        assert_eq!(r.p_value, 0.0);
    }

    #[test]
    fn one_sample_against_known_mean() {
        let r = one_sample_t_test(&[5.1, 4.9, 5.2, 5.0, 4.8, 5.3, 5.1, 4.9], 5.0, &TTestOptions::default())
            .unwrap();
        assert!(r.p_value > 0.05);
        assert!(r.confidence_interval.unwrap().contains(5.0));
    }

    #[test]
    fn anova_decomposition() {
        let groups = [vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0], vec![7.0, 8.0, 9.0]];
        let r = one_way_anova(&groups, &AnovaOptions::default()).unwrap();
        // SSB = 54, SSW = 6, F = 27 / 1 = 27
        assert!((r.statistic - 27.0).abs() < 1e-9);
        assert!(r.p_value < 0.001);
        assert_eq!(r.metadata.number("ss_between"), Some(54.0));
        assert_eq!(r.metadata.number("ss_within"), Some(6.0));
        assert_eq!(r.degrees_of_freedom(), Some(2.0));
        assert_eq!(r.metadata.number("df_within"), Some(6.0));
        match r.effect_size.unwrap() {
            EffectSize::EtaSquared {
                eta_squared,
                omega_squared,
                interpretation,
            } => {
                assert!((eta_squared - 0.9).abs() < 1e-12);
                assert!((omega_squared - 52.0 / 61.0).abs() < 1e-12);
                assert_eq!(interpretation, Magnitude::Large);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn anova_contract_violations() {
        let one: [&[f64]; 1] = [&[1.0, 2.0]];
        assert!(one_way_anova(&one, &AnovaOptions::default()).is_err());
        let empty: [&[f64]; 2] = [&[1.0, 2.0], &[]];
        assert!(one_way_anova(&empty, &AnovaOptions::default()).is_err());
        let singletons: [&[f64]; 2] = [&[1.0], &[2.0]];
        assert!(one_way_anova(&singletons, &AnovaOptions::default()).is_err());
    }

    #[test]
    fn anova_constant_groups() {
        let same: [&[f64]; 2] = [&[2.0, 2.0], &[2.0, 2.0, 2.0]];
        let r = one_way_anova(&same, &AnovaOptions::default()).unwrap();
        assert_eq!((r.statistic, r.p_value), (0.0, 1.0));
        let apart: [&[f64]; 2] = [&[2.0, 2.0], &[3.0, 3.0, 3.0]];
        let r = one_way_anova(&apart, &AnovaOptions::default()).unwrap();
        assert_eq!((r.statistic, r.p_value), (f64::INFINITY, 0.0));
    }
}

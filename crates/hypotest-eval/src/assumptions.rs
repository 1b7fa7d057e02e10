//! Assumption diagnostics: normality (Shapiro-Wilk, skew/kurtosis screen) and
//! equality of variances (Levene / Brown-Forsythe, F-test).

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use hypotest_common::{Center, Metadata, StatError, StatResult, TestKind, TestResult, ensure_finite};

use crate::descriptive::{kurtosis, mean, median, pearson, skewness, sorted, variance};
use crate::parametric::AnovaTable;
use crate::report::{interpretation, validate_alpha};
use crate::special::{f_cdf, normal_cdf, normal_quantile};

pub const SHAPIRO_MIN_N: usize = 3;
pub const SHAPIRO_MAX_N: usize = 5000;

/// Below this size every sample passes the quick screen.
pub const SCREEN_MIN_N: usize = 8;
pub const SCREEN_MAX_ABS_SKEW: f64 = 2.0;
pub const SCREEN_MAX_ABS_KURTOSIS: f64 = 7.0;

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DiagnosticOptions {
    pub alpha: f64,
}

impl Default for DiagnosticOptions {
    fn default() -> Self {
        Self { alpha: 0.05 }
    }
}

impl DiagnosticOptions {
    pub fn with_alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self
    }

    pub fn validate(&self) -> StatResult<()> {
        validate_alpha(self.alpha)
    }
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LeveneOptions {
    /// `Median` is the Brown-Forsythe variant.
    pub center: Center,
    pub alpha: f64,
}

impl Default for LeveneOptions {
    fn default() -> Self {
        Self {
            center: Center::Median,
            alpha: 0.05,
        }
    }
}

impl LeveneOptions {
    pub fn with_center(mut self, center: Center) -> Self {
        self.center = center;
        self
    }

    pub fn with_alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self
    }

    pub fn validate(&self) -> StatResult<()> {
        validate_alpha(self.alpha)
    }
}

/* ───────────────────────────── Shapiro-Wilk ───────────────────────────── */

/// Royston's normalising transform of W to an upper-tail p-value.
fn royston_p_value(w: f64, n: usize) -> f64 {
    let nf = n as f64;
    if n == 3 {
        let p = 6.0 / std::f64::consts::PI * (w.sqrt().asin() - 0.75f64.sqrt().asin());
        return p.clamp(0.0, 1.0);
    }
    let ln_1mw = (1.0 - w).ln();
    let (y, mu, sigma) = if n <= 11 {
        let gamma = 0.459 * nf - 2.273;
        if ln_1mw >= gamma {
            return 0.0;
        }
        let mu = 0.5440 - 0.39978 * nf + 0.025054 * nf.powi(2) - 0.0006714 * nf.powi(3);
        let sigma = (1.3822 - 0.77857 * nf + 0.062767 * nf.powi(2) - 0.0020322 * nf.powi(3)).exp();
        (-(gamma - ln_1mw).ln(), mu, sigma)
    } else {
        let ln_n = nf.ln();
        let mu = 0.0038915 * ln_n.powi(3) - 0.083751 * ln_n.powi(2) - 0.31082 * ln_n - 1.5861;
        let sigma = (0.0030302 * ln_n.powi(2) - 0.082676 * ln_n - 0.4803).exp();
        (ln_1mw, mu, sigma)
    };
    (1.0 - normal_cdf((y - mu) / sigma)).clamp(0.0, 1.0)
}

/// Shapiro-Wilk normality test for `3 <= n <= 5000`.
///
/// W is the squared correlation between the sorted sample and the expected
/// normal order statistics `Φ⁻¹((i - 0.375) / (n + 0.25))`. Constant data
/// gives W = 1 and p = 1. Metadata carries `normal = p >= alpha`.
pub fn shapiro_wilk(data: &[f64], opts: &DiagnosticOptions) -> StatResult<TestResult> {
    #[cfg(feature = "tracing")]
    let _span = tracing::info_span!("shapiro_wilk", n = data.len()).entered();
    opts.validate()?;
    let n = data.len();
    if n < SHAPIRO_MIN_N {
        return Err(StatError::insufficient("shapiro-wilk", SHAPIRO_MIN_N, n));
    }
    if n > SHAPIRO_MAX_N {
        return Err(StatError::invalid(
            "data",
            format!("{n} observations"),
            "shapiro-wilk supports at most 5000 observations",
        ));
    }
    ensure_finite("sample", data)?;

    let x = sorted(data);
    let (w, p) = if x[0] == x[n - 1] {
        #[cfg(feature = "tracing")]
        tracing::debug!("shapiro_wilk_constant_data");
        (1.0, 1.0)
    } else {
        let nf = n as f64;
        let m: Vec<f64> = (1..=n)
            .map(|i| normal_quantile((i as f64 - 0.375) / (nf + 0.25)).unwrap_or(0.0))
            .collect();
        let r = pearson(&x, &m)?;
        let w = (r * r).min(1.0);
        (w, royston_p_value(w, n))
    };

    let kind = TestKind::ShapiroWilk;
    Ok(TestResult::new(kind, w, p)
        .with_interpretation(interpretation(kind, p, opts.alpha, None))
        .with_metadata(Metadata::new().with("n", n).with("normal", p >= opts.alpha)))
}

/// Outcome of the skew/kurtosis heuristic.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalityScreen {
    pub n: usize,
    pub skewness: Option<f64>,
    pub kurtosis: Option<f64>,
    pub normal: bool,
}

/// Quick normality heuristic: `|skew| < 2` and `|excess kurtosis| < 7`.
///
/// Samples smaller than eight always pass. This is a screen, not a test; use
/// [`shapiro_wilk`] when a p-value is needed.
pub fn normality_screen(data: &[f64]) -> NormalityScreen {
    let skew = skewness(data);
    let kurt = kurtosis(data);
    let normal = data.len() < SCREEN_MIN_N
        || (skew.is_none_or(|s| s.abs() < SCREEN_MAX_ABS_SKEW)
            && kurt.is_none_or(|k| k.abs() < SCREEN_MAX_ABS_KURTOSIS));
    NormalityScreen {
        n: data.len(),
        skewness: skew,
        kurtosis: kurt,
        normal,
    }
}

/* ─────────────────────────── variance equality ─────────────────────────── */

/// Levene's test (Brown-Forsythe with the default median center): one-way
/// ANOVA on absolute deviations from each group's center.
///
/// Needs at least two groups of at least two observations. Metadata carries
/// `equal_variances = p >= alpha`.
pub fn levene<S: AsRef<[f64]>>(groups: &[S], opts: &LeveneOptions) -> StatResult<TestResult> {
    #[cfg(feature = "tracing")]
    let _span = tracing::info_span!("levene", groups = groups.len(), center = opts.center.as_str()).entered();
    opts.validate()?;
    if groups.len() < 2 {
        return Err(StatError::insufficient("levene", 2, groups.len()));
    }
    let mut deviations = Vec::with_capacity(groups.len());
    let mut variances = Vec::with_capacity(groups.len());
    for g in groups {
        let g = g.as_ref();
        if g.len() < 2 {
            return Err(StatError::insufficient("levene", 2, g.len()));
        }
        ensure_finite("sample", g)?;
        let center = match opts.center {
            Center::Median => median(g),
            Center::Mean => mean(g),
        }
        .unwrap_or(0.0);
        deviations.push(g.iter().map(|x| (x - center).abs()).collect::<Vec<f64>>());
        variances.push(variance(g).unwrap_or(0.0));
    }

    let table = AnovaTable::from_groups("levene", &deviations)?;
    let p = table.p_value;
    let equal = p >= opts.alpha;
    let metadata = Metadata::new()
        .with("df", table.df_between)
        .with("df_between", table.df_between)
        .with("df_within", table.df_within)
        .with("center", opts.center.as_str())
        .with("group_variances", variances)
        .with("equal_variances", equal);

    let kind = TestKind::Levene;
    Ok(TestResult::new(kind, table.f, p)
        .with_interpretation(interpretation(kind, p, opts.alpha, None))
        .with_metadata(metadata))
}

/// Two-sample F-test on the ratio of the larger to the smaller variance.
///
/// The ratio is always ≥ 1 and the p-value two-sided, `min(1, 2(1 - F_cdf))`.
/// Two zero variances give F = 1, p = 1; exactly one gives F = ∞, p = 0.
pub fn variance_ratio_test(a: &[f64], b: &[f64], opts: &DiagnosticOptions) -> StatResult<TestResult> {
    #[cfg(feature = "tracing")]
    let _span = tracing::info_span!("variance_ratio_test", n1 = a.len(), n2 = b.len()).entered();
    opts.validate()?;
    for sample in [a, b] {
        if sample.len() < 2 {
            return Err(StatError::insufficient("variance ratio test", 2, sample.len()));
        }
        ensure_finite("sample", sample)?;
    }

    let var1 = variance(a).unwrap_or(0.0);
    let var2 = variance(b).unwrap_or(0.0);
    let ((larger, df1), (smaller, df2)) = if var1 >= var2 {
        ((var1, a.len() - 1), (var2, b.len() - 1))
    } else {
        ((var2, b.len() - 1), (var1, a.len() - 1))
    };

    let (f, p) = if larger == 0.0 {
        (1.0, 1.0)
    } else if smaller == 0.0 {
        (f64::INFINITY, 0.0)
    } else {
        let f = larger / smaller;
        (f, (2.0 * (1.0 - f_cdf(f, df1 as f64, df2 as f64))).min(1.0))
    };
    #[cfg(feature = "tracing")]
    if smaller == 0.0 {
        tracing::debug!(f, "variance_ratio_zero_variance");
    }

    let equal = p >= opts.alpha;
    let metadata = Metadata::new()
        .with("var1", var1)
        .with("var2", var2)
        .with("df", df1)
        .with("df_numerator", df1)
        .with("df_denominator", df2)
        .with("equal_variances", equal);

    let kind = TestKind::VarianceRatio;
    Ok(TestResult::new(kind, f, p)
        .with_interpretation(interpretation(kind, p, opts.alpha, None))
        .with_metadata(metadata))
}

#[cfg(test)]
mod tests {
    use super::*;
    use hypotest_common::StatErrorKind;

    #[test]
    fn shapiro_rejects_heavy_skew() {
        let data = [
            1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 2.0, 2.0, 3.0, 5.0, 8.0, 13.0, 21.0, 34.0, 55.0, 89.0, 144.0,
            233.0, 377.0,
        ];
        let r = shapiro_wilk(&data, &DiagnosticOptions::default()).unwrap();
        assert!((r.statistic - 0.5666).abs() < 1e-3);
        assert!(r.p_value < 1e-4);
        assert_eq!(r.metadata.flag("normal"), Some(false));
    }

    #[test]
    fn shapiro_accepts_evenly_spread_data() {
        let data: Vec<f64> = (1..=20).map(f64::from).collect();
        let r = shapiro_wilk(&data, &DiagnosticOptions::default()).unwrap();
        assert!((r.statistic - 0.9772).abs() < 1e-3);
        assert!((r.p_value - 0.893).abs() < 0.01);
    }

    #[test]
    fn shapiro_small_sample_branches() {
        let r = shapiro_wilk(&[2.1, 3.4, 1.9, 5.6, 4.4, 3.8, 4.9, 2.7], &DiagnosticOptions::default()).unwrap();
        assert!((r.p_value - 0.951).abs() < 0.01);

        let outlier = [148.0, 154.0, 158.0, 160.0, 161.0, 162.0, 166.0, 170.0, 182.0, 195.0, 236.0];
        let r = shapiro_wilk(&outlier, &DiagnosticOptions::default()).unwrap();
        assert!(r.p_value < 0.01);

        let r = shapiro_wilk(&[1.0, 2.0, 3.0], &DiagnosticOptions::default()).unwrap();
        assert!((r.statistic - 1.0).abs() < 1e-12);
        assert!((r.p_value - 1.0).abs() < 1e-9);
        let r = shapiro_wilk(&[1.0, 2.0, 10.0], &DiagnosticOptions::default()).unwrap();
        assert!((r.p_value - 0.194).abs() < 0.005);
    }

    #[test]
    fn shapiro_constant_and_bounds() {
        let r = shapiro_wilk(&[7.0; 12], &DiagnosticOptions::default()).unwrap();
        assert_eq!((r.statistic, r.p_value), (1.0, 1.0));
        assert_eq!(
            shapiro_wilk(&[1.0, 2.0], &DiagnosticOptions::default()).unwrap_err().kind(),
            StatErrorKind::InsufficientData
        );
        let big = vec![0.5; 5001];
        assert_eq!(
            shapiro_wilk(&big, &DiagnosticOptions::default()).unwrap_err().kind(),
            StatErrorKind::InvalidArgument
        );
    }

    #[test]
    fn screen_thresholds() {
        assert!(normality_screen(&[1.0, 100.0, 1.0, 1.0]).normal);
        let spread: Vec<f64> = (1..=20).map(f64::from).collect();
        assert!(normality_screen(&spread).normal);
        let mut spike = vec![0.0; 30];
        spike.push(100.0);
        let screen = normality_screen(&spike);
        assert!(!screen.normal);
        assert!(screen.skewness.unwrap() > 2.0);
    }

    #[test]
    fn unequal_spread_is_flagged() {
        let tight = [5.0, 5.0, 5.0, 5.0];
        let wide = [1.0, 10.0, 2.0, 9.0];

        let lev = levene(&[&tight[..], &wide[..]], &LeveneOptions::default()).unwrap();
        // deviations [0,0,0,0] vs [4.5,4.5,3.5,3.5]: F = 32 / (1/6)
        assert!((lev.statistic - 192.0).abs() < 1e-9);
        assert_eq!(lev.degrees_of_freedom(), Some(1.0));
        assert_eq!(lev.metadata.number("df_within"), Some(6.0));
        assert_eq!(lev.metadata.flag("equal_variances"), Some(false));

        let f = variance_ratio_test(&tight, &wide, &DiagnosticOptions::default()).unwrap();
        assert_eq!((f.statistic, f.p_value), (f64::INFINITY, 0.0));
        assert_eq!(f.degrees_of_freedom(), Some(3.0));
        assert_eq!(f.metadata.flag("equal_variances"), Some(false));
    }

    #[test]
    fn similar_spread_passes() {
        let a = [4.0, 5.0, 6.0, 5.5, 4.5, 5.2];
        let b = [14.0, 15.0, 16.0, 15.4, 14.6, 15.1];
        for center in [Center::Median, Center::Mean] {
            let r = levene(&[&a[..], &b[..]], &LeveneOptions::default().with_center(center)).unwrap();
            assert_eq!(r.metadata.flag("equal_variances"), Some(true));
        }
        let f = variance_ratio_test(&a, &b, &DiagnosticOptions::default()).unwrap();
        assert!(f.statistic >= 1.0);
        assert!(f.p_value > 0.05);
    }

    #[test]
    fn variance_ratio_sentinels_and_exact_tail() {
        let r = variance_ratio_test(&[3.0, 3.0], &[8.0, 8.0, 8.0], &DiagnosticOptions::default()).unwrap();
        assert_eq!((r.statistic, r.p_value), (1.0, 1.0));
        assert_eq!(r.metadata.flag("equal_variances"), Some(true));

        // variance ratio 10 with df (4, 4): upper tail of F(4, 4) at 10 is 0.02329
        let b = [1.0, 2.0, 3.0, 4.0, 5.0];
        let a: Vec<f64> = b.iter().map(|x| x * 10f64.sqrt()).collect();
        let r = variance_ratio_test(&b, &a, &DiagnosticOptions::default()).unwrap();
        assert!((r.statistic - 10.0).abs() < 1e-9);
        assert!((r.p_value - 2.0 * 0.023291).abs() < 1e-4);
    }

    #[test]
    fn levene_contract() {
        let one: [&[f64]; 1] = [&[1.0, 2.0]];
        assert!(levene(&one, &LeveneOptions::default()).is_err());
        let short: [&[f64]; 2] = [&[1.0, 2.0], &[3.0]];
        assert_eq!(
            levene(&short, &LeveneOptions::default()).unwrap_err().kind(),
            StatErrorKind::InsufficientData
        );
    }
}

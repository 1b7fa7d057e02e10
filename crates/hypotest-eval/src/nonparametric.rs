//! Rank-based tests: Mann-Whitney U, Wilcoxon signed-rank (paired and
//! one-sample) and Kruskal-Wallis H.
//!
//! P-values come from the normal (or chi-squared) approximation with tie
//! correction at every sample size. No exact small-sample tables are used, so
//! p-values for very small samples are approximate.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use hypotest_common::{Alternative, Metadata, StatError, StatResult, TestKind, TestResult, ensure_finite};

use crate::descriptive::rank_with_ties;
use crate::effect_size::{epsilon_squared, rank_biserial, wilcoxon_r};
use crate::report::{interpretation, validate_alpha};
use crate::special::{chi_squared_cdf, normal_cdf};

/// Fewest non-zero differences the signed-rank tests accept.
pub const WILCOXON_MIN_NONZERO: usize = 5;

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RankTestOptions {
    /// Ignored by Kruskal-Wallis, which is always an upper-tail test.
    pub alternative: Alternative,
    pub alpha: f64,
    /// Apply the 0.5 continuity correction to the normal approximation.
    pub continuity_correction: bool,
}

impl Default for RankTestOptions {
    fn default() -> Self {
        Self {
            alternative: Alternative::TwoSided,
            alpha: 0.05,
            continuity_correction: true,
        }
    }
}

impl RankTestOptions {
    pub fn with_alternative(mut self, alternative: Alternative) -> Self {
        self.alternative = alternative;
        self
    }

    pub fn with_alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self
    }

    pub fn with_continuity_correction(mut self, on: bool) -> Self {
        self.continuity_correction = on;
        self
    }

    pub fn validate(&self) -> StatResult<()> {
        validate_alpha(self.alpha)
    }

    fn correction(&self) -> f64 {
        if self.continuity_correction { 0.5 } else { 0.0 }
    }
}

/// Normal approximation for a rank statistic `s` with null mean `mu` and
/// variance `var`. Returns `(z, p)`; zero variance gives `(0, 1)`.
fn normal_approximation(s: f64, mu: f64, var: f64, cc: f64, alternative: Alternative) -> (f64, f64) {
    if !(var > 0.0) {
        return (0.0, 1.0);
    }
    let sd = var.sqrt();
    let (z, p) = match alternative {
        Alternative::TwoSided => {
            let z = ((s - mu).abs() - cc).max(0.0) / sd;
            (z.copysign(s - mu), 2.0 * (1.0 - normal_cdf(z)))
        }
        Alternative::Greater => {
            let z = (s - mu - cc) / sd;
            (z, 1.0 - normal_cdf(z))
        }
        Alternative::Less => {
            let z = (s - mu + cc) / sd;
            (z, normal_cdf(z))
        }
    };
    (z, p.clamp(0.0, 1.0))
}

/// Mann-Whitney U (Wilcoxon rank-sum) test for two independent samples.
///
/// The reported statistic is `min(U1, U2)`; one-sided alternatives are judged
/// on `U1`, the statistic of `a` (`Greater` means `a` tends to be larger).
pub fn mann_whitney(a: &[f64], b: &[f64], opts: &RankTestOptions) -> StatResult<TestResult> {
    #[cfg(feature = "tracing")]
    let _span = tracing::info_span!("mann_whitney", n1 = a.len(), n2 = b.len()).entered();
    opts.validate()?;
    for sample in [a, b] {
        if sample.len() < 2 {
            return Err(StatError::insufficient("mann-whitney u", 2, sample.len()));
        }
        ensure_finite("sample", sample)?;
    }

    let n1 = a.len() as f64;
    let n2 = b.len() as f64;
    let n = n1 + n2;
    let pooled: Vec<f64> = a.iter().chain(b).copied().collect();
    let ranking = rank_with_ties(&pooled);
    let rank_sum_a: f64 = ranking.ranks[..a.len()].iter().sum();

    let u1 = rank_sum_a - n1 * (n1 + 1.0) / 2.0;
    let u2 = n1 * n2 - u1;
    let u = u1.min(u2);

    let mu = n1 * n2 / 2.0;
    let var = n1 * n2 / 12.0 * ((n + 1.0) - ranking.tie_term() / (n * (n - 1.0)));
    #[cfg(feature = "tracing")]
    if !(var > 0.0) {
        tracing::debug!("mann_whitney_all_tied");
    }
    let (z, p) = normal_approximation(u1, mu, var, opts.correction(), opts.alternative);

    let effect = rank_biserial(u, a.len(), b.len());
    let metadata = Metadata::new()
        .with("n1", a.len())
        .with("n2", b.len())
        .with("u1", u1)
        .with("u2", u2)
        .with("rank_sum_a", rank_sum_a)
        .with("z", z)
        .with("tie_groups", ranking.ties.len())
        .with("alternative", opts.alternative.as_str());

    let kind = TestKind::MannWhitney;
    Ok(TestResult::new(kind, u, p)
        .with_interpretation(interpretation(kind, p, opts.alpha, Some(&effect)))
        .with_effect_size(effect)
        .with_metadata(metadata))
}

/// Shared signed-rank core over raw differences (zeros are dropped here).
fn signed_rank(
    context: &'static str,
    diffs: &[f64],
    opts: &RankTestOptions,
    mut metadata: Metadata,
) -> StatResult<TestResult> {
    let nonzero: Vec<f64> = diffs.iter().copied().filter(|d| *d != 0.0).collect();
    let n = nonzero.len();
    if n < WILCOXON_MIN_NONZERO {
        return Err(StatError::insufficient(context, WILCOXON_MIN_NONZERO, n));
    }

    let abs: Vec<f64> = nonzero.iter().map(|d| d.abs()).collect();
    let ranking = rank_with_ties(&abs);
    let (mut w_plus, mut w_minus) = (0.0, 0.0);
    for (d, r) in nonzero.iter().zip(&ranking.ranks) {
        if *d > 0.0 {
            w_plus += r;
        } else {
            w_minus += r;
        }
    }
    let w = w_plus.min(w_minus);

    let nf = n as f64;
    let mu = nf * (nf + 1.0) / 4.0;
    let var = nf * (nf + 1.0) * (2.0 * nf + 1.0) / 24.0 - ranking.tie_term() / 48.0;
    let (z, p) = normal_approximation(w_plus, mu, var, opts.correction(), opts.alternative);

    metadata.insert("w_plus", w_plus);
    metadata.insert("w_minus", w_minus);
    metadata.insert("n_nonzero", n);
    metadata.insert("n_zero_dropped", diffs.len() - n);
    metadata.insert("z", z);
    metadata.insert("alternative", opts.alternative.as_str());

    let kind = TestKind::WilcoxonSignedRank;
    let effect = wilcoxon_r(z, n);
    let mut result = TestResult::new(kind, w, p)
        .with_interpretation(interpretation(kind, p, opts.alpha, effect.as_ref()))
        .with_metadata(metadata);
    if let Some(effect) = effect {
        result = result.with_effect_size(effect);
    }
    Ok(result)
}

/// Wilcoxon signed-rank test on the paired differences `a[i] - b[i]`.
///
/// Zero differences are discarded and at least five must remain. The effect
/// size `r = |z| / sqrt(n)` is only attached when more than 25 remain.
pub fn wilcoxon_signed_rank(a: &[f64], b: &[f64], opts: &RankTestOptions) -> StatResult<TestResult> {
    #[cfg(feature = "tracing")]
    let _span = tracing::info_span!("wilcoxon_signed_rank", n = a.len()).entered();
    opts.validate()?;
    if a.len() != b.len() {
        return Err(StatError::length_mismatch("wilcoxon signed-rank", a.len(), b.len()));
    }
    ensure_finite("sample", a)?;
    ensure_finite("sample", b)?;
    let diffs: Vec<f64> = a.iter().zip(b).map(|(x, y)| x - y).collect();
    signed_rank(
        "wilcoxon signed-rank",
        &diffs,
        opts,
        Metadata::new().with("n", a.len()),
    )
}

/// One-sample signed-rank test of `median(data) == median`.
pub fn wilcoxon_one_sample(data: &[f64], median: f64, opts: &RankTestOptions) -> StatResult<TestResult> {
    #[cfg(feature = "tracing")]
    let _span = tracing::info_span!("wilcoxon_one_sample", n = data.len()).entered();
    opts.validate()?;
    ensure_finite("sample", data)?;
    if !median.is_finite() {
        return Err(StatError::invalid("median", median, "hypothesised median must be finite"));
    }
    let diffs: Vec<f64> = data.iter().map(|x| x - median).collect();
    signed_rank(
        "wilcoxon one-sample",
        &diffs,
        opts,
        Metadata::new().with("n", data.len()).with("mu", median),
    )
}

/// Kruskal-Wallis H test across two or more independent groups.
pub fn kruskal_wallis<S: AsRef<[f64]>>(groups: &[S], opts: &RankTestOptions) -> StatResult<TestResult> {
    #[cfg(feature = "tracing")]
    let _span = tracing::info_span!("kruskal_wallis", groups = groups.len()).entered();
    opts.validate()?;
    let k = groups.len();
    if k < 2 {
        return Err(StatError::insufficient("kruskal-wallis", 2, k));
    }
    let mut pooled = Vec::new();
    let mut sizes = Vec::with_capacity(k);
    for g in groups {
        let g = g.as_ref();
        if g.is_empty() {
            return Err(StatError::insufficient("kruskal-wallis", 1, 0));
        }
        ensure_finite("sample", g)?;
        pooled.extend_from_slice(g);
        sizes.push(g.len());
    }

    let n = pooled.len() as f64;
    let ranking = rank_with_ties(&pooled);
    let mut offset = 0;
    let mut rank_sums = Vec::with_capacity(k);
    let mut sum_term = 0.0;
    for &size in &sizes {
        let r: f64 = ranking.ranks[offset..offset + size].iter().sum();
        sum_term += r * r / size as f64;
        rank_sums.push(r);
        offset += size;
    }

    let h_raw = 12.0 / (n * (n + 1.0)) * sum_term - 3.0 * (n + 1.0);
    let tie_correction = 1.0 - ranking.tie_term() / (n * n * n - n);
    let df = (k - 1) as f64;
    let (h, p) = if tie_correction > 0.0 {
        let h = (h_raw / tie_correction).max(0.0);
        (h, (1.0 - chi_squared_cdf(h, df)).clamp(0.0, 1.0))
    } else {
        #[cfg(feature = "tracing")]
        tracing::debug!("kruskal_wallis_all_tied");
        (0.0, 1.0)
    };

    let effect = epsilon_squared(h, pooled.len());
    let metadata = Metadata::new()
        .with("df", df)
        .with("k", k)
        .with("n_total", pooled.len())
        .with("rank_sums", rank_sums)
        .with("tie_correction", tie_correction);

    let kind = TestKind::KruskalWallis;
    Ok(TestResult::new(kind, h, p)
        .with_interpretation(interpretation(kind, p, opts.alpha, Some(&effect)))
        .with_effect_size(effect)
        .with_metadata(metadata))
}

#[cfg(test)]
mod tests {
    use super::*;
    use hypotest_common::{EffectSize, StatErrorKind};

    const LOW: [f64; 5] = [1.0, 2.0, 3.0, 4.0, 5.0];
    const HIGH: [f64; 5] = [6.0, 7.0, 8.0, 9.0, 10.0];

    #[test]
    fn mann_whitney_separated_samples() {
        let r = mann_whitney(&LOW, &HIGH, &RankTestOptions::default()).unwrap();
        assert_eq!(r.statistic, 0.0);
        assert_eq!(r.metadata.number("u2"), Some(25.0));
        // z = 12 / sqrt(275 / 12)
        assert!((r.p_value - 0.01219).abs() < 2e-4);
        assert_eq!(r.effect_size.unwrap().value(), 1.0);
    }

    #[test]
    fn mann_whitney_one_sided_uses_first_sample() {
        let less = mann_whitney(&LOW, &HIGH, &RankTestOptions::default().with_alternative(Alternative::Less))
            .unwrap();
        let greater = mann_whitney(
            &LOW,
            &HIGH,
            &RankTestOptions::default().with_alternative(Alternative::Greater),
        )
        .unwrap();
        assert!(less.p_value < 0.01);
        assert!(greater.p_value > 0.99);
    }

    #[test]
    fn mann_whitney_all_tied_is_uninformative() {
        let r = mann_whitney(&[3.0, 3.0, 3.0], &[3.0, 3.0], &RankTestOptions::default()).unwrap();
        assert_eq!(r.p_value, 1.0);
        assert_eq!(r.statistic, 3.0);
    }

    #[test]
    fn mann_whitney_needs_two_per_group() {
        let err = mann_whitney(&[1.0], &HIGH, &RankTestOptions::default()).unwrap_err();
        assert_eq!(err.kind(), StatErrorKind::InsufficientData);
    }

    #[test]
    fn signed_rank_all_positive() {
        let a = [11.0, 12.0, 13.0, 14.0, 15.0, 16.0];
        let b = [10.0; 6];
        let r = wilcoxon_signed_rank(&a, &b, &RankTestOptions::default()).unwrap();
        assert_eq!(r.statistic, 0.0);
        assert_eq!(r.metadata.number("w_plus"), Some(21.0));
        // z = 10 / sqrt(22.75)
        assert!((r.p_value - 0.0360).abs() < 1e-3);
        assert!(r.effect_size.is_none());
    }

    #[test]
    fn signed_rank_drops_zeros_and_enforces_minimum() {
        let a = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let b = [1.0, 1.0, 2.0, 3.0, 4.0, 5.0];
        let err = wilcoxon_signed_rank(&a, &b[..5], &RankTestOptions::default()).unwrap_err();
        assert_eq!(err.kind(), StatErrorKind::LengthMismatch);
        // one zero difference leaves five
        let r = wilcoxon_signed_rank(&a, &b, &RankTestOptions::default()).unwrap();
        assert_eq!(r.metadata.number("n_zero_dropped"), Some(1.0));
        let err = wilcoxon_signed_rank(&a[..5], &b[..5], &RankTestOptions::default()).unwrap_err();
        assert!(matches!(err, StatError::InsufficientData { required: 5, actual: 4, .. }));
    }

    #[test]
    fn signed_rank_effect_size_for_large_n() {
        let a: Vec<f64> = (1..=30).map(|i| i as f64 + 0.5).collect();
        let b: Vec<f64> = (1..=30).map(|i| if i % 4 == 0 { i as f64 + 1.0 } else { i as f64 }).collect();
        let r = wilcoxon_signed_rank(&a, &b, &RankTestOptions::default()).unwrap();
        assert!(matches!(r.effect_size, Some(EffectSize::WilcoxonR { .. })));
    }

    #[test]
    fn one_sample_signed_rank() {
        let data = [2.1, 3.4, 1.9, 5.6, 4.4, 3.8, 4.9, 2.7];
        let r = wilcoxon_one_sample(&data, 3.5, &RankTestOptions::default()).unwrap();
        assert!(r.p_value > 0.05);
        assert_eq!(r.metadata.number("mu"), Some(3.5));
    }

    #[test]
    fn kruskal_wallis_separated_groups() {
        let groups = [vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0], vec![7.0, 8.0, 9.0]];
        let r = kruskal_wallis(&groups, &RankTestOptions::default()).unwrap();
        assert!((r.statistic - 7.2).abs() < 1e-9);
        assert!((r.p_value - (-3.6f64).exp()).abs() < 1e-6);
        assert!((r.effect_size.unwrap().value() - 0.9).abs() < 1e-9);
        assert_eq!(r.degrees_of_freedom(), Some(2.0));
    }

    #[test]
    fn kruskal_wallis_degenerate_and_invalid() {
        let tied: [&[f64]; 2] = [&[4.0, 4.0], &[4.0, 4.0, 4.0]];
        let r = kruskal_wallis(&tied, &RankTestOptions::default()).unwrap();
        assert_eq!((r.statistic, r.p_value), (0.0, 1.0));

        let one: [&[f64]; 1] = [&[1.0, 2.0]];
        assert!(kruskal_wallis(&one, &RankTestOptions::default()).is_err());
        let empty: [&[f64]; 2] = [&[1.0, 2.0], &[]];
        assert!(kruskal_wallis(&empty, &RankTestOptions::default()).is_err());
    }
}

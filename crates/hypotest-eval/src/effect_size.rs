//! Effect sizes and their qualitative bands.
//!
//! Bands follow Cohen (1988):
//! - standardized mean differences: 0.2 / 0.5 / 0.8
//! - correlation-type measures (rank-biserial, r): 0.1 / 0.3 / 0.5
//! - variance-explained measures (η², ω², ε²): 0.01 / 0.06 / 0.14
//!
//! A zero pooled (or control) standard deviation yields an effect of 0.0.

use hypotest_common::{EffectSize, EffectSizeKind, Magnitude, StatError, StatResult};

use crate::descriptive::{mean, variance};

pub const D_THRESHOLDS: [f64; 3] = [0.2, 0.5, 0.8];
pub const R_THRESHOLDS: [f64; 3] = [0.1, 0.3, 0.5];
pub const ETA_THRESHOLDS: [f64; 3] = [0.01, 0.06, 0.14];

/// Minimum number of non-zero differences for which `r = |z| / sqrt(n)` is reported.
pub const WILCOXON_R_MIN_N: usize = 26;

pub fn interpret_d(d: f64) -> Magnitude {
    Magnitude::classify(d, D_THRESHOLDS)
}

pub fn interpret_r(r: f64) -> Magnitude {
    Magnitude::classify(r, R_THRESHOLDS)
}

pub fn interpret_eta_squared(eta_sq: f64) -> Magnitude {
    Magnitude::classify(eta_sq, ETA_THRESHOLDS)
}

fn group_summary(context: &'static str, data: &[f64], min: usize) -> StatResult<(f64, f64, f64)> {
    if data.len() < min {
        return Err(StatError::insufficient(context, min, data.len()));
    }
    let m = mean(data).ok_or_else(|| StatError::insufficient(context, min, 0))?;
    let v = variance(data).unwrap_or(0.0);
    Ok((m, v, data.len() as f64))
}

fn pooled_sd(v1: f64, n1: f64, v2: f64, n2: f64) -> f64 {
    (((n1 - 1.0) * v1 + (n2 - 1.0) * v2) / (n1 + n2 - 2.0)).sqrt()
}

fn standardized(diff: f64, sd: f64) -> f64 {
    if sd > 0.0 { diff / sd } else { 0.0 }
}

/// Raw Cohen's d, `(mean_a - mean_b) / pooled_sd`.
pub fn cohens_d_value(a: &[f64], b: &[f64]) -> StatResult<f64> {
    let (m1, v1, n1) = group_summary("cohen's d", a, 1)?;
    let (m2, v2, n2) = group_summary("cohen's d", b, 1)?;
    if n1 + n2 < 3.0 {
        return Err(StatError::insufficient("cohen's d", 3, (n1 + n2) as usize));
    }
    Ok(standardized(m1 - m2, pooled_sd(v1, n1, v2, n2)))
}

/// Cohen's d; negative when `b` has the larger mean.
pub fn cohens_d(a: &[f64], b: &[f64]) -> StatResult<EffectSize> {
    let value = cohens_d_value(a, b)?;
    Ok(EffectSize::CohensD {
        value,
        interpretation: interpret_d(value),
    })
}

/// Hedges' g: Cohen's d times the small-sample factor `1 - 3 / (4(n1 + n2) - 9)`.
pub fn hedges_g(a: &[f64], b: &[f64]) -> StatResult<EffectSize> {
    let d = cohens_d_value(a, b)?;
    let n = (a.len() + b.len()) as f64;
    let value = d * (1.0 - 3.0 / (4.0 * n - 9.0));
    Ok(EffectSize::HedgesG {
        value,
        interpretation: interpret_d(value),
    })
}

/// Glass's Δ, standardized by the control group `b` only.
pub fn glass_delta(a: &[f64], b: &[f64]) -> StatResult<EffectSize> {
    let (m1, _, _) = group_summary("glass's delta", a, 1)?;
    let (m2, v2, _) = group_summary("glass's delta", b, 2)?;
    let value = standardized(m1 - m2, v2.sqrt());
    Ok(EffectSize::GlassDelta {
        value,
        interpretation: interpret_d(value),
    })
}

/// Cohen's d_z on the paired differences `a[i] - b[i]`.
pub fn paired_cohens_d(a: &[f64], b: &[f64]) -> StatResult<EffectSize> {
    if a.len() != b.len() {
        return Err(StatError::length_mismatch("paired cohen's d", a.len(), b.len()));
    }
    let diffs: Vec<f64> = a.iter().zip(b).map(|(x, y)| x - y).collect();
    let (m, v, _) = group_summary("paired cohen's d", &diffs, 2)?;
    let value = standardized(m, v.sqrt());
    Ok(EffectSize::PairedCohensD {
        value,
        interpretation: interpret_d(value),
    })
}

/// Mean-difference measure selected by `kind`.
pub fn two_sample(kind: EffectSizeKind, a: &[f64], b: &[f64]) -> StatResult<EffectSize> {
    match kind {
        EffectSizeKind::CohensD => cohens_d(a, b),
        EffectSizeKind::HedgesG => hedges_g(a, b),
        EffectSizeKind::GlassDelta => glass_delta(a, b),
    }
}

/// Rank-biserial correlation `1 - 2U / (n1 n2)`.
pub fn rank_biserial(u: f64, n1: usize, n2: usize) -> EffectSize {
    let prod = (n1 * n2) as f64;
    let value = if prod > 0.0 { 1.0 - 2.0 * u / prod } else { 0.0 };
    EffectSize::RankBiserial {
        value,
        interpretation: interpret_r(value),
    }
}

/// `r = |z| / sqrt(n)`, only reported for `n > 25`.
pub fn wilcoxon_r(z: f64, n: usize) -> Option<EffectSize> {
    if n < WILCOXON_R_MIN_N {
        return None;
    }
    let value = z.abs() / (n as f64).sqrt();
    Some(EffectSize::WilcoxonR {
        value,
        interpretation: interpret_r(value),
    })
}

/// η² and ω² from an ANOVA decomposition; banded on η².
///
/// ω² is floored at 0. A zero total sum of squares gives 0 for both.
pub fn eta_omega_squared(
    ss_between: f64,
    ss_total: f64,
    df_between: f64,
    ms_within: f64,
) -> EffectSize {
    let (eta_squared, omega_squared) = if ss_total > 0.0 {
        let eta = (ss_between / ss_total).clamp(0.0, 1.0);
        let omega = ((ss_between - df_between * ms_within) / (ss_total + ms_within)).max(0.0);
        (eta, omega)
    } else {
        (0.0, 0.0)
    };
    EffectSize::EtaSquared {
        eta_squared,
        omega_squared,
        interpretation: interpret_eta_squared(eta_squared),
    }
}

/// ε² = H / (N - 1) for Kruskal-Wallis.
pub fn epsilon_squared(h: f64, n_total: usize) -> EffectSize {
    let value = if n_total > 1 {
        (h / (n_total as f64 - 1.0)).max(0.0)
    } else {
        0.0
    };
    EffectSize::EpsilonSquared {
        value,
        interpretation: interpret_eta_squared(value),
    }
}

/// Cohen's f from η², `sqrt(η² / (1 - η²))`.
pub fn cohens_f(eta_squared: f64) -> f64 {
    if eta_squared >= 1.0 {
        return f64::INFINITY;
    }
    (eta_squared.max(0.0) / (1.0 - eta_squared)).sqrt()
}

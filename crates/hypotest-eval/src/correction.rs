//! Multiple-comparison p-value adjustment.
//!
//! Every method returns adjusted p-values in input order, one per input, each
//! within [0, 1]. For the same input the adjustments are ordered
//! Bonferroni ≥ Holm ≥ Benjamini-Hochberg element-wise.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use hypotest_common::{CorrectionMethod, StatError, StatResult};

use crate::report::validate_alpha;

fn check_p_values(p_values: &[f64]) -> StatResult<()> {
    match p_values.iter().find(|p| !(0.0..=1.0).contains(*p)) {
        Some(p) => Err(StatError::invalid("p_values", p, "every p-value must lie in [0, 1]")),
        None => Ok(()),
    }
}

/// Indices of `p_values` in ascending p order (stable for ties).
fn ascending_order(p_values: &[f64]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..p_values.len()).collect();
    order.sort_by(|&a, &b| p_values[a].total_cmp(&p_values[b]));
    order
}

/// `min(p · n, 1)`.
pub fn bonferroni(p_values: &[f64]) -> StatResult<Vec<f64>> {
    check_p_values(p_values)?;
    let n = p_values.len() as f64;
    Ok(p_values.iter().map(|p| (p * n).min(1.0)).collect())
}

/// Holm step-down: `p(i) · (n - i + 1)` over ascending ranks, kept monotone
/// with a running maximum.
pub fn holm(p_values: &[f64]) -> StatResult<Vec<f64>> {
    check_p_values(p_values)?;
    let n = p_values.len();
    let mut adjusted = vec![0.0; n];
    let mut running_max = 0.0f64;
    for (i, &idx) in ascending_order(p_values).iter().enumerate() {
        let value = (p_values[idx] * (n - i) as f64).min(1.0);
        running_max = running_max.max(value);
        adjusted[idx] = running_max;
    }
    Ok(adjusted)
}

/// Benjamini-Hochberg step-up: `p(i) · n / i`, kept monotone with a running
/// minimum taken from the largest rank down.
pub fn benjamini_hochberg(p_values: &[f64]) -> StatResult<Vec<f64>> {
    check_p_values(p_values)?;
    let n = p_values.len();
    let mut adjusted = vec![0.0; n];
    let mut running_min = 1.0f64;
    for (i, &idx) in ascending_order(p_values).iter().enumerate().rev() {
        let rank = (i + 1) as f64;
        let value = (p_values[idx] * n as f64 / rank).min(1.0);
        running_min = running_min.min(value);
        adjusted[idx] = running_min;
    }
    Ok(adjusted)
}

pub fn adjusted_p_values(p_values: &[f64], method: CorrectionMethod) -> StatResult<Vec<f64>> {
    match method {
        CorrectionMethod::Bonferroni => bonferroni(p_values),
        CorrectionMethod::Holm => holm(p_values),
        CorrectionMethod::BenjaminiHochberg => benjamini_hochberg(p_values),
    }
}

/// One adjusted hypothesis.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CorrectionResult {
    pub index: usize,
    pub p_value: f64,
    pub adjusted_p_value: f64,
    pub alpha: f64,
    /// `p_value < alpha`, before any correction.
    pub significant_before: bool,
    /// `adjusted_p_value < alpha`, after correction.
    pub significant: bool,
    pub method: CorrectionMethod,
}

/// Adjust `p_values` with `method` and flag each against `alpha`.
pub fn adjust(p_values: &[f64], method: CorrectionMethod, alpha: f64) -> StatResult<Vec<CorrectionResult>> {
    #[cfg(feature = "tracing")]
    let _span = tracing::info_span!("adjust", method = method.as_str(), m = p_values.len()).entered();
    validate_alpha(alpha)?;
    let adjusted = adjusted_p_values(p_values, method)?;
    Ok(p_values
        .iter()
        .zip(adjusted)
        .enumerate()
        .map(|(index, (&p_value, adjusted_p_value))| CorrectionResult {
            index,
            p_value,
            adjusted_p_value,
            alpha,
            significant_before: p_value < alpha,
            significant: adjusted_p_value < alpha,
            method,
        })
        .collect())
}

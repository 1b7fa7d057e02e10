//! Descriptive statistics shared by every test.
//!
//! Notes:
//! - Empty input yields `None`, never a silent zero.
//! - Variance uses the `n - 1` denominator unless a `ddof` is given; a single
//!   observation has variance `Some(0.0)`.
//! - Zero-variance data never fails: skewness and kurtosis are 0, z-scores are all 0.
//! - Only [`pearson`] returns an error (length mismatch or fewer than two pairs).

use hypotest_common::{StatError, StatResult};

/// Copy of `data` in ascending order.
pub fn sorted(data: &[f64]) -> Vec<f64> {
    let mut out = data.to_vec();
    out.sort_by(f64::total_cmp);
    out
}

pub fn mean(data: &[f64]) -> Option<f64> {
    if data.is_empty() {
        return None;
    }
    Some(data.iter().sum::<f64>() / data.len() as f64)
}

pub fn median(data: &[f64]) -> Option<f64> {
    quantile(data, 0.5)
}

/// Sum of squared deviations from the mean (Excel's DEVSQ).
pub fn sum_of_squares(data: &[f64]) -> Option<f64> {
    let m = mean(data)?;
    Some(data.iter().map(|x| (x - m) * (x - m)).sum())
}

/// Sample variance (`n - 1` denominator).
pub fn variance(data: &[f64]) -> Option<f64> {
    variance_with(data, 1)
}

pub fn population_variance(data: &[f64]) -> Option<f64> {
    variance_with(data, 0)
}

/// Variance with `n - ddof` in the denominator; `Some(0.0)` when `n <= ddof`.
pub fn variance_with(data: &[f64], ddof: usize) -> Option<f64> {
    let ss = sum_of_squares(data)?;
    let n = data.len();
    if n <= ddof {
        return Some(0.0);
    }
    Some(ss / (n - ddof) as f64)
}

pub fn stdev(data: &[f64]) -> Option<f64> {
    variance(data).map(f64::sqrt)
}

/// Standard error of the mean, `s / sqrt(n)`.
pub fn sem(data: &[f64]) -> Option<f64> {
    let s = stdev(data)?;
    Some(s / (data.len() as f64).sqrt())
}

/// Quantile by linear interpolation between order statistics (`q` in [0, 1]).
pub fn quantile(data: &[f64], q: f64) -> Option<f64> {
    if data.is_empty() || !(0.0..=1.0).contains(&q) {
        return None;
    }
    Some(quantile_sorted(&sorted(data), q))
}

/// Same as [`quantile`] for data already in ascending order (non-empty, `q` in range).
pub(crate) fn quantile_sorted(sorted: &[f64], q: f64) -> f64 {
    if sorted.len() == 1 {
        return sorted[0];
    }
    let rank = q * (sorted.len() - 1) as f64; // 0-based rank
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    if lo == hi {
        return sorted[lo];
    }
    let frac = rank - lo as f64;
    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}

/// Bias-corrected sample skewness (G1). `None` for fewer than 3 values.
pub fn skewness(data: &[f64]) -> Option<f64> {
    let n = data.len();
    if n < 3 {
        return None;
    }
    let m = mean(data)?;
    let s = stdev(data)?;
    if s == 0.0 {
        return Some(0.0);
    }
    let n_f = n as f64;
    let sum_cubed: f64 = data.iter().map(|x| ((x - m) / s).powi(3)).sum();
    Some(n_f / ((n_f - 1.0) * (n_f - 2.0)) * sum_cubed)
}

/// Excess kurtosis with the small-sample correction (G2). `None` for fewer than 4 values.
pub fn kurtosis(data: &[f64]) -> Option<f64> {
    let n = data.len();
    if n < 4 {
        return None;
    }
    let m = mean(data)?;
    let s = stdev(data)?;
    if s == 0.0 {
        return Some(0.0);
    }
    let n_f = n as f64;
    let sum_fourth: f64 = data.iter().map(|x| ((x - m) / s).powi(4)).sum();
    let lead = n_f * (n_f + 1.0) / ((n_f - 1.0) * (n_f - 2.0) * (n_f - 3.0));
    let tail = 3.0 * (n_f - 1.0).powi(2) / ((n_f - 2.0) * (n_f - 3.0));
    Some(lead * sum_fourth - tail)
}

/// Pearson product-moment correlation.
///
/// Fails when the inputs differ in length or hold fewer than two pairs.
/// Returns 0.0 when either side has zero variance.
pub fn pearson(x: &[f64], y: &[f64]) -> StatResult<f64> {
    if x.len() != y.len() {
        return Err(StatError::length_mismatch("pearson correlation", x.len(), y.len()));
    }
    if x.len() < 2 {
        return Err(StatError::insufficient("pearson correlation", 2, x.len()));
    }
    let n = x.len() as f64;
    let mx = x.iter().sum::<f64>() / n;
    let my = y.iter().sum::<f64>() / n;
    let mut sxy = 0.0;
    let mut sxx = 0.0;
    let mut syy = 0.0;
    for (a, b) in x.iter().zip(y) {
        let dx = a - mx;
        let dy = b - my;
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }
    if sxx == 0.0 || syy == 0.0 {
        return Ok(0.0);
    }
    Ok((sxy / (sxx * syy).sqrt()).clamp(-1.0, 1.0))
}

/// Standardized scores `(x - mean) / s`; all zero for constant data.
pub fn z_scores(data: &[f64]) -> Vec<f64> {
    let (Some(m), Some(s)) = (mean(data), stdev(data)) else {
        return Vec::new();
    };
    if s == 0.0 {
        return vec![0.0; data.len()];
    }
    data.iter().map(|x| (x - m) / s).collect()
}

/// Mid-ranks (1-based) plus the sizes of every tie group.
#[derive(Debug, Clone, PartialEq)]
pub struct Ranking {
    /// Rank of each input position, in input order.
    pub ranks: Vec<f64>,
    /// Size of each run of equal values (only runs longer than one).
    pub ties: Vec<usize>,
}

impl Ranking {
    /// `sum(t^3 - t)` over tie groups, the usual variance correction term.
    pub fn tie_term(&self) -> f64 {
        self.ties
            .iter()
            .map(|&t| {
                let t = t as f64;
                t * t * t - t
            })
            .sum()
    }
}

/// Ranks with ties sharing the average of the positions they span.
pub fn rank_with_ties(data: &[f64]) -> Ranking {
    let n = data.len();
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| data[a].total_cmp(&data[b]));

    let mut ranks = vec![0.0; n];
    let mut ties = Vec::new();
    let mut i = 0;
    while i < n {
        let mut j = i + 1;
        while j < n && data[order[j]] == data[order[i]] {
            j += 1;
        }
        // Positions i..j are tied; average of 1-based ranks i+1..=j
        let avg_rank = (i + 1 + j) as f64 / 2.0;
        for &idx in &order[i..j] {
            ranks[idx] = avg_rank;
        }
        if j - i > 1 {
            ties.push(j - i);
        }
        i = j;
    }
    Ranking { ranks, ties }
}

/// Mid-ranks of `data` in input order.
pub fn rank(data: &[f64]) -> Vec<f64> {
    rank_with_ties(data).ranks
}

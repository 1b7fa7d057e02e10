//! Confidence intervals: analytical (t for the mean, chi-squared for the
//! variance) and percentile bootstrap.
//!
//! Resampling never touches a global generator. Callers either pass their own
//! RNG to [`bootstrap_with_rng`] / [`bootstrap_difference_with_rng`] or let
//! [`confidence_interval`] / [`bootstrap_difference`] seed a `SmallRng` from
//! `IntervalOptions::seed`. When no seed is given a time-derived one is used,
//! and either way the seed is recorded in the result metadata.

use std::time::{SystemTime, UNIX_EPOCH};

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use hypotest_common::{
    ConfidenceInterval, IntervalMethod, IntervalStatistic, Metadata, StatError, StatResult,
    ensure_finite,
};

use crate::descriptive::{mean, quantile_sorted, variance};
use crate::report::validate_confidence_level;
use crate::special::{chi_squared_quantile, t_quantile};

pub const DEFAULT_BOOTSTRAP_ITERATIONS: usize = 10_000;

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntervalOptions {
    pub statistic: IntervalStatistic,
    pub method: IntervalMethod,
    pub confidence_level: f64,
    /// Bootstrap resamples; must be at least 1.
    pub iterations: usize,
    pub seed: Option<u64>,
}

impl Default for IntervalOptions {
    fn default() -> Self {
        Self {
            statistic: IntervalStatistic::Mean,
            method: IntervalMethod::Analytical,
            confidence_level: 0.95,
            iterations: DEFAULT_BOOTSTRAP_ITERATIONS,
            seed: None,
        }
    }
}

impl IntervalOptions {
    pub fn with_statistic(mut self, statistic: IntervalStatistic) -> Self {
        self.statistic = statistic;
        self
    }

    pub fn with_method(mut self, method: IntervalMethod) -> Self {
        self.method = method;
        self
    }

    pub fn with_confidence_level(mut self, level: f64) -> Self {
        self.confidence_level = level;
        self
    }

    pub fn with_iterations(mut self, iterations: usize) -> Self {
        self.iterations = iterations;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn validate(&self) -> StatResult<()> {
        validate_confidence_level(self.confidence_level)?;
        if self.iterations == 0 {
            return Err(StatError::invalid(
                "iterations",
                self.iterations,
                "at least one bootstrap resample is required",
            ));
        }
        Ok(())
    }
}

/// A point estimate with its interval.
///
/// `method` is the method actually used: a median requested analytically is
/// reported as `Bootstrap`.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct IntervalEstimate {
    pub statistic: IntervalStatistic,
    pub method: IntervalMethod,
    pub estimate: f64,
    pub interval: ConfidenceInterval,
    pub metadata: Metadata,
}

fn evaluate(statistic: IntervalStatistic, data: &mut [f64]) -> f64 {
    match statistic {
        IntervalStatistic::Mean => mean(data).unwrap_or(f64::NAN),
        IntervalStatistic::Variance => variance(data).unwrap_or(f64::NAN),
        IntervalStatistic::Median => {
            data.sort_by(f64::total_cmp);
            quantile_sorted(data, 0.5)
        }
    }
}

fn check_sample(context: &'static str, data: &[f64]) -> StatResult<()> {
    if data.len() < 2 {
        return Err(StatError::insufficient(context, 2, data.len()));
    }
    ensure_finite("sample", data)
}

/// Seed from the wall clock, for runs that did not ask for one.
fn time_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() ^ (u64::from(d.subsec_nanos()) << 32))
        .unwrap_or(0)
}

fn seeded_rng(opts: &IntervalOptions) -> (SmallRng, u64, &'static str) {
    let (seed, source) = match opts.seed {
        Some(seed) => (seed, "explicit"),
        None => (time_seed(), "time"),
    };
    #[cfg(feature = "tracing")]
    tracing::debug!(seed, source, "bootstrap_seed");
    (SmallRng::seed_from_u64(seed), seed, source)
}

/// Interval for one sample per `opts.statistic` / `opts.method`.
pub fn confidence_interval(data: &[f64], opts: &IntervalOptions) -> StatResult<IntervalEstimate> {
    #[cfg(feature = "tracing")]
    let _span = tracing::info_span!("confidence_interval", n = data.len()).entered();
    opts.validate()?;
    check_sample("confidence interval", data)?;

    let analytical = match (opts.method, opts.statistic) {
        (IntervalMethod::Analytical, IntervalStatistic::Mean) => Some(mean_interval(data, opts)),
        (IntervalMethod::Analytical, IntervalStatistic::Variance) => Some(variance_interval(data, opts)),
        // No closed form for the median
        (IntervalMethod::Analytical, IntervalStatistic::Median) | (IntervalMethod::Bootstrap, _) => None,
    };
    if let Some(estimate) = analytical {
        return estimate;
    }

    let (mut rng, seed, source) = seeded_rng(opts);
    let mut estimate = bootstrap_with_rng(data, opts, &mut rng)?;
    estimate.metadata.insert("seed", seed.to_string());
    estimate.metadata.insert("seed_source", source);
    if opts.method == IntervalMethod::Analytical {
        estimate.metadata.insert("fallback", "bootstrap");
    }
    Ok(estimate)
}

fn mean_interval(data: &[f64], opts: &IntervalOptions) -> StatResult<IntervalEstimate> {
    let n = data.len() as f64;
    let m = mean(data).unwrap_or(0.0);
    let se = variance(data).unwrap_or(0.0).sqrt() / n.sqrt();
    let df = n - 1.0;
    let alpha = 1.0 - opts.confidence_level;
    let t_crit = t_quantile(df, 1.0 - alpha / 2.0)
        .ok_or_else(|| StatError::invalid("confidence_level", opts.confidence_level, "no t quantile"))?;
    let half = t_crit * se;
    Ok(IntervalEstimate {
        statistic: IntervalStatistic::Mean,
        method: IntervalMethod::Analytical,
        estimate: m,
        interval: ConfidenceInterval::new(m - half, m + half, opts.confidence_level),
        metadata: Metadata::new()
            .with("n", data.len())
            .with("df", df)
            .with("std_error", se)
            .with("t_critical", t_crit),
    })
}

fn variance_interval(data: &[f64], opts: &IntervalOptions) -> StatResult<IntervalEstimate> {
    let df = data.len() as f64 - 1.0;
    let var = variance(data).unwrap_or(0.0);
    let alpha = 1.0 - opts.confidence_level;
    let no_quantile = || StatError::invalid("confidence_level", opts.confidence_level, "no chi-squared quantile");
    let chi_upper = chi_squared_quantile(df, 1.0 - alpha / 2.0).ok_or_else(no_quantile)?;
    let chi_lower = chi_squared_quantile(df, alpha / 2.0).ok_or_else(no_quantile)?;
    Ok(IntervalEstimate {
        statistic: IntervalStatistic::Variance,
        method: IntervalMethod::Analytical,
        estimate: var,
        interval: ConfidenceInterval::new(df * var / chi_upper, df * var / chi_lower, opts.confidence_level),
        metadata: Metadata::new()
            .with("n", data.len())
            .with("df", df)
            .with("chi_squared_lower", chi_lower)
            .with("chi_squared_upper", chi_upper),
    })
}

/// Percentile interval from sorted bootstrap replicates, plus their summary.
fn percentile_interval(mut replicates: Vec<f64>, level: f64) -> (ConfidenceInterval, Metadata) {
    replicates.sort_by(f64::total_cmp);
    let alpha = 1.0 - level;
    let lower = quantile_sorted(&replicates, alpha / 2.0);
    let upper = quantile_sorted(&replicates, 1.0 - alpha / 2.0);
    let metadata = Metadata::new()
        .with("iterations", replicates.len())
        .with("bootstrap_mean", mean(&replicates).unwrap_or(f64::NAN))
        .with("bootstrap_sd", variance(&replicates).unwrap_or(0.0).sqrt());
    (ConfidenceInterval::new(lower, upper, level), metadata)
}

fn resample_into<R: Rng + ?Sized>(data: &[f64], buf: &mut Vec<f64>, rng: &mut R) {
    buf.clear();
    buf.extend((0..data.len()).map(|_| data[rng.gen_range(0..data.len())]));
}

/// Percentile bootstrap interval of `opts.statistic`, driven by `rng`.
///
/// `opts.method` and `opts.seed` are ignored; the caller owns the generator.
pub fn bootstrap_with_rng<R: Rng + ?Sized>(
    data: &[f64],
    opts: &IntervalOptions,
    rng: &mut R,
) -> StatResult<IntervalEstimate> {
    opts.validate()?;
    check_sample("bootstrap", data)?;

    let estimate = evaluate(opts.statistic, &mut data.to_vec());
    let mut buf = Vec::with_capacity(data.len());
    let replicates: Vec<f64> = (0..opts.iterations)
        .map(|_| {
            resample_into(data, &mut buf, rng);
            evaluate(opts.statistic, &mut buf)
        })
        .collect();
    let (interval, metadata) = percentile_interval(replicates, opts.confidence_level);

    Ok(IntervalEstimate {
        statistic: opts.statistic,
        method: IntervalMethod::Bootstrap,
        estimate,
        interval,
        metadata: metadata.with("n", data.len()),
    })
}

/// Bootstrap interval for `statistic(a) - statistic(b)`, resampling each
/// sample independently. Seeded like [`confidence_interval`].
pub fn bootstrap_difference(a: &[f64], b: &[f64], opts: &IntervalOptions) -> StatResult<IntervalEstimate> {
    #[cfg(feature = "tracing")]
    let _span = tracing::info_span!("bootstrap_difference", n1 = a.len(), n2 = b.len()).entered();
    let (mut rng, seed, source) = seeded_rng(opts);
    let mut estimate = bootstrap_difference_with_rng(a, b, opts, &mut rng)?;
    estimate.metadata.insert("seed", seed.to_string());
    estimate.metadata.insert("seed_source", source);
    Ok(estimate)
}

pub fn bootstrap_difference_with_rng<R: Rng + ?Sized>(
    a: &[f64],
    b: &[f64],
    opts: &IntervalOptions,
    rng: &mut R,
) -> StatResult<IntervalEstimate> {
    opts.validate()?;
    check_sample("bootstrap difference", a)?;
    check_sample("bootstrap difference", b)?;

    let estimate = evaluate(opts.statistic, &mut a.to_vec()) - evaluate(opts.statistic, &mut b.to_vec());
    let mut buf_a = Vec::with_capacity(a.len());
    let mut buf_b = Vec::with_capacity(b.len());
    let replicates: Vec<f64> = (0..opts.iterations)
        .map(|_| {
            resample_into(a, &mut buf_a, rng);
            resample_into(b, &mut buf_b, rng);
            evaluate(opts.statistic, &mut buf_a) - evaluate(opts.statistic, &mut buf_b)
        })
        .collect();
    let (interval, metadata) = percentile_interval(replicates, opts.confidence_level);

    Ok(IntervalEstimate {
        statistic: opts.statistic,
        method: IntervalMethod::Bootstrap,
        estimate,
        interval,
        metadata: metadata.with("n1", a.len()).with("n2", b.len()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use hypotest_common::StatErrorKind;

    const DATA: [f64; 10] = [12.0, 14.0, 11.0, 15.0, 13.0, 16.0, 12.5, 13.5, 14.5, 11.5];

    #[test]
    fn analytical_mean_interval() {
        let est = confidence_interval(&DATA, &IntervalOptions::default()).unwrap();
        assert_eq!(est.method, IntervalMethod::Analytical);
        assert!((est.estimate - 13.3).abs() < 1e-12);
        // t(9, 0.975) = 2.262157
        let se = variance(&DATA).unwrap().sqrt() / 10f64.sqrt();
        assert!((est.interval.upper - (13.3 + 2.262157 * se)).abs() < 1e-4);
        assert!(est.interval.contains(13.3));
    }

    #[test]
    fn analytical_variance_interval_is_asymmetric() {
        let opts = IntervalOptions::default().with_statistic(IntervalStatistic::Variance);
        let est = confidence_interval(&DATA, &opts).unwrap();
        let var = variance(&DATA).unwrap();
        // chi2(9): 0.025 -> 2.700389, 0.975 -> 19.022768
        assert!((est.interval.lower - 9.0 * var / 19.022768).abs() < 1e-4);
        assert!((est.interval.upper - 9.0 * var / 2.700389).abs() < 1e-3);
        assert!(est.interval.upper - var > var - est.interval.lower);
    }

    #[test]
    fn median_falls_back_to_seeded_bootstrap() {
        let opts = IntervalOptions::default()
            .with_statistic(IntervalStatistic::Median)
            .with_iterations(2000)
            .with_seed(7);
        let first = confidence_interval(&DATA, &opts).unwrap();
        let second = confidence_interval(&DATA, &opts).unwrap();
        assert_eq!(first.method, IntervalMethod::Bootstrap);
        assert_eq!(first.interval, second.interval);
        assert_eq!(first.metadata.text("seed"), Some("7"));
        assert_eq!(first.metadata.text("fallback"), Some("bootstrap"));
        assert!(first.interval.contains(first.estimate));
    }

    #[test]
    fn unseeded_bootstrap_records_its_seed() {
        let opts = IntervalOptions::default()
            .with_method(IntervalMethod::Bootstrap)
            .with_iterations(200);
        let est = confidence_interval(&DATA, &opts).unwrap();
        assert_eq!(est.metadata.text("seed_source"), Some("time"));
        let seed: u64 = est.metadata.text("seed").unwrap().parse().unwrap();
        let replay = confidence_interval(&DATA, &opts.with_seed(seed)).unwrap();
        assert_eq!(replay.interval, est.interval);
    }

    #[test]
    fn bootstrap_mean_close_to_analytical() {
        let mut rng = SmallRng::seed_from_u64(42);
        let opts = IntervalOptions::default().with_iterations(5000);
        let boot = bootstrap_with_rng(&DATA, &opts, &mut rng).unwrap();
        let exact = confidence_interval(&DATA, &opts).unwrap();
        assert!((boot.interval.lower - exact.interval.lower).abs() < 0.5);
        assert!((boot.interval.upper - exact.interval.upper).abs() < 0.5);
        assert_eq!(boot.metadata.number("iterations"), Some(5000.0));
    }

    #[test]
    fn constant_data_collapses() {
        let mut rng = SmallRng::seed_from_u64(1);
        let est = bootstrap_with_rng(&[4.0; 6], &IntervalOptions::default().with_iterations(50), &mut rng)
            .unwrap();
        assert_eq!((est.interval.lower, est.interval.upper), (4.0, 4.0));
    }

    #[test]
    fn difference_of_means() {
        let a = [10.0, 11.0, 12.0, 13.0, 14.0];
        let b = [1.0, 2.0, 3.0, 4.0, 5.0];
        let opts = IntervalOptions::default().with_iterations(1000).with_seed(3);
        let est = bootstrap_difference(&a, &b, &opts).unwrap();
        assert_eq!(est.estimate, 9.0);
        assert!(est.interval.lower > 6.0 && est.interval.upper < 12.0);
    }

    #[test]
    fn contract_violations() {
        let err = confidence_interval(&[1.0], &IntervalOptions::default()).unwrap_err();
        assert_eq!(err.kind(), StatErrorKind::InsufficientData);
        let err = confidence_interval(&DATA, &IntervalOptions::default().with_iterations(0)).unwrap_err();
        assert_eq!(err.kind(), StatErrorKind::InvalidArgument);
        let err =
            confidence_interval(&DATA, &IntervalOptions::default().with_confidence_level(0.0)).unwrap_err();
        assert_eq!(err.kind(), StatErrorKind::InvalidArgument);
    }
}

//! A-priori sample size, post-hoc power and minimum detectable effect for
//! t-test and one-way ANOVA designs.
//!
//! All three use the normal approximation
//! `power = 1 - Φ(z_α - δ)` with the noncentrality `δ` of the design:
//!
//! | design              | δ              | effect size |
//! |---------------------|----------------|-------------|
//! | two independent     | `d·sqrt(n/2)`  | Cohen's d   |
//! | one-sample / paired | `d·sqrt(n)`    | Cohen's d   |
//! | one-way ANOVA, k    | `f·sqrt(k·n)`  | Cohen's f   |
//!
//! `n` is always the per-group size. Effect sizes are taken in absolute value.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use hypotest_common::{Alternative, StatError, StatResult};

use crate::report::validate_alpha;
use crate::special::{normal_cdf, normal_quantile};

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PowerDesign {
    #[default]
    TwoSample,
    OneSample,
    Paired,
    Anova {
        groups: usize,
    },
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PowerOptions {
    pub alpha: f64,
    /// Target power (1 - β); unused by [`power`] itself.
    pub power: f64,
    pub alternative: Alternative,
    pub design: PowerDesign,
}

impl Default for PowerOptions {
    fn default() -> Self {
        Self {
            alpha: 0.05,
            power: 0.8,
            alternative: Alternative::TwoSided,
            design: PowerDesign::TwoSample,
        }
    }
}

impl PowerOptions {
    pub fn with_alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self
    }

    pub fn with_power(mut self, power: f64) -> Self {
        self.power = power;
        self
    }

    pub fn with_alternative(mut self, alternative: Alternative) -> Self {
        self.alternative = alternative;
        self
    }

    pub fn with_design(mut self, design: PowerDesign) -> Self {
        self.design = design;
        self
    }

    pub fn validate(&self) -> StatResult<()> {
        validate_alpha(self.alpha)?;
        hypotest_common::ensure_open_unit("power", self.power)?;
        if let PowerDesign::Anova { groups } = self.design {
            if groups < 2 {
                return Err(StatError::insufficient("anova power", 2, groups));
            }
        }
        Ok(())
    }

    /// Critical z, using α/2 for two-sided designs.
    fn z_alpha(&self) -> StatResult<f64> {
        let tail = match self.alternative {
            Alternative::TwoSided => self.alpha / 2.0,
            Alternative::Less | Alternative::Greater => self.alpha,
        };
        normal_quantile(1.0 - tail).ok_or_else(|| StatError::invalid("alpha", self.alpha, "no normal quantile"))
    }

    fn z_beta(&self) -> StatResult<f64> {
        normal_quantile(self.power).ok_or_else(|| StatError::invalid("power", self.power, "no normal quantile"))
    }

    /// Multiplier `m` with `δ = effect · sqrt(m · n)`.
    fn scale(&self) -> f64 {
        match self.design {
            PowerDesign::TwoSample => 0.5,
            PowerDesign::OneSample | PowerDesign::Paired => 1.0,
            PowerDesign::Anova { groups } => groups as f64,
        }
    }
}

fn check_effect(effect: f64) -> StatResult<f64> {
    if !effect.is_finite() {
        return Err(StatError::invalid("effect_size", effect, "must be finite"));
    }
    Ok(effect.abs())
}

/// Per-group sample size reaching `opts.power` for the given effect.
///
/// Fails for a zero effect, and for one so small the required n overflows.
pub fn sample_size(effect: f64, opts: &PowerOptions) -> StatResult<usize> {
    opts.validate()?;
    let effect = check_effect(effect)?;
    if effect == 0.0 {
        return Err(StatError::invalid("effect_size", effect, "must be non-zero"));
    }
    let z = opts.z_alpha()? + opts.z_beta()?;
    let n = ((z / effect).powi(2) / opts.scale()).ceil();
    if !n.is_finite() || n > usize::MAX as f64 {
        return Err(StatError::invalid("effect_size", effect, "too small to reach the target power"));
    }
    Ok((n as usize).max(1))
}

/// Post-hoc power with `n` observations per group.
pub fn power(effect: f64, n: usize, opts: &PowerOptions) -> StatResult<f64> {
    opts.validate()?;
    let effect = check_effect(effect)?;
    if n == 0 {
        return Err(StatError::insufficient("power", 1, 0));
    }
    let delta = effect * (opts.scale() * n as f64).sqrt();
    Ok((1.0 - normal_cdf(opts.z_alpha()? - delta)).clamp(0.0, 1.0))
}

/// Smallest effect detectable with `n` per group at `opts.alpha` / `opts.power`.
pub fn minimum_detectable_effect(n: usize, opts: &PowerOptions) -> StatResult<f64> {
    opts.validate()?;
    if n == 0 {
        return Err(StatError::insufficient("minimum detectable effect", 1, 0));
    }
    let z = opts.z_alpha()? + opts.z_beta()?;
    Ok(z / (opts.scale() * n as f64).sqrt())
}

/// Per-group n for a two-sample t-test at Cohen's `d`.
pub fn t_test_sample_size(d: f64, alpha: f64, target_power: f64) -> StatResult<usize> {
    sample_size(d, &PowerOptions::default().with_alpha(alpha).with_power(target_power))
}

pub fn t_test_power(d: f64, n_per_group: usize, alpha: f64) -> StatResult<f64> {
    power(d, n_per_group, &PowerOptions::default().with_alpha(alpha))
}

/// Per-group n for a one-way ANOVA with `groups` groups at Cohen's `f`.
pub fn anova_sample_size(f: f64, groups: usize, alpha: f64, target_power: f64) -> StatResult<usize> {
    let opts = PowerOptions::default()
        .with_alpha(alpha)
        .with_power(target_power)
        .with_design(PowerDesign::Anova { groups });
    sample_size(f, &opts)
}

pub fn anova_power(f: f64, groups: usize, n_per_group: usize, alpha: f64) -> StatResult<f64> {
    let opts = PowerOptions::default()
        .with_alpha(alpha)
        .with_design(PowerDesign::Anova { groups });
    power(f, n_per_group, &opts)
}

//! The uniform result record returned by every hypothesis test.

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{Metadata, TestKind};

/// Qualitative magnitude band for an effect size.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Magnitude {
    Negligible,
    Small,
    Medium,
    Large,
}

impl Magnitude {
    /// Band `|value|` against ascending `[small, medium, large]` cut-offs.
    pub fn classify(value: f64, thresholds: [f64; 3]) -> Self {
        let v = value.abs();
        if v.is_nan() || v < thresholds[0] {
            Magnitude::Negligible
        } else if v < thresholds[1] {
            Magnitude::Small
        } else if v < thresholds[2] {
            Magnitude::Medium
        } else {
            Magnitude::Large
        }
    }
}

impl fmt::Display for Magnitude {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Magnitude::Negligible => "negligible",
            Magnitude::Small => "small",
            Magnitude::Medium => "medium",
            Magnitude::Large => "large",
        })
    }
}

/// Effect-size measure keyed by kind; each variant carries its own banding.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "measure", rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EffectSize {
    CohensD {
        value: f64,
        interpretation: Magnitude,
    },
    HedgesG {
        value: f64,
        interpretation: Magnitude,
    },
    GlassDelta {
        value: f64,
        interpretation: Magnitude,
    },
    /// Cohen's d_z on the paired differences.
    PairedCohensD {
        value: f64,
        interpretation: Magnitude,
    },
    RankBiserial {
        value: f64,
        interpretation: Magnitude,
    },
    /// r = |z| / sqrt(n) for the signed-rank test.
    WilcoxonR {
        value: f64,
        interpretation: Magnitude,
    },
    EtaSquared {
        eta_squared: f64,
        omega_squared: f64,
        interpretation: Magnitude,
    },
    EpsilonSquared {
        value: f64,
        interpretation: Magnitude,
    },
}

impl EffectSize {
    pub fn name(&self) -> &'static str {
        match self {
            EffectSize::CohensD { .. } => "cohens_d",
            EffectSize::HedgesG { .. } => "hedges_g",
            EffectSize::GlassDelta { .. } => "glass_delta",
            EffectSize::PairedCohensD { .. } => "paired_cohens_d",
            EffectSize::RankBiserial { .. } => "rank_biserial",
            EffectSize::WilcoxonR { .. } => "wilcoxon_r",
            EffectSize::EtaSquared { .. } => "eta_squared",
            EffectSize::EpsilonSquared { .. } => "epsilon_squared",
        }
    }

    /// Primary value (η² for the ANOVA variant).
    pub fn value(&self) -> f64 {
        match *self {
            EffectSize::CohensD { value, .. }
            | EffectSize::HedgesG { value, .. }
            | EffectSize::GlassDelta { value, .. }
            | EffectSize::PairedCohensD { value, .. }
            | EffectSize::RankBiserial { value, .. }
            | EffectSize::WilcoxonR { value, .. }
            | EffectSize::EpsilonSquared { value, .. } => value,
            EffectSize::EtaSquared { eta_squared, .. } => eta_squared,
        }
    }

    pub fn interpretation(&self) -> Magnitude {
        match *self {
            EffectSize::CohensD { interpretation, .. }
            | EffectSize::HedgesG { interpretation, .. }
            | EffectSize::GlassDelta { interpretation, .. }
            | EffectSize::PairedCohensD { interpretation, .. }
            | EffectSize::RankBiserial { interpretation, .. }
            | EffectSize::WilcoxonR { interpretation, .. }
            | EffectSize::EtaSquared { interpretation, .. }
            | EffectSize::EpsilonSquared { interpretation, .. } => interpretation,
        }
    }
}

impl fmt::Display for EffectSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EffectSize::EtaSquared {
                eta_squared,
                omega_squared,
                interpretation,
            } => write!(
                f,
                "eta_squared = {eta_squared:.4}, omega_squared = {omega_squared:.4} ({interpretation})"
            ),
            other => write!(
                f,
                "{} = {:.4} ({})",
                other.name(),
                other.value(),
                other.interpretation()
            ),
        }
    }
}

/// Closed interval with `lower <= upper` and the confidence level it was built for.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConfidenceInterval {
    pub lower: f64,
    pub upper: f64,
    pub level: f64,
}

impl ConfidenceInterval {
    /// Bounds are swapped if given out of order.
    pub fn new(a: f64, b: f64, level: f64) -> Self {
        let (lower, upper) = if b < a { (b, a) } else { (a, b) };
        Self {
            lower,
            upper,
            level,
        }
    }

    pub fn contains(&self, x: f64) -> bool {
        self.lower <= x && x <= self.upper
    }

    pub fn width(&self) -> f64 {
        self.upper - self.lower
    }
}

impl fmt::Display for ConfidenceInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:.0}% CI [{:.4}, {:.4}]",
            self.level * 100.0,
            self.lower,
            self.upper
        )
    }
}

/// Common output of every test.
///
/// Collaborators (exporters, pipeline adapters) read the public fields; the
/// keys inside `metadata` are informational and may grow over time.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct TestResult {
    pub test: TestKind,
    pub statistic: f64,
    /// Always within [0, 1].
    pub p_value: f64,
    pub effect_size: Option<EffectSize>,
    pub confidence_interval: Option<ConfidenceInterval>,
    pub interpretation: String,
    pub metadata: Metadata,
}

impl TestResult {
    /// A NaN p-value is recorded as 1.0 so it can never read as significant.
    pub fn new(test: TestKind, statistic: f64, p_value: f64) -> Self {
        let p_value = if p_value.is_nan() {
            1.0
        } else {
            p_value.clamp(0.0, 1.0)
        };
        Self {
            test,
            statistic,
            p_value,
            effect_size: None,
            confidence_interval: None,
            interpretation: String::new(),
            metadata: Metadata::new(),
        }
    }

    pub fn with_effect_size(mut self, effect: EffectSize) -> Self {
        self.effect_size = Some(effect);
        self
    }

    pub fn with_confidence_interval(mut self, ci: ConfidenceInterval) -> Self {
        self.confidence_interval = Some(ci);
        self
    }

    pub fn with_interpretation<S: Into<String>>(mut self, text: S) -> Self {
        self.interpretation = text.into();
        self
    }

    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata.extend(metadata);
        self
    }

    pub fn is_significant(&self, alpha: f64) -> bool {
        self.p_value < alpha
    }

    pub fn degrees_of_freedom(&self) -> Option<f64> {
        self.metadata.number("df")
    }
}

impl fmt::Display for TestResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: statistic = {:.4}, p = {:.4}",
            self.test.display_name(),
            self.statistic,
            self.p_value
        )?;
        if let Some(effect) = &self.effect_size {
            write!(f, ", {effect}")?;
        }
        if let Some(ci) = &self.confidence_interval {
            write!(f, ", {ci}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn magnitude_bands_use_absolute_value() {
        let cuts = [0.2, 0.5, 0.8];
        assert_eq!(Magnitude::classify(0.1, cuts), Magnitude::Negligible);
        assert_eq!(Magnitude::classify(-0.3, cuts), Magnitude::Small);
        assert_eq!(Magnitude::classify(0.5, cuts), Magnitude::Medium);
        assert_eq!(Magnitude::classify(-2.0, cuts), Magnitude::Large);
        assert_eq!(Magnitude::classify(f64::NAN, cuts), Magnitude::Negligible);
    }

    #[test]
    fn interval_orders_bounds() {
        let ci = ConfidenceInterval::new(3.0, 1.0, 0.95);
        assert_eq!((ci.lower, ci.upper), (1.0, 3.0));
        assert!(ci.contains(2.0));
        assert_eq!(ci.width(), 2.0);
        assert_eq!(ci.to_string(), "95% CI [1.0000, 3.0000]");
    }

    #[test]
    fn p_value_is_clamped() {
        assert_eq!(TestResult::new(TestKind::WelchT, 1.0, 1.0000001).p_value, 1.0);
        assert_eq!(TestResult::new(TestKind::WelchT, 1.0, -1e-12).p_value, 0.0);
        assert_eq!(TestResult::new(TestKind::WelchT, 1.0, f64::NAN).p_value, 1.0);
    }

    #[test]
    fn effect_size_replacement_keeps_other_fields() {
        let base = TestResult::new(TestKind::WelchT, -2.5, 0.03)
            .with_effect_size(EffectSize::CohensD {
                value: -1.2,
                interpretation: Magnitude::Large,
            })
            .with_interpretation("x");
        let merged = base.clone().with_effect_size(EffectSize::HedgesG {
            value: -1.1,
            interpretation: Magnitude::Large,
        });
        assert_eq!(merged.effect_size.unwrap().name(), "hedges_g");
        assert_eq!(merged.statistic, base.statistic);
        assert_eq!(merged.interpretation, "x");
    }

    #[cfg(feature = "serde")]
    #[test]
    fn serializes_with_tagged_effect_size() {
        let result = TestResult::new(TestKind::WelchT, -3.1, 0.012)
            .with_effect_size(EffectSize::CohensD {
                value: -1.9,
                interpretation: Magnitude::Large,
            })
            .with_metadata(Metadata::new().with("df", 7.5));
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["test"], "welch_t");
        assert_eq!(json["effect_size"]["measure"], "cohens_d");
        assert_eq!(json["effect_size"]["interpretation"], "large");
        assert_eq!(json["metadata"]["df"], 7.5);
        let back: TestResult = serde_json::from_value(json).unwrap();
        assert_eq!(back, result);
    }

    #[test]
    fn eta_squared_reports_eta_as_primary_value() {
        let es = EffectSize::EtaSquared {
            eta_squared: 0.2,
            omega_squared: 0.15,
            interpretation: Magnitude::Large,
        };
        assert_eq!(es.value(), 0.2);
        assert!(es.to_string().contains("omega_squared = 0.1500"));
    }
}

//! Closed identifier enums.
//!
//! Every textual selector accepted by the engine (test kind, alternative
//! hypothesis, correction method, …) parses into one of these enums. Parsing
//! is case-insensitive and treats `-`, `.` and spaces like `_`, so
//! `"Two-Sided"`, `"two.sided"` and `"two_sided"` are the same value.
//! Anything else is rejected with [`StatError::UnknownIdentifier`].

use std::fmt;
use std::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::StatError;

fn normalize(s: &str) -> String {
    s.trim().to_ascii_lowercase().replace(['-', '.', ' '], "_")
}

macro_rules! identifier_enum {
    (
        $(#[$meta:meta])*
        $name:ident, $label:literal {
            $($variant:ident => $canon:literal $(| $alias:literal)*),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
        #[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
        #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Canonical snake_case identifier.
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $canon),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = StatError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match normalize(s).as_str() {
                    $($canon $(| $alias)* => Ok($name::$variant),)+
                    _ => Err(StatError::unknown($label, s.trim())),
                }
            }
        }
    };
}

identifier_enum! {
    /// Every procedure that produces a [`crate::TestResult`].
    TestKind, "test" {
        StudentT => "student_t" | "t_test_pooled" | "pooled_t" | "student",
        WelchT => "welch_t" | "t_test" | "ttest" | "welch",
        PairedT => "paired_t" | "paired_t_test" | "paired",
        OneSampleT => "one_sample_t" | "one_sample_t_test",
        OneWayAnova => "one_way_anova" | "anova",
        MannWhitney => "mann_whitney" | "mann_whitney_u" | "wilcoxon_rank_sum",
        WilcoxonSignedRank => "wilcoxon_signed_rank" | "wilcoxon",
        KruskalWallis => "kruskal_wallis" | "kruskal",
        ShapiroWilk => "shapiro_wilk" | "shapiro",
        Levene => "levene" | "brown_forsythe",
        VarianceRatio => "variance_ratio" | "f_test",
    }
}

impl TestKind {
    /// Human-readable name used in interpretation strings.
    pub fn display_name(&self) -> &'static str {
        match self {
            TestKind::StudentT => "Student's t-test",
            TestKind::WelchT => "Welch's t-test",
            TestKind::PairedT => "paired t-test",
            TestKind::OneSampleT => "one-sample t-test",
            TestKind::OneWayAnova => "one-way ANOVA",
            TestKind::MannWhitney => "Mann-Whitney U test",
            TestKind::WilcoxonSignedRank => "Wilcoxon signed-rank test",
            TestKind::KruskalWallis => "Kruskal-Wallis H test",
            TestKind::ShapiroWilk => "Shapiro-Wilk test",
            TestKind::Levene => "Levene's test",
            TestKind::VarianceRatio => "F-test for equality of variances",
        }
    }

    pub fn is_parametric(&self) -> bool {
        matches!(
            self,
            TestKind::StudentT
                | TestKind::WelchT
                | TestKind::PairedT
                | TestKind::OneSampleT
                | TestKind::OneWayAnova
        )
    }

    /// The rank-based counterpart of a parametric location test.
    pub fn nonparametric_alternative(&self) -> Option<TestKind> {
        match self {
            TestKind::StudentT | TestKind::WelchT => Some(TestKind::MannWhitney),
            TestKind::PairedT | TestKind::OneSampleT => Some(TestKind::WilcoxonSignedRank),
            TestKind::OneWayAnova => Some(TestKind::KruskalWallis),
            _ => None,
        }
    }
}

identifier_enum! {
    /// Direction of the alternative hypothesis.
    Alternative, "alternative" {
        TwoSided => "two_sided" | "two_tailed" | "both",
        Less => "less" | "lower",
        Greater => "greater" | "upper",
    }
}

impl Default for Alternative {
    fn default() -> Self {
        Alternative::TwoSided
    }
}

identifier_enum! {
    /// Standardised mean-difference measure reported by two-sample t-tests.
    EffectSizeKind, "effect size type" {
        CohensD => "cohens_d" | "cohen_d" | "d",
        HedgesG => "hedges_g" | "hedge_g" | "g",
        GlassDelta => "glass_delta" | "glass",
    }
}

impl Default for EffectSizeKind {
    fn default() -> Self {
        EffectSizeKind::CohensD
    }
}

identifier_enum! {
    /// Multiple-comparison adjustment.
    CorrectionMethod, "correction method" {
        Bonferroni => "bonferroni",
        Holm => "holm" | "holm_bonferroni",
        BenjaminiHochberg => "benjamini_hochberg" | "bh" | "fdr" | "fdr_bh",
    }
}

identifier_enum! {
    /// Location used for absolute deviations in Levene's test.
    Center, "center" {
        Median => "median" | "brown_forsythe",
        Mean => "mean",
    }
}

impl Default for Center {
    fn default() -> Self {
        Center::Median
    }
}

identifier_enum! {
    /// Which population quantity a confidence interval brackets.
    IntervalStatistic, "interval statistic" {
        Mean => "mean",
        Variance => "variance" | "var",
        Median => "median",
    }
}

identifier_enum! {
    IntervalMethod, "interval method" {
        Analytical => "analytical" | "parametric",
        Bootstrap => "bootstrap" | "percentile",
    }
}

impl Default for IntervalMethod {
    fn default() -> Self {
        IntervalMethod::Analytical
    }
}

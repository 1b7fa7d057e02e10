//! Hypothesis tests, effect sizes, confidence intervals and power analysis
//! over numeric samples, built on a self-contained special-function core.

pub mod assumptions;
pub mod correction;
pub mod descriptive;
pub mod effect_size;
pub mod interval;
pub mod nonparametric;
pub mod parametric;
pub mod power;
pub mod select;
pub mod special;

mod report;

pub use assumptions::{
    DiagnosticOptions, LeveneOptions, NormalityScreen, levene, normality_screen, shapiro_wilk,
    variance_ratio_test,
};
pub use correction::{CorrectionResult, adjust, benjamini_hochberg, bonferroni, holm};
pub use interval::{
    IntervalEstimate, IntervalOptions, bootstrap_difference, bootstrap_with_rng, confidence_interval,
};
pub use nonparametric::{
    RankTestOptions, kruskal_wallis, mann_whitney, wilcoxon_one_sample, wilcoxon_signed_rank,
};
pub use parametric::{
    AnovaOptions, AnovaTable, TTestOptions, one_sample_t_test, one_way_anova, paired_t_test, t_test,
};
pub use power::{PowerDesign, PowerOptions, minimum_detectable_effect};
pub use select::{CompareOptions, compare_groups, compare_two, run, run_named};

pub use hypotest_common::{
    Alternative, Center, ConfidenceInterval, CorrectionMethod, EffectSize, EffectSizeKind,
    IntervalMethod, IntervalStatistic, Magnitude, MetaValue, Metadata, StatError, StatErrorKind,
    StatResult, TestKind, TestResult,
};

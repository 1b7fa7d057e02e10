//! Test selection: pick the parametric test when its assumptions look
//! plausible, otherwise its rank-based counterpart, and dispatch named tests.
//!
//! The decision uses [`normality_screen`], a skew/kurtosis heuristic rather
//! than a formal test. Callers who need rigour should run
//! [`crate::assumptions::shapiro_wilk`] and [`crate::assumptions::levene`]
//! themselves. The reason for each choice is recorded in the result metadata
//! under `selection_reason`.

use std::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use hypotest_common::{Alternative, EffectSizeKind, StatError, StatResult, TestKind, TestResult};

use crate::assumptions::{
    DiagnosticOptions, LeveneOptions, levene, normality_screen, shapiro_wilk, variance_ratio_test,
};
use crate::effect_size;
use crate::nonparametric::{
    RankTestOptions, kruskal_wallis, mann_whitney, wilcoxon_one_sample, wilcoxon_signed_rank,
};
use crate::parametric::{AnovaOptions, TTestOptions, one_sample_t_test, one_way_anova, paired_t_test, t_test};
use crate::report::{interpretation, validate_alpha, validate_confidence_level};

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompareOptions {
    /// Screen samples for normality before choosing a parametric test.
    pub check_assumptions: bool,
    pub paired: bool,
    pub alternative: Alternative,
    pub confidence_level: f64,
    /// Measure attached to independent-samples t-tests.
    pub effect_size: EffectSizeKind,
    pub equal_variance: bool,
    pub alpha: f64,
    /// Hypothesised location for one-sample tests dispatched through [`run`].
    pub null_value: f64,
}

impl Default for CompareOptions {
    fn default() -> Self {
        Self {
            check_assumptions: true,
            paired: false,
            alternative: Alternative::TwoSided,
            confidence_level: 0.95,
            effect_size: EffectSizeKind::CohensD,
            equal_variance: false,
            alpha: 0.05,
            null_value: 0.0,
        }
    }
}

impl CompareOptions {
    pub fn with_check_assumptions(mut self, check: bool) -> Self {
        self.check_assumptions = check;
        self
    }

    pub fn with_paired(mut self, paired: bool) -> Self {
        self.paired = paired;
        self
    }

    pub fn with_alternative(mut self, alternative: Alternative) -> Self {
        self.alternative = alternative;
        self
    }

    pub fn with_confidence_level(mut self, level: f64) -> Self {
        self.confidence_level = level;
        self
    }

    pub fn with_effect_size(mut self, kind: EffectSizeKind) -> Self {
        self.effect_size = kind;
        self
    }

    pub fn with_equal_variance(mut self, equal_variance: bool) -> Self {
        self.equal_variance = equal_variance;
        self
    }

    pub fn with_alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self
    }

    pub fn with_null_value(mut self, value: f64) -> Self {
        self.null_value = value;
        self
    }

    pub fn validate(&self) -> StatResult<()> {
        validate_confidence_level(self.confidence_level)?;
        validate_alpha(self.alpha)?;
        if !self.null_value.is_finite() {
            return Err(StatError::invalid("null_value", self.null_value, "must be finite"));
        }
        Ok(())
    }

    fn t_options(&self) -> TTestOptions {
        TTestOptions {
            alternative: self.alternative,
            confidence_level: self.confidence_level,
            equal_variance: self.equal_variance,
        }
    }

    fn rank_options(&self) -> RankTestOptions {
        RankTestOptions::default()
            .with_alternative(self.alternative)
            .with_alpha(self.alpha)
    }
}

/// Why the orchestrator chose the test it did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Selection {
    NotChecked,
    ScreenPassed,
    ScreenFailed,
}

impl Selection {
    fn as_str(&self) -> &'static str {
        match self {
            Selection::NotChecked => "assumptions_not_checked",
            Selection::ScreenPassed => "normality_screen_passed",
            Selection::ScreenFailed => "normality_screen_failed",
        }
    }

    fn parametric(&self) -> bool {
        !matches!(self, Selection::ScreenFailed)
    }
}

fn select<S: AsRef<[f64]>>(check: bool, samples: &[S]) -> Selection {
    if !check {
        Selection::NotChecked
    } else if samples.iter().all(|s| normality_screen(s.as_ref()).normal) {
        Selection::ScreenPassed
    } else {
        Selection::ScreenFailed
    }
}

fn annotate(mut result: TestResult, selection: Selection, considered: TestKind) -> TestResult {
    #[cfg(feature = "tracing")]
    tracing::debug!(
        chosen = result.test.as_str(),
        reason = selection.as_str(),
        "test_selected"
    );
    result.metadata.insert("selection_reason", selection.as_str());
    result.metadata.insert("parametric_candidate", considered.as_str());
    result
}

/// Swap in the requested mean-difference measure and refresh the verdict.
fn with_requested_effect(
    result: TestResult,
    a: &[f64],
    b: &[f64],
    opts: &CompareOptions,
) -> StatResult<TestResult> {
    let effect = effect_size::two_sample(opts.effect_size, a, b)?;
    let mut result = result.with_effect_size(effect);
    result.interpretation = interpretation(result.test, result.p_value, opts.alpha, Some(&effect));
    Ok(result)
}

/// Compare two samples, independent or paired per `opts.paired`.
///
/// Paired designs screen the differences; independent designs screen each
/// sample. Passing (or skipping) the screen selects the t-test, otherwise
/// Mann-Whitney U or Wilcoxon signed-rank.
pub fn compare_two(a: &[f64], b: &[f64], opts: &CompareOptions) -> StatResult<TestResult> {
    #[cfg(feature = "tracing")]
    let _span = tracing::info_span!("compare_two", n1 = a.len(), n2 = b.len(), paired = opts.paired).entered();
    opts.validate()?;

    if opts.paired {
        if a.len() != b.len() {
            return Err(StatError::length_mismatch("paired comparison", a.len(), b.len()));
        }
        let diffs: Vec<f64> = a.iter().zip(b).map(|(x, y)| x - y).collect();
        let selection = select(opts.check_assumptions, &[diffs]);
        let result = if selection.parametric() {
            let mut r = paired_t_test(a, b, &opts.t_options())?;
            r.interpretation = interpretation(r.test, r.p_value, opts.alpha, r.effect_size.as_ref());
            r
        } else {
            wilcoxon_signed_rank(a, b, &opts.rank_options())?
        };
        return Ok(annotate(result, selection, TestKind::PairedT));
    }

    let selection = select(opts.check_assumptions, &[a, b]);
    let result = if selection.parametric() {
        with_requested_effect(t_test(a, b, &opts.t_options())?, a, b, opts)?
    } else {
        mann_whitney(a, b, &opts.rank_options())?
    };
    let candidate = if opts.equal_variance {
        TestKind::StudentT
    } else {
        TestKind::WelchT
    };
    Ok(annotate(result, selection, candidate))
}

/// Compare two or more independent groups: one-way ANOVA or Kruskal-Wallis.
pub fn compare_groups<S: AsRef<[f64]>>(groups: &[S], opts: &CompareOptions) -> StatResult<TestResult> {
    #[cfg(feature = "tracing")]
    let _span = tracing::info_span!("compare_groups", groups = groups.len()).entered();
    opts.validate()?;
    let selection = select(opts.check_assumptions, groups);
    let result = if selection.parametric() {
        one_way_anova(groups, &AnovaOptions { alpha: opts.alpha })?
    } else {
        kruskal_wallis(groups, &opts.rank_options())?
    };
    Ok(annotate(result, selection, TestKind::OneWayAnova))
}

fn expect_samples<S: AsRef<[f64]>>(kind: TestKind, samples: &[S], expected: usize) -> StatResult<()> {
    if samples.len() != expected {
        return Err(StatError::invalid(
            "samples",
            format!("{} samples for {}", samples.len(), kind.as_str()),
            match expected {
                1 => "this test takes exactly one sample",
                _ => "this test takes exactly two samples",
            },
        ));
    }
    Ok(())
}

fn pair<S: AsRef<[f64]>>(kind: TestKind, samples: &[S]) -> StatResult<(&[f64], &[f64])> {
    expect_samples(kind, samples, 2)?;
    Ok((samples[0].as_ref(), samples[1].as_ref()))
}

/// Run one named test on `samples`.
///
/// Sample counts: one for `one_sample_t` and `shapiro_wilk`; one or two for
/// `wilcoxon_signed_rank` (one sample is tested against `opts.null_value`);
/// two or more for `one_way_anova`, `kruskal_wallis` and `levene`; exactly two
/// for everything else. No screening happens here.
pub fn run<S: AsRef<[f64]>>(kind: TestKind, samples: &[S], opts: &CompareOptions) -> StatResult<TestResult> {
    #[cfg(feature = "tracing")]
    let _span = tracing::info_span!("run", test = kind.as_str(), samples = samples.len()).entered();
    opts.validate()?;

    match kind {
        TestKind::StudentT | TestKind::WelchT => {
            let (a, b) = pair(kind, samples)?;
            let t_opts = opts.t_options().with_equal_variance(kind == TestKind::StudentT);
            with_requested_effect(t_test(a, b, &t_opts)?, a, b, opts)
        }
        TestKind::PairedT => {
            let (a, b) = pair(kind, samples)?;
            paired_t_test(a, b, &opts.t_options())
        }
        TestKind::OneSampleT => {
            expect_samples(kind, samples, 1)?;
            one_sample_t_test(samples[0].as_ref(), opts.null_value, &opts.t_options())
        }
        TestKind::OneWayAnova => one_way_anova(samples, &AnovaOptions { alpha: opts.alpha }),
        TestKind::MannWhitney => {
            let (a, b) = pair(kind, samples)?;
            mann_whitney(a, b, &opts.rank_options())
        }
        TestKind::WilcoxonSignedRank => {
            if samples.len() == 1 {
                wilcoxon_one_sample(samples[0].as_ref(), opts.null_value, &opts.rank_options())
            } else {
                let (a, b) = pair(kind, samples)?;
                wilcoxon_signed_rank(a, b, &opts.rank_options())
            }
        }
        TestKind::KruskalWallis => kruskal_wallis(samples, &opts.rank_options()),
        TestKind::ShapiroWilk => {
            expect_samples(kind, samples, 1)?;
            shapiro_wilk(samples[0].as_ref(), &DiagnosticOptions { alpha: opts.alpha })
        }
        TestKind::Levene => levene(samples, &LeveneOptions::default().with_alpha(opts.alpha)),
        TestKind::VarianceRatio => {
            let (a, b) = pair(kind, samples)?;
            variance_ratio_test(a, b, &DiagnosticOptions { alpha: opts.alpha })
        }
    }
}

/// [`run`] with the test named by a string, e.g. `"welch_t"` or `"Kruskal-Wallis"`.
pub fn run_named<S: AsRef<[f64]>>(name: &str, samples: &[S], opts: &CompareOptions) -> StatResult<TestResult> {
    run(TestKind::from_str(name)?, samples, opts)
}

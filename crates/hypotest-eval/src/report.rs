//! Plain-language interpretation strings attached to result records.

use hypotest_common::{EffectSize, StatResult, TestKind, ensure_open_unit};

/// `p` formatted the way the interpretation strings show it.
pub(crate) fn format_p(p: f64) -> String {
    if p < 0.001 {
        "p < 0.001".to_string()
    } else {
        format!("p = {p:.4}")
    }
}

pub(crate) fn interpretation(
    test: TestKind,
    p_value: f64,
    alpha: f64,
    effect: Option<&EffectSize>,
) -> String {
    let verdict = if p_value < alpha {
        format!(
            "{}: statistically significant at alpha = {alpha} ({})",
            test.display_name(),
            format_p(p_value)
        )
    } else {
        format!(
            "{}: not statistically significant at alpha = {alpha} ({})",
            test.display_name(),
            format_p(p_value)
        )
    };
    match effect {
        Some(es) => format!(
            "{verdict}; {} effect ({} = {:.3})",
            es.interpretation(),
            es.name(),
            es.value()
        ),
        None => verdict,
    }
}

/// Shared check for every `confidence_level` option.
pub(crate) fn validate_confidence_level(level: f64) -> StatResult<()> {
    ensure_open_unit("confidence_level", level)
}

pub(crate) fn validate_alpha(alpha: f64) -> StatResult<()> {
    ensure_open_unit("alpha", alpha)
}

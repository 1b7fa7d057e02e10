#![cfg(feature = "serde")]

use hypotest_eval::{Alternative, CompareOptions, EffectSizeKind, IntervalOptions, IntervalStatistic, PowerDesign, PowerOptions};

#[test]
fn partial_option_documents_fill_in_defaults() {
    let opts: CompareOptions =
        serde_json::from_str(r#"{"paired": true, "alternative": "greater", "effect_size": "hedges_g"}"#)
            .expect("options parse");
    assert!(opts.paired);
    assert_eq!(opts.alternative, Alternative::Greater);
    assert_eq!(opts.effect_size, EffectSizeKind::HedgesG);
    assert_eq!(opts.confidence_level, 0.95);
    assert!(opts.check_assumptions);
}

#[test]
fn interval_and_power_options_parse() {
    let interval: IntervalOptions =
        serde_json::from_str(r#"{"statistic": "median", "seed": 99}"#).expect("interval options parse");
    assert_eq!(interval.statistic, IntervalStatistic::Median);
    assert_eq!(interval.seed, Some(99));
    assert_eq!(interval.iterations, 10_000);

    let power: PowerOptions =
        serde_json::from_str(r#"{"design": {"anova": {"groups": 4}}, "power": 0.9}"#).expect("power options parse");
    assert_eq!(power.design, PowerDesign::Anova { groups: 4 });
    assert_eq!(power.power, 0.9);
}

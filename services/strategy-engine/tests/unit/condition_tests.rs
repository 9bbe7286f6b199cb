//! M75 condition evaluator tests

use pretty_assertions::assert_eq;
use rstest::*;
use services_common::{BoxStrategyValues, LevelCondition, M75Conditions, Pl3Levels, Signal};
use strategy_engine::{box_proximity, evaluate_conditions};

fn levels(pl3h: f64, pl3m: f64, pl3l: f64) -> Pl3Levels {
    Pl3Levels {
        pl3h: Some(pl3h),
        pl3m: Some(pl3m),
        pl3l: Some(pl3l),
    }
}

#[rstest]
fn test_breakout_above_pl3h_is_bullish() {
    let result = evaluate_conditions(Some(101.0), None, &levels(100.0, 95.0, 90.0));
    assert_eq!(result.pl3h_condition, Some(LevelCondition::Bullish));
    assert_eq!(result.pl3h_signal, Some(Signal::Buy));
    assert!(!result.pl3h_alert);
}

#[rstest]
fn test_nearing_pl3h_from_below_raises_alert_only() {
    // 99.6 vs 100: 0.4% away, no breakout
    let result = evaluate_conditions(Some(99.6), None, &levels(100.0, 95.0, 90.0));
    assert_eq!(result.pl3h_condition, None);
    assert_eq!(result.pl3h_signal, None);
    assert!(result.pl3h_alert);
}

#[rstest]
fn test_alert_threshold_is_inclusive() {
    // Exactly 0.5% below the level
    let result = evaluate_conditions(Some(99.5), None, &levels(100.0, 95.0, 90.0));
    assert!(result.pl3h_alert);

    // Just beyond the threshold
    let result = evaluate_conditions(Some(99.49), None, &levels(100.0, 95.0, 90.0));
    assert!(!result.pl3h_alert);
}

#[rstest]
fn test_breakdown_below_pl3l_is_bearish() {
    let result = evaluate_conditions(Some(89.0), None, &levels(100.0, 95.0, 90.0));
    assert_eq!(result.pl3l_condition, Some(LevelCondition::Bearish));
    assert_eq!(result.pl3l_signal, Some(Signal::BuyOpposite));
}

#[rstest]
fn test_nearing_pl3l_from_above_raises_alert() {
    let result = evaluate_conditions(Some(90.3), None, &levels(100.0, 95.0, 90.0));
    assert_eq!(result.pl3l_condition, None);
    assert!(result.pl3l_alert);
}

#[rstest]
#[case(101.0, 99.0, LevelCondition::BearishBreak)]
#[case(99.0, 101.0, LevelCondition::BullishBreak)]
#[case(99.0, 98.0, LevelCondition::Below)]
#[case(101.0, 102.0, LevelCondition::Above)]
fn test_pl3m_direction_with_history(
    #[case] previous: f64,
    #[case] current: f64,
    #[case] expected: LevelCondition,
) {
    let result = evaluate_conditions(
        Some(current),
        Some(previous),
        &levels(200.0, 100.0, 50.0),
    );
    assert_eq!(result.pl3m_condition, Some(expected));
    assert_eq!(result.pl3m_signal, Some(Signal::Watch));
}

#[rstest]
fn test_pl3m_touch_from_above_counts_as_bearish_break() {
    // Crossing includes landing exactly on the level
    let result = evaluate_conditions(Some(100.0), Some(101.0), &levels(200.0, 100.0, 50.0));
    assert_eq!(result.pl3m_condition, Some(LevelCondition::BearishBreak));
}

#[rstest]
fn test_pl3m_position_without_history() {
    let result = evaluate_conditions(Some(99.0), None, &levels(200.0, 100.0, 50.0));
    assert_eq!(result.pl3m_condition, Some(LevelCondition::Below));
    assert_eq!(result.pl3m_signal, Some(Signal::Watch));

    let result = evaluate_conditions(Some(101.0), None, &levels(200.0, 100.0, 50.0));
    assert_eq!(result.pl3m_condition, Some(LevelCondition::Above));
}

#[rstest]
fn test_pl3m_exactly_at_level_without_history_has_no_condition() {
    let result = evaluate_conditions(Some(100.0), None, &levels(200.0, 100.0, 50.0));
    assert_eq!(result.pl3m_condition, None);
    assert_eq!(result.pl3m_signal, None);
    // Distance zero still trips the proximity alert
    assert!(result.pl3m_alert);
}

#[rstest]
fn test_pl3m_alert_is_independent_of_condition() {
    // Holding just below the midpoint: condition and alert together
    let result = evaluate_conditions(Some(99.8), Some(99.5), &levels(200.0, 100.0, 50.0));
    assert_eq!(result.pl3m_condition, Some(LevelCondition::Below));
    assert!(result.pl3m_alert);
}

#[rstest]
#[case(None, Some(100.0), Some(95.0), Some(90.0))]
#[case(Some(99.0), None, Some(95.0), Some(90.0))]
#[case(Some(99.0), Some(100.0), None, Some(90.0))]
#[case(Some(99.0), Some(100.0), Some(95.0), None)]
fn test_any_missing_input_nulls_everything(
    #[case] ltp: Option<f64>,
    #[case] pl3h: Option<f64>,
    #[case] pl3m: Option<f64>,
    #[case] pl3l: Option<f64>,
) {
    let result = evaluate_conditions(ltp, Some(99.5), &Pl3Levels { pl3h, pl3m, pl3l });
    assert_eq!(result, M75Conditions::default());
}

#[rstest]
fn test_box_proximity_flags() {
    let values = BoxStrategyValues {
        br_t: Some(130.0),
        br_r: Some(122.5),
        be_t: Some(80.0),
        be_r: Some(87.5),
        ..Default::default()
    };

    // Within 0.2% of the bullish reversal zone only
    let proximity = box_proximity(Some(122.4), &values);
    assert!(proximity.is_near_bull_zone);
    assert!(!proximity.is_near_bull_target);
    assert!(!proximity.is_near_bear_zone);
    assert!(!proximity.is_near_bear_target);

    // No price, no flags
    assert_eq!(
        box_proximity(None, &values),
        services_common::BoxProximity::default()
    );
}

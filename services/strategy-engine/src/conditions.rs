//! M75 condition evaluation and box proximity flags

use services_common::constants::strategy;
use services_common::{
    BoxProximity, BoxStrategyValues, LevelCondition, M75Conditions, Pl3Levels, Signal,
};

/// Relative distance check against a level
fn near_level(ltp: f64, level: f64, threshold: f64) -> bool {
    (ltp - level).abs() / level <= threshold
}

/// Evaluate the M75 per-level conditions against the live price
///
/// Each level is judged independently. When any required input is
/// missing the whole result is null conditions/signals and false alerts.
/// PL3M needs direction history: with a previous price it distinguishes
/// breaks from holds, without one it reports position only.
#[must_use]
pub fn evaluate_conditions(
    ltp: Option<f64>,
    previous_ltp: Option<f64>,
    levels: &Pl3Levels,
) -> M75Conditions {
    let (Some(ltp), Some(pl3h), Some(pl3m), Some(pl3l)) =
        (ltp, levels.pl3h, levels.pl3m, levels.pl3l)
    else {
        return M75Conditions::default();
    };

    let mut result = M75Conditions::default();
    let threshold = strategy::NEAR_LEVEL_THRESHOLD;

    // PL3H: breakout above is bullish; otherwise watch for approach
    if ltp > pl3h {
        result.pl3h_condition = Some(LevelCondition::Bullish);
        result.pl3h_signal = Some(Signal::Buy);
    } else if near_level(ltp, pl3h, threshold) {
        result.pl3h_alert = true;
    }

    // PL3L: breakdown below is bearish
    if ltp < pl3l {
        result.pl3l_condition = Some(LevelCondition::Bearish);
        result.pl3l_signal = Some(Signal::BuyOpposite);
    } else if near_level(ltp, pl3l, threshold) {
        result.pl3l_alert = true;
    }

    // PL3M: direction-aware when history is available
    result.pl3m_condition = if let Some(previous) = previous_ltp {
        if previous > pl3m && ltp <= pl3m {
            Some(LevelCondition::BearishBreak)
        } else if previous < pl3m && ltp >= pl3m {
            Some(LevelCondition::BullishBreak)
        } else if ltp < pl3m && previous < pl3m {
            Some(LevelCondition::Below)
        } else if ltp > pl3m && previous > pl3m {
            Some(LevelCondition::Above)
        } else {
            None
        }
    } else if ltp < pl3m {
        Some(LevelCondition::Below)
    } else if ltp > pl3m {
        Some(LevelCondition::Above)
    } else {
        None
    };
    result.pl3m_signal = result.pl3m_condition.map(|_| Signal::Watch);

    // Midpoint alert is independent of the condition
    result.pl3m_alert = near_level(ltp, pl3m, threshold);

    result
}

/// Box strategy proximity flags: price within 0.2% of a target or
/// reversal zone
#[must_use]
pub fn box_proximity(ltp: Option<f64>, values: &BoxStrategyValues) -> BoxProximity {
    let Some(ltp) = ltp else {
        return BoxProximity::default();
    };

    let threshold = strategy::BOX_PROXIMITY_THRESHOLD;
    let near = |level: Option<f64>| level.is_some_and(|l| near_level(ltp, l, threshold));

    BoxProximity {
        is_near_bull_zone: near(values.br_r),
        is_near_bear_zone: near(values.be_r),
        is_near_bull_target: near(values.br_t),
        is_near_bear_target: near(values.be_t),
    }
}

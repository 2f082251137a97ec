// core/fairness/src/model.rs

use crate::calculator::compute_ratio;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Fairness score at or above which a detailed report calls the exchange
/// balanced. This is a score gate, separate from the 1% value tolerance the
/// calculator applies at computation time; the two gates serve different
/// contexts and are kept as distinct constants.
pub const BALANCED_SCORE_THRESHOLD: Decimal = dec!(95.0);

/// Relative deviation of the current hours ratio from the perfect ratio
/// above which an adjustment is suggested (5%).
pub const ADJUSTMENT_DEVIATION: Decimal = dec!(0.05);

/// Fairness scores are reported with one decimal place.
pub const SCORE_PRECISION: u32 = 1;

/// Score how close two contributed values are, on a 0-100 scale.
///
/// `min(value_given, value_received) / max(..) * 100`, rounded to
/// [`SCORE_PRECISION`]. Returns 0 for any non-positive rate or hour input;
/// never panics.
pub fn fairness_score(
    rate_given: Decimal,
    hours_given: Decimal,
    rate_received: Decimal,
    hours_received: Decimal,
) -> Decimal {
    if rate_given <= Decimal::ZERO
        || hours_given <= Decimal::ZERO
        || rate_received <= Decimal::ZERO
        || hours_received <= Decimal::ZERO
    {
        return Decimal::ZERO;
    }

    let given = rate_given * hours_given;
    let received = rate_received * hours_received;
    let (lo, hi) = if given <= received {
        (given, received)
    } else {
        (received, given)
    };

    (lo / hi * dec!(100)).round_dp(SCORE_PRECISION)
}

/// Corrective suggestion for an exchange whose hours drifted off the fair
/// ratio.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdjustmentSuggestion {
    pub adjustment_needed: bool,
    pub perfect_ratio: Decimal,
    pub suggested_initiator_hours: Option<Decimal>,
    pub suggested_responder_hours: Option<Decimal>,
    pub current_fairness_score: Decimal,
}

impl AdjustmentSuggestion {
    fn not_needed(perfect_ratio: Decimal, current_fairness_score: Decimal) -> Self {
        Self {
            adjustment_needed: false,
            perfect_ratio,
            suggested_initiator_hours: None,
            suggested_responder_hours: None,
            current_fairness_score,
        }
    }
}

/// Compare the current hour allocation against the perfect ratio derived
/// from the current rates, and suggest the normalized allocation when the
/// relative deviation exceeds [`ADJUSTMENT_DEVIATION`].
///
/// Zero or negative inputs fall back to "no adjustment needed" instead of
/// raising.
pub fn suggest_adjustment(
    initiator_rate: Decimal,
    initiator_hours: Decimal,
    responder_rate: Decimal,
    responder_hours: Decimal,
) -> AdjustmentSuggestion {
    let current_score = fairness_score(
        initiator_rate,
        initiator_hours,
        responder_rate,
        responder_hours,
    );

    if initiator_rate <= Decimal::ZERO
        || responder_rate <= Decimal::ZERO
        || initiator_hours <= Decimal::ZERO
        || responder_hours <= Decimal::ZERO
    {
        return AdjustmentSuggestion::not_needed(Decimal::ONE, current_score);
    }

    let perfect_ratio = initiator_rate / responder_rate;
    let current_ratio = responder_hours / initiator_hours;
    let deviation = (current_ratio - perfect_ratio).abs() / perfect_ratio;

    if deviation <= ADJUSTMENT_DEVIATION {
        return AdjustmentSuggestion::not_needed(perfect_ratio, current_score);
    }

    let breakdown = compute_ratio(initiator_rate, responder_rate);
    AdjustmentSuggestion {
        adjustment_needed: true,
        perfect_ratio,
        suggested_initiator_hours: Some(breakdown.hours_a),
        suggested_responder_hours: Some(breakdown.hours_b),
        current_fairness_score: current_score,
    }
}

/// Full fairness breakdown for presentation to either party.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FairnessReport {
    pub fairness_score: Decimal,
    pub initiator_value: Decimal,
    pub responder_value: Decimal,
    pub value_difference: Decimal,
    pub rate_ratio: Decimal,
    pub hours_ratio: Decimal,
    pub is_balanced: bool,
    pub total_value: Decimal,
}

/// Build the detailed report for an exchange snapshot.
///
/// `is_balanced` here is gated on [`BALANCED_SCORE_THRESHOLD`], not on the
/// calculator's value tolerance. `stored_total_value` is echoed from the
/// exchange snapshot rather than recomputed.
pub fn fairness_report(
    initiator_rate: Decimal,
    initiator_hours: Decimal,
    responder_rate: Decimal,
    responder_hours: Decimal,
    stored_total_value: Decimal,
) -> FairnessReport {
    let score = fairness_score(
        initiator_rate,
        initiator_hours,
        responder_rate,
        responder_hours,
    );
    let initiator_value = initiator_rate * initiator_hours;
    let responder_value = responder_rate * responder_hours;
    let rate_ratio = if responder_rate > Decimal::ZERO {
        initiator_rate / responder_rate
    } else {
        Decimal::ZERO
    };
    let hours_ratio = if initiator_hours > Decimal::ZERO {
        responder_hours / initiator_hours
    } else {
        Decimal::ZERO
    };

    FairnessReport {
        fairness_score: score,
        initiator_value,
        responder_value,
        value_difference: (initiator_value - responder_value).abs(),
        rate_ratio,
        hours_ratio,
        is_balanced: score >= BALANCED_SCORE_THRESHOLD,
        total_value: stored_total_value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_perfect_allocation_scores_100() {
        let score = fairness_score(dec!(50), dec!(1.0), dec!(40), dec!(1.25));
        assert_eq!(score, dec!(100.0));
    }

    #[test]
    fn test_lopsided_allocation_scores_low() {
        // 50*1.0 = 50 given vs 40*0.5 = 20 received -> 40%.
        let score = fairness_score(dec!(50), dec!(1.0), dec!(40), dec!(0.5));
        assert_eq!(score, dec!(40.0));
        assert!(score < dec!(50));
    }

    #[test]
    fn test_score_is_zero_on_garbage_input() {
        assert_eq!(
            fairness_score(Decimal::ZERO, dec!(1), dec!(40), dec!(1)),
            Decimal::ZERO
        );
        assert_eq!(
            fairness_score(dec!(50), dec!(-1), dec!(40), dec!(1)),
            Decimal::ZERO
        );
    }

    #[test]
    fn test_score_symmetry() {
        let a = fairness_score(dec!(50), dec!(1.0), dec!(40), dec!(0.5));
        let b = fairness_score(dec!(40), dec!(0.5), dec!(50), dec!(1.0));
        assert_eq!(a, b);
    }

    #[test]
    fn test_adjustment_suggested_off_ratio() {
        // Designer $50 vs writer $25 at 1.0/1.5 hours: perfect ratio is 2.0.
        let suggestion = suggest_adjustment(dec!(50), dec!(1.0), dec!(25), dec!(1.5));
        assert!(suggestion.adjustment_needed);
        assert_eq!(suggestion.perfect_ratio, dec!(2));
        assert_eq!(suggestion.suggested_initiator_hours, Some(dec!(1)));
        assert_eq!(suggestion.suggested_responder_hours, Some(dec!(2.00)));
        assert!(suggestion.current_fairness_score < dec!(100));
    }

    #[test]
    fn test_no_adjustment_within_band() {
        let suggestion = suggest_adjustment(dec!(50), dec!(1.0), dec!(40), dec!(1.25));
        assert!(!suggestion.adjustment_needed);
        assert_eq!(suggestion.current_fairness_score, dec!(100.0));
        assert!(suggestion.suggested_initiator_hours.is_none());
    }

    #[test]
    fn test_adjustment_never_raises_on_zero_rate() {
        let suggestion = suggest_adjustment(Decimal::ZERO, dec!(1), dec!(40), dec!(1));
        assert!(!suggestion.adjustment_needed);
        assert_eq!(suggestion.current_fairness_score, Decimal::ZERO);
    }

    #[test]
    fn test_report_uses_score_threshold() {
        let report = fairness_report(dec!(50), dec!(1.0), dec!(40), dec!(0.5), dec!(35.0));
        assert_eq!(report.fairness_score, dec!(40.0));
        assert!(!report.is_balanced);
        assert_eq!(report.initiator_value, dec!(50.0));
        assert_eq!(report.responder_value, dec!(20.0));
        assert_eq!(report.value_difference, dec!(30.0));
        assert_eq!(report.total_value, dec!(35.0));

        let fair = fairness_report(dec!(50), dec!(1.0), dec!(40), dec!(1.25), dec!(50.0));
        assert!(fair.is_balanced);
        assert_eq!(fair.hours_ratio, dec!(1.25));
    }
}

// core/fairness/src/calculator.rs

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Relative tolerance for declaring an exchange value-balanced (1%).
pub const VALUE_BALANCE_TOLERANCE: Decimal = dec!(0.01);

/// Absolute floor for the balance tolerance when the total value is zero.
pub const MIN_IMBALANCE_FLOOR: Decimal = dec!(0.01);

/// Hour allocations are rounded to two decimal places.
pub const HOURS_PRECISION: u32 = 2;

/// Output of the rate-ratio calculator for a pair of hourly rates.
///
/// `degenerate` marks the "cannot compute, rate missing" outcome: both hour
/// fields hold the neutral 1.0 and `is_balanced` is false. It does not mean
/// the exchange is fair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatioBreakdown {
    pub ratio: Decimal,
    pub hours_a: Decimal,
    pub hours_b: Decimal,
    pub value_a: Decimal,
    pub value_b: Decimal,
    pub total_value: Decimal,
    pub imbalance: Decimal,
    pub is_balanced: bool,
    pub degenerate: bool,
}

impl RatioBreakdown {
    fn degenerate() -> Self {
        Self {
            ratio: Decimal::ONE,
            hours_a: Decimal::ONE,
            hours_b: Decimal::ONE,
            value_a: Decimal::ZERO,
            value_b: Decimal::ZERO,
            total_value: Decimal::ZERO,
            imbalance: Decimal::ZERO,
            is_balanced: false,
            degenerate: true,
        }
    }
}

/// Derive the hour allocation that equalizes monetary value between two
/// hourly rates.
///
/// The side with the higher rate always contributes exactly one hour; the
/// cheaper side contributes proportionally more, rounded to
/// [`HOURS_PRECISION`] decimal places. Non-positive rates yield the tagged
/// degenerate result rather than an error.
pub fn compute_ratio(rate_a: Decimal, rate_b: Decimal) -> RatioBreakdown {
    if rate_a <= Decimal::ZERO || rate_b <= Decimal::ZERO {
        return RatioBreakdown::degenerate();
    }

    let ratio = rate_a / rate_b;
    let (hours_a, hours_b) = if ratio >= Decimal::ONE {
        (Decimal::ONE, ratio.round_dp(HOURS_PRECISION))
    } else {
        ((Decimal::ONE / ratio).round_dp(HOURS_PRECISION), Decimal::ONE)
    };

    let assessment = assess_allocation(rate_a, hours_a, rate_b, hours_b);

    RatioBreakdown {
        ratio,
        hours_a,
        hours_b,
        value_a: assessment.value_a,
        value_b: assessment.value_b,
        total_value: assessment.total_value,
        imbalance: assessment.imbalance,
        is_balanced: assessment.is_balanced,
        degenerate: false,
    }
}

/// Value metrics for an explicit (possibly hand-edited) hour allocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationAssessment {
    pub value_a: Decimal,
    pub value_b: Decimal,
    pub total_value: Decimal,
    pub imbalance: Decimal,
    pub is_balanced: bool,
}

/// Re-derive value totals and the balance flag for a concrete hour
/// allocation, without renormalizing the hours.
pub fn assess_allocation(
    rate_a: Decimal,
    hours_a: Decimal,
    rate_b: Decimal,
    hours_b: Decimal,
) -> AllocationAssessment {
    let value_a = rate_a * hours_a;
    let value_b = rate_b * hours_b;
    let total_value = (value_a + value_b) / dec!(2);
    let imbalance = (value_a - value_b).abs();
    let tolerance = (total_value * VALUE_BALANCE_TOLERANCE).max(MIN_IMBALANCE_FLOOR);

    AllocationAssessment {
        value_a,
        value_b,
        total_value,
        imbalance,
        is_balanced: imbalance <= tolerance,
    }
}

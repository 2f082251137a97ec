// core/fairness/src/lib.rs

//! Tradeloop fairness math
//!
//! Pure decimal computations shared by every exchange and chain: the
//! rate-ratio calculator that derives the hour allocation equalizing
//! monetary value between two hourly rates, and the fairness model that
//! scores a proposed allocation and suggests corrections.
//!
//! Nothing in this crate touches shared state or raises on degenerate
//! input; a missing or non-positive rate produces a tagged degenerate
//! result instead of an error.

pub mod calculator;
pub mod model;

pub use calculator::{
    assess_allocation, compute_ratio, AllocationAssessment, RatioBreakdown, HOURS_PRECISION,
    MIN_IMBALANCE_FLOOR, VALUE_BALANCE_TOLERANCE,
};
pub use model::{
    fairness_report, fairness_score, suggest_adjustment, AdjustmentSuggestion, FairnessReport,
    ADJUSTMENT_DEVIATION, BALANCED_SCORE_THRESHOLD, SCORE_PRECISION,
};

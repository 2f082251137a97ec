// core/exchange/src/types.rs

use crate::state::ExchangeStatus;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tradeloop_fairness::{
    assess_allocation, compute_ratio, fairness_report, fairness_score, suggest_adjustment,
    AdjustmentSuggestion, FairnessReport,
};
use tradeloop_primitives::{ExchangeId, OfferId, OfferedSkill, SkillId, UserId, ValidationError};

/// What kind of arrangement the parties agreed to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExchangeType {
    #[default]
    SkillForSkill,
    Mentoring,
    Collaboration,
}

/// A proposed or realized barter between an initiator and a responder.
///
/// Rate and hour fields are snapshots taken at calculation time; they are
/// never re-read from the live offers unless [`Exchange::recalculate`] is
/// called explicitly. Both parties may drive the status, but neither may
/// touch the other's snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exchange {
    pub id: ExchangeId,
    pub initiator: UserId,
    pub responder: UserId,
    pub initiator_offer: OfferId,
    pub responder_offer: OfferId,
    pub initiator_skill: SkillId,
    pub responder_skill: SkillId,
    pub exchange_type: ExchangeType,
    pub terms: String,

    // Snapshot written only by (re)calculation.
    pub initiator_hourly_rate: Decimal,
    pub responder_hourly_rate: Decimal,
    pub calculated_ratio: Decimal,
    pub initiator_hours_required: Decimal,
    pub responder_hours_required: Decimal,
    pub total_value: Decimal,
    pub imbalance_amount: Decimal,
    pub is_balanced: bool,

    pub status: ExchangeStatus,

    pub proposed_start_date: Option<NaiveDate>,
    pub proposed_end_date: Option<NaiveDate>,
    pub agreed_start_date: Option<NaiveDate>,
    pub agreed_end_date: Option<NaiveDate>,

    pub created_at: DateTime<Utc>,
    pub accepted_at: Option<DateTime<Utc>>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub closed_at: Option<DateTime<Utc>>,

    pub initiator_rating: Option<u8>,
    pub responder_rating: Option<u8>,
    pub initiator_feedback: Option<String>,
    pub responder_feedback: Option<String>,
}

impl Exchange {
    /// Create a pending exchange from two active offers, snapshotting both
    /// rates and deriving the fair hour allocation.
    pub fn new(
        initiator_offer: &OfferedSkill,
        responder_offer: &OfferedSkill,
        exchange_type: ExchangeType,
        terms: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        if initiator_offer.user_id == responder_offer.user_id {
            return Err(ValidationError::SelfExchange);
        }
        if !initiator_offer.is_active {
            return Err(ValidationError::InactiveOffer(initiator_offer.id));
        }
        if !responder_offer.is_active {
            return Err(ValidationError::InactiveOffer(responder_offer.id));
        }

        let mut exchange = Self {
            id: ExchangeId::new(),
            initiator: initiator_offer.user_id,
            responder: responder_offer.user_id,
            initiator_offer: initiator_offer.id,
            responder_offer: responder_offer.id,
            initiator_skill: initiator_offer.skill_id,
            responder_skill: responder_offer.skill_id,
            exchange_type,
            terms: terms.into(),
            initiator_hourly_rate: Decimal::ZERO,
            responder_hourly_rate: Decimal::ZERO,
            calculated_ratio: Decimal::ONE,
            initiator_hours_required: Decimal::ONE,
            responder_hours_required: Decimal::ONE,
            total_value: Decimal::ZERO,
            imbalance_amount: Decimal::ZERO,
            is_balanced: false,
            status: ExchangeStatus::Pending,
            proposed_start_date: None,
            proposed_end_date: None,
            agreed_start_date: None,
            agreed_end_date: None,
            created_at: Utc::now(),
            accepted_at: None,
            started_at: None,
            completed_at: None,
            closed_at: None,
            initiator_rating: None,
            responder_rating: None,
            initiator_feedback: None,
            responder_feedback: None,
        };
        exchange.recalculate(
            initiator_offer.hourly_rate_equivalent,
            responder_offer.hourly_rate_equivalent,
        );
        Ok(exchange)
    }

    /// Create an exchange carrying an externally negotiated hour allocation
    /// (used when a chain link is realized): rates are snapshotted, the
    /// given hours are kept as-is, and value metrics are assessed against
    /// them.
    pub fn with_allocation(
        initiator_offer: &OfferedSkill,
        responder_offer: &OfferedSkill,
        initiator_hours: Decimal,
        responder_hours: Decimal,
        exchange_type: ExchangeType,
        terms: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        let mut exchange = Self::new(initiator_offer, responder_offer, exchange_type, terms)?;
        exchange.set_hours(initiator_hours, responder_hours);
        Ok(exchange)
    }

    /// Re-snapshot both rates and re-derive the normalized hour allocation
    /// and value metrics. Must be invoked whenever a contributing offer's
    /// rate or skill changes; nothing here happens automatically.
    pub fn recalculate(&mut self, initiator_rate: Decimal, responder_rate: Decimal) {
        let breakdown = compute_ratio(initiator_rate, responder_rate);
        self.initiator_hourly_rate = initiator_rate;
        self.responder_hourly_rate = responder_rate;
        self.calculated_ratio = breakdown.ratio;
        self.initiator_hours_required = breakdown.hours_a;
        self.responder_hours_required = breakdown.hours_b;
        self.total_value = breakdown.total_value;
        self.imbalance_amount = breakdown.imbalance;
        self.is_balanced = breakdown.is_balanced;
    }

    /// Override the hour allocation (renegotiation) and reassess value
    /// metrics against the stored rates, without renormalizing.
    pub fn set_hours(&mut self, initiator_hours: Decimal, responder_hours: Decimal) {
        self.initiator_hours_required = initiator_hours;
        self.responder_hours_required = responder_hours;
        let assessment = assess_allocation(
            self.initiator_hourly_rate,
            self.initiator_hours_required,
            self.responder_hourly_rate,
            self.responder_hours_required,
        );
        self.total_value = assessment.total_value;
        self.imbalance_amount = assessment.imbalance;
        self.is_balanced = assessment.is_balanced;
    }

    pub fn is_participant(&self, user: UserId) -> bool {
        user == self.initiator || user == self.responder
    }

    pub fn other_party(&self, user: UserId) -> Option<UserId> {
        if user == self.initiator {
            Some(self.responder)
        } else if user == self.responder {
            Some(self.initiator)
        } else {
            None
        }
    }

    /// One-line description of the proposed trade.
    pub fn summary(&self) -> String {
        format!(
            "{} hr at {}/hr for {} hr at {}/hr ({})",
            self.initiator_hours_required,
            self.initiator_hourly_rate,
            self.responder_hours_required,
            self.responder_hourly_rate,
            self.status.as_str(),
        )
    }

    /// 0-100 fairness of the current snapshot.
    pub fn fairness_score(&self) -> Decimal {
        fairness_score(
            self.initiator_hourly_rate,
            self.initiator_hours_required,
            self.responder_hourly_rate,
            self.responder_hours_required,
        )
    }

    /// Corrective hour suggestion if the snapshot drifted off the fair
    /// ratio.
    pub fn suggest_adjustment(&self) -> AdjustmentSuggestion {
        suggest_adjustment(
            self.initiator_hourly_rate,
            self.initiator_hours_required,
            self.responder_hourly_rate,
            self.responder_hours_required,
        )
    }

    /// Detailed per-party value breakdown with the 95-score balance gate.
    pub fn detailed_fairness_report(&self) -> FairnessReport {
        fairness_report(
            self.initiator_hourly_rate,
            self.initiator_hours_required,
            self.responder_hourly_rate,
            self.responder_hours_required,
            self.total_value,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use tradeloop_primitives::SkillId;

    fn offer(rate: Decimal) -> OfferedSkill {
        OfferedSkill::new(UserId::new(), SkillId::new(), "", "", rate)
    }

    #[test]
    fn test_new_snapshots_and_computes() {
        let design = offer(dec!(50.00));
        let dev = offer(dec!(40.00));
        let exchange =
            Exchange::new(&design, &dev, ExchangeType::default(), "Logo for website").unwrap();

        assert_eq!(exchange.initiator, design.user_id);
        assert_eq!(exchange.responder, dev.user_id);
        assert_eq!(exchange.initiator_hourly_rate, dec!(50.00));
        assert_eq!(exchange.responder_hourly_rate, dec!(40.00));
        assert_eq!(exchange.calculated_ratio, dec!(1.25));
        assert_eq!(exchange.initiator_hours_required, dec!(1));
        assert_eq!(exchange.responder_hours_required, dec!(1.25));
        assert!(exchange.is_balanced);
        assert_eq!(exchange.status, ExchangeStatus::Pending);
        assert_eq!(exchange.fairness_score(), dec!(100.0));
    }

    #[test]
    fn test_self_exchange_rejected_before_any_state() {
        let user = UserId::new();
        let a = OfferedSkill::new(user, SkillId::new(), "", "", dec!(50));
        let b = OfferedSkill::new(user, SkillId::new(), "", "", dec!(25));
        assert!(matches!(
            Exchange::new(&a, &b, ExchangeType::default(), ""),
            Err(ValidationError::SelfExchange)
        ));
    }

    #[test]
    fn test_inactive_offer_rejected() {
        let mut a = offer(dec!(50));
        let b = offer(dec!(40));
        a.deactivate();
        assert!(matches!(
            Exchange::new(&a, &b, ExchangeType::default(), ""),
            Err(ValidationError::InactiveOffer(_))
        ));
    }

    #[test]
    fn test_set_hours_reassesses_without_renormalizing() {
        let mut exchange = Exchange::new(
            &offer(dec!(50)),
            &offer(dec!(40)),
            ExchangeType::default(),
            "",
        )
        .unwrap();

        exchange.set_hours(dec!(1.0), dec!(0.5));
        assert_eq!(exchange.initiator_hours_required, dec!(1.0));
        assert_eq!(exchange.responder_hours_required, dec!(0.5));
        assert!(!exchange.is_balanced);
        assert_eq!(exchange.fairness_score(), dec!(40.0));

        let report = exchange.detailed_fairness_report();
        assert!(!report.is_balanced);
        assert_eq!(report.value_difference, dec!(30.0));
    }

    #[test]
    fn test_recalculate_overwrites_snapshot() {
        let mut exchange = Exchange::new(
            &offer(dec!(50)),
            &offer(dec!(40)),
            ExchangeType::default(),
            "",
        )
        .unwrap();
        exchange.recalculate(dec!(60), dec!(30));
        assert_eq!(exchange.calculated_ratio, dec!(2));
        assert_eq!(exchange.responder_hours_required, dec!(2.00));
    }

    #[test]
    fn test_other_party() {
        let exchange = Exchange::new(
            &offer(dec!(50)),
            &offer(dec!(40)),
            ExchangeType::default(),
            "",
        )
        .unwrap();
        assert_eq!(
            exchange.other_party(exchange.initiator),
            Some(exchange.responder)
        );
        assert_eq!(
            exchange.other_party(exchange.responder),
            Some(exchange.initiator)
        );
        assert_eq!(exchange.other_party(UserId::new()), None);
        assert!(!exchange.is_participant(UserId::new()));
    }

    #[test]
    fn test_degenerate_rate_degrades_gracefully() {
        let mut exchange = Exchange::new(
            &offer(dec!(50)),
            &offer(dec!(40)),
            ExchangeType::default(),
            "",
        )
        .unwrap();
        exchange.recalculate(Decimal::ZERO, dec!(40));
        assert!(!exchange.is_balanced);
        assert_eq!(exchange.fairness_score(), Decimal::ZERO);
        let suggestion = exchange.suggest_adjustment();
        assert!(!suggestion.adjustment_needed);
    }
}

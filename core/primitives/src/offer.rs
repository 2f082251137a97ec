// core/primitives/src/offer.rs

use crate::ids::{NeedId, OfferId, SkillId, UserId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// How urgently a needed skill is required.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Urgency {
    Low,
    #[default]
    Medium,
    High,
}

impl Urgency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Urgency::Low => "Low",
            Urgency::Medium => "Medium",
            Urgency::High => "High",
        }
    }
}

/// "I can provide this": a (user, skill) advertisement with a notional
/// market rate per hour.
///
/// Withdrawn offers are deactivated, never deleted, so historical exchanges
/// keep resolving their snapshots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OfferedSkill {
    pub id: OfferId,
    pub user_id: UserId,
    pub skill_id: SkillId,
    pub description: String,
    pub availability: String,
    pub hourly_rate_equivalent: Decimal,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl OfferedSkill {
    pub fn new(
        user_id: UserId,
        skill_id: SkillId,
        description: impl Into<String>,
        availability: impl Into<String>,
        hourly_rate_equivalent: Decimal,
    ) -> Self {
        Self {
            id: OfferId::new(),
            user_id,
            skill_id,
            description: description.into(),
            availability: availability.into(),
            hourly_rate_equivalent,
            is_active: true,
            created_at: Utc::now(),
        }
    }

    pub fn deactivate(&mut self) {
        self.is_active = false;
    }
}

/// "I need this": a (user, skill) request with an optional rate ceiling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NeededSkill {
    pub id: NeedId,
    pub user_id: UserId,
    pub skill_id: SkillId,
    pub description: String,
    pub urgency: Urgency,
    pub max_hourly_rate: Option<Decimal>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl NeededSkill {
    pub fn new(
        user_id: UserId,
        skill_id: SkillId,
        description: impl Into<String>,
        urgency: Urgency,
        max_hourly_rate: Option<Decimal>,
    ) -> Self {
        Self {
            id: NeedId::new(),
            user_id,
            skill_id,
            description: description.into(),
            urgency,
            max_hourly_rate,
            is_active: true,
            created_at: Utc::now(),
        }
    }

    pub fn deactivate(&mut self) {
        self.is_active = false;
    }
}

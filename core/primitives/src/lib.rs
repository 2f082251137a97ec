// core/primitives/src/lib.rs

//! Tradeloop core primitives
//!
//! Shared identifiers and entity types for the barter engine: skills and
//! their category taxonomy, user profiles, and the offered/needed skill
//! records that every matching and fairness computation reads.

pub mod error;
pub mod ids;
pub mod offer;
pub mod skill;

pub use error::ValidationError;
pub use ids::{
    CategoryId, ChainId, ExchangeId, NeedId, NotificationId, OfferId, SkillId, UserId,
};
pub use offer::{NeededSkill, OfferedSkill, Urgency};
pub use skill::{Category, CategoryTree, Proficiency, Skill};

use serde::{Deserialize, Serialize};

/// Opaque user identity at the engine boundary: an equality-comparable id
/// plus a display name. Registration and authentication live elsewhere.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: UserId,
    pub display_name: String,
}

impl UserProfile {
    pub fn new(display_name: impl Into<String>) -> Self {
        Self {
            id: UserId::new(),
            display_name: display_name.into(),
        }
    }
}

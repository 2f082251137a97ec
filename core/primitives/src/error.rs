// core/primitives/src/error.rs

use crate::ids::{OfferId, SkillId, UserId};

/// Validation failures rejected before any state mutation.
///
/// Each variant is a specific reason code so callers can render a precise
/// message instead of a generic failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("initiator and responder must be different users")]
    SelfExchange,

    #[error("offered skill {offer} does not belong to user {user}")]
    ForeignOffer { offer: OfferId, user: UserId },

    #[error("offered skill {0} is not active")]
    InactiveOffer(OfferId),

    #[error("user {user} already has an active offer for skill {skill}")]
    DuplicateActiveOffer { user: UserId, skill: SkillId },

    #[error("user {user} already has an active need for skill {skill}")]
    DuplicateActiveNeed { user: UserId, skill: SkillId },

    #[error("hourly rate must be positive, got {0}")]
    NonPositiveRate(rust_decimal::Decimal),

    #[error("skill name must not be empty")]
    EmptySkillName,

    #[error("rating must be between 1 and 5, got {0}")]
    InvalidRating(u8),
}

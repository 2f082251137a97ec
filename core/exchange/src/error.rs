// core/exchange/src/error.rs

use crate::state::ExchangeStatus;
use tradeloop_primitives::{ExchangeId, UserId, ValidationError};

/// Failures of exchange operations.
///
/// Authorization, state, validation and lookup failures are distinct
/// variants so callers can answer each with the right signal.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExchangeError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("user {user} is not a participant in exchange {exchange}")]
    NotParticipant { exchange: ExchangeId, user: UserId },

    #[error("cannot transition exchange from {} to {}", from.as_str(), to.as_str())]
    InvalidTransition {
        from: ExchangeStatus,
        to: ExchangeStatus,
    },

    #[error("exchange {0} not found")]
    NotFound(ExchangeId),

    #[error("ratings are only accepted on completed exchanges (status is {})", status.as_str())]
    NotRatable { status: ExchangeStatus },

    #[error("user {user} has already rated exchange {exchange}")]
    AlreadyRated { exchange: ExchangeId, user: UserId },
}

// core/matching/src/error.rs

use crate::chain::{ChainStatus, LinkStatus};
use tradeloop_primitives::{ChainId, NeedId, OfferId, SkillId, UserId, ValidationError};

/// Failures of board and chain operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MatchError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("user {0} is not registered on the board")]
    UnknownUser(UserId),

    #[error("skill {0} is not registered on the board")]
    UnknownSkill(SkillId),

    #[error("offered skill {0} not found")]
    OfferNotFound(OfferId),

    #[error("needed skill {0} not found")]
    NeedNotFound(NeedId),

    #[error("chain {0} not found")]
    ChainNotFound(ChainId),

    #[error("user {user} holds no link in chain {chain}")]
    NotChainParticipant { chain: ChainId, user: UserId },

    /// The concurrent-accept race: the link was no longer pending by the
    /// time this response arrived. Callers should re-fetch the chain.
    #[error("link for user {user} in chain {chain} was already {}", status.as_str())]
    LinkConflict {
        chain: ChainId,
        user: UserId,
        status: LinkStatus,
    },

    #[error("chain {chain} is already {}", status.as_str())]
    ChainClosed {
        chain: ChainId,
        status: ChainStatus,
    },

    #[error("user {0} appears more than once in the chain")]
    DuplicateChainUser(UserId),
}

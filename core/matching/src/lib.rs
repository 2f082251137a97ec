// core/matching/src/lib.rs

//! Tradeloop matching engines
//!
//! Everything that turns offered/needed skill records into exchange
//! proposals: the shared [`SkillBoard`] adjacency store, the bilateral
//! [`DirectMatchFinder`], and the three-party chain machinery: cycle
//! discovery over the offer/need graph, the link acceptance protocol, and
//! atomic materialization of an accepted chain into exchanges.

pub mod board;
pub mod chain;
pub mod direct;
pub mod discovery;
pub mod error;

pub use board::{SkillBoard, MIN_QUERY_LEN};
pub use chain::{
    ChainEngine, ChainLink, ChainOutcome, ChainStatus, ExchangeChain, LinkStatus,
};
pub use direct::{DirectMatchFinder, MatchCandidate, MatchKind};
pub use discovery::{
    ChainDiscovery, ChainParticipant, ChainProposal, ChainSuggestion, HourPoolSuggestion,
    DISCOVERY_FALLBACK_SCORE,
};
pub use error::MatchError;

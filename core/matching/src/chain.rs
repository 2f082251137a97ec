// core/matching/src/chain.rs

use crate::board::SkillBoard;
use crate::discovery::ChainProposal;
use crate::error::MatchError;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use parking_lot::Mutex;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};
use tradeloop_exchange::{Exchange, ExchangeStatus, ExchangeStore, ExchangeType};
use tradeloop_primitives::{ChainId, OfferId, SkillId, UserId};

/// Lifecycle of a multi-party chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChainStatus {
    Forming,
    Proposed,
    Pending,
    Accepted,
    InProgress,
    Completed,
    Cancelled,
}

impl ChainStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChainStatus::Forming => "forming",
            ChainStatus::Proposed => "proposed",
            ChainStatus::Pending => "pending",
            ChainStatus::Accepted => "accepted",
            ChainStatus::InProgress => "in_progress",
            ChainStatus::Completed => "completed",
            ChainStatus::Cancelled => "cancelled",
        }
    }
}

/// Per-link response state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkStatus {
    #[default]
    Pending,
    Reviewing,
    Accepted,
    Rejected,
}

impl LinkStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LinkStatus::Pending => "pending",
            LinkStatus::Reviewing => "reviewing",
            LinkStatus::Accepted => "accepted",
            LinkStatus::Rejected => "rejected",
        }
    }
}

/// One participant's position in a chain: what they give, what they
/// receive, and their response.
///
/// The cycle is resolved by index arithmetic over `position`, not by
/// object references; the next link is `(position + 1) % len`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChainLink {
    pub user_id: UserId,
    pub gives_offer: OfferId,
    pub gives_skill: SkillId,
    pub receives_skill: SkillId,
    pub hours_given: Decimal,
    pub hours_received: Decimal,
    pub position: usize,
    pub status: LinkStatus,
}

/// A proposed cyclic group exchange.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExchangeChain {
    pub id: ChainId,
    pub name: String,
    pub status: ChainStatus,
    pub created_by: UserId,
    pub links: Vec<ChainLink>,
    pub created_at: DateTime<Utc>,
    pub accepted_at: Option<DateTime<Utc>>,
}

impl ExchangeChain {
    pub fn participant_count(&self) -> usize {
        self.links.len()
    }

    /// Total hours committed across every link.
    pub fn total_hours(&self) -> Decimal {
        self.links.iter().map(|link| link.hours_given).sum()
    }

    pub fn link_for(&self, user: UserId) -> Option<&ChainLink> {
        self.links.iter().find(|link| link.user_id == user)
    }

    pub fn next_position(&self, position: usize) -> usize {
        (position + 1) % self.links.len()
    }

    pub fn previous_position(&self, position: usize) -> usize {
        (position + self.links.len() - 1) % self.links.len()
    }

    pub fn all_accepted(&self) -> bool {
        self.links
            .iter()
            .all(|link| link.status == LinkStatus::Accepted)
    }

    pub fn any_rejected(&self) -> bool {
        self.links
            .iter()
            .any(|link| link.status == LinkStatus::Rejected)
    }

    /// Aggregate fairness of the chain from its links' give/receive values.
    ///
    /// `rate_of` resolves an offer's hourly rate. Receive value of a link
    /// is priced by the next link's given offer. When no receive value can
    /// be priced, falls back to an hours-only ratio. Chains with fewer than
    /// two links are trivially fair.
    pub fn calculate_fairness<F>(&self, rate_of: F) -> Decimal
    where
        F: Fn(OfferId) -> Option<Decimal>,
    {
        if self.links.len() < 2 {
            return dec!(100);
        }

        let mut total_given = Decimal::ZERO;
        let mut total_received = Decimal::ZERO;
        for (index, link) in self.links.iter().enumerate() {
            let next = &self.links[(index + 1) % self.links.len()];
            if let Some(rate) = rate_of(link.gives_offer) {
                total_given += rate * link.hours_given;
            }
            if let Some(rate) = rate_of(next.gives_offer) {
                total_received += rate * link.hours_received;
            }
        }

        if total_received > Decimal::ZERO {
            let (lo, hi) = if total_given <= total_received {
                (total_given, total_received)
            } else {
                (total_received, total_given)
            };
            return (lo / hi * dec!(100)).round_dp(1);
        }

        // No receive value could be priced; compare raw hours instead.
        let hours_given: Decimal = self.links.iter().map(|l| l.hours_given).sum();
        let hours_received: Decimal = self.links.iter().map(|l| l.hours_received).sum();
        let (lo, hi) = if hours_given <= hours_received {
            (hours_given, hours_received)
        } else {
            (hours_received, hours_given)
        };
        if hi > Decimal::ZERO {
            (lo / hi * dec!(100)).round_dp(1)
        } else {
            Decimal::ZERO
        }
    }
}

/// Result of one participant's response to a chain.
#[derive(Debug, Clone)]
pub struct ChainOutcome {
    pub chain: ExchangeChain,
    /// Exchanges created when this response closed the chain; empty
    /// otherwise.
    pub materialized: Vec<Exchange>,
}

/// The chain acceptance protocol and its storage.
///
/// Link responses are compare-and-swap under the chain's mutex, so exactly
/// one of two concurrent accepts wins; the loser sees a conflict. The last
/// accept atomically materializes one exchange per link or none at all.
#[derive(Debug)]
pub struct ChainEngine {
    board: Arc<SkillBoard>,
    exchanges: Arc<ExchangeStore>,
    chains: Arc<DashMap<ChainId, Arc<Mutex<ExchangeChain>>>>,
}

impl ChainEngine {
    pub fn new(board: Arc<SkillBoard>, exchanges: Arc<ExchangeStore>) -> Self {
        Self {
            board,
            exchanges,
            chains: Arc::new(DashMap::new()),
        }
    }

    /// Turn a discovered cycle into a stored chain awaiting responses.
    ///
    /// Every link starts pending with a nominal one-hour commitment in
    /// each direction; hours are renegotiated per exchange after
    /// acceptance.
    pub async fn propose_from(
        &self,
        proposal: &ChainProposal,
        name: impl Into<String>,
        created_by: UserId,
    ) -> Result<ExchangeChain, MatchError> {
        let mut links = Vec::with_capacity(proposal.participants.len());
        for (position, participant) in proposal.participants.iter().enumerate() {
            if links
                .iter()
                .any(|link: &ChainLink| link.user_id == participant.user_id)
            {
                return Err(MatchError::DuplicateChainUser(participant.user_id));
            }
            links.push(ChainLink {
                user_id: participant.user_id,
                gives_offer: participant.gives_offer,
                gives_skill: participant.gives_skill,
                receives_skill: participant.receives_skill,
                hours_given: Decimal::ONE,
                hours_received: Decimal::ONE,
                position,
                status: LinkStatus::Pending,
            });
        }

        let chain = ExchangeChain {
            id: ChainId::new(),
            name: name.into(),
            status: ChainStatus::Pending,
            created_by,
            links,
            created_at: Utc::now(),
            accepted_at: None,
        };

        info!(
            chain = %chain.id,
            participants = chain.participant_count(),
            "Chain proposed"
        );
        self.chains
            .insert(chain.id, Arc::new(Mutex::new(chain.clone())));
        Ok(chain)
    }

    pub async fn get(&self, id: ChainId) -> Result<ExchangeChain, MatchError> {
        let entry = self.entry(id)?;
        let chain = entry.lock();
        Ok(chain.clone())
    }

    /// Aggregate fairness of a stored chain, priced from the board.
    pub async fn fairness(&self, id: ChainId) -> Result<Decimal, MatchError> {
        let entry = self.entry(id)?;
        let chain = entry.lock();
        Ok(chain.calculate_fairness(|offer| {
            self.board
                .offer(offer)
                .ok()
                .map(|o| o.hourly_rate_equivalent)
        }))
    }

    /// Record one participant's accept/reject.
    ///
    /// The link flips from pending under the chain lock; a link that is no
    /// longer pending answers with a conflict so the caller can re-fetch.
    /// When the last link accepts, one exchange per link is created with
    /// consecutive positions wired initiator -> responder (modulo chain
    /// length), all inside the same critical section: either every
    /// exchange is created and the chain is accepted, or none are.
    pub async fn respond(
        &self,
        chain_id: ChainId,
        user: UserId,
        accept: bool,
    ) -> Result<ChainOutcome, MatchError> {
        let entry = self.entry(chain_id)?;
        let mut chain = entry.lock();

        if chain.status != ChainStatus::Pending {
            return Err(MatchError::ChainClosed {
                chain: chain_id,
                status: chain.status,
            });
        }

        let link = chain
            .links
            .iter_mut()
            .find(|link| link.user_id == user)
            .ok_or(MatchError::NotChainParticipant {
                chain: chain_id,
                user,
            })?;
        if link.status != LinkStatus::Pending {
            return Err(MatchError::LinkConflict {
                chain: chain_id,
                user,
                status: link.status,
            });
        }

        link.status = if accept {
            LinkStatus::Accepted
        } else {
            LinkStatus::Rejected
        };
        info!(
            chain = %chain_id,
            user = %user,
            accepted = accept,
            "Chain link response recorded"
        );

        if !accept {
            // A rejected link parks the chain; cancelling it is the
            // surrounding workflow's call.
            warn!(chain = %chain_id, user = %user, "Chain link rejected");
            return Ok(ChainOutcome {
                chain: chain.clone(),
                materialized: Vec::new(),
            });
        }

        if !chain.all_accepted() {
            return Ok(ChainOutcome {
                chain: chain.clone(),
                materialized: Vec::new(),
            });
        }

        // Last accept: build every exchange first so a failure creates
        // nothing, then insert and flip the chain.
        let materialized = self.materialize(&chain)?;
        for exchange in &materialized {
            self.exchanges.insert(exchange.clone());
        }
        chain.status = ChainStatus::Accepted;
        chain.accepted_at = Some(Utc::now());
        info!(
            chain = %chain_id,
            exchanges = materialized.len(),
            "Chain accepted and materialized"
        );

        Ok(ChainOutcome {
            chain: chain.clone(),
            materialized,
        })
    }

    fn materialize(&self, chain: &ExchangeChain) -> Result<Vec<Exchange>, MatchError> {
        let len = chain.links.len();
        let mut exchanges = Vec::with_capacity(len);
        for (index, link) in chain.links.iter().enumerate() {
            let next = &chain.links[(index + 1) % len];
            let initiator_offer = self.board.offer(link.gives_offer)?;
            let responder_offer = self.board.offer(next.gives_offer)?;
            let mut exchange = Exchange::with_allocation(
                &initiator_offer,
                &responder_offer,
                link.hours_given,
                link.hours_received,
                ExchangeType::SkillForSkill,
                format!("Link {} of chain \"{}\"", link.position, chain.name),
            )?;
            // Chain links arrive pre-agreed; the exchange skips the pending
            // entry entirely.
            exchange.status = ExchangeStatus::Accepted;
            exchange.accepted_at = Some(Utc::now());
            exchanges.push(exchange);
        }
        Ok(exchanges)
    }

    fn entry(&self, id: ChainId) -> Result<Arc<Mutex<ExchangeChain>>, MatchError> {
        self.chains
            .get(&id)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or(MatchError::ChainNotFound(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn link(user: UserId, position: usize, hours_given: Decimal) -> ChainLink {
        ChainLink {
            user_id: user,
            gives_offer: OfferId::new(),
            gives_skill: SkillId::new(),
            receives_skill: SkillId::new(),
            hours_given,
            hours_received: Decimal::ONE,
            position,
            status: LinkStatus::Pending,
        }
    }

    fn chain_with_links(links: Vec<ChainLink>) -> ExchangeChain {
        ExchangeChain {
            id: ChainId::new(),
            name: "test".to_string(),
            status: ChainStatus::Pending,
            created_by: links[0].user_id,
            links,
            created_at: Utc::now(),
            accepted_at: None,
        }
    }

    #[test]
    fn test_position_arithmetic_wraps() {
        let chain = chain_with_links(vec![
            link(UserId::new(), 0, Decimal::ONE),
            link(UserId::new(), 1, Decimal::ONE),
            link(UserId::new(), 2, Decimal::ONE),
        ]);
        assert_eq!(chain.next_position(2), 0);
        assert_eq!(chain.previous_position(0), 2);
        assert_eq!(chain.next_position(0), 1);
    }

    #[test]
    fn test_single_link_chain_is_trivially_fair() {
        let chain = chain_with_links(vec![link(UserId::new(), 0, Decimal::ONE)]);
        assert_eq!(chain.calculate_fairness(|_| Some(dec!(50))), dec!(100));
    }

    #[test]
    fn test_fairness_balanced_cycle_scores_100() {
        // Every given offer is also a received offer with matching hours,
        // so aggregate give and receive values coincide.
        let chain = chain_with_links(vec![
            link(UserId::new(), 0, Decimal::ONE),
            link(UserId::new(), 1, Decimal::ONE),
            link(UserId::new(), 2, Decimal::ONE),
        ]);
        let rates = [dec!(50), dec!(40), dec!(25)];
        let offers: Vec<OfferId> = chain.links.iter().map(|l| l.gives_offer).collect();
        let score = chain.calculate_fairness(|offer| {
            offers
                .iter()
                .position(|o| *o == offer)
                .map(|index| rates[index])
        });
        assert_eq!(score, dec!(100.0));
    }

    #[test]
    fn test_fairness_skewed_hours_score_below_100() {
        // First participant gives three hours but everyone still receives
        // one: total given outweighs total received.
        let users: Vec<UserId> = (0..3).map(|_| UserId::new()).collect();
        let chain = chain_with_links(vec![
            link(users[0], 0, dec!(3)),
            link(users[1], 1, Decimal::ONE),
            link(users[2], 2, Decimal::ONE),
        ]);
        let score = chain.calculate_fairness(|_| Some(dec!(30)));
        // given = 30*3 + 30 + 30 = 150, received = 30*3 = 90.
        assert_eq!(score, dec!(60.0));
    }

    #[test]
    fn test_fairness_hours_fallback_without_rates() {
        let chain = chain_with_links(vec![
            link(UserId::new(), 0, dec!(2)),
            link(UserId::new(), 1, dec!(2)),
        ]);
        // No offer can be priced: 4 hours given vs 2 received.
        assert_eq!(chain.calculate_fairness(|_| None), dec!(50.0));
    }
}

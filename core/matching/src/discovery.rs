// core/matching/src/discovery.rs

use crate::board::SkillBoard;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info};
use tradeloop_fairness::fairness_score;
use tradeloop_primitives::{OfferId, OfferedSkill, SkillId, UserId};

/// Score assigned to a discovered cycle when its rates cannot be priced.
pub const DISCOVERY_FALLBACK_SCORE: Decimal = dec!(95.0);

/// One participant's give/receive pair inside a discovered cycle.
///
/// Participants are listed in cyclic order; each receives the skill given
/// by the next participant (modulo the cycle length).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChainParticipant {
    pub user_id: UserId,
    pub display_name: String,
    pub gives_skill: SkillId,
    pub gives_offer: OfferId,
    pub receives_skill: SkillId,
    pub hourly_rate: Decimal,
}

/// A discovered closed cycle of offers and needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChainProposal {
    pub participants: Vec<ChainParticipant>,
    /// Human-readable cycle, e.g. "ana → ben → cy → ana".
    pub summary: String,
    pub fairness_score: Decimal,
}

/// Advisory fallback when no cycle closes but the user both offers and
/// needs something.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HourPoolSuggestion {
    pub user_id: UserId,
    pub message: String,
}

/// What a discovery run produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ChainSuggestion {
    Cycle(ChainProposal),
    HourPool(HourPoolSuggestion),
}

/// Depth-3 cycle search over the offer/need graph.
#[derive(Debug)]
pub struct ChainDiscovery {
    board: Arc<SkillBoard>,
}

impl ChainDiscovery {
    pub fn new(board: Arc<SkillBoard>) -> Self {
        Self { board }
    }

    /// Find three-party broker cycles for `user`: a provider p for one of
    /// the user's needs, a provider q for one of p's needs, and an unmet
    /// need of q's that one of the user's own offers satisfies.
    ///
    /// Trivial two-cycles are excluded by skipping p's need for the skill
    /// p itself just supplied. If nothing closes and the user has at least
    /// one active offer and need, a single advisory hour-pool suggestion
    /// is emitted instead.
    pub async fn discover(&self, user: UserId) -> Vec<ChainSuggestion> {
        let my_needs = self.board.active_needs_of(user);
        let my_offers = self.board.active_offers_of(user);

        let mut proposals = Vec::new();
        let mut seen: HashSet<(OfferId, OfferId, OfferId)> = HashSet::new();

        for need in &my_needs {
            for p_offer in self.board.active_offers_for_skill(need.skill_id, &[user]) {
                let p = p_offer.user_id;
                for p_need in self.board.active_needs_of(p) {
                    if p_need.skill_id == need.skill_id {
                        continue;
                    }
                    for q_offer in self
                        .board
                        .active_offers_for_skill(p_need.skill_id, &[user, p])
                    {
                        let q = q_offer.user_id;
                        for my_offer in &my_offers {
                            if !self.board.has_active_need(q, my_offer.skill_id) {
                                continue;
                            }
                            if seen.insert((my_offer.id, p_offer.id, q_offer.id)) {
                                proposals.push(self.build_proposal(my_offer, &p_offer, &q_offer));
                            }
                        }
                    }
                }
            }
        }

        if proposals.is_empty() {
            if !my_offers.is_empty() && !my_needs.is_empty() {
                debug!(user = %user, "No cycle found, suggesting hour pool");
                return vec![ChainSuggestion::HourPool(HourPoolSuggestion {
                    user_id: user,
                    message: "No three-way chain closes right now. Consider banking \
                              your hours in the community pool and drawing them back \
                              out when a provider appears."
                        .to_string(),
                })];
            }
            return Vec::new();
        }

        info!(user = %user, cycles = proposals.len(), "Chain discovery finished");
        proposals.into_iter().map(ChainSuggestion::Cycle).collect()
    }

    /// Assemble the cycle U -> p -> q -> U. Each participant receives the
    /// skill given by the next one.
    fn build_proposal(
        &self,
        my_offer: &OfferedSkill,
        p_offer: &OfferedSkill,
        q_offer: &OfferedSkill,
    ) -> ChainProposal {
        let participants: Vec<ChainParticipant> = [
            (my_offer, p_offer.skill_id),
            (p_offer, q_offer.skill_id),
            (q_offer, my_offer.skill_id),
        ]
        .into_iter()
        .map(|(offer, receives_skill)| ChainParticipant {
            user_id: offer.user_id,
            display_name: self.board.display_name(offer.user_id),
            gives_skill: offer.skill_id,
            gives_offer: offer.id,
            receives_skill,
            hourly_rate: offer.hourly_rate_equivalent,
        })
        .collect();

        let summary = format!(
            "{} → {} → {} → {}",
            participants[0].display_name,
            participants[1].display_name,
            participants[2].display_name,
            participants[0].display_name,
        );

        ChainProposal {
            fairness_score: Self::score(&participants),
            summary,
            participants,
        }
    }

    /// Discovery-time fairness: the weakest pairwise value match around
    /// the loop at one nominal hour per link. Unpriceable rates fall back
    /// to the legacy flat placeholder.
    fn score(participants: &[ChainParticipant]) -> Decimal {
        if participants
            .iter()
            .any(|p| p.hourly_rate <= Decimal::ZERO)
        {
            return DISCOVERY_FALLBACK_SCORE;
        }
        participants
            .iter()
            .enumerate()
            .map(|(index, giver)| {
                let receiver = &participants[(index + 1) % participants.len()];
                fairness_score(
                    giver.hourly_rate,
                    Decimal::ONE,
                    receiver.hourly_rate,
                    Decimal::ONE,
                )
            })
            .min()
            .unwrap_or(DISCOVERY_FALLBACK_SCORE)
    }
}

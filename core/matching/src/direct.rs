// core/matching/src/direct.rs

use crate::board::SkillBoard;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;
use tradeloop_fairness::compute_ratio;
use tradeloop_primitives::{OfferedSkill, UserId};

/// Score weight per reciprocal value match with the same partner.
const VALUE_MATCH_WEIGHT: Decimal = dec!(10);

/// Base score a rate-proximity match is discounted from.
const RATE_MATCH_BASE: Decimal = dec!(100);

/// How many closest-rate pairings to keep per candidate partner.
const RATE_MATCHES_PER_PARTNER: usize = 3;

/// How a candidate match was derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchKind {
    /// Reciprocal offer/need pair: they need what I offer and offer what I
    /// need.
    ValueBased,
    /// Fallback: no reciprocal pair exists, but our advertised rates are
    /// close.
    RateBased,
}

/// One candidate bilateral match for the requesting user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchCandidate {
    pub partner: UserId,
    pub partner_name: String,
    pub kind: MatchKind,
    pub my_offer: OfferedSkill,
    pub their_offer: OfferedSkill,
    /// Human-readable summary, e.g. "1 hr of Design = 1.25 hrs of Coding".
    pub ratio_summary: String,
    /// Absolute rate difference, for rate-proximity matches.
    pub rate_difference: Option<Decimal>,
    pub score: Decimal,
}

/// Bilateral match search over the board.
#[derive(Debug)]
pub struct DirectMatchFinder {
    board: Arc<SkillBoard>,
}

impl DirectMatchFinder {
    pub fn new(board: Arc<SkillBoard>) -> Self {
        Self { board }
    }

    /// Candidate matches for `user`, best first.
    ///
    /// The value-based pass looks for reciprocal offer/need pairs; only
    /// when it comes up empty does the rate-proximity fallback run. The
    /// final list is ordered by match score descending.
    pub async fn find_matches(&self, user: UserId) -> Vec<MatchCandidate> {
        let mut candidates = self.value_based(user);
        if candidates.is_empty() {
            candidates = self.rate_based(user);
        }
        candidates.sort_by(|a, b| b.score.cmp(&a.score));
        debug!(user = %user, count = candidates.len(), "Direct match search finished");
        candidates
    }

    fn value_based(&self, user: UserId) -> Vec<MatchCandidate> {
        let my_offers = self.board.active_offers_of(user);
        let my_needs = self.board.active_needs_of(user);

        let mut per_partner: HashMap<UserId, Vec<(OfferedSkill, OfferedSkill)>> = HashMap::new();
        for my_offer in &my_offers {
            for partner in self.board.users_needing(my_offer.skill_id, &[user]) {
                for their_offer in self.board.active_offers_of(partner) {
                    let reciprocal = my_needs
                        .iter()
                        .any(|need| need.skill_id == their_offer.skill_id);
                    if reciprocal {
                        per_partner
                            .entry(partner)
                            .or_default()
                            .push((my_offer.clone(), their_offer));
                    }
                }
            }
        }

        let mut candidates = Vec::new();
        for (partner, pairs) in per_partner {
            let score = VALUE_MATCH_WEIGHT * Decimal::from(pairs.len());
            let partner_name = self.board.display_name(partner);
            for (my_offer, their_offer) in pairs {
                let ratio_summary = self.ratio_summary(&my_offer, &their_offer);
                candidates.push(MatchCandidate {
                    partner,
                    partner_name: partner_name.clone(),
                    kind: MatchKind::ValueBased,
                    my_offer,
                    their_offer,
                    ratio_summary,
                    rate_difference: None,
                    score,
                });
            }
        }
        candidates
    }

    fn rate_based(&self, user: UserId) -> Vec<MatchCandidate> {
        let my_offers = self.board.active_offers_of(user);
        if my_offers.is_empty() {
            return Vec::new();
        }

        // Group every other user's active offers by owner.
        let mut per_partner: HashMap<UserId, Vec<(Decimal, OfferedSkill, OfferedSkill)>> =
            HashMap::new();
        for partner in self.board.browse_profiles("", None, None) {
            if partner.id == user {
                continue;
            }
            for their_offer in self.board.active_offers_of(partner.id) {
                for my_offer in &my_offers {
                    let diff = (my_offer.hourly_rate_equivalent
                        - their_offer.hourly_rate_equivalent)
                        .abs();
                    per_partner.entry(partner.id).or_default().push((
                        diff,
                        my_offer.clone(),
                        their_offer.clone(),
                    ));
                }
            }
        }

        let mut candidates = Vec::new();
        for (partner, mut pairs) in per_partner {
            pairs.sort_by(|a, b| a.0.cmp(&b.0));
            pairs.truncate(RATE_MATCHES_PER_PARTNER);
            let min_diff = pairs[0].0;
            let score = RATE_MATCH_BASE - min_diff;
            let partner_name = self.board.display_name(partner);
            for (diff, my_offer, their_offer) in pairs {
                let ratio_summary = self.ratio_summary(&my_offer, &their_offer);
                candidates.push(MatchCandidate {
                    partner,
                    partner_name: partner_name.clone(),
                    kind: MatchKind::RateBased,
                    my_offer,
                    their_offer,
                    ratio_summary,
                    rate_difference: Some(diff),
                    score,
                });
            }
        }
        candidates
    }

    /// "1 hr of X = R hrs of Y", with the pricier skill on the left.
    fn ratio_summary(&self, my_offer: &OfferedSkill, their_offer: &OfferedSkill) -> String {
        let mine = self
            .board
            .skill_name(my_offer.skill_id)
            .unwrap_or_else(|| "your skill".to_string());
        let theirs = self
            .board
            .skill_name(their_offer.skill_id)
            .unwrap_or_else(|| "their skill".to_string());

        let breakdown = compute_ratio(
            my_offer.hourly_rate_equivalent,
            their_offer.hourly_rate_equivalent,
        );
        if breakdown.degenerate {
            return format!("{mine} for {theirs} (rate unavailable)");
        }
        if breakdown.hours_a == Decimal::ONE {
            format!("1 hr of {mine} = {} hrs of {theirs}", breakdown.hours_b)
        } else {
            format!("1 hr of {theirs} = {} hrs of {mine}", breakdown.hours_a)
        }
    }
}

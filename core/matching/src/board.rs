// core/matching/src/board.rs

use crate::error::MatchError;
use dashmap::DashMap;
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{debug, info};
use tradeloop_primitives::{
    NeedId, NeededSkill, OfferId, OfferedSkill, Skill, SkillId, UserId, UserProfile,
    ValidationError,
};

/// Browse queries ignore name filters shorter than this.
pub const MIN_QUERY_LEN: usize = 3;

/// The shared offer/need adjacency store.
///
/// Both match finders and the chain engine answer their graph questions
/// against these records; an edge user X -> user Y exists when X actively
/// offers a skill Y actively needs. Queries are plain synchronous reads so
/// they can run inside chain critical sections.
#[derive(Debug, Default)]
pub struct SkillBoard {
    profiles: Arc<DashMap<UserId, UserProfile>>,
    skills: Arc<DashMap<SkillId, Skill>>,
    offers: Arc<DashMap<OfferId, OfferedSkill>>,
    needs: Arc<DashMap<NeedId, NeededSkill>>,
}

impl SkillBoard {
    pub fn new() -> Self {
        Self::default()
    }

    // ------------------------------------------------------------------
    // Registration
    // ------------------------------------------------------------------

    pub fn register_user(&self, profile: UserProfile) -> UserId {
        let id = profile.id;
        self.profiles.insert(id, profile);
        id
    }

    pub fn display_name(&self, user: UserId) -> String {
        self.profiles
            .get(&user)
            .map(|p| p.display_name.clone())
            .unwrap_or_else(|| "someone".to_string())
    }

    /// Register a skill, reusing an existing one with the same name.
    pub fn add_skill(&self, skill: Skill) -> SkillId {
        if let Some(existing) = self
            .skills
            .iter()
            .find(|entry| entry.value().name == skill.name)
        {
            return *existing.key();
        }
        let id = skill.id;
        self.skills.insert(id, skill);
        id
    }

    pub fn skill_name(&self, skill: SkillId) -> Option<String> {
        self.skills.get(&skill).map(|s| s.name.clone())
    }

    /// Publish an offered skill, upholding the one-active-per-(user, skill)
    /// invariant.
    pub fn publish_offer(&self, offer: OfferedSkill) -> Result<OfferId, MatchError> {
        if !self.profiles.contains_key(&offer.user_id) {
            return Err(MatchError::UnknownUser(offer.user_id));
        }
        if !self.skills.contains_key(&offer.skill_id) {
            return Err(MatchError::UnknownSkill(offer.skill_id));
        }
        if offer.hourly_rate_equivalent <= Decimal::ZERO {
            return Err(ValidationError::NonPositiveRate(offer.hourly_rate_equivalent).into());
        }
        if self.has_active_offer(offer.user_id, offer.skill_id) {
            return Err(ValidationError::DuplicateActiveOffer {
                user: offer.user_id,
                skill: offer.skill_id,
            }
            .into());
        }

        let id = offer.id;
        info!(
            user = %offer.user_id,
            skill = %offer.skill_id,
            rate = %offer.hourly_rate_equivalent,
            "Offer published"
        );
        self.offers.insert(id, offer);
        Ok(id)
    }

    /// Withdraw an offer. The record is deactivated, never removed, so
    /// snapshots in past exchanges keep resolving.
    pub fn withdraw_offer(&self, id: OfferId) -> Result<(), MatchError> {
        let mut offer = self.offers.get_mut(&id).ok_or(MatchError::OfferNotFound(id))?;
        offer.deactivate();
        debug!(offer = %id, "Offer withdrawn");
        Ok(())
    }

    pub fn publish_need(&self, need: NeededSkill) -> Result<NeedId, MatchError> {
        if !self.profiles.contains_key(&need.user_id) {
            return Err(MatchError::UnknownUser(need.user_id));
        }
        if !self.skills.contains_key(&need.skill_id) {
            return Err(MatchError::UnknownSkill(need.skill_id));
        }
        if let Some(ceiling) = need.max_hourly_rate {
            if ceiling <= Decimal::ZERO {
                return Err(ValidationError::NonPositiveRate(ceiling).into());
            }
        }
        if self.has_active_need(need.user_id, need.skill_id) {
            return Err(ValidationError::DuplicateActiveNeed {
                user: need.user_id,
                skill: need.skill_id,
            }
            .into());
        }

        let id = need.id;
        info!(user = %need.user_id, skill = %need.skill_id, "Need published");
        self.needs.insert(id, need);
        Ok(id)
    }

    pub fn withdraw_need(&self, id: NeedId) -> Result<(), MatchError> {
        let mut need = self.needs.get_mut(&id).ok_or(MatchError::NeedNotFound(id))?;
        need.deactivate();
        debug!(need = %id, "Need withdrawn");
        Ok(())
    }

    // ------------------------------------------------------------------
    // Adjacency queries
    // ------------------------------------------------------------------

    pub fn offer(&self, id: OfferId) -> Result<OfferedSkill, MatchError> {
        self.offers
            .get(&id)
            .map(|o| o.clone())
            .ok_or(MatchError::OfferNotFound(id))
    }

    pub fn active_offers_of(&self, user: UserId) -> Vec<OfferedSkill> {
        self.offers
            .iter()
            .filter(|entry| entry.value().user_id == user && entry.value().is_active)
            .map(|entry| entry.value().clone())
            .collect()
    }

    pub fn active_needs_of(&self, user: UserId) -> Vec<NeededSkill> {
        self.needs
            .iter()
            .filter(|entry| entry.value().user_id == user && entry.value().is_active)
            .map(|entry| entry.value().clone())
            .collect()
    }

    /// Active offers of `skill` from anyone not in `excluding`.
    pub fn active_offers_for_skill(
        &self,
        skill: SkillId,
        excluding: &[UserId],
    ) -> Vec<OfferedSkill> {
        self.offers
            .iter()
            .filter(|entry| {
                let offer = entry.value();
                offer.is_active && offer.skill_id == skill && !excluding.contains(&offer.user_id)
            })
            .map(|entry| entry.value().clone())
            .collect()
    }

    /// Users with an active need for `skill`, deduplicated.
    pub fn users_needing(&self, skill: SkillId, excluding: &[UserId]) -> Vec<UserId> {
        let mut users: Vec<UserId> = self
            .needs
            .iter()
            .filter(|entry| {
                let need = entry.value();
                need.is_active && need.skill_id == skill && !excluding.contains(&need.user_id)
            })
            .map(|entry| entry.value().user_id)
            .collect();
        users.sort();
        users.dedup();
        users
    }

    pub fn has_active_offer(&self, user: UserId, skill: SkillId) -> bool {
        self.offers.iter().any(|entry| {
            let offer = entry.value();
            offer.user_id == user && offer.skill_id == skill && offer.is_active
        })
    }

    pub fn has_active_need(&self, user: UserId, skill: SkillId) -> bool {
        self.needs.iter().any(|entry| {
            let need = entry.value();
            need.user_id == user && need.skill_id == skill && need.is_active
        })
    }

    // ------------------------------------------------------------------
    // Browse
    // ------------------------------------------------------------------

    /// Profile browse with an optional name query and offered/needed skill
    /// filters. The name filter only applies from [`MIN_QUERY_LEN`]
    /// characters; filters intersect.
    pub fn browse_profiles(
        &self,
        query: &str,
        offers_skill: Option<SkillId>,
        needs_skill: Option<SkillId>,
    ) -> Vec<UserProfile> {
        let query = query.trim().to_lowercase();
        let mut result: Vec<UserProfile> = self
            .profiles
            .iter()
            .map(|entry| entry.value().clone())
            .filter(|profile| {
                if query.len() >= MIN_QUERY_LEN
                    && !profile.display_name.to_lowercase().contains(&query)
                {
                    return false;
                }
                if let Some(skill) = offers_skill {
                    if !self.has_active_offer(profile.id, skill) {
                        return false;
                    }
                }
                if let Some(skill) = needs_skill {
                    if !self.has_active_need(profile.id, skill) {
                        return false;
                    }
                }
                true
            })
            .collect();
        result.sort_by(|a, b| a.display_name.cmp(&b.display_name));
        result
    }
}

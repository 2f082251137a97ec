// core/exchange/src/store.rs

use crate::error::ExchangeError;
use crate::events::{ExchangeEvent, ExchangeEventType};
use crate::state::ExchangeStatus;
use crate::types::{Exchange, ExchangeType};
use dashmap::DashMap;
use parking_lot::Mutex;
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{debug, info};
use tradeloop_primitives::{ExchangeId, OfferedSkill, UserId, ValidationError};

/// Concurrent store of exchanges.
///
/// Every exchange sits behind its own mutex: a recalculation overwrites the
/// rate/hour snapshot, so it must never interleave with a status transition
/// on the same exchange. Different exchanges proceed independently.
#[derive(Debug, Default)]
pub struct ExchangeStore {
    exchanges: Arc<DashMap<ExchangeId, Arc<Mutex<Exchange>>>>,
}

impl ExchangeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and create a pending exchange between two users.
    ///
    /// Each party's contributed offer must belong to that party and be
    /// active; the initiator may not propose to themselves. Returns the
    /// stored exchange and the `Proposed` event for the responder.
    pub async fn propose(
        &self,
        initiator: UserId,
        responder: UserId,
        initiator_offer: &OfferedSkill,
        responder_offer: &OfferedSkill,
        exchange_type: ExchangeType,
        terms: impl Into<String>,
    ) -> Result<(Exchange, ExchangeEvent), ExchangeError> {
        if initiator == responder {
            return Err(ValidationError::SelfExchange.into());
        }
        if initiator_offer.user_id != initiator {
            return Err(ValidationError::ForeignOffer {
                offer: initiator_offer.id,
                user: initiator,
            }
            .into());
        }
        if responder_offer.user_id != responder {
            return Err(ValidationError::ForeignOffer {
                offer: responder_offer.id,
                user: responder,
            }
            .into());
        }

        let exchange = Exchange::new(initiator_offer, responder_offer, exchange_type, terms)?;
        let event = exchange.event(ExchangeEventType::Proposed, initiator);

        info!(
            exchange_id = %exchange.id,
            initiator = %initiator,
            responder = %responder,
            ratio = %exchange.calculated_ratio,
            "Exchange proposed"
        );

        self.exchanges
            .insert(exchange.id, Arc::new(Mutex::new(exchange.clone())));
        Ok((exchange, event))
    }

    /// Insert an externally built exchange (e.g. one materialized from an
    /// accepted chain link). Synchronous so it can run inside a chain's
    /// critical section.
    pub fn insert(&self, exchange: Exchange) {
        debug!(exchange_id = %exchange.id, status = exchange.status.as_str(), "Exchange inserted");
        self.exchanges
            .insert(exchange.id, Arc::new(Mutex::new(exchange)));
    }

    /// Snapshot an exchange by id.
    pub async fn get(&self, id: ExchangeId) -> Result<Exchange, ExchangeError> {
        let entry = self.entry(id)?;
        let exchange = entry.lock();
        Ok(exchange.clone())
    }

    /// All exchanges a user participates in, newest first.
    pub async fn for_participant(&self, user: UserId) -> Vec<Exchange> {
        let mut result: Vec<Exchange> = self
            .exchanges
            .iter()
            .map(|entry| entry.value().lock().clone())
            .filter(|exchange| exchange.is_participant(user))
            .collect();
        result.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        result
    }

    /// Drive a status transition under the exchange's lock.
    pub async fn transition(
        &self,
        id: ExchangeId,
        actor: UserId,
        next: ExchangeStatus,
    ) -> Result<Option<ExchangeEvent>, ExchangeError> {
        let entry = self.entry(id)?;
        let mut exchange = entry.lock();
        let event = exchange.transition(actor, next)?;
        info!(
            exchange_id = %id,
            actor = %actor,
            status = exchange.status.as_str(),
            "Exchange transitioned"
        );
        Ok(event)
    }

    /// Record a participant's rating once the exchange is completed.
    pub async fn submit_rating(
        &self,
        id: ExchangeId,
        actor: UserId,
        rating: u8,
        feedback: Option<String>,
    ) -> Result<ExchangeEvent, ExchangeError> {
        let entry = self.entry(id)?;
        let mut exchange = entry.lock();
        let event = exchange.submit_rating(actor, rating, feedback)?;
        info!(exchange_id = %id, actor = %actor, rating, "Rating submitted");
        Ok(event)
    }

    /// Re-run the fairness computation with fresh rates, serialized against
    /// any concurrent status transition on the same exchange.
    pub async fn recalculate(
        &self,
        id: ExchangeId,
        initiator_rate: Decimal,
        responder_rate: Decimal,
    ) -> Result<Exchange, ExchangeError> {
        let entry = self.entry(id)?;
        let mut exchange = entry.lock();
        exchange.recalculate(initiator_rate, responder_rate);
        debug!(
            exchange_id = %id,
            ratio = %exchange.calculated_ratio,
            balanced = exchange.is_balanced,
            "Exchange recalculated"
        );
        Ok(exchange.clone())
    }

    pub fn len(&self) -> usize {
        self.exchanges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.exchanges.is_empty()
    }

    fn entry(&self, id: ExchangeId) -> Result<Arc<Mutex<Exchange>>, ExchangeError> {
        self.exchanges
            .get(&id)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or(ExchangeError::NotFound(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use tradeloop_primitives::SkillId;

    fn offer_for(user: UserId, rate: Decimal) -> OfferedSkill {
        OfferedSkill::new(user, SkillId::new(), "", "", rate)
    }

    #[tokio::test]
    async fn test_propose_and_get() {
        let store = ExchangeStore::new();
        let alice = UserId::new();
        let bob = UserId::new();
        let (exchange, event) = store
            .propose(
                alice,
                bob,
                &offer_for(alice, dec!(50)),
                &offer_for(bob, dec!(40)),
                ExchangeType::default(),
                "logo for website",
            )
            .await
            .unwrap();

        assert_eq!(event.event_type, ExchangeEventType::Proposed);
        assert_eq!(event.recipients, vec![bob]);
        let fetched = store.get(exchange.id).await.unwrap();
        assert_eq!(fetched.responder_hours_required, dec!(1.25));
    }

    #[tokio::test]
    async fn test_propose_rejects_foreign_offer() {
        let store = ExchangeStore::new();
        let alice = UserId::new();
        let bob = UserId::new();
        let mallory = UserId::new();
        let err = store
            .propose(
                alice,
                bob,
                &offer_for(mallory, dec!(50)),
                &offer_for(bob, dec!(40)),
                ExchangeType::default(),
                "",
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ExchangeError::Validation(ValidationError::ForeignOffer { .. })
        ));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_missing_exchange_is_not_found() {
        let store = ExchangeStore::new();
        let err = store.get(ExchangeId::new()).await.unwrap_err();
        assert!(matches!(err, ExchangeError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_recalculate_is_serialized_with_transitions() {
        let store = Arc::new(ExchangeStore::new());
        let alice = UserId::new();
        let bob = UserId::new();
        let (exchange, _) = store
            .propose(
                alice,
                bob,
                &offer_for(alice, dec!(50)),
                &offer_for(bob, dec!(40)),
                ExchangeType::default(),
                "",
            )
            .await
            .unwrap();
        let id = exchange.id;

        let recalc = {
            let store = Arc::clone(&store);
            tokio::spawn(async move { store.recalculate(id, dec!(60), dec!(30)).await })
        };
        let accept = {
            let store = Arc::clone(&store);
            tokio::spawn(
                async move { store.transition(id, bob, ExchangeStatus::Accepted).await },
            )
        };

        recalc.await.unwrap().unwrap();
        accept.await.unwrap().unwrap();

        let after = store.get(id).await.unwrap();
        assert_eq!(after.status, ExchangeStatus::Accepted);
        assert_eq!(after.calculated_ratio, dec!(2));
    }

    #[tokio::test]
    async fn test_for_participant_sorted_newest_first() {
        let store = ExchangeStore::new();
        let alice = UserId::new();
        let bob = UserId::new();
        let carol = UserId::new();
        for partner in [bob, carol] {
            store
                .propose(
                    alice,
                    partner,
                    &offer_for(alice, dec!(50)),
                    &offer_for(partner, dec!(40)),
                    ExchangeType::default(),
                    "",
                )
                .await
                .unwrap();
        }
        let mine = store.for_participant(alice).await;
        assert_eq!(mine.len(), 2);
        assert!(mine[0].created_at >= mine[1].created_at);
        assert_eq!(store.for_participant(carol).await.len(), 1);
    }
}

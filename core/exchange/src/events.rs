// core/exchange/src/events.rs

use crate::types::Exchange;
use serde::{Deserialize, Serialize};
use tradeloop_primitives::{ExchangeId, UserId};

/// What happened to an exchange, at the boundary with the notification
/// collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExchangeEventType {
    #[serde(rename = "exchange_proposed")]
    Proposed,
    #[serde(rename = "exchange_accepted")]
    Accepted,
    #[serde(rename = "exchange_rejected")]
    Rejected,
    #[serde(rename = "exchange_completed")]
    Completed,
    #[serde(rename = "exchange_cancelled")]
    Cancelled,
    #[serde(rename = "exchange_disputed")]
    Disputed,
    #[serde(rename = "rating_received")]
    RatingReceived,
}

impl ExchangeEventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExchangeEventType::Proposed => "exchange_proposed",
            ExchangeEventType::Accepted => "exchange_accepted",
            ExchangeEventType::Rejected => "exchange_rejected",
            ExchangeEventType::Completed => "exchange_completed",
            ExchangeEventType::Cancelled => "exchange_cancelled",
            ExchangeEventType::Disputed => "exchange_disputed",
            ExchangeEventType::RatingReceived => "rating_received",
        }
    }
}

/// Typed event descriptor returned by state transitions.
///
/// The engine decides who should hear about each event; delivery is the
/// notification collaborator's job. Transitions return these as values
/// instead of calling into a notifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExchangeEvent {
    pub event_type: ExchangeEventType,
    pub exchange_id: ExchangeId,
    pub actor: UserId,
    pub initiator: UserId,
    pub responder: UserId,
    pub recipients: Vec<UserId>,
}

impl Exchange {
    /// Build the event descriptor for `event_type`, selecting recipients:
    /// a proposal goes to the responder, an acceptance to the initiator,
    /// a completion to both parties, and everything else to the actor's
    /// counterpart.
    pub fn event(&self, event_type: ExchangeEventType, actor: UserId) -> ExchangeEvent {
        let recipients = match event_type {
            ExchangeEventType::Proposed => vec![self.responder],
            ExchangeEventType::Accepted => vec![self.initiator],
            ExchangeEventType::Completed => vec![self.initiator, self.responder],
            ExchangeEventType::Rejected
            | ExchangeEventType::Cancelled
            | ExchangeEventType::Disputed
            | ExchangeEventType::RatingReceived => {
                self.other_party(actor).map(|u| vec![u]).unwrap_or_default()
            }
        };

        ExchangeEvent {
            event_type,
            exchange_id: self.id,
            actor,
            initiator: self.initiator,
            responder: self.responder,
            recipients,
        }
    }
}

// core/exchange/src/state.rs

use crate::error::ExchangeError;
use crate::events::{ExchangeEvent, ExchangeEventType};
use crate::types::Exchange;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tradeloop_primitives::{UserId, ValidationError};

/// Lifecycle of a bilateral exchange.
///
/// `Cancelled` and `Disputed` are reachable from any non-terminal state;
/// `Completed`, `Cancelled` and `Disputed` are terminal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExchangeStatus {
    #[default]
    Pending,
    UnderReview,
    Negotiating,
    Accepted,
    InProgress,
    Completed,
    Cancelled,
    Disputed,
}

impl ExchangeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExchangeStatus::Pending => "pending",
            ExchangeStatus::UnderReview => "under_review",
            ExchangeStatus::Negotiating => "negotiating",
            ExchangeStatus::Accepted => "accepted",
            ExchangeStatus::InProgress => "in_progress",
            ExchangeStatus::Completed => "completed",
            ExchangeStatus::Cancelled => "cancelled",
            ExchangeStatus::Disputed => "disputed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ExchangeStatus::Completed | ExchangeStatus::Cancelled | ExchangeStatus::Disputed
        )
    }

    /// Whether the state machine permits moving from `self` to `next`.
    pub fn can_transition_to(self, next: ExchangeStatus) -> bool {
        use ExchangeStatus::*;

        if self.is_terminal() || self == next {
            return false;
        }
        if matches!(next, Cancelled | Disputed) {
            return true;
        }
        matches!(
            (self, next),
            (Pending, UnderReview)
                | (Pending, Negotiating)
                | (Pending, Accepted)
                | (UnderReview, Negotiating)
                | (UnderReview, Accepted)
                | (Negotiating, UnderReview)
                | (Negotiating, Accepted)
                | (Accepted, InProgress)
                | (InProgress, Completed)
        )
    }
}

impl Exchange {
    /// Drive the exchange to `next`, stamping lifecycle timestamps and
    /// returning the notification event the transition produces, if any.
    ///
    /// Only the initiator or responder may transition; anyone else gets an
    /// authorization error, which is distinct from an invalid-transition
    /// state error.
    pub fn transition(
        &mut self,
        actor: UserId,
        next: ExchangeStatus,
    ) -> Result<Option<ExchangeEvent>, ExchangeError> {
        if !self.is_participant(actor) {
            return Err(ExchangeError::NotParticipant {
                exchange: self.id,
                user: actor,
            });
        }
        if !self.status.can_transition_to(next) {
            return Err(ExchangeError::InvalidTransition {
                from: self.status,
                to: next,
            });
        }

        let previous = self.status;
        let now = Utc::now();
        self.status = next;

        match next {
            // Stamped once; re-entry through renegotiation must not move it.
            ExchangeStatus::Accepted => {
                if self.accepted_at.is_none() {
                    self.accepted_at = Some(now);
                }
            }
            ExchangeStatus::InProgress => self.started_at = Some(now),
            ExchangeStatus::Completed => self.completed_at = Some(now),
            ExchangeStatus::Cancelled | ExchangeStatus::Disputed => self.closed_at = Some(now),
            _ => {}
        }

        let event_type = match next {
            ExchangeStatus::Accepted => Some(ExchangeEventType::Accepted),
            ExchangeStatus::Completed => Some(ExchangeEventType::Completed),
            // A responder declining a fresh proposal is a rejection; any
            // other cancellation is just a cancellation.
            ExchangeStatus::Cancelled
                if previous == ExchangeStatus::Pending && actor == self.responder =>
            {
                Some(ExchangeEventType::Rejected)
            }
            ExchangeStatus::Cancelled => Some(ExchangeEventType::Cancelled),
            ExchangeStatus::Disputed => Some(ExchangeEventType::Disputed),
            _ => None,
        };

        Ok(event_type.map(|event_type| self.event(event_type, actor)))
    }

    /// Record a 1-5 rating (and optional feedback) from one participant.
    ///
    /// Only allowed once the exchange is completed; a party that already
    /// rated is rejected based on the rating field itself.
    pub fn submit_rating(
        &mut self,
        actor: UserId,
        rating: u8,
        feedback: Option<String>,
    ) -> Result<ExchangeEvent, ExchangeError> {
        if !self.is_participant(actor) {
            return Err(ExchangeError::NotParticipant {
                exchange: self.id,
                user: actor,
            });
        }
        if self.status != ExchangeStatus::Completed {
            return Err(ExchangeError::NotRatable {
                status: self.status,
            });
        }
        if !(1..=5).contains(&rating) {
            return Err(ExchangeError::Validation(ValidationError::InvalidRating(
                rating,
            )));
        }

        let (rating_slot, feedback_slot) = if actor == self.initiator {
            (&mut self.initiator_rating, &mut self.initiator_feedback)
        } else {
            (&mut self.responder_rating, &mut self.responder_feedback)
        };
        if rating_slot.is_some() {
            return Err(ExchangeError::AlreadyRated {
                exchange: self.id,
                user: actor,
            });
        }
        *rating_slot = Some(rating);
        *feedback_slot = feedback;

        Ok(self.event(ExchangeEventType::RatingReceived, actor))
    }
}

// core/exchange/src/notify.rs

use crate::events::{ExchangeEvent, ExchangeEventType};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;
use tradeloop_primitives::{NotificationId, UserId};

/// A rendered, per-recipient notification record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub id: NotificationId,
    pub user_id: UserId,
    pub event_type: ExchangeEventType,
    pub exchange_id: tradeloop_primitives::ExchangeId,
    pub title: String,
    pub message: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
    pub read_at: Option<DateTime<Utc>>,
}

/// In-memory notification log.
///
/// The engine only decides who hears what and renders the wording; the
/// delivery transport consumes these records elsewhere.
#[derive(Debug, Default)]
pub struct NotificationCenter {
    notifications: Arc<DashMap<NotificationId, Notification>>,
}

impl NotificationCenter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fan an event out to its recipients, one stored notification each.
    ///
    /// `resolve_name` maps a user id to a display name for the message
    /// wording; each recipient's message names their counterpart in the
    /// exchange.
    pub async fn publish<F>(&self, event: &ExchangeEvent, resolve_name: F) -> Vec<Notification>
    where
        F: Fn(UserId) -> String,
    {
        let mut published = Vec::with_capacity(event.recipients.len());
        for recipient in &event.recipients {
            let counterpart = if *recipient == event.initiator {
                event.responder
            } else {
                event.initiator
            };
            let (title, message) = render(event, resolve_name(counterpart));
            let notification = Notification {
                id: NotificationId::new(),
                user_id: *recipient,
                event_type: event.event_type,
                exchange_id: event.exchange_id,
                title,
                message,
                is_read: false,
                created_at: Utc::now(),
                read_at: None,
            };
            debug!(
                user = %recipient,
                event = event.event_type.as_str(),
                "Notification recorded"
            );
            self.notifications
                .insert(notification.id, notification.clone());
            published.push(notification);
        }
        published
    }

    /// Count of unread notifications for a user.
    pub async fn unread_count(&self, user: UserId) -> usize {
        self.notifications
            .iter()
            .filter(|entry| entry.value().user_id == user && !entry.value().is_read)
            .count()
    }

    /// A user's most recent notifications, newest first.
    pub async fn recent(&self, user: UserId, limit: usize) -> Vec<Notification> {
        let mut mine: Vec<Notification> = self
            .notifications
            .iter()
            .filter(|entry| entry.value().user_id == user)
            .map(|entry| entry.value().clone())
            .collect();
        mine.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        mine.truncate(limit);
        mine
    }

    /// Mark everything unread for a user as read. Returns how many changed.
    pub async fn mark_all_read(&self, user: UserId) -> usize {
        let now = Utc::now();
        let mut updated = 0;
        for mut entry in self.notifications.iter_mut() {
            let notification = entry.value_mut();
            if notification.user_id == user && !notification.is_read {
                notification.is_read = true;
                notification.read_at = Some(now);
                updated += 1;
            }
        }
        updated
    }
}

/// Wording per event type. Unrecognized combinations fall back to a generic
/// notification rather than failing.
fn render(event: &ExchangeEvent, counterpart: String) -> (String, String) {
    match event.event_type {
        ExchangeEventType::Proposed => (
            "New Exchange Proposal".to_string(),
            format!("{counterpart} has proposed an exchange with you!"),
        ),
        ExchangeEventType::Accepted => (
            "Exchange Accepted".to_string(),
            format!("{counterpart} has accepted your exchange proposal!"),
        ),
        ExchangeEventType::Rejected => (
            "Exchange Rejected".to_string(),
            format!("{counterpart} has declined your exchange proposal."),
        ),
        ExchangeEventType::Cancelled => (
            "Exchange Cancelled".to_string(),
            format!("Exchange {} has been cancelled.", event.exchange_id),
        ),
        ExchangeEventType::Completed => (
            "Exchange Completed".to_string(),
            format!("Your exchange with {counterpart} has been completed!"),
        ),
        ExchangeEventType::RatingReceived => (
            "New Rating Received".to_string(),
            format!("You received a rating from {counterpart}!"),
        ),
        ExchangeEventType::Disputed => (
            "Notification".to_string(),
            "You have a new notification.".to_string(),
        ),
    }
}

// core/exchange/src/lib.rs

//! Tradeloop exchange lifecycle
//!
//! The bilateral barter aggregate: the [`Exchange`] entity with its
//! snapshotted fairness computation, the status state machine with
//! participant-only transitions, typed notification events emitted as
//! return values, and the concurrent store that serializes recalculation
//! against status updates per exchange.

pub mod error;
pub mod events;
pub mod notify;
pub mod state;
pub mod store;
pub mod types;

pub use error::ExchangeError;
pub use events::{ExchangeEvent, ExchangeEventType};
pub use notify::{Notification, NotificationCenter};
pub use state::ExchangeStatus;
pub use store::ExchangeStore;
pub use types::{Exchange, ExchangeType};

// core/primitives/src/ids.rs

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        pub struct $name(pub Uuid);

        impl $name {
            /// Generate a fresh random identifier.
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

entity_id!(
    /// Identifies a user across the engine.
    UserId
);
entity_id!(
    /// Identifies a named skill.
    SkillId
);
entity_id!(
    /// Identifies a category node in the taxonomy.
    CategoryId
);
entity_id!(
    /// Identifies an offered-skill record.
    OfferId
);
entity_id!(
    /// Identifies a needed-skill record.
    NeedId
);
entity_id!(
    /// Identifies a bilateral exchange.
    ExchangeId
);
entity_id!(
    /// Identifies a multi-party exchange chain.
    ChainId
);
entity_id!(
    /// Identifies a stored notification.
    NotificationId
);

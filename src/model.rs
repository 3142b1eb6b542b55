//! Core data model.
//!
//! A couple owns a set of timeline events (dated memories) and a shared
//! task list. Records come from the backend; everything derived from them
//! (orderings, buckets, rankings) lives in the engine modules.

pub mod couple;
pub mod event;
pub mod stats;
pub mod task;

pub use couple::{Couple, UserProfile};
pub use event::{EventPatch, GeoPoint, NewEvent, Rating, TimelineEvent};
pub use stats::{RankedEntry, Stats};
pub use task::{NewTask, Task, TaskPatch};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Identifiers
// ---------------------------------------------------------------------------

macro_rules! id_newtype {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = crate::error::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(s).map(Self).map_err(|e| {
                    crate::error::Error::Validation(format!(
                        "invalid {}: {e}",
                        stringify!($name)
                    ))
                })
            }
        }
    };
}

id_newtype!(
    /// Identifier of a timeline event.
    EventId
);
id_newtype!(
    /// Identifier of a shared task.
    TaskId
);
id_newtype!(
    /// Identifier of a couple (the owner of events and tasks).
    CoupleId
);
id_newtype!(
    /// Identifier of a user profile.
    UserId
);

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// The signed-in identity, passed explicitly to every operation that needs it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub user_id: UserId,
    pub couple_id: CoupleId,
}

impl Session {
    pub fn new(user_id: UserId, couple_id: CoupleId) -> Self {
        Self { user_id, couple_id }
    }
}

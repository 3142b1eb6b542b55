//! Couple and user profile records. Read-mostly from the engine's side.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::{CoupleId, UserId};

/// The pairing of two users that owns events and tasks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Couple {
    pub id: CoupleId,
    pub invite_code: String,
    pub first_met_date: Option<NaiveDate>,
    pub created_at: Option<DateTime<Utc>>,
}

impl Couple {
    /// Days together counted from the first-met day as day 1 ("D+N").
    ///
    /// `None` when no first-met date is set or it lies in the future.
    pub fn days_together(&self, today: NaiveDate) -> Option<i64> {
        let first = self.first_met_date?;
        let days = (today - first).num_days();
        (days >= 0).then_some(days + 1)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: UserId,
    pub nickname: Option<String>,
    pub profile_image_url: Option<String>,
    pub couple_id: Option<CoupleId>,
}

impl UserProfile {
    /// Name to show in the UI, falling back to a generic label.
    pub fn display_name(&self) -> &str {
        self.nickname
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or("Unknown")
    }
}

//! Aggregate statistics payload.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A value with its occurrence count, as produced by frequency ranking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankedEntry {
    pub value: String,
    pub count: usize,
}

/// Summary over a couple's whole event set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    pub total: usize,
    pub latest_event_date: Option<DateTime<Utc>>,
    /// Most-visited locations, most frequent first.
    pub top_locations: Vec<RankedEntry>,
    /// Most-used categories, most frequent first.
    pub top_categories: Vec<RankedEntry>,
}

impl Stats {
    pub fn top_location(&self) -> Option<&RankedEntry> {
        self.top_locations.first()
    }

    pub fn top_category(&self) -> Option<&RankedEntry> {
        self.top_categories.first()
    }
}

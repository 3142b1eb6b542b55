//! Frequency-ranked summaries over a couple's events.
//!
//! Recomputed from scratch on every call; a couple's event set is small.

use std::collections::HashMap;

use crate::model::{RankedEntry, Stats, TimelineEvent};

/// Count exact (case-sensitive) occurrences and rank by count, descending.
///
/// Equal counts keep first-seen order: the value that appeared earlier in
/// the input ranks higher.
pub fn rank_by_frequency<'a, I>(values: I) -> Vec<RankedEntry>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut slots: HashMap<&'a str, usize> = HashMap::new();
    let mut ranked: Vec<(&'a str, usize)> = Vec::new();
    for value in values {
        match slots.get(value) {
            Some(&slot) => ranked[slot].1 += 1,
            None => {
                slots.insert(value, ranked.len());
                ranked.push((value, 1));
            }
        }
    }

    // Stable: ties stay in first-seen order.
    ranked.sort_by(|a, b| b.1.cmp(&a.1));
    ranked
        .into_iter()
        .map(|(value, count)| RankedEntry {
            value: value.to_string(),
            count,
        })
        .collect()
}

/// Build the stats payload, keeping at most `top_k` entries per ranking.
pub fn compute_stats(events: &[TimelineEvent], top_k: usize) -> Stats {
    let locations = events
        .iter()
        .filter_map(|e| e.location.as_deref())
        .filter(|l| !l.trim().is_empty());
    let categories = events
        .iter()
        .filter_map(|e| e.category.as_deref())
        .filter(|c| !c.is_empty());

    let mut top_locations = rank_by_frequency(locations);
    top_locations.truncate(top_k);
    let mut top_categories = rank_by_frequency(categories);
    top_categories.truncate(top_k);

    Stats {
        total: events.len(),
        latest_event_date: events.iter().map(|e| e.event_date).max(),
        top_locations,
        top_categories,
    }
}

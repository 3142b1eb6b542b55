mod common;

use common::{day, event, session};
use tandem_rs::stats::{compute_stats, rank_by_frequency};

#[test]
fn most_frequent_location_wins() {
    let s = session();
    let events: Vec<_> = ["Cafe A", "Cafe A", "Cafe B"]
        .into_iter()
        .enumerate()
        .map(|(i, location)| {
            let mut e = event(&s, day(2024, 1, i as u32 + 1));
            e.location = Some(location.to_string());
            e
        })
        .collect();

    let stats = compute_stats(&events, 5);
    assert_eq!(stats.total, 3);
    let top = stats.top_location().unwrap();
    assert_eq!(top.value, "Cafe A");
    assert_eq!(top.count, 2);
    assert_eq!(stats.top_locations.len(), 2);
    assert_eq!(stats.latest_event_date, Some(day(2024, 1, 3)));
}

#[test]
fn equal_counts_keep_first_seen_order() {
    let ranked = rank_by_frequency(["park", "cafe", "cafe", "park", "museum"]);
    let values: Vec<_> = ranked.iter().map(|r| r.value.as_str()).collect();
    assert_eq!(values, ["park", "cafe", "museum"]);
    assert_eq!(ranked[0].count, 2);
    assert_eq!(ranked[1].count, 2);
}

#[test]
fn matching_is_exact_and_case_sensitive() {
    let ranked = rank_by_frequency(["Cafe", "cafe", "Cafe "]);
    assert_eq!(ranked.len(), 3);
    assert!(ranked.iter().all(|r| r.count == 1));
}

#[test]
fn blank_locations_and_missing_categories_are_not_counted() {
    let s = session();
    let mut a = event(&s, day(2024, 1, 1));
    a.location = Some("   ".to_string());
    a.category = Some("cafe".to_string());
    let mut b = event(&s, day(2024, 1, 2));
    b.category = Some("cafe".to_string());
    let c = event(&s, day(2024, 1, 3));

    let stats = compute_stats(&[a, b, c], 5);
    assert_eq!(stats.total, 3);
    assert!(stats.top_locations.is_empty());
    assert_eq!(stats.top_category().unwrap().value, "cafe");
    assert_eq!(stats.top_category().unwrap().count, 2);
}

#[test]
fn rankings_are_truncated_to_top_k() {
    let s = session();
    let events: Vec<_> = (0..10)
        .map(|i| {
            let mut e = event(&s, day(2024, 1, i + 1));
            e.location = Some(format!("place {i}"));
            e
        })
        .collect();
    assert_eq!(compute_stats(&events, 3).top_locations.len(), 3);
}

#[test]
fn empty_event_set() {
    let stats = compute_stats(&[], 5);
    assert_eq!(stats.total, 0);
    assert!(stats.top_location().is_none());
    assert!(stats.latest_event_date.is_none());
}

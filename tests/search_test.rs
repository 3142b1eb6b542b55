mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{day, event, session};
use tandem_rs::category::CategoryCatalog;
use tandem_rs::model::{Session, TimelineEvent};
use tandem_rs::search::{DEFAULT_DEBOUNCE, SearchSession, SearchState, search_events};

fn fixture(s: &Session) -> Vec<TimelineEvent> {
    let mut cafe = event(s, day(2024, 1, 10));
    cafe.location = Some("Blue Bottle Cafe".to_string());
    cafe.category = Some("cafe".to_string());

    let mut park = event(s, day(2024, 2, 1));
    park.description = Some("Picnic by the river".to_string());
    park.keywords = Some(vec!["sunny".to_string(), "Caffeine".to_string()]);

    let mut dinner = event(s, day(2024, 1, 20));
    dinner.description = Some("Anniversary dinner".to_string());
    dinner.category = Some("restaurant".to_string());

    vec![cafe, park, dinner]
}

#[test]
fn blank_query_is_idle_not_empty_results() {
    let s = session();
    let catalog = CategoryCatalog::builtin();
    let events = fixture(&s);

    assert_eq!(search_events(&events, "", &catalog), SearchState::Idle);
    assert_eq!(search_events(&events, "   ", &catalog), SearchState::Idle);

    let none = search_events(&events, "zzz", &catalog);
    assert_eq!(
        none,
        SearchState::Results {
            query: "zzz".to_string(),
            events: vec![]
        }
    );
    assert!(none.events().is_empty());
}

#[test]
fn matches_are_case_insensitive_and_newest_first() {
    let s = session();
    let catalog = CategoryCatalog::builtin();
    let events = fixture(&s);

    let state = search_events(&events, "CAF", &catalog);
    let days: Vec<_> = state.events().iter().map(|e| e.day().to_string()).collect();
    // keyword "Caffeine" (Feb) before location "Blue Bottle Cafe" (Jan)
    assert_eq!(days, ["2024-02-01", "2024-01-10"]);
}

#[test]
fn category_label_is_searchable() {
    let s = session();
    let catalog = CategoryCatalog::builtin();
    let events = fixture(&s);

    let label = catalog.label_for("restaurant").unwrap().to_string();
    let state = search_events(&events, &label, &catalog);
    assert_eq!(state.events().len(), 1);
    assert_eq!(
        state.events()[0].description.as_deref(),
        Some("Anniversary dinner")
    );

    let by_id = search_events(&events, "restaurant", &catalog);
    assert_eq!(by_id.events().len(), 1);
}

#[test]
fn description_and_keywords_are_searched() {
    let s = session();
    let catalog = CategoryCatalog::builtin();
    let events = fixture(&s);

    assert_eq!(search_events(&events, "river", &catalog).events().len(), 1);
    assert_eq!(search_events(&events, "sunny", &catalog).events().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn typing_burst_is_evaluated_once_for_the_final_query() {
    let s = session();
    let search = SearchSession::new(
        fixture(&s),
        Arc::new(CategoryCatalog::builtin()),
        DEFAULT_DEBOUNCE,
    );

    search.set_query("c");
    tokio::time::sleep(Duration::from_millis(100)).await;
    search.set_query("ca");
    tokio::time::sleep(Duration::from_millis(100)).await;
    search.set_query("caf");
    assert_eq!(
        search.state(),
        SearchState::Pending {
            query: "caf".to_string()
        }
    );

    tokio::time::sleep(Duration::from_millis(299)).await;
    assert_eq!(search.evaluations(), 0);

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(search.evaluations(), 1);
    match search.state() {
        SearchState::Results { query, events } => {
            assert_eq!(query, "caf");
            assert_eq!(events.len(), 2);
        }
        other => panic!("expected results, got {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn clearing_the_query_cancels_pending_evaluation() {
    let s = session();
    let search = SearchSession::new(
        fixture(&s),
        Arc::new(CategoryCatalog::builtin()),
        DEFAULT_DEBOUNCE,
    );

    search.set_query("river");
    tokio::time::sleep(Duration::from_millis(50)).await;
    search.set_query("  ");
    tokio::time::sleep(Duration::from_secs(1)).await;

    assert_eq!(search.evaluations(), 0);
    assert_eq!(search.state(), SearchState::Idle);
}

#[tokio::test(start_paused = true)]
async fn subscribers_see_results_and_reloads_rerun_the_query() {
    let s = session();
    let search = SearchSession::new(
        fixture(&s),
        Arc::new(CategoryCatalog::builtin()),
        DEFAULT_DEBOUNCE,
    );
    let mut rx = search.subscribe();

    search.set_query("dinner");
    tokio::time::sleep(Duration::from_millis(400)).await;
    rx.borrow_and_update();
    assert_eq!(search.state().events().len(), 1);

    let mut extra = event(&s, day(2024, 3, 3));
    extra.description = Some("Dinner with friends".to_string());
    let mut events = fixture(&s);
    events.push(extra);
    search.set_events(events);

    tokio::time::sleep(Duration::from_millis(400)).await;
    assert!(rx.has_changed().unwrap());
    let state = rx.borrow_and_update().clone();
    assert_eq!(state.events().len(), 2);
    assert_eq!(state.events()[0].day().to_string(), "2024-03-03");
    assert_eq!(search.evaluations(), 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn racing_query_changes_always_settle_on_results() {
    let s = session();
    let search = Arc::new(SearchSession::new(
        fixture(&s),
        Arc::new(CategoryCatalog::builtin()),
        Duration::from_millis(10),
    ));

    for _ in 0..30 {
        let (a, b) = (Arc::clone(&search), Arc::clone(&search));
        let first = tokio::spawn(async move { a.set_query("cafe") });
        let second = tokio::spawn(async move { b.set_query("dinner") });
        first.await.unwrap();
        second.await.unwrap();

        tokio::time::sleep(Duration::from_millis(80)).await;
        match search.state() {
            SearchState::Results { query, events } => {
                assert!(query == "cafe" || query == "dinner");
                assert!(!events.is_empty());
            }
            other => panic!("search stuck in {other:?}"),
        }
    }
}

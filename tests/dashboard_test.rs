mod common;

use chrono::NaiveDate;
use common::{at, day, event, session, task};
use tandem_rs::backend::{MemoryBackend, Op};
use tandem_rs::engine::{Dashboard, Leg, NoticeKind};
use tandem_rs::model::{Couple, Session};

fn seeded() -> (MemoryBackend, Session) {
    let s = session();
    let backend = MemoryBackend::new();
    backend.insert_couple(Couple {
        id: s.couple_id,
        invite_code: "LOVE42".to_string(),
        first_met_date: NaiveDate::from_ymd_opt(2023, 5, 1),
        created_at: None,
    });
    for (d, place) in [(1, "Cafe A"), (2, "Cafe A"), (3, "Cafe B")] {
        let mut e = event(&s, day(2024, 1, d));
        e.location = Some(place.to_string());
        backend.insert_event(e);
    }
    backend.insert_task(task(&s, "done", true, at(2024, 1, 2, 0, 0, 0)));
    backend.insert_task(task(&s, "open", false, at(2024, 1, 1, 0, 0, 0)));
    (backend, s)
}

#[tokio::test]
async fn all_legs_load() {
    let (backend, s) = seeded();

    let dashboard = Dashboard::load(&backend, &s, 3).await;

    assert!(dashboard.failures.is_empty());
    assert_eq!(dashboard.events.len(), 3);
    assert_eq!(dashboard.events[0].day().to_string(), "2024-01-03");
    assert_eq!(dashboard.couple.as_ref().unwrap().invite_code, "LOVE42");
    let stats = dashboard.stats.as_ref().unwrap();
    assert_eq!(stats.top_location().unwrap().value, "Cafe A");
    assert_eq!(dashboard.tasks[0].text, "open");
}

#[tokio::test]
async fn failing_stats_leg_does_not_block_events() {
    let (backend, s) = seeded();
    backend.fail_next(Op::GetStats);

    let dashboard = Dashboard::load(&backend, &s, 3).await;

    assert_eq!(dashboard.events.len(), 3);
    assert!(dashboard.couple.is_some());
    assert_eq!(dashboard.tasks.len(), 2);
    assert!(dashboard.stats.is_none());
    assert!(dashboard.failed(Leg::Stats));
    assert_eq!(dashboard.failures.len(), 1);
    assert_eq!(dashboard.failures[0].notice.kind, NoticeKind::Transient);
}

#[tokio::test]
async fn every_leg_is_attempted_even_when_several_fail() {
    let (backend, s) = seeded();
    backend.fail_next(Op::ListEvents);
    backend.fail_next(Op::GetCouple);

    let dashboard = Dashboard::load(&backend, &s, 3).await;

    assert!(dashboard.failed(Leg::Events));
    assert!(dashboard.failed(Leg::Couple));
    assert!(!dashboard.failed(Leg::Tasks));
    assert_eq!(backend.calls(Op::GetStats), 1);
    assert_eq!(backend.calls(Op::ListTasks), 1);
    assert!(dashboard.stats.is_some());
}

#[tokio::test]
async fn failed_refresh_keeps_previous_values() {
    let (backend, s) = seeded();
    let mut dashboard = Dashboard::load(&backend, &s, 3).await;
    let events_before = dashboard.events.clone();

    backend.fail_next(Op::ListEvents);
    backend.insert_event(event(&s, day(2024, 2, 1)));
    let all_ok = dashboard.refresh(&backend, &s, 3).await;

    assert!(!all_ok);
    assert_eq!(dashboard.events, events_before);
    assert_eq!(dashboard.stats.as_ref().unwrap().total, 4);

    assert!(dashboard.refresh(&backend, &s, 3).await);
    assert_eq!(dashboard.events.len(), 4);
    assert!(dashboard.failures.is_empty());
}

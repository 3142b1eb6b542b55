//! Fixtures shared by the integration tests.

#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use tandem_rs::model::{CoupleId, EventId, Session, Task, TaskId, TimelineEvent, UserId};

pub fn session() -> Session {
    Session::new(UserId::new(), CoupleId::new())
}

pub fn at(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, min, s).unwrap()
}

pub fn day(y: i32, m: u32, d: u32) -> DateTime<Utc> {
    at(y, m, d, 12, 0, 0)
}

pub fn event(session: &Session, event_date: DateTime<Utc>) -> TimelineEvent {
    TimelineEvent {
        id: EventId::new(),
        couple_id: session.couple_id,
        author_id: session.user_id,
        image_path: None,
        description: None,
        location: None,
        point: None,
        category: None,
        keywords: None,
        rating: None,
        event_date,
        created_at: None,
    }
}

pub fn photo(session: &Session, event_date: DateTime<Utc>) -> TimelineEvent {
    let mut e = event(session, event_date);
    e.image_path = Some(format!("{}/{}_test.jpg", session.couple_id, e.id));
    e
}

pub fn task(session: &Session, text: &str, completed: bool, created_at: DateTime<Utc>) -> Task {
    Task {
        id: TaskId::new(),
        couple_id: session.couple_id,
        text: text.to_string(),
        completed,
        created_at,
    }
}

//! Ordering and grouping of timeline events.
//!
//! Three views are derived from the same event snapshot:
//! - the reverse-chronological timeline (also used by search),
//! - month calendars with per-day marks and a selected day,
//! - gallery sections: image events bucketed by month and cut into rows.
//!
//! All month arithmetic is done in UTC on `event_date`.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, NaiveDate, TimeDelta, Utc};
use serde::Serialize;

use crate::error::{Error, Result};
use crate::model::TimelineEvent;

pub const DEFAULT_GALLERY_COLUMNS: usize = 3;

// ---------------------------------------------------------------------------
// Ordering
// ---------------------------------------------------------------------------

/// Newest `event_date` first; ties go to the newest `created_at`.
/// A missing `created_at` counts as the oldest possible instant.
pub fn compare_timeline(a: &TimelineEvent, b: &TimelineEvent) -> Ordering {
    b.event_date.cmp(&a.event_date).then_with(|| {
        let created_a = a.created_at.unwrap_or(DateTime::<Utc>::MIN_UTC);
        let created_b = b.created_at.unwrap_or(DateTime::<Utc>::MIN_UTC);
        created_b.cmp(&created_a)
    })
}

/// Sort in timeline order. Stable: fully tied events keep their input order.
pub fn sort_timeline(events: &mut [TimelineEvent]) {
    events.sort_by(compare_timeline);
}

pub fn sorted_timeline(events: &[TimelineEvent]) -> Vec<TimelineEvent> {
    let mut sorted = events.to_vec();
    sort_timeline(&mut sorted);
    sorted
}

// ---------------------------------------------------------------------------
// Months
// ---------------------------------------------------------------------------

/// A calendar month, displayed as "2024-1".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct MonthKey {
    pub year: i32,
    pub month: u32,
}

impl MonthKey {
    pub fn new(year: i32, month: u32) -> Result<Self> {
        if !(1..=12).contains(&month) {
            return Err(Error::Validation(format!("month must be 1-12, got {month}")));
        }
        Ok(Self { year, month })
    }

    pub fn of(date: DateTime<Utc>) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn first_day(&self) -> Result<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
            .ok_or_else(|| Error::Validation(format!("no such month: {self}")))
    }

    pub fn next(&self) -> Self {
        if self.month == 12 {
            Self {
                year: self.year + 1,
                month: 1,
            }
        } else {
            Self {
                year: self.year,
                month: self.month + 1,
            }
        }
    }

    /// First and last instant of the month, both inclusive.
    pub fn bounds(&self) -> Result<(DateTime<Utc>, DateTime<Utc>)> {
        let start = self.first_day()?.and_time(chrono::NaiveTime::MIN).and_utc();
        let next = self.next().first_day()?.and_time(chrono::NaiveTime::MIN).and_utc();
        Ok((start, next - TimeDelta::nanoseconds(1)))
    }

    /// Whether `date` falls in this month, in UTC.
    pub fn contains(&self, date: DateTime<Utc>) -> bool {
        Self::of(date) == *self
    }
}

impl std::fmt::Display for MonthKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.year, self.month)
    }
}

/// Events whose `event_date` falls inside the month (UTC).
pub fn events_in_month(events: &[TimelineEvent], month: MonthKey) -> Result<Vec<TimelineEvent>> {
    month.first_day()?;
    Ok(events
        .iter()
        .filter(|e| month.contains(e.event_date))
        .cloned()
        .collect())
}

// ---------------------------------------------------------------------------
// Calendar
// ---------------------------------------------------------------------------

/// Marking of one calendar day.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DayMark {
    pub has_events: bool,
    pub selected: bool,
}

/// One loaded month of the calendar plus the selected day.
///
/// Selecting another day never refetches: it only moves the selection
/// within the already-loaded events.
#[derive(Debug, Clone)]
pub struct MonthView {
    month: MonthKey,
    events: Vec<TimelineEvent>,
    selected: NaiveDate,
}

impl MonthView {
    /// Build from fetched events. Events outside the month are dropped.
    pub fn new(month: MonthKey, events: &[TimelineEvent], selected: NaiveDate) -> Result<Self> {
        let mut events = events_in_month(events, month)?;
        sort_timeline(&mut events);
        Ok(Self {
            month,
            events,
            selected,
        })
    }

    pub fn month(&self) -> MonthKey {
        self.month
    }

    pub fn events(&self) -> &[TimelineEvent] {
        &self.events
    }

    pub fn selected(&self) -> NaiveDate {
        self.selected
    }

    pub fn select(&mut self, day: NaiveDate) {
        self.selected = day;
    }

    /// Day marks keyed by `YYYY-MM-DD`. The selected day is always present.
    pub fn marks(&self) -> BTreeMap<String, DayMark> {
        let mut marks: BTreeMap<String, DayMark> = BTreeMap::new();
        for event in &self.events {
            marks.entry(day_key(event.day())).or_default().has_events = true;
        }
        marks.entry(day_key(self.selected)).or_default().selected = true;
        marks
    }

    /// Events on the selected day, in timeline order.
    pub fn selected_events(&self) -> Vec<&TimelineEvent> {
        self.events
            .iter()
            .filter(|e| e.day() == self.selected)
            .collect()
    }
}

pub fn day_key(day: NaiveDate) -> String {
    day.format("%Y-%m-%d").to_string()
}

// ---------------------------------------------------------------------------
// Gallery
// ---------------------------------------------------------------------------

/// One month of image events, cut into fixed-width rows.
#[derive(Debug, Clone, Serialize)]
pub struct GallerySection {
    pub key: MonthKey,
    pub columns: usize,
    pub rows: Vec<Vec<TimelineEvent>>,
}

impl GallerySection {
    pub fn len(&self) -> usize {
        self.rows.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Empty slots at the end of the last row.
    pub fn short_slots(&self) -> usize {
        self.rows
            .last()
            .map(|row| self.columns - row.len())
            .unwrap_or(0)
    }
}

/// Group image-bearing events by month, newest month first, `columns` per row.
/// The last row of a month may be partial; it is never merged into the next month.
pub fn gallery_sections(events: &[TimelineEvent], columns: usize) -> Vec<GallerySection> {
    let columns = columns.max(1);
    let mut with_images: Vec<TimelineEvent> =
        events.iter().filter(|e| e.has_image()).cloned().collect();
    sort_timeline(&mut with_images);

    let mut buckets: Vec<(MonthKey, Vec<TimelineEvent>)> = Vec::new();
    for event in with_images {
        let key = MonthKey::of(event.event_date);
        match buckets.last_mut() {
            Some((last, bucket)) if *last == key => bucket.push(event),
            _ => buckets.push((key, vec![event])),
        }
    }

    buckets
        .into_iter()
        .map(|(key, bucket)| GallerySection {
            key,
            columns,
            rows: bucket.chunks(columns).map(<[_]>::to_vec).collect(),
        })
        .collect()
}

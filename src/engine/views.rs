//! Fetch-then-derive helpers for the read-only screens.
//!
//! Each helper does one backend fetch and hands the snapshot to the pure
//! functions in [`crate::timeline`], [`crate::stats`] and [`crate::search`].
//! A failed fetch becomes a [`Notice`]; callers keep their previous view.

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;

use super::Notice;
use crate::backend::Backend;
use crate::category::CategoryCatalog;
use crate::model::{Session, Stats, TimelineEvent};
use crate::search::SearchSession;
use crate::timeline::{GallerySection, MonthKey, MonthView, gallery_sections, sort_timeline};

/// The full timeline, newest first.
pub async fn load_timeline(
    backend: &dyn Backend,
    session: &Session,
) -> Result<Vec<TimelineEvent>, Notice> {
    let mut events = backend.list_events(session.couple_id).await?;
    sort_timeline(&mut events);
    Ok(events)
}

/// One calendar month with `selected` as the selected day.
pub async fn load_month_view(
    backend: &dyn Backend,
    session: &Session,
    month: MonthKey,
    selected: NaiveDate,
) -> Result<MonthView, Notice> {
    let events = backend
        .list_events_in_month(session.couple_id, month.year, month.month)
        .await?;
    Ok(MonthView::new(month, &events, selected)?)
}

pub async fn load_gallery(
    backend: &dyn Backend,
    session: &Session,
    columns: usize,
) -> Result<Vec<GallerySection>, Notice> {
    let events = backend.list_events(session.couple_id).await?;
    Ok(gallery_sections(&events, columns))
}

pub async fn load_stats(
    backend: &dyn Backend,
    session: &Session,
    top_k: usize,
) -> Result<Stats, Notice> {
    Ok(backend.get_stats(session.couple_id, top_k).await?)
}

/// Start a search session over the couple's current events.
pub async fn open_search(
    backend: &dyn Backend,
    session: &Session,
    catalog: Arc<CategoryCatalog>,
    debounce: Duration,
) -> Result<SearchSession, Notice> {
    let events = backend.list_events(session.couple_id).await?;
    Ok(SearchSession::new(events, catalog, debounce))
}

//! Timeline event rows.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::{Db, expect_row};
use crate::error::{Error, Result};
use crate::model::*;
use crate::timeline::MonthKey;

const EVENT_COLUMNS: &str = "id, couple_id, author_id, image_path, description, location, latitude, longitude, category, keywords, rating, event_date, created_at";

impl Db {
    /// All events of a couple, newest `event_date` first.
    pub async fn list_events(&self, couple_id: CoupleId) -> Result<Vec<TimelineEvent>> {
        let rows: Vec<EventRow> = sqlx::query_as(&format!(
            "SELECT {EVENT_COLUMNS} FROM timeline_events
             WHERE couple_id = $1
             ORDER BY event_date DESC"
        ))
        .bind(couple_id.0)
        .fetch_all(self.pool())
        .await?;

        rows.into_iter().map(EventRow::try_into_event).collect()
    }

    /// Events inside `[first instant, last instant]` of the month.
    pub async fn list_events_in_month(
        &self,
        couple_id: CoupleId,
        month: MonthKey,
    ) -> Result<Vec<TimelineEvent>> {
        let (start, end) = month.bounds()?;
        let rows: Vec<EventRow> = sqlx::query_as(&format!(
            "SELECT {EVENT_COLUMNS} FROM timeline_events
             WHERE couple_id = $1 AND event_date >= $2 AND event_date <= $3
             ORDER BY event_date DESC"
        ))
        .bind(couple_id.0)
        .bind(start)
        .bind(end)
        .fetch_all(self.pool())
        .await?;

        rows.into_iter().map(EventRow::try_into_event).collect()
    }

    pub async fn get_event(&self, id: EventId) -> Result<TimelineEvent> {
        let row: Option<EventRow> = sqlx::query_as(&format!(
            "SELECT {EVENT_COLUMNS} FROM timeline_events WHERE id = $1"
        ))
        .bind(id.0)
        .fetch_optional(self.pool())
        .await?;

        row.ok_or_else(|| Error::NotFound(format!("event {id}")))?
            .try_into_event()
    }

    pub async fn create_event(&self, new: NewEvent) -> Result<TimelineEvent> {
        new.validate()?;
        let id = Uuid::new_v4();
        let row: EventRow = sqlx::query_as(&format!(
            "INSERT INTO timeline_events (id, couple_id, author_id, image_path, description, location, latitude, longitude, category, keywords, rating, event_date, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, now())
             RETURNING {EVENT_COLUMNS}"
        ))
        .bind(id)
        .bind(new.couple_id.0)
        .bind(new.author_id.0)
        .bind(&new.image_path)
        .bind(&new.description)
        .bind(&new.location)
        .bind(new.point.map(|p| p.latitude))
        .bind(new.point.map(|p| p.longitude))
        .bind(&new.category)
        .bind(&new.keywords)
        .bind(new.rating)
        .bind(new.event_date)
        .fetch_one(self.pool())
        .await?;

        row.try_into_event()
    }

    /// Apply a partial update. A new location label also replaces the point.
    pub async fn update_event(&self, id: EventId, patch: &EventPatch) -> Result<()> {
        patch.validate()?;
        let rows_affected = sqlx::query(
            "UPDATE timeline_events SET
                description = COALESCE($1, description),
                event_date  = COALESCE($2, event_date),
                location    = COALESCE($3::text, location),
                latitude    = CASE WHEN $3::text IS NULL THEN latitude ELSE $4::float8 END,
                longitude   = CASE WHEN $3::text IS NULL THEN longitude ELSE $5::float8 END,
                category    = COALESCE($6, category),
                keywords    = COALESCE($7, keywords),
                rating      = COALESCE($8, rating)
             WHERE id = $9",
        )
        .bind(&patch.description)
        .bind(patch.event_date)
        .bind(&patch.location)
        .bind(patch.point.map(|p| p.latitude))
        .bind(patch.point.map(|p| p.longitude))
        .bind(&patch.category)
        .bind(&patch.keywords)
        .bind(patch.rating)
        .bind(id.0)
        .execute(self.pool())
        .await?
        .rows_affected();

        expect_row(rows_affected, || format!("event {id}"))
    }

    pub async fn delete_event(&self, id: EventId) -> Result<()> {
        let rows_affected = sqlx::query("DELETE FROM timeline_events WHERE id = $1")
            .bind(id.0)
            .execute(self.pool())
            .await?
            .rows_affected();

        expect_row(rows_affected, || format!("event {id}"))
    }
}

/// Internal row type for sqlx::FromRow.
#[derive(sqlx::FromRow)]
struct EventRow {
    id: Uuid,
    couple_id: Uuid,
    author_id: Uuid,
    image_path: Option<String>,
    description: Option<String>,
    location: Option<String>,
    latitude: Option<f64>,
    longitude: Option<f64>,
    category: Option<String>,
    keywords: Option<Vec<String>>,
    rating: Option<f64>,
    event_date: DateTime<Utc>,
    created_at: Option<DateTime<Utc>>,
}

impl EventRow {
    fn try_into_event(self) -> Result<TimelineEvent> {
        let point = GeoPoint::from_parts(self.latitude, self.longitude)
            .map_err(|e| Error::InvalidRecord(format!("event {}: {e}", self.id)))?;
        let rating = self
            .rating
            .map(Rating::new)
            .transpose()
            .map_err(|e| Error::InvalidRecord(format!("event {}: {e}", self.id)))?;

        Ok(TimelineEvent {
            id: EventId(self.id),
            couple_id: CoupleId(self.couple_id),
            author_id: UserId(self.author_id),
            image_path: self.image_path,
            description: self.description,
            location: self.location,
            point,
            category: self.category,
            keywords: self.keywords,
            rating,
            event_date: self.event_date,
            created_at: self.created_at,
        })
    }
}

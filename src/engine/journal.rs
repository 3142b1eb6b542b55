//! Creating, editing and deleting memories.
//!
//! A new memory is two backend calls: upload the image, then insert the
//! record. A delete is also two calls in the other order: record first,
//! then image. Neither pair is transactional.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, NaiveDate, Utc};
use opentelemetry::KeyValue;
use tracing::{Instrument, info, info_span, warn};

use super::Notice;
use crate::backend::Backend;
use crate::error::{Error, Result};
use crate::model::{
    Couple, EventId, EventPatch, GeoPoint, NewEvent, Session, TimelineEvent, UserProfile,
};
use crate::telemetry::metrics;

/// Everything the "new memory" form collects.
#[derive(Debug, Clone, Default)]
pub struct MemoryDraft {
    /// Local photo to upload. Required.
    pub image: Option<PathBuf>,
    pub event_date: Option<DateTime<Utc>>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub point: Option<GeoPoint>,
    pub category: Option<String>,
    pub keywords: Vec<String>,
    pub rating: Option<f64>,
}

impl MemoryDraft {
    pub fn new(image: impl Into<PathBuf>) -> Self {
        Self {
            image: Some(image.into()),
            ..Self::default()
        }
    }

    /// Check the draft and build the record to insert, minus the image path.
    ///
    /// Blank text fields become `None`; keywords are trimmed and blanks dropped.
    pub fn prepare(&self, session: &Session, now: DateTime<Utc>) -> Result<NewEvent> {
        if self.image.is_none() {
            return Err(Error::Validation("a photo is required".to_string()));
        }
        if self.point.is_some() && non_blank(&self.location).is_none() {
            return Err(Error::Validation(
                "coordinates need a location label".to_string(),
            ));
        }

        let keywords: Vec<String> = self
            .keywords
            .iter()
            .map(|k| k.trim())
            .filter(|k| !k.is_empty())
            .map(str::to_string)
            .collect();

        let new = NewEvent {
            couple_id: session.couple_id,
            author_id: session.user_id,
            image_path: None,
            description: non_blank(&self.description),
            location: non_blank(&self.location),
            point: self.point,
            category: non_blank(&self.category),
            keywords: (!keywords.is_empty()).then_some(keywords),
            rating: self.rating,
            event_date: self.event_date.unwrap_or(now),
        };
        new.validate()?;
        Ok(new)
    }
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Memory operations for the signed-in user.
pub struct Journal {
    backend: Arc<dyn Backend>,
    session: Session,
}

impl Journal {
    pub fn new(backend: Arc<dyn Backend>, session: Session) -> Self {
        Self { backend, session }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Upload the draft's photo and insert the record.
    ///
    /// Validation happens before any backend call. If the insert fails after
    /// the upload succeeded, the uploaded image is removed on a best-effort basis.
    pub async fn record(&self, draft: &MemoryDraft) -> std::result::Result<TimelineEvent, Notice> {
        let new = draft.prepare(&self.session, Utc::now())?;
        let Some(image) = draft.image.as_deref() else {
            return Err(Error::Validation("a photo is required".to_string()).into());
        };

        let span = info_span!("journal.record", couple.id = %self.session.couple_id);
        let started = Instant::now();
        let event = self.upload_and_insert(new, image).instrument(span).await?;
        observe("journal.record", started);
        Ok(event)
    }

    async fn upload_and_insert(&self, mut new: NewEvent, image: &Path) -> Result<TimelineEvent> {
        let storage_path = self
            .backend
            .upload_image(self.session.couple_id, image)
            .await?;
        new.image_path = Some(storage_path.clone());

        match self.backend.create_event(new).await {
            Ok(event) => {
                info!(event.id = %event.id, path = %storage_path, "memory recorded");
                Ok(event)
            }
            Err(e) => {
                if let Err(cleanup) = self.backend.remove_image(&storage_path).await {
                    warn!(path = %storage_path, error = %cleanup, "uploaded image left behind");
                }
                Err(e)
            }
        }
    }

    /// Apply a partial update. Rejected locally when the patch is empty or invalid.
    pub async fn edit(&self, id: EventId, patch: EventPatch) -> std::result::Result<(), Notice> {
        patch.validate()?;
        let started = Instant::now();
        self.backend
            .update_event(id, patch)
            .instrument(info_span!("journal.edit", event.id = %id))
            .await?;
        observe("journal.edit", started);
        Ok(())
    }

    /// Delete the record, then its image.
    ///
    /// If the record is gone but the image removal fails, the result is a
    /// `PartialFailure` notice carrying the orphaned path.
    pub async fn delete(&self, event: &TimelineEvent) -> std::result::Result<(), Notice> {
        let span = info_span!("journal.delete", event.id = %event.id);
        let started = Instant::now();
        self.delete_record_and_image(event).instrument(span).await?;
        observe("journal.delete", started);
        Ok(())
    }

    async fn delete_record_and_image(&self, event: &TimelineEvent) -> Result<()> {
        self.backend.delete_event(event.id).await?;

        let Some(path) = event.image_path.as_deref().filter(|p| !p.is_empty()) else {
            info!("memory deleted");
            return Ok(());
        };
        if let Err(e) = self.backend.remove_image(path).await {
            warn!(path, error = %e, "event deleted but image removal failed");
            return Err(Error::OrphanedImage {
                event_id: event.id,
                path: path.to_string(),
                reason: e.to_string(),
            });
        }
        info!(path, "memory deleted");
        Ok(())
    }

    pub async fn event(&self, id: EventId) -> std::result::Result<TimelineEvent, Notice> {
        Ok(self.backend.get_event(id).await?)
    }

    pub async fn couple(&self) -> std::result::Result<Couple, Notice> {
        Ok(self.backend.get_couple(self.session.couple_id).await?)
    }

    pub async fn me(&self) -> std::result::Result<UserProfile, Notice> {
        Ok(self.backend.get_user(self.session.user_id).await?)
    }

    pub async fn partner(&self) -> std::result::Result<Option<UserProfile>, Notice> {
        Ok(self.backend.get_partner(&self.session).await?)
    }

    pub async fn set_first_met_date(&self, date: NaiveDate) -> std::result::Result<Couple, Notice> {
        if date > Utc::now().date_naive() {
            return Err(Error::Validation("first-met date is in the future".to_string()).into());
        }
        Ok(self
            .backend
            .update_first_met_date(self.session.couple_id, date)
            .await?)
    }
}

fn observe(operation: &'static str, started: Instant) {
    metrics::operation_duration_ms().record(
        started.elapsed().as_secs_f64() * 1000.0,
        &[KeyValue::new("operation", operation)],
    );
}

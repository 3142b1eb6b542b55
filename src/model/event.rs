//! Timeline event types.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::{CoupleId, EventId, Session, UserId};
use crate::error::{Error, Result};

/// One dated memory: photo, caption, place, rating and keywords.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineEvent {
    pub id: EventId,
    pub couple_id: CoupleId,
    pub author_id: UserId,

    /// Object-storage path of the attached photo.
    pub image_path: Option<String>,
    pub description: Option<String>,
    /// Human-readable place label.
    pub location: Option<String>,
    /// Resolved coordinates. Present only when a place was picked.
    pub point: Option<GeoPoint>,
    /// Category id from the place catalog (e.g. "cafe").
    pub category: Option<String>,
    /// May contain duplicates; use [`TimelineEvent::unique_keywords`].
    pub keywords: Option<Vec<String>>,
    pub rating: Option<Rating>,

    /// Date of the memory, chosen by the user.
    pub event_date: DateTime<Utc>,
    /// Insertion time assigned by the backend.
    pub created_at: Option<DateTime<Utc>>,
}

impl TimelineEvent {
    pub fn has_image(&self) -> bool {
        self.image_path.as_deref().is_some_and(|p| !p.is_empty())
    }

    /// Calendar day of `event_date`.
    pub fn day(&self) -> NaiveDate {
        self.event_date.date_naive()
    }

    /// Keywords with duplicates removed, first occurrence wins.
    pub fn unique_keywords(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();
        for keyword in self.keywords.iter().flatten() {
            let keyword = keyword.as_str();
            if !keyword.is_empty() && !seen.contains(&keyword) {
                seen.push(keyword);
            }
        }
        seen
    }
}

// ---------------------------------------------------------------------------
// GeoPoint
// ---------------------------------------------------------------------------

/// WGS84 latitude/longitude in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    pub const ORIGIN: GeoPoint = GeoPoint {
        latitude: 0.0,
        longitude: 0.0,
    };

    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Rebuild a point from two nullable columns. Both or neither must be set.
    pub fn from_parts(latitude: Option<f64>, longitude: Option<f64>) -> Result<Option<Self>> {
        match (latitude, longitude) {
            (Some(lat), Some(lon)) => Ok(Some(Self::new(lat, lon))),
            (None, None) => Ok(None),
            (lat, lon) => Err(Error::InvalidRecord(format!(
                "latitude and longitude must be set together (got {lat:?}, {lon:?})"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// Rating
// ---------------------------------------------------------------------------

/// A star rating in half steps, 0.5 through 5.0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Rating(u8);

impl Rating {
    pub const MIN: f64 = 0.5;
    pub const MAX: f64 = 5.0;

    pub fn new(value: f64) -> Result<Self> {
        let halves = value * 2.0;
        if !(Self::MIN..=Self::MAX).contains(&value) || halves.fract() != 0.0 {
            return Err(Error::Validation(format!(
                "rating must be a multiple of 0.5 between 0.5 and 5, got {value}"
            )));
        }
        Ok(Self(halves as u8))
    }

    pub fn value(self) -> f64 {
        f64::from(self.0) / 2.0
    }
}

impl TryFrom<f64> for Rating {
    type Error = Error;

    fn try_from(value: f64) -> Result<Self> {
        Self::new(value)
    }
}

impl From<Rating> for f64 {
    fn from(rating: Rating) -> f64 {
        rating.value()
    }
}

impl std::fmt::Display for Rating {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.1}", self.value())
    }
}

// ---------------------------------------------------------------------------
// Builders
// ---------------------------------------------------------------------------

/// Fields for inserting a new event. The backend assigns id and `created_at`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewEvent {
    pub couple_id: CoupleId,
    pub author_id: UserId,
    pub image_path: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub point: Option<GeoPoint>,
    pub category: Option<String>,
    pub keywords: Option<Vec<String>>,
    pub rating: Option<f64>,
    pub event_date: DateTime<Utc>,
}

impl NewEvent {
    pub fn new(session: &Session, event_date: DateTime<Utc>) -> Self {
        Self {
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
        }
    }

    pub fn image_path(mut self, path: impl Into<String>) -> Self {
        self.image_path = Some(path.into());
        self
    }

    pub fn description(mut self, text: impl Into<String>) -> Self {
        self.description = Some(text.into());
        self
    }

    /// Set the place label and, if it was resolved, its coordinates.
    pub fn location(mut self, label: impl Into<String>, point: Option<GeoPoint>) -> Self {
        self.location = Some(label.into());
        self.point = point;
        self
    }

    pub fn category(mut self, id: impl Into<String>) -> Self {
        self.category = Some(id.into());
        self
    }

    pub fn keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.keywords = Some(keywords.into_iter().map(Into::into).collect());
        self
    }

    pub fn rating(mut self, value: f64) -> Self {
        self.rating = Some(value);
        self
    }

    /// Check field-level invariants. Does not touch the backend.
    pub fn validate(&self) -> Result<()> {
        if let Some(value) = self.rating {
            Rating::new(value)?;
        }
        if let Some(ref keywords) = self.keywords {
            validate_keywords(keywords)?;
        }
        Ok(())
    }

    /// Materialize the record once the backend has assigned identity.
    pub fn into_event(self, id: EventId, created_at: DateTime<Utc>) -> Result<TimelineEvent> {
        let rating = self.rating.map(Rating::new).transpose()?;
        Ok(TimelineEvent {
            id,
            couple_id: self.couple_id,
            author_id: self.author_id,
            image_path: self.image_path,
            description: self.description,
            location: self.location,
            point: self.point,
            category: self.category,
            keywords: self.keywords,
            rating,
            event_date: self.event_date,
            created_at: Some(created_at),
        })
    }
}

/// Partial update of an event. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventPatch {
    pub description: Option<String>,
    pub event_date: Option<DateTime<Utc>>,
    pub location: Option<String>,
    pub point: Option<GeoPoint>,
    pub category: Option<String>,
    pub keywords: Option<Vec<String>>,
    pub rating: Option<f64>,
}

impl EventPatch {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    pub fn validate(&self) -> Result<()> {
        if self.is_empty() {
            return Err(Error::Validation("nothing to update".to_string()));
        }
        if self.point.is_some() && self.location.is_none() {
            return Err(Error::Validation(
                "coordinates can only change together with the location label".to_string(),
            ));
        }
        if let Some(value) = self.rating {
            Rating::new(value)?;
        }
        if let Some(ref keywords) = self.keywords {
            validate_keywords(keywords)?;
        }
        Ok(())
    }

    /// Apply the patch in place. A new location replaces the old point as well.
    pub fn apply_to(&self, event: &mut TimelineEvent) -> Result<()> {
        self.validate()?;
        if let Some(ref description) = self.description {
            event.description = Some(description.clone());
        }
        if let Some(date) = self.event_date {
            event.event_date = date;
        }
        if let Some(ref location) = self.location {
            event.location = Some(location.clone());
            event.point = self.point;
        }
        if let Some(ref category) = self.category {
            event.category = Some(category.clone());
        }
        if let Some(ref keywords) = self.keywords {
            event.keywords = Some(keywords.clone());
        }
        if let Some(value) = self.rating {
            event.rating = Some(Rating::new(value)?);
        }
        Ok(())
    }
}

fn validate_keywords(keywords: &[String]) -> Result<()> {
    if keywords.iter().any(|k| k.trim().is_empty()) {
        return Err(Error::Validation("keywords must not be empty".to_string()));
    }
    Ok(())
}

//! Error types for tandem-rs.

use thiserror::Error;

use crate::model::{EventId, TaskId};

#[derive(Debug, Error)]
pub enum Error {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("validation failed: {0}")]
    Validation(String),

    /// A persisted row violates a model invariant (e.g. latitude without longitude).
    #[error("invalid record: {0}")]
    InvalidRecord(String),

    /// The backend or another remote collaborator rejected or failed a call.
    #[error("remote failure: {0}")]
    Remote(String),

    /// The event record is gone but its stored image could not be removed.
    #[error("event {event_id} deleted but image {path} was not removed: {reason}")]
    OrphanedImage {
        event_id: EventId,
        path: String,
        reason: String,
    },

    #[error("task {0} already has a mutation in flight")]
    RowBusy(TaskId),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, Error>;

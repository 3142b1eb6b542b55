//! User-facing operations over the backend.
//!
//! - [`TaskBoard`]: shared task list with optimistic toggle/delete,
//! - [`Journal`]: create, edit and delete memories,
//! - [`Dashboard`]: concurrent fan-out fetch of the home screen,
//! - [`views`]: fetch-and-derive helpers for timeline, calendar, gallery and search.
//!
//! Every failure that reaches a caller here is a [`Notice`]: something the UI
//! can show and dismiss. Nothing in this module panics on remote errors.

pub mod dashboard;
pub mod journal;
pub mod tasks;
pub mod views;

pub use dashboard::{Dashboard, Leg, LegFailure};
pub use journal::{Journal, MemoryDraft};
pub use tasks::{RowState, TaskBoard, order_tasks};

use serde::Serialize;
use thiserror::Error;

use crate::error::Error;

/// Category of a user-visible failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeKind {
    /// Input rejected before any remote call.
    Validation,
    /// Network/backend failure; the action can be retried by the user.
    Transient,
    /// The record is gone but a related resource (image) could not be removed.
    PartialFailure,
    /// Another mutation on the same row has not finished yet.
    Busy,
    NotFound,
}

/// A dismissible message for the user.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[error("{message}")]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

impl Notice {
    pub fn new(kind: NoticeKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl From<Error> for Notice {
    fn from(error: Error) -> Self {
        let kind = match error {
            Error::Validation(_) => NoticeKind::Validation,
            Error::NotFound(_) => NoticeKind::NotFound,
            Error::OrphanedImage { .. } => NoticeKind::PartialFailure,
            Error::RowBusy(_) => NoticeKind::Busy,
            _ => NoticeKind::Transient,
        };
        Self::new(kind, error.to_string())
    }
}

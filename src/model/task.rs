//! Shared checklist items.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{CoupleId, TaskId};

/// A task on the couple's shared list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub couple_id: CoupleId,
    pub text: String,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
}

/// Parameters for creating a task. The backend assigns id and `created_at`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTask {
    pub couple_id: CoupleId,
    pub text: String,
}

/// Partial update of a task.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskPatch {
    pub text: Option<String>,
    pub completed: Option<bool>,
}

impl TaskPatch {
    pub fn completed(value: bool) -> Self {
        Self {
            text: None,
            completed: Some(value),
        }
    }

    pub fn apply_to(&self, task: &mut Task) {
        if let Some(ref text) = self.text {
            task.text = text.clone();
        }
        if let Some(completed) = self.completed {
            task.completed = completed;
        }
    }
}

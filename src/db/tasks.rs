//! Shared task rows.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::{Db, expect_row};
use crate::error::Result;
use crate::model::*;

impl Db {
    /// Tasks of a couple, newest first.
    pub async fn list_tasks(&self, couple_id: CoupleId) -> Result<Vec<Task>> {
        let rows: Vec<TaskRow> = sqlx::query_as(
            "SELECT id, couple_id, text, completed, created_at FROM tasks
             WHERE couple_id = $1
             ORDER BY created_at DESC",
        )
        .bind(couple_id.0)
        .fetch_all(self.pool())
        .await?;

        Ok(rows.into_iter().map(Task::from).collect())
    }

    pub async fn create_task(&self, new: &NewTask) -> Result<Task> {
        let row: TaskRow = sqlx::query_as(
            "INSERT INTO tasks (id, couple_id, text, completed, created_at)
             VALUES ($1, $2, $3, false, now())
             RETURNING id, couple_id, text, completed, created_at",
        )
        .bind(Uuid::new_v4())
        .bind(new.couple_id.0)
        .bind(&new.text)
        .fetch_one(self.pool())
        .await?;

        Ok(row.into())
    }

    pub async fn update_task(&self, id: TaskId, patch: &TaskPatch) -> Result<()> {
        let rows_affected = sqlx::query(
            "UPDATE tasks SET text = COALESCE($1, text), completed = COALESCE($2, completed)
             WHERE id = $3",
        )
        .bind(&patch.text)
        .bind(patch.completed)
        .bind(id.0)
        .execute(self.pool())
        .await?
        .rows_affected();

        expect_row(rows_affected, || format!("task {id}"))
    }

    pub async fn delete_task(&self, id: TaskId) -> Result<()> {
        let rows_affected = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id.0)
            .execute(self.pool())
            .await?
            .rows_affected();

        expect_row(rows_affected, || format!("task {id}"))
    }
}

/// Internal row type for sqlx::FromRow.
#[derive(sqlx::FromRow)]
struct TaskRow {
    id: Uuid,
    couple_id: Uuid,
    text: String,
    completed: bool,
    created_at: DateTime<Utc>,
}

impl From<TaskRow> for Task {
    fn from(row: TaskRow) -> Self {
        Self {
            id: TaskId(row.id),
            couple_id: CoupleId(row.couple_id),
            text: row.text,
            completed: row.completed,
            created_at: row.created_at,
        }
    }
}

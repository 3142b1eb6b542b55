//! The remote store the engine talks to.
//!
//! Records (events, tasks, couples, users) and image objects live behind
//! the [`Backend`] trait. Two implementations ship with the crate:
//!
//! - [`RemoteBackend`]: Postgres records plus a directory image store,
//! - [`MemoryBackend`]: in-process, with failure injection for tests and demos.

mod memory;
mod remote;

pub use memory::{MemoryBackend, Op};
pub use remote::RemoteBackend;

use async_trait::async_trait;
use chrono::NaiveDate;
use std::path::Path;

use crate::error::Result;
use crate::model::*;
use crate::stats::compute_stats;

/// CRUD + object-storage contract consumed by the engine.
///
/// No method retries; a failure is reported once.
#[async_trait]
pub trait Backend: Send + Sync {
    /// All events of a couple, newest `event_date` first.
    async fn list_events(&self, couple_id: CoupleId) -> Result<Vec<TimelineEvent>>;

    /// Events whose `event_date` lies within the given month (inclusive bounds).
    async fn list_events_in_month(
        &self,
        couple_id: CoupleId,
        year: i32,
        month: u32,
    ) -> Result<Vec<TimelineEvent>>;

    async fn get_event(&self, id: EventId) -> Result<TimelineEvent>;

    async fn create_event(&self, new: NewEvent) -> Result<TimelineEvent>;

    async fn update_event(&self, id: EventId, patch: EventPatch) -> Result<()>;

    /// Delete the record only. The caller removes the image separately.
    async fn delete_event(&self, id: EventId) -> Result<()>;

    /// Store a local image file; returns its storage path.
    async fn upload_image(&self, couple_id: CoupleId, local_file: &Path) -> Result<String>;

    async fn remove_image(&self, storage_path: &str) -> Result<()>;

    fn public_url(&self, storage_path: &str) -> String;

    /// Tasks of a couple, newest first.
    async fn list_tasks(&self, couple_id: CoupleId) -> Result<Vec<Task>>;

    async fn create_task(&self, new: NewTask) -> Result<Task>;

    async fn update_task(&self, id: TaskId, patch: TaskPatch) -> Result<()>;

    async fn delete_task(&self, id: TaskId) -> Result<()>;

    async fn get_couple(&self, id: CoupleId) -> Result<Couple>;

    async fn update_first_met_date(&self, id: CoupleId, date: NaiveDate) -> Result<Couple>;

    async fn get_user(&self, id: UserId) -> Result<UserProfile>;

    /// The other member of the couple, if one has joined.
    async fn get_partner(&self, session: &Session) -> Result<Option<UserProfile>>;

    /// Summary stats. Default: rank over a full event fetch.
    async fn get_stats(&self, couple_id: CoupleId, top_k: usize) -> Result<Stats> {
        let events = self.list_events(couple_id).await?;
        Ok(compute_stats(&events, top_k))
    }
}

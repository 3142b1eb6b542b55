//! Production backend: Postgres records plus a directory image store.

use async_trait::async_trait;
use chrono::NaiveDate;
use std::path::Path;

use super::Backend;
use crate::db::Db;
use crate::error::Result;
use crate::model::*;
use crate::storage::ImageStore;
use crate::timeline::MonthKey;

pub struct RemoteBackend {
    db: Db,
    images: ImageStore,
}

impl RemoteBackend {
    pub fn new(db: Db, images: ImageStore) -> Self {
        Self { db, images }
    }

    pub fn db(&self) -> &Db {
        &self.db
    }
}

#[async_trait]
impl Backend for RemoteBackend {
    async fn list_events(&self, couple_id: CoupleId) -> Result<Vec<TimelineEvent>> {
        self.db.list_events(couple_id).await
    }

    async fn list_events_in_month(
        &self,
        couple_id: CoupleId,
        year: i32,
        month: u32,
    ) -> Result<Vec<TimelineEvent>> {
        self.db
            .list_events_in_month(couple_id, MonthKey::new(year, month)?)
            .await
    }

    async fn get_event(&self, id: EventId) -> Result<TimelineEvent> {
        self.db.get_event(id).await
    }

    async fn create_event(&self, new: NewEvent) -> Result<TimelineEvent> {
        self.db.create_event(new).await
    }

    async fn update_event(&self, id: EventId, patch: EventPatch) -> Result<()> {
        self.db.update_event(id, &patch).await
    }

    async fn delete_event(&self, id: EventId) -> Result<()> {
        self.db.delete_event(id).await
    }

    async fn upload_image(&self, couple_id: CoupleId, local_file: &Path) -> Result<String> {
        self.images.upload(couple_id, local_file).await
    }

    async fn remove_image(&self, storage_path: &str) -> Result<()> {
        self.images.remove(storage_path).await
    }

    fn public_url(&self, storage_path: &str) -> String {
        self.images.public_url(storage_path)
    }

    async fn list_tasks(&self, couple_id: CoupleId) -> Result<Vec<Task>> {
        self.db.list_tasks(couple_id).await
    }

    async fn create_task(&self, new: NewTask) -> Result<Task> {
        self.db.create_task(&new).await
    }

    async fn update_task(&self, id: TaskId, patch: TaskPatch) -> Result<()> {
        self.db.update_task(id, &patch).await
    }

    async fn delete_task(&self, id: TaskId) -> Result<()> {
        self.db.delete_task(id).await
    }

    async fn get_couple(&self, id: CoupleId) -> Result<Couple> {
        self.db.get_couple(id).await
    }

    async fn update_first_met_date(&self, id: CoupleId, date: NaiveDate) -> Result<Couple> {
        self.db.update_first_met_date(id, date).await
    }

    async fn get_user(&self, id: UserId) -> Result<UserProfile> {
        self.db.get_user(id).await
    }

    async fn get_partner(&self, session: &Session) -> Result<Option<UserProfile>> {
        self.db.get_partner(session).await
    }
}

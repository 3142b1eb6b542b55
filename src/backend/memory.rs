//! In-process backend.
//!
//! Keeps records in memory and lets callers inject failures and latency per
//! operation, which is how the engine's rollback and partial-failure paths
//! are exercised without a database.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, TimeDelta, Utc};
use std::collections::{BTreeSet, HashMap};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use super::Backend;
use crate::error::{Error, Result};
use crate::model::*;
use crate::stats::compute_stats;
use crate::storage::new_object_path;
use crate::timeline::{MonthKey, events_in_month, sort_timeline};

/// Backend operations, for failure injection and call accounting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    ListEvents,
    ListEventsInMonth,
    GetEvent,
    CreateEvent,
    UpdateEvent,
    DeleteEvent,
    UploadImage,
    RemoveImage,
    ListTasks,
    CreateTask,
    UpdateTask,
    DeleteTask,
    GetCouple,
    UpdateFirstMetDate,
    GetUser,
    GetPartner,
    GetStats,
}

#[derive(Default)]
struct MemoryState {
    events: Vec<TimelineEvent>,
    tasks: Vec<Task>,
    couples: Vec<Couple>,
    users: Vec<UserProfile>,
    images: BTreeSet<String>,
    last_created: Option<DateTime<Utc>>,
}

impl MemoryState {
    /// Strictly increasing insertion timestamps, even within one clock tick.
    fn next_created_at(&mut self) -> DateTime<Utc> {
        let now = Utc::now();
        let created = match self.last_created {
            Some(last) if now <= last => last + TimeDelta::microseconds(1),
            _ => now,
        };
        self.last_created = Some(created);
        created
    }
}

#[derive(Default)]
struct Faults {
    pending: HashMap<Op, u32>,
    calls: HashMap<Op, usize>,
    latency: Option<Duration>,
}

/// Backend that lives entirely in memory.
#[derive(Default)]
pub struct MemoryBackend {
    state: Mutex<MemoryState>,
    faults: Mutex<Faults>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    // --- Seeding -----------------------------------------------------------

    pub fn insert_event(&self, event: TimelineEvent) {
        let mut state = lock(&self.state);
        if let Some(path) = event.image_path.clone() {
            state.images.insert(path);
        }
        state.events.push(event);
    }

    pub fn insert_task(&self, task: Task) {
        lock(&self.state).tasks.push(task);
    }

    pub fn insert_couple(&self, couple: Couple) {
        lock(&self.state).couples.push(couple);
    }

    pub fn insert_user(&self, user: UserProfile) {
        lock(&self.state).users.push(user);
    }

    // --- Inspection --------------------------------------------------------

    pub fn events(&self) -> Vec<TimelineEvent> {
        lock(&self.state).events.clone()
    }

    pub fn tasks(&self) -> Vec<Task> {
        lock(&self.state).tasks.clone()
    }

    pub fn images(&self) -> Vec<String> {
        lock(&self.state).images.iter().cloned().collect()
    }

    /// How many times an operation was attempted (including injected failures).
    pub fn calls(&self, op: Op) -> usize {
        lock(&self.faults).calls.get(&op).copied().unwrap_or(0)
    }

    // --- Fault injection ---------------------------------------------------

    /// Make the next call of `op` fail with a remote error.
    pub fn fail_next(&self, op: Op) {
        self.fail_times(op, 1);
    }

    pub fn fail_times(&self, op: Op, times: u32) {
        *lock(&self.faults).pending.entry(op).or_default() += times;
    }

    /// Delay every operation by `latency` before it takes effect.
    pub fn set_latency(&self, latency: Option<Duration>) {
        lock(&self.faults).latency = latency;
    }

    async fn enter(&self, op: Op) -> Result<()> {
        let latency = {
            let mut faults = lock(&self.faults);
            *faults.calls.entry(op).or_default() += 1;
            faults.latency
        };
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }

        let mut faults = lock(&self.faults);
        match faults.pending.get_mut(&op) {
            Some(remaining) if *remaining > 0 => {
                *remaining -= 1;
                Err(Error::Remote(format!("injected failure in {op:?}")))
            }
            _ => Ok(()),
        }
    }

    fn couple_events(&self, couple_id: CoupleId) -> Vec<TimelineEvent> {
        let mut events: Vec<TimelineEvent> = lock(&self.state)
            .events
            .iter()
            .filter(|e| e.couple_id == couple_id)
            .cloned()
            .collect();
        sort_timeline(&mut events);
        events
    }
}

#[async_trait]
impl Backend for MemoryBackend {
    async fn list_events(&self, couple_id: CoupleId) -> Result<Vec<TimelineEvent>> {
        self.enter(Op::ListEvents).await?;
        Ok(self.couple_events(couple_id))
    }

    async fn list_events_in_month(
        &self,
        couple_id: CoupleId,
        year: i32,
        month: u32,
    ) -> Result<Vec<TimelineEvent>> {
        self.enter(Op::ListEventsInMonth).await?;
        events_in_month(&self.couple_events(couple_id), MonthKey::new(year, month)?)
    }

    async fn get_event(&self, id: EventId) -> Result<TimelineEvent> {
        self.enter(Op::GetEvent).await?;
        lock(&self.state)
            .events
            .iter()
            .find(|e| e.id == id)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("event {id}")))
    }

    async fn create_event(&self, new: NewEvent) -> Result<TimelineEvent> {
        self.enter(Op::CreateEvent).await?;
        new.validate()?;
        let mut state = lock(&self.state);
        let created_at = state.next_created_at();
        let event = new.into_event(EventId::new(), created_at)?;
        state.events.push(event.clone());
        Ok(event)
    }

    async fn update_event(&self, id: EventId, patch: EventPatch) -> Result<()> {
        self.enter(Op::UpdateEvent).await?;
        let mut state = lock(&self.state);
        let event = state
            .events
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or_else(|| Error::NotFound(format!("event {id}")))?;
        patch.apply_to(event)
    }

    async fn delete_event(&self, id: EventId) -> Result<()> {
        self.enter(Op::DeleteEvent).await?;
        let mut state = lock(&self.state);
        let before = state.events.len();
        state.events.retain(|e| e.id != id);
        if state.events.len() == before {
            return Err(Error::NotFound(format!("event {id}")));
        }
        Ok(())
    }

    async fn upload_image(&self, couple_id: CoupleId, local_file: &Path) -> Result<String> {
        self.enter(Op::UploadImage).await?;
        let path = new_object_path(couple_id, local_file);
        lock(&self.state).images.insert(path.clone());
        Ok(path)
    }

    async fn remove_image(&self, storage_path: &str) -> Result<()> {
        self.enter(Op::RemoveImage).await?;
        if lock(&self.state).images.remove(storage_path) {
            Ok(())
        } else {
            Err(Error::NotFound(format!("image {storage_path}")))
        }
    }

    fn public_url(&self, storage_path: &str) -> String {
        format!("memory://{storage_path}")
    }

    async fn list_tasks(&self, couple_id: CoupleId) -> Result<Vec<Task>> {
        self.enter(Op::ListTasks).await?;
        let mut tasks: Vec<Task> = lock(&self.state)
            .tasks
            .iter()
            .filter(|t| t.couple_id == couple_id)
            .cloned()
            .collect();
        tasks.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(tasks)
    }

    async fn create_task(&self, new: NewTask) -> Result<Task> {
        self.enter(Op::CreateTask).await?;
        let mut state = lock(&self.state);
        let task = Task {
            id: TaskId::new(),
            couple_id: new.couple_id,
            text: new.text,
            completed: false,
            created_at: state.next_created_at(),
        };
        state.tasks.push(task.clone());
        Ok(task)
    }

    async fn update_task(&self, id: TaskId, patch: TaskPatch) -> Result<()> {
        self.enter(Op::UpdateTask).await?;
        let mut state = lock(&self.state);
        let task = state
            .tasks
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| Error::NotFound(format!("task {id}")))?;
        patch.apply_to(task);
        Ok(())
    }

    async fn delete_task(&self, id: TaskId) -> Result<()> {
        self.enter(Op::DeleteTask).await?;
        let mut state = lock(&self.state);
        let before = state.tasks.len();
        state.tasks.retain(|t| t.id != id);
        if state.tasks.len() == before {
            return Err(Error::NotFound(format!("task {id}")));
        }
        Ok(())
    }

    async fn get_couple(&self, id: CoupleId) -> Result<Couple> {
        self.enter(Op::GetCouple).await?;
        lock(&self.state)
            .couples
            .iter()
            .find(|c| c.id == id)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("couple {id}")))
    }

    async fn update_first_met_date(&self, id: CoupleId, date: NaiveDate) -> Result<Couple> {
        self.enter(Op::UpdateFirstMetDate).await?;
        let mut state = lock(&self.state);
        let couple = state
            .couples
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| Error::NotFound(format!("couple {id}")))?;
        couple.first_met_date = Some(date);
        Ok(couple.clone())
    }

    async fn get_user(&self, id: UserId) -> Result<UserProfile> {
        self.enter(Op::GetUser).await?;
        lock(&self.state)
            .users
            .iter()
            .find(|u| u.id == id)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("user {id}")))
    }

    async fn get_partner(&self, session: &Session) -> Result<Option<UserProfile>> {
        self.enter(Op::GetPartner).await?;
        Ok(lock(&self.state)
            .users
            .iter()
            .find(|u| u.couple_id == Some(session.couple_id) && u.id != session.user_id)
            .cloned())
    }

    async fn get_stats(&self, couple_id: CoupleId, top_k: usize) -> Result<Stats> {
        self.enter(Op::GetStats).await?;
        Ok(compute_stats(&self.couple_events(couple_id), top_k))
    }
}

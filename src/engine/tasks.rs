//! Shared task list with optimistic updates.
//!
//! Toggle and delete change the local list first and then call the backend.
//! If the backend call fails, the whole list is reloaded from the backend
//! (no per-row undo) and the failure comes back as a [`Notice`]. Create is
//! not optimistic: the backend assigns the id, so the row is inserted only
//! after the backend confirms.
//!
//! Different rows can be mutated concurrently. A row with a mutation in
//! flight is `Mutating`; a second mutation on it is refused. A reload keeps
//! the local effect of every other mutation still in flight, and of any that
//! were confirmed while the reload was running, so one row's rollback never
//! undoes another row's change.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;

use opentelemetry::KeyValue;
use tracing::{Instrument, debug, error, info};

use super::{Notice, NoticeKind};
use crate::backend::Backend;
use crate::error::Error;
use crate::model::{CoupleId, NewTask, Session, Task, TaskId, TaskPatch};
use crate::telemetry::metrics;
use crate::telemetry::mutation::{record_outcome, record_rollback, start_mutation_span};

/// Display order: open tasks before completed ones, newest first within each group.
pub fn order_tasks(tasks: &mut [Task]) {
    tasks.sort_by(|a, b| {
        a.completed
            .cmp(&b.completed)
            .then_with(|| b.created_at.cmp(&a.created_at))
    });
}

/// Per-row mutation state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowState {
    Idle,
    Mutating,
}

/// The local effect of an optimistic mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PendingOp {
    SetCompleted(bool),
    Remove,
}

impl PendingOp {
    fn apply(self, id: TaskId, tasks: &mut Vec<Task>) {
        match self {
            Self::SetCompleted(completed) => {
                if let Some(task) = tasks.iter_mut().find(|t| t.id == id) {
                    task.completed = completed;
                }
            }
            Self::Remove => tasks.retain(|t| t.id != id),
        }
    }
}

#[derive(Default)]
struct BoardState {
    tasks: Vec<Task>,
    /// Rows with a mutation in flight.
    pending: HashMap<TaskId, PendingOp>,
    /// Reloads currently fetching from the backend.
    reloads: usize,
    /// Mutations confirmed while a reload was fetching.
    settled: HashMap<TaskId, PendingOp>,
}

impl BoardState {
    /// Store a backend snapshot, reapplying local effects it may predate.
    fn replace(&mut self, mut tasks: Vec<Task>, skip: Option<TaskId>) {
        for (&id, &op) in self.settled.iter().chain(self.pending.iter()) {
            if Some(id) != skip {
                op.apply(id, &mut tasks);
            }
        }
        self.tasks = tasks;
    }

    fn finish_reload(&mut self) {
        self.reloads = self.reloads.saturating_sub(1);
        if self.reloads == 0 {
            self.settled.clear();
        }
    }
}

/// Marks a row as `Mutating` until dropped.
struct RowClaim<'a> {
    state: &'a Mutex<BoardState>,
    id: TaskId,
    op: PendingOp,
    confirmed: bool,
}

impl RowClaim<'_> {
    fn confirm(&mut self) {
        self.confirmed = true;
    }
}

impl Drop for RowClaim<'_> {
    fn drop(&mut self) {
        let mut state = lock(self.state);
        let Some(op) = state.pending.remove(&self.id) else {
            return;
        };
        if self.confirmed && state.reloads > 0 {
            state.settled.insert(self.id, op);
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// The task list of one couple, as held by the tasks screen.
pub struct TaskBoard {
    backend: Arc<dyn Backend>,
    couple_id: CoupleId,
    state: Mutex<BoardState>,
}

impl TaskBoard {
    pub fn new(backend: Arc<dyn Backend>, session: &Session) -> Self {
        Self {
            backend,
            couple_id: session.couple_id,
            state: Mutex::new(BoardState::default()),
        }
    }

    /// Current list in display order.
    pub fn tasks(&self) -> Vec<Task> {
        let mut tasks = lock(&self.state).tasks.clone();
        order_tasks(&mut tasks);
        tasks
    }

    /// (completed, total)
    pub fn progress(&self) -> (usize, usize) {
        let state = lock(&self.state);
        (
            state.tasks.iter().filter(|t| t.completed).count(),
            state.tasks.len(),
        )
    }

    pub fn row_state(&self, id: TaskId) -> RowState {
        if lock(&self.state).pending.contains_key(&id) {
            RowState::Mutating
        } else {
            RowState::Idle
        }
    }

    /// Replace the local list with the backend's. On failure the old list stays.
    pub async fn load(&self) -> Result<(), Notice> {
        Ok(self.resync(None).await?)
    }

    /// Create a task from the input box. The input is cleared only once the
    /// new task is in the list; on failure it is left as typed.
    pub async fn create(&self, input: &mut String) -> Result<Task, Notice> {
        let text = input.trim();
        if text.is_empty() {
            return Err(Notice::new(NoticeKind::Validation, "task text is empty"));
        }

        let span = start_mutation_span("create", None);
        let started = Instant::now();
        let created = self
            .backend
            .create_task(NewTask {
                couple_id: self.couple_id,
                text: text.to_string(),
            })
            .instrument(span.clone())
            .await;
        observe("create", started, created.is_ok());

        match created {
            Ok(task) => {
                span.record("task.id", tracing::field::display(task.id));
                record_outcome(&span, "confirmed");
                lock(&self.state).tasks.insert(0, task.clone());
                input.clear();
                Ok(task)
            }
            Err(e) => {
                record_outcome(&span, "rejected");
                Err(e.into())
            }
        }
    }

    /// Flip a task's completed flag, optimistically.
    pub async fn toggle(&self, id: TaskId) -> Result<(), Notice> {
        let mut claim = self.claim(id, |task| PendingOp::SetCompleted(!task.completed))?;
        let span = start_mutation_span("toggle", Some(id));
        let completed = claim.op == PendingOp::SetCompleted(true);

        let started = Instant::now();
        let result = self
            .backend
            .update_task(id, TaskPatch::completed(completed))
            .instrument(span.clone())
            .await;
        observe("toggle", started, result.is_ok());

        match result {
            Ok(()) => {
                claim.confirm();
                record_outcome(&span, "confirmed");
                Ok(())
            }
            Err(e) => Err(self.roll_back("toggle", id, &span, e).await),
        }
    }

    /// Remove a task, optimistically.
    pub async fn delete(&self, id: TaskId) -> Result<(), Notice> {
        let mut claim = self.claim(id, |_| PendingOp::Remove)?;
        let span = start_mutation_span("delete", Some(id));

        let started = Instant::now();
        let result = self
            .backend
            .delete_task(id)
            .instrument(span.clone())
            .await;
        observe("delete", started, result.is_ok());

        match result {
            Ok(()) => {
                claim.confirm();
                record_outcome(&span, "confirmed");
                Ok(())
            }
            Err(e) => Err(self.roll_back("delete", id, &span, e).await),
        }
    }

    /// Mark the row `Mutating` and apply its local effect in one step.
    fn claim(
        &self,
        id: TaskId,
        effect: impl FnOnce(&Task) -> PendingOp,
    ) -> Result<RowClaim<'_>, Notice> {
        let mut state = lock(&self.state);
        if state.pending.contains_key(&id) {
            return Err(Error::RowBusy(id).into());
        }
        let op = match state.tasks.iter().find(|t| t.id == id) {
            Some(task) => effect(task),
            None => return Err(Error::NotFound(format!("task {id}")).into()),
        };
        op.apply(id, &mut state.tasks);
        state.pending.insert(id, op);
        Ok(RowClaim {
            state: &self.state,
            id,
            op,
            confirmed: false,
        })
    }

    /// Fetch the backend list and store it with in-flight effects reapplied.
    /// `skip` is the row whose own mutation failed.
    async fn resync(&self, skip: Option<TaskId>) -> crate::error::Result<()> {
        lock(&self.state).reloads += 1;
        let fetched = self.backend.list_tasks(self.couple_id).await;

        let mut state = lock(&self.state);
        let result = match fetched {
            Ok(tasks) => {
                let reapplied = state.pending.len() + state.settled.len();
                state.replace(tasks, skip);
                debug!(count = state.tasks.len(), reapplied, "task list replaced");
                Ok(())
            }
            Err(e) => Err(e),
        };
        state.finish_reload();
        result
    }

    /// Resync the whole list after a failed mutation and return the notice to show.
    async fn roll_back(
        &self,
        op: &'static str,
        id: TaskId,
        span: &tracing::Span,
        cause: Error,
    ) -> Notice {
        record_outcome(span, "rolled_back");
        record_rollback(span, &cause.to_string());
        metrics::task_rollbacks().add(1, &[KeyValue::new("op", op)]);

        match self.resync(Some(id)).await {
            Ok(()) => info!(op, "task list reloaded after failure"),
            Err(reload) => {
                error!(op, error = %reload, "task list reload failed; local list may be stale");
            }
        }
        cause.into()
    }
}

fn observe(op: &'static str, started: Instant, ok: bool) {
    let result = if ok { "ok" } else { "error" };
    metrics::task_mutations().add(
        1,
        &[KeyValue::new("op", op), KeyValue::new("result", result)],
    );
    metrics::operation_duration_ms().record(
        started.elapsed().as_secs_f64() * 1000.0,
        &[KeyValue::new("operation", format!("task.{op}"))],
    );
}

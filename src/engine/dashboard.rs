//! Home screen assembly.
//!
//! The four legs (events, couple, stats, tasks) are fetched concurrently and
//! joined. The dashboard is published only after every leg has settled. A
//! failed leg is logged, counted and recorded in [`Dashboard::failures`];
//! it keeps whatever value it had before and never blocks the other legs.

use std::fmt;
use std::time::Instant;

use opentelemetry::KeyValue;
use serde::Serialize;
use tracing::{Instrument, info, info_span, warn};

use super::Notice;
use super::tasks::order_tasks;
use crate::backend::Backend;
use crate::error::Result;
use crate::model::{Couple, Session, Stats, Task, TimelineEvent};
use crate::telemetry::metrics;
use crate::timeline::sort_timeline;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Leg {
    Events,
    Couple,
    Stats,
    Tasks,
}

impl Leg {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Events => "events",
            Self::Couple => "couple",
            Self::Stats => "stats",
            Self::Tasks => "tasks",
        }
    }
}

impl fmt::Display for Leg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LegFailure {
    pub leg: Leg,
    pub notice: Notice,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Dashboard {
    /// Timeline order.
    pub events: Vec<TimelineEvent>,
    pub couple: Option<Couple>,
    pub stats: Option<Stats>,
    /// Display order (open first).
    pub tasks: Vec<Task>,
    /// Legs that failed on the most recent refresh.
    pub failures: Vec<LegFailure>,
}

impl Dashboard {
    /// Fetch a fresh dashboard. Failed legs are left empty.
    pub async fn load(backend: &dyn Backend, session: &Session, top_k: usize) -> Self {
        let mut dashboard = Self::default();
        dashboard.refresh(backend, session, top_k).await;
        dashboard
    }

    /// Refetch every leg concurrently. Returns `true` when all legs succeeded.
    pub async fn refresh(&mut self, backend: &dyn Backend, session: &Session, top_k: usize) -> bool {
        let couple_id = session.couple_id;
        let started = Instant::now();

        let (events, couple, stats, tasks) = async {
            tokio::join!(
                backend.list_events(couple_id),
                backend.get_couple(couple_id),
                backend.get_stats(couple_id, top_k),
                backend.list_tasks(couple_id),
            )
        }
        .instrument(info_span!("dashboard.refresh", couple.id = %couple_id))
        .await;

        self.failures.clear();
        if let Some(mut events) = self.settle(Leg::Events, events) {
            sort_timeline(&mut events);
            self.events = events;
        }
        if let Some(couple) = self.settle(Leg::Couple, couple) {
            self.couple = Some(couple);
        }
        if let Some(stats) = self.settle(Leg::Stats, stats) {
            self.stats = Some(stats);
        }
        if let Some(mut tasks) = self.settle(Leg::Tasks, tasks) {
            order_tasks(&mut tasks);
            self.tasks = tasks;
        }

        metrics::operation_duration_ms().record(
            started.elapsed().as_secs_f64() * 1000.0,
            &[KeyValue::new("operation", "dashboard.refresh")],
        );
        info!(
            events = self.events.len(),
            tasks = self.tasks.len(),
            failed_legs = self.failures.len(),
            "dashboard refreshed"
        );
        self.failures.is_empty()
    }

    pub fn failed(&self, leg: Leg) -> bool {
        self.failures.iter().any(|f| f.leg == leg)
    }

    fn settle<T>(&mut self, leg: Leg, result: Result<T>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(leg = leg.as_str(), error = %e, "dashboard leg failed");
                metrics::dashboard_leg_failures().add(1, &[KeyValue::new("leg", leg.as_str())]);
                self.failures.push(LegFailure {
                    leg,
                    notice: e.into(),
                });
                None
            }
        }
    }
}

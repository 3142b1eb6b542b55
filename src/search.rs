//! Free-text search over events, with debouncing.
//!
//! [`search_events`] is the pure matcher. [`SearchSession`] wraps it for
//! interactive use: every query change restarts a quiet-period timer and only
//! the last query of a burst is evaluated. Results are published on a
//! `tokio::sync::watch` channel.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, RwLock};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::category::CategoryCatalog;
use crate::model::TimelineEvent;
use crate::telemetry::metrics;
use crate::timeline::sort_timeline;

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(300);

/// What the search screen should show.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchState {
    /// No query: nothing is shown. Not the same as "no matches".
    Idle,
    /// A query is waiting for the quiet period to pass.
    Pending { query: String },
    /// Matches for `query`, newest first. May be empty.
    Results {
        query: String,
        events: Vec<TimelineEvent>,
    },
}

impl SearchState {
    /// Events to display (empty unless results are available).
    pub fn events(&self) -> &[TimelineEvent] {
        match self {
            SearchState::Results { events, .. } => events,
            _ => &[],
        }
    }
}

/// Does the event match an already-lowercased, non-empty query?
///
/// Checked fields: description, location, category id, category label and
/// each keyword. Plain substring match, no tokenization.
pub fn event_matches(event: &TimelineEvent, needle: &str, catalog: &CategoryCatalog) -> bool {
    let hit = |field: &str| field.to_lowercase().contains(needle);

    event.description.as_deref().is_some_and(hit)
        || event.location.as_deref().is_some_and(hit)
        || event.category.as_deref().is_some_and(|id| {
            hit(id) || catalog.label_for(id).is_some_and(hit)
        })
        || event.keywords.iter().flatten().any(|k| hit(k))
}

/// Evaluate a query against a snapshot. A blank query yields [`SearchState::Idle`].
pub fn search_events(
    events: &[TimelineEvent],
    query: &str,
    catalog: &CategoryCatalog,
) -> SearchState {
    if query.trim().is_empty() {
        return SearchState::Idle;
    }
    let needle = query.to_lowercase();
    let mut matched: Vec<TimelineEvent> = events
        .iter()
        .filter(|e| event_matches(e, &needle, catalog))
        .cloned()
        .collect();
    sort_timeline(&mut matched);
    SearchState::Results {
        query: query.to_string(),
        events: matched,
    }
}

// ---------------------------------------------------------------------------
// Debounced session
// ---------------------------------------------------------------------------

struct Shared {
    events: RwLock<Arc<Vec<TimelineEvent>>>,
    catalog: Arc<CategoryCatalog>,
    debounce: Duration,
    /// Bumped on every query change; a timer only publishes if it still holds the latest value.
    generation: AtomicU64,
    evaluations: AtomicU64,
    state: watch::Sender<SearchState>,
}

/// Interactive search over one screen's event snapshot.
///
/// Must be used from within a tokio runtime.
pub struct SearchSession {
    shared: Arc<Shared>,
    control: Mutex<Control>,
}

/// The current query and its timer. Changed together under one lock so the
/// latest query always owns the latest generation.
#[derive(Default)]
struct Control {
    query: String,
    pending: Option<JoinHandle<()>>,
}

fn lock_control(control: &Mutex<Control>) -> MutexGuard<'_, Control> {
    match control.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

impl SearchSession {
    pub fn new(events: Vec<TimelineEvent>, catalog: Arc<CategoryCatalog>, debounce: Duration) -> Self {
        let (state, _) = watch::channel(SearchState::Idle);
        Self {
            shared: Arc::new(Shared {
                events: RwLock::new(Arc::new(events)),
                catalog,
                debounce,
                generation: AtomicU64::new(0),
                evaluations: AtomicU64::new(0),
                state,
            }),
            control: Mutex::new(Control::default()),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<SearchState> {
        self.shared.state.subscribe()
    }

    pub fn state(&self) -> SearchState {
        self.shared.state.borrow().clone()
    }

    /// Number of match passes actually run.
    pub fn evaluations(&self) -> u64 {
        self.shared.evaluations.load(Ordering::SeqCst)
    }

    /// Change the query. Cancels any pending evaluation.
    pub fn set_query(&self, query: impl Into<String>) {
        let mut control = lock_control(&self.control);
        control.query = query.into();
        self.restart(&mut control);
    }

    /// Replace the event snapshot (e.g. after a reload) and re-run the current query.
    pub fn set_events(&self, events: Vec<TimelineEvent>) {
        match self.shared.events.write() {
            Ok(mut snapshot) => *snapshot = Arc::new(events),
            Err(poisoned) => *poisoned.into_inner() = Arc::new(events),
        }
        let mut control = lock_control(&self.control);
        self.restart(&mut control);
    }

    fn restart(&self, control: &mut Control) {
        let generation = self.shared.generation.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some(handle) = control.pending.take() {
            handle.abort();
        }

        let query = control.query.clone();
        if query.trim().is_empty() {
            self.shared.state.send_replace(SearchState::Idle);
            return;
        }

        self.shared.state.send_replace(SearchState::Pending {
            query: query.clone(),
        });

        let shared = Arc::clone(&self.shared);
        control.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(shared.debounce).await;
            if shared.generation.load(Ordering::SeqCst) != generation {
                return;
            }

            let snapshot = match shared.events.read() {
                Ok(guard) => Arc::clone(&guard),
                Err(poisoned) => Arc::clone(&poisoned.into_inner()),
            };
            shared.evaluations.fetch_add(1, Ordering::SeqCst);
            metrics::search_evaluations().add(1, &[]);
            let result = search_events(&snapshot, &query, &shared.catalog);
            debug!(%query, matches = result.events().len(), "search evaluated");

            // Check and publish under the channel lock so a newer query always wins.
            shared.state.send_if_modified(|state| {
                if shared.generation.load(Ordering::SeqCst) == generation {
                    *state = result;
                    true
                } else {
                    false
                }
            });
        }));
    }
}

impl Drop for SearchSession {
    fn drop(&mut self) {
        let control = match self.control.get_mut() {
            Ok(control) => control,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Some(handle) = control.pending.take() {
            handle.abort();
        }
    }
}

//! Span helpers for task mutations.

use tracing::Span;

use crate::model::TaskId;

/// Start a span for one task mutation (`op` is "create", "toggle" or "delete").
///
/// `mutation.outcome` is filled in by [`record_outcome`].
pub fn start_mutation_span(op: &str, task_id: Option<TaskId>) -> Span {
    let span = tracing::info_span!(
        "task.mutate",
        "mutation.op" = op,
        "task.id" = tracing::field::Empty,
        "mutation.outcome" = tracing::field::Empty,
    );
    if let Some(id) = task_id {
        span.record("task.id", tracing::field::display(id));
    }
    span
}

/// Record how the mutation ended ("confirmed", "rolled_back", "rejected").
pub fn record_outcome(span: &Span, outcome: &str) {
    span.record("mutation.outcome", outcome);
}

/// Emit a rollback event scoped to the mutation span.
pub fn record_rollback(span: &Span, reason: &str) {
    span.in_scope(|| {
        tracing::warn!(reason = reason, "optimistic mutation rolled back, list reloaded");
    });
}

//! Metric instruments for tandem-rs.
//!
//! Uses the OTel Meter API with the globally-registered `MeterProvider`
//! (a no-op until telemetry is initialized with an endpoint).

use opentelemetry::metrics::{Counter, Histogram, Meter};

fn meter() -> Meter {
    opentelemetry::global::meter("tandem-rs")
}

/// Counter: task mutations.
/// Labels: `op` ("create" | "toggle" | "delete"), `result` ("ok" | "error").
pub fn task_mutations() -> Counter<u64> {
    meter()
        .u64_counter("tandem.task.mutations")
        .with_description("Number of task mutations")
        .build()
}

/// Counter: full task-list reloads after a failed optimistic mutation.
/// Labels: `op`.
pub fn task_rollbacks() -> Counter<u64> {
    meter()
        .u64_counter("tandem.task.rollbacks")
        .with_description("Task list reloads triggered by failed mutations")
        .build()
}

/// Counter: debounced search passes actually evaluated.
pub fn search_evaluations() -> Counter<u64> {
    meter()
        .u64_counter("tandem.search.evaluations")
        .with_description("Number of search match passes")
        .build()
}

/// Counter: coordinate conversions.
/// Labels: `path` ("projected" | "prescaled" | "failed").
pub fn geo_conversions() -> Counter<u64> {
    meter()
        .u64_counter("tandem.geo.conversions")
        .with_description("Number of place coordinate conversions")
        .build()
}

/// Counter: dashboard fetch legs that failed.
/// Labels: `leg`.
pub fn dashboard_leg_failures() -> Counter<u64> {
    meter()
        .u64_counter("tandem.dashboard.leg_failures")
        .with_description("Dashboard fetch legs that failed")
        .build()
}

/// Histogram: operation duration in milliseconds.
/// Labels: `operation`.
pub fn operation_duration_ms() -> Histogram<f64> {
    meter()
        .f64_histogram("tandem.operation.duration_ms")
        .with_description("Operation duration in milliseconds")
        .with_unit("ms")
        .build()
}

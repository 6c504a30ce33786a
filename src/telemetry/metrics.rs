//! Metric instrument factories for worklist-rs.
//!
//! Uses the OTel Meter API with the globally-registered `MeterProvider`.
//! Without a configured provider these are no-ops.

use opentelemetry::metrics::{Counter, Histogram, Meter};

fn meter() -> Meter {
    opentelemetry::global::meter("worklist-rs")
}

/// Counter: items the user moved past.
/// Labels: `result` ("completed" | "skipped" | "invalid").
pub fn items_advanced() -> Counter<u64> {
    meter()
        .u64_counter("worklist.items.advanced")
        .with_description("Worklist items advanced past in a traversal session")
        .build()
}

/// Counter: local queue refills.
/// Labels: `trigger` ("advance" | "ignore").
pub fn refills() -> Counter<u64> {
    meter()
        .u64_counter("worklist.refills")
        .with_description("Number of prefetch queue refills")
        .build()
}

/// Counter: streamed items dropped because the session already visited them.
pub fn stale_filtered() -> Counter<u64> {
    meter()
        .u64_counter("worklist.stale_filtered")
        .with_description("Stale items filtered out of remote pages")
        .build()
}

/// Counter: round trips to a remote source.
/// Labels: `worklist`, `operation` ("count" | "stream").
pub fn source_calls() -> Counter<u64> {
    meter()
        .u64_counter("worklist.source.calls")
        .with_description("Number of remote worklist source calls")
        .build()
}

/// Histogram: refill duration in milliseconds.
pub fn refill_duration_ms() -> Histogram<f64> {
    meter()
        .f64_histogram("worklist.refill.duration_ms")
        .with_description("Prefetch queue refill duration in milliseconds")
        .with_unit("ms")
        .build()
}

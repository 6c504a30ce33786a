//! Integration tests for telemetry initialization and span helpers.

use worklist_rs::model::ItemRef;

#[test]
fn telemetry_initializes_without_endpoint() {
    let config = worklist_rs::telemetry::TelemetryConfig {
        endpoint: None,
        service_name: "worklist-test".to_string(),
        log_level: "debug".to_string(),
    };
    // Only one global subscriber per process; a second init may fail.
    if let Ok(guard) = worklist_rs::telemetry::init_telemetry(config) {
        assert!(!guard.is_exporting());
        guard.force_flush();
    }
}

#[test]
fn session_span_records_advances() {
    let span = worklist_rs::telemetry::session::start_session_span("CT Reporting", Some("ct"));
    let first = ItemRef::new();
    let second = first.bumped();
    worklist_rs::telemetry::session::record_advance(
        &span,
        Some(&first),
        Some(&second),
        "completed",
    );
    worklist_rs::telemetry::session::record_advance(&span, Some(&second), None, "skipped");
}

#[test]
fn session_span_without_worklist() {
    let span = worklist_rs::telemetry::session::start_session_span("", None);
    worklist_rs::telemetry::session::record_advance(&span, None, None, "invalid");
}

#[test]
fn metrics_instruments_accept_records_without_a_provider() {
    use opentelemetry::KeyValue;
    use worklist_rs::telemetry::metrics;

    metrics::items_advanced().add(1, &[KeyValue::new("result", "completed")]);
    metrics::refills().add(1, &[KeyValue::new("trigger", "advance")]);
    metrics::stale_filtered().add(3, &[]);
    metrics::refill_duration_ms().record(1.5, &[]);
}

// Prometheus metrics for the transaction service
// Tracks: event outcomes per lifecycle type; store and bus metrics live in their crates

use lazy_static::lazy_static;
use prometheus::{register_counter_vec, CounterVec, Encoder, TextEncoder};

lazy_static! {
    /// Events handed to the publish path, by outcome
    pub static ref EVENTS_TOTAL: CounterVec = register_counter_vec!(
        "transaction_service_events_total",
        "Total events by type and publish outcome",
        &["event_type", "outcome"]
    )
    .expect("events_total registration");
}

/// Record the outcome of one event publish
pub fn record_event(event_type: &str, outcome: &str) {
    EVENTS_TOTAL.with_label_values(&[event_type, outcome]).inc();
}

/// Render every registered metric in the Prometheus text format
pub fn export() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
}

//! Prometheus metrics for the transaction store
//!
//! - `ledger_store_appends_total{status}` - appends by outcome
//! - `ledger_store_size` - records currently held
//! - `ledger_store_append_duration_seconds` - round-trip through the actor

use lazy_static::lazy_static;
use prometheus::{
    register_counter_vec, register_histogram, register_int_gauge, CounterVec, Histogram, IntGauge,
};

lazy_static! {
    /// Appends by outcome (`committed`, `duplicate`, `error`)
    pub static ref STORE_APPENDS_TOTAL: CounterVec = register_counter_vec!(
        "ledger_store_appends_total",
        "Total transaction appends by outcome",
        &["status"]
    )
    .expect("ledger_store_appends_total registration");

    /// Number of records held by the store
    pub static ref STORE_SIZE: IntGauge = register_int_gauge!(
        "ledger_store_size",
        "Number of transactions held in the store"
    )
    .expect("ledger_store_size registration");

    /// Append latency including the actor round-trip
    pub static ref STORE_APPEND_DURATION: Histogram = register_histogram!(
        "ledger_store_append_duration_seconds",
        "Histogram of append latencies",
        vec![0.0001, 0.0005, 0.001, 0.005, 0.010, 0.050, 0.100, 0.500]
    )
    .expect("ledger_store_append_duration_seconds registration");
}

/// Record the outcome of one append
pub fn record_append(status: &str, duration_seconds: f64) {
    STORE_APPENDS_TOTAL.with_label_values(&[status]).inc();
    STORE_APPEND_DURATION.observe(duration_seconds);
}

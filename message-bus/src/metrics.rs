//! Prometheus metrics for message bus

use lazy_static::lazy_static;
use prometheus::{register_counter_vec, register_histogram_vec, CounterVec, HistogramVec};

lazy_static! {
    /// Total publish calls by outcome
    pub static ref MESSAGE_PUBLISH_TOTAL: CounterVec = register_counter_vec!(
        "message_bus_publish_total",
        "Total publish calls by outcome",
        &["topic", "status"]
    )
    .expect("message_bus_publish_total registration");

    /// Publish call duration, retries included
    pub static ref MESSAGE_PUBLISH_DURATION: HistogramVec = register_histogram_vec!(
        "message_bus_publish_duration_seconds",
        "Message publish duration in seconds",
        &["topic"]
    )
    .expect("message_bus_publish_duration_seconds registration");

    /// Individual transport attempts
    pub static ref MESSAGE_PUBLISH_ATTEMPTS: CounterVec = register_counter_vec!(
        "message_bus_publish_attempts_total",
        "Total transport attempts",
        &["topic"]
    )
    .expect("message_bus_publish_attempts_total registration");
}

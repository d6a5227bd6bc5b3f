/// Prometheus metrics for the Emberbin server
///
/// This module defines and manages all metrics exposed by the server, in
/// Prometheus text format at the /metrics endpoint.

use lazy_static::lazy_static;
use prometheus::{
    histogram_opts, opts, register_histogram_vec, register_int_counter, register_int_counter_vec,
    Encoder, HistogramVec, IntCounter, IntCounterVec, Registry, TextEncoder,
};

lazy_static! {
    /// Global Prometheus registry
    pub static ref REGISTRY: Registry = Registry::new();

    /// Total number of pastes created
    pub static ref PASTES_CREATED_TOTAL: IntCounter = register_int_counter!(
        opts!(
            "ember_pastes_created_total",
            "Total number of pastes created"
        )
    )
    .unwrap();

    /// Total number of fetch attempts by outcome
    ///
    /// Labels:
    /// - outcome: ok, not_found, expired, view_limit, or error
    pub static ref PASTE_FETCHES_TOTAL: IntCounterVec = register_int_counter_vec!(
        opts!(
            "ember_paste_fetches_total",
            "Total number of paste fetch attempts"
        ),
        &["outcome"]
    )
    .unwrap();

    /// Request duration in seconds
    ///
    /// Labels:
    /// - route: create_paste or fetch_paste
    ///
    /// Buckets: 0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0 seconds
    pub static ref REQUEST_DURATION_SECONDS: HistogramVec = register_histogram_vec!(
        histogram_opts!(
            "ember_request_duration_seconds",
            "Request duration in seconds",
            vec![0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0]
        ),
        &["route"]
    )
    .unwrap();
}

/// Register all metrics with the global registry
pub fn register_metrics() {
    REGISTRY
        .register(Box::new(PASTES_CREATED_TOTAL.clone()))
        .expect("Failed to register PASTES_CREATED_TOTAL");

    REGISTRY
        .register(Box::new(PASTE_FETCHES_TOTAL.clone()))
        .expect("Failed to register PASTE_FETCHES_TOTAL");

    REGISTRY
        .register(Box::new(REQUEST_DURATION_SECONDS.clone()))
        .expect("Failed to register REQUEST_DURATION_SECONDS");
}

/// Encode metrics in Prometheus text format
pub fn encode_metrics() -> Result<String, Box<dyn std::error::Error>> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = vec![];
    encoder.encode(&metric_families, &mut buffer)?;
    Ok(String::from_utf8(buffer)?)
}

//! Prometheus metrics for the processing, training and serving paths.
//!
//! All metrics live in one global registry and are exported in the
//! Prometheus text format by [`gather_metrics`].
//!
//! # Example
//! ```no_run
//! use disaster_response::metrics::ROWS_DROPPED_TOTAL;
//!
//! ROWS_DROPPED_TOTAL.with_label_values(&["duplicate_id"]).inc();
//! ```

use lazy_static::lazy_static;
use prometheus::{Counter, CounterVec, Histogram, HistogramOpts, Opts, Registry};

lazy_static! {
    /// Global Prometheus registry for all metrics
    pub static ref PROMETHEUS_REGISTRY: Registry = Registry::new();

    // ============================================================================
    // Processing Metrics
    // ============================================================================

    /// Rows read from the input files
    ///
    /// Labels: source (messages, categories)
    pub static ref ROWS_LOADED_TOTAL: CounterVec = CounterVec::new(
        Opts::new("rows_loaded_total", "Total number of input rows read")
            .namespace("disaster_response"),
        &["source"]
    ).expect("Failed to create ROWS_LOADED_TOTAL metric");

    /// Rows removed while cleaning
    ///
    /// Labels: reason (exact_duplicate, duplicate_id)
    pub static ref ROWS_DROPPED_TOTAL: CounterVec = CounterVec::new(
        Opts::new("rows_dropped_total", "Total number of rows removed while cleaning")
            .namespace("disaster_response"),
        &["reason"]
    ).expect("Failed to create ROWS_DROPPED_TOTAL metric");

    /// Category columns removed for having no positive examples
    pub static ref CATEGORIES_DROPPED_TOTAL: Counter = Counter::with_opts(
        Opts::new(
            "categories_dropped_total",
            "Total number of category columns dropped for zero support"
        )
        .namespace("disaster_response")
    ).expect("Failed to create CATEGORIES_DROPPED_TOTAL metric");

    /// Rows written to the relational store
    pub static ref ROWS_PERSISTED_TOTAL: Counter = Counter::with_opts(
        Opts::new("rows_persisted_total", "Total number of rows written to the store")
            .namespace("disaster_response")
    ).expect("Failed to create ROWS_PERSISTED_TOTAL metric");

    // ============================================================================
    // Training Metrics
    // ============================================================================

    /// Training runs
    ///
    /// Labels: status (success, failure)
    pub static ref TRAINING_RUNS_TOTAL: CounterVec = CounterVec::new(
        Opts::new("training_runs_total", "Total number of training runs")
            .namespace("disaster_response"),
        &["status"]
    ).expect("Failed to create TRAINING_RUNS_TOTAL metric");

    /// Wall-clock duration of pipeline fitting
    pub static ref TRAINING_DURATION_SECONDS: Histogram = Histogram::with_opts(
        HistogramOpts::new(
            "training_duration_seconds",
            "Time spent fitting the classification pipeline"
        )
        .namespace("disaster_response")
        .buckets(vec![1.0, 5.0, 15.0, 30.0, 60.0, 120.0, 300.0, 600.0, 1800.0])
    ).expect("Failed to create TRAINING_DURATION_SECONDS metric");

    // ============================================================================
    // Serving Metrics
    // ============================================================================

    /// Classification requests
    ///
    /// Labels: status (success, invalid, error)
    pub static ref CLASSIFICATION_REQUESTS_TOTAL: CounterVec = CounterVec::new(
        Opts::new("classification_requests_total", "Total number of classification requests")
            .namespace("disaster_response"),
        &["status"]
    ).expect("Failed to create CLASSIFICATION_REQUESTS_TOTAL metric");

    /// Classification latency
    pub static ref CLASSIFICATION_DURATION_SECONDS: Histogram = Histogram::with_opts(
        HistogramOpts::new(
            "classification_duration_seconds",
            "Time spent classifying one message"
        )
        .namespace("disaster_response")
        .buckets(vec![0.0005, 0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25])
    ).expect("Failed to create CLASSIFICATION_DURATION_SECONDS metric");
}

/// Register every metric with the global registry.
///
/// Calling this more than once is harmless.
pub fn init_metrics() -> Result<(), prometheus::Error> {
    register(Box::new(ROWS_LOADED_TOTAL.clone()))?;
    register(Box::new(ROWS_DROPPED_TOTAL.clone()))?;
    register(Box::new(CATEGORIES_DROPPED_TOTAL.clone()))?;
    register(Box::new(ROWS_PERSISTED_TOTAL.clone()))?;
    register(Box::new(TRAINING_RUNS_TOTAL.clone()))?;
    register(Box::new(TRAINING_DURATION_SECONDS.clone()))?;
    register(Box::new(CLASSIFICATION_REQUESTS_TOTAL.clone()))?;
    register(Box::new(CLASSIFICATION_DURATION_SECONDS.clone()))?;

    Ok(())
}

fn register(collector: Box<dyn prometheus::core::Collector>) -> Result<(), prometheus::Error> {
    match PROMETHEUS_REGISTRY.register(collector) {
        Ok(()) | Err(prometheus::Error::AlreadyReg) => Ok(()),
        Err(e) => Err(e),
    }
}

/// Export all registered metrics in Prometheus text format
pub fn gather_metrics() -> String {
    use prometheus::Encoder;
    let encoder = prometheus::TextEncoder::new();
    let metric_families = PROMETHEUS_REGISTRY.gather();
    let mut buffer = Vec::new();

    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!("Failed to encode metrics: {}", e);
        return String::from("# Error encoding metrics\n");
    }

    String::from_utf8(buffer).unwrap_or_else(|e| {
        tracing::error!("Failed to convert metrics to string: {}", e);
        String::from("# Error converting metrics\n")
    })
}

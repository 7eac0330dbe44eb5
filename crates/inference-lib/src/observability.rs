//! Observability infrastructure for the inference engine
//!
//! Prometheus metrics for prediction throughput/latency, fallback
//! activations and remote invocation outcomes. The host owns exposition;
//! this module only registers and updates the default registry.

use prometheus::{
    register_gauge_vec, register_histogram, register_int_counter, GaugeVec, Histogram, IntCounter,
};
use std::sync::OnceLock;

/// Default histogram buckets for prediction latency (in seconds)
const LATENCY_BUCKETS: &[f64] = &[
    0.0001, 0.0005, 0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0,
];

/// Global metrics instance (registered once)
static GLOBAL_METRICS: OnceLock<EngineMetricsInner> = OnceLock::new();

struct EngineMetricsInner {
    prediction_latency_seconds: Histogram,
    predictions_total: IntCounter,
    prediction_errors_total: IntCounter,
    fallback_activations_total: IntCounter,
    remote_requests_total: IntCounter,
    remote_failures_total: IntCounter,
    model_info: GaugeVec,
}

impl EngineMetricsInner {
    fn new() -> Self {
        Self {
            prediction_latency_seconds: register_histogram!(
                "inference_engine_prediction_latency_seconds",
                "Time spent classifying one feature vector",
                LATENCY_BUCKETS.to_vec()
            )
            .expect("Failed to register prediction_latency_seconds"),

            predictions_total: register_int_counter!(
                "inference_engine_predictions_total",
                "Total number of predictions served"
            )
            .expect("Failed to register predictions_total"),

            prediction_errors_total: register_int_counter!(
                "inference_engine_prediction_errors_total",
                "Total number of rejected prediction requests"
            )
            .expect("Failed to register prediction_errors_total"),

            fallback_activations_total: register_int_counter!(
                "inference_engine_fallback_activations_total",
                "Times the engine degraded to the builtin fallback model"
            )
            .expect("Failed to register fallback_activations_total"),

            remote_requests_total: register_int_counter!(
                "inference_engine_remote_requests_total",
                "Remote model invocation attempts, including retries"
            )
            .expect("Failed to register remote_requests_total"),

            remote_failures_total: register_int_counter!(
                "inference_engine_remote_failures_total",
                "Remote conversations that failed after retry handling"
            )
            .expect("Failed to register remote_failures_total"),

            model_info: register_gauge_vec!(
                "inference_engine_model_info",
                "Information about the active model bundle",
                &["version", "model_type"]
            )
            .expect("Failed to register model_info"),
        }
    }
}

/// Engine metrics handle
///
/// A lightweight handle to the global metrics instance; clones share the
/// same underlying metrics.
#[derive(Clone)]
pub struct EngineMetrics {
    _private: (),
}

impl Default for EngineMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl EngineMetrics {
    /// Create a metrics handle, initializing the global instance if needed.
    pub fn new() -> Self {
        GLOBAL_METRICS.get_or_init(EngineMetricsInner::new);
        Self { _private: () }
    }

    fn inner(&self) -> &EngineMetricsInner {
        GLOBAL_METRICS.get().expect("Metrics not initialized")
    }

    pub fn observe_prediction_latency(&self, duration_secs: f64) {
        self.inner().prediction_latency_seconds.observe(duration_secs);
    }

    pub fn inc_predictions(&self) {
        self.inner().predictions_total.inc();
    }

    pub fn inc_prediction_errors(&self) {
        self.inner().prediction_errors_total.inc();
    }

    pub fn inc_fallback_activations(&self) {
        self.inner().fallback_activations_total.inc();
    }

    pub fn inc_remote_requests(&self) {
        self.inner().remote_requests_total.inc();
    }

    pub fn inc_remote_failures(&self) {
        self.inner().remote_failures_total.inc();
    }

    /// Record the active model bundle, clearing any previous value.
    pub fn set_model_info(&self, version: &str, model_type: &str) {
        self.inner().model_info.reset();
        self.inner()
            .model_info
            .with_label_values(&[version, model_type])
            .set(1.0);
    }
}

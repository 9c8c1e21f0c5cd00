//! Application metrics for Prometheus monitoring.
//!
//! This module provides:
//! - Prometheus metrics recorder initialization
//! - Metric definitions for the live monitoring endpoint
//! - `RequestTimer` for timing handlers

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle, PrometheusRecorder};
use std::sync::{Mutex, OnceLock};
use std::time::Instant;

/// Global Prometheus handle for rendering metrics. Only set once the recorder
/// is actually installed.
static PROMETHEUS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Serializes concurrent `init_metrics` calls.
static INIT_LOCK: Mutex<()> = Mutex::new(());

/// Initialize the Prometheus metrics recorder.
///
/// Call once at startup, before any metrics are recorded.
/// Returns `true` if this call installed the recorder, `false` if metrics were
/// already initialized or another global recorder is in place.
pub fn init_metrics() -> bool {
    install_into(&PROMETHEUS_HANDLE, |recorder| {
        metrics::set_global_recorder(recorder).is_ok()
    })
}

fn install_into(
    slot: &OnceLock<PrometheusHandle>,
    install: impl FnOnce(PrometheusRecorder) -> bool,
) -> bool {
    let _guard = INIT_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    if slot.get().is_some() {
        return false;
    }

    let recorder = PrometheusBuilder::new().build_recorder();
    let handle = recorder.handle();
    if !install(recorder) {
        tracing::warn!("Failed to set global metrics recorder (already set)");
        return false;
    }

    describe_metrics();
    let _ = slot.set(handle);
    tracing::info!("Prometheus metrics initialized");
    true
}

fn describe_metrics() {
    describe_counter!(
        "api_requests_total",
        "Total number of API requests by endpoint and status"
    );
    describe_histogram!(
        "api_request_duration_seconds",
        "Duration of API requests in seconds"
    );
    describe_gauge!(
        "live_active_sessions",
        "Active time-tracking sessions seen by the last aggregation"
    );
}

/// Render current metrics in Prometheus text format.
///
/// Returns `None` if metrics are not initialized.
pub fn render_metrics() -> Option<String> {
    PROMETHEUS_HANDLE.get().map(|h| h.render())
}

/// Record a completed API request.
pub fn record_request(endpoint: &str, status: &str, duration: std::time::Duration) {
    counter!(
        "api_requests_total",
        "endpoint" => endpoint.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    histogram!("api_request_duration_seconds", "endpoint" => endpoint.to_string())
        .record(duration.as_secs_f64());
}

pub fn record_active_sessions(count: usize) {
    gauge!("live_active_sessions").set(count as f64);
}

/// Helper for timing request handlers.
///
/// ```ignore
/// let timer = RequestTimer::new("live_active_sessions");
/// // ... do work ...
/// timer.finish_ok(); // or timer.finish_err(status_code)
/// ```
pub struct RequestTimer {
    endpoint: &'static str,
    start: Instant,
}

impl RequestTimer {
    pub fn new(endpoint: &'static str) -> Self {
        Self {
            endpoint,
            start: Instant::now(),
        }
    }

    pub fn finish_ok(self) {
        record_request(self.endpoint, "200", self.start.elapsed());
    }

    pub fn finish_err(self, status: u16) {
        record_request(self.endpoint, &status.to_string(), self.start.elapsed());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_timer() {
        // Recording without an installed recorder is a no-op.
        let timer = RequestTimer::new("test_endpoint");
        timer.finish_ok();
        RequestTimer::new("test_endpoint").finish_err(500);
        record_active_sessions(3);
    }

    #[test]
    fn test_failed_install_leaves_metrics_uninitialized() {
        let slot = OnceLock::new();
        assert!(!install_into(&slot, |_recorder| false));
        assert!(slot.get().is_none());

        assert!(install_into(&slot, |_recorder| true));
        assert!(slot.get().is_some());
        assert!(!install_into(&slot, |_recorder| true));
    }

    #[test]
    fn test_init_metrics_is_idempotent() {
        init_metrics();
        assert!(!init_metrics());
        assert!(render_metrics().is_some());
    }
}

//! Metrics recording for fingerprint store operations.

use std::time::Instant;

/// Records operation metrics for a store operation.
///
/// Emits two metrics:
/// 1. `fingerprint_store_operations_total` - counter by backend, operation and status
/// 2. `fingerprint_store_operation_duration_ms` - latency histogram
///
/// # Arguments
///
/// * `backend` - Backend name ("sqlite", "memory")
/// * `operation` - Operation name ("insert", "scan", "prune", ...)
/// * `start` - Operation start time from `Instant::now()`
/// * `status` - "success" or "error"
pub fn record_operation_metrics(
    backend: &'static str,
    operation: &'static str,
    start: Instant,
    status: &'static str,
) {
    metrics::counter!(
        "fingerprint_store_operations_total",
        "backend" => backend,
        "operation" => operation,
        "status" => status
    )
    .increment(1);
    metrics::histogram!(
        "fingerprint_store_operation_duration_ms",
        "backend" => backend,
        "operation" => operation,
        "status" => status
    )
    .record(start.elapsed().as_secs_f64() * 1000.0);
}

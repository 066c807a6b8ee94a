//! Prometheus metrics for the batching pipeline.
//!
//! Collectors are process-wide and safe for concurrent updates from the
//! batching loop, the confirmation subsystem, and the finalizer.

use std::time::Instant;

use lazy_static::lazy_static;
use prometheus::{
    register_histogram_vec, register_int_counter_vec, HistogramOpts, HistogramVec, IntCounterVec,
    Registry,
};
use strew_core::BlobStatus;

use crate::errors::FailReason;

lazy_static! {
    /// Registry for all batcher metrics.
    pub static ref REGISTRY: Registry = Registry::new();

    /// Histogram tracking batch attempt duration by stage
    /// Labels: stage=[create_batch|disperse|total]
    pub static ref ATTEMPT_DURATION: HistogramVec = register_histogram_vec!(
        HistogramOpts::new(
            "strew_batcher_attempt_duration_seconds",
            "Time spent on batch attempts by stage"
        )
        .buckets(vec![0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 2.0, 5.0, 10.0, 30.0]),
        &["stage"]
    )
    .unwrap();

    /// Counter for blobs reaching a terminal state
    pub static ref COMPLETED_BLOBS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "strew_batcher_completed_blobs_total",
        "Total number of blobs completed by the batcher",
        &["state"] // state=[confirmed|failed|...]
    )
    .unwrap();

    /// Counter for bytes of blobs reaching a terminal state
    pub static ref COMPLETED_BLOB_BYTES_TOTAL: IntCounterVec = register_int_counter_vec!(
        "strew_batcher_completed_blob_bytes_total",
        "Total bytes of blobs completed by the batcher",
        &["state"]
    )
    .unwrap();

    /// Counter for blobs implicated in failed batch attempts, by fail reason
    pub static ref BATCH_ERRORS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "strew_batcher_batch_errors_total",
        "Blobs implicated in failed batch attempts",
        &["reason"] // reason=[batch_header_hash|inclusion_proof|dispatch]
    )
    .unwrap();
}

/// Helper to register all batcher metrics with the registry
pub fn register_metrics() -> Result<(), prometheus::Error> {
    REGISTRY.register(Box::new(ATTEMPT_DURATION.clone()))?;
    REGISTRY.register(Box::new(COMPLETED_BLOBS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(COMPLETED_BLOB_BYTES_TOTAL.clone()))?;
    REGISTRY.register(Box::new(BATCH_ERRORS_TOTAL.clone()))?;
    Ok(())
}

/// RAII guard observing an attempt stage duration on drop.
#[derive(Debug)]
pub struct TimingGuard {
    start: Instant,
    stage: &'static str,
}

impl TimingGuard {
    pub fn new(stage: &'static str) -> Self {
        Self {
            start: Instant::now(),
            stage,
        }
    }
}

impl Drop for TimingGuard {
    fn drop(&mut self) {
        ATTEMPT_DURATION
            .with_label_values(&[self.stage])
            .observe(self.start.elapsed().as_secs_f64());
    }
}

/// Observes the duration of one attempt stage.
pub fn observe_stage(stage: &str, duration: std::time::Duration) {
    ATTEMPT_DURATION
        .with_label_values(&[stage])
        .observe(duration.as_secs_f64());
}

/// Records a blob reaching a terminal state.
pub fn record_completed_blob(size_bytes: u64, state: BlobStatus) {
    COMPLETED_BLOBS_TOTAL.with_label_values(&[state.as_str()]).inc();
    COMPLETED_BLOB_BYTES_TOTAL
        .with_label_values(&[state.as_str()])
        .inc_by(size_bytes);
}

/// Bumps the aggregate batch error counter for one failed attempt, weighted
/// by the number of implicated blobs.
pub fn record_batch_error(reason: FailReason, blob_count: usize) {
    BATCH_ERRORS_TOTAL
        .with_label_values(&[reason.as_str()])
        .inc_by(blob_count as u64);
}

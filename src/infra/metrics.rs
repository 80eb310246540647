//! Metric names emitted by the repository backends.

use std::time::Instant;

use metrics::{counter, histogram};

pub const METRIC_STORE_SAVE_TOTAL: &str = "ventus_store_save_total";
pub const METRIC_STORE_DELETE_TOTAL: &str = "ventus_store_delete_total";
pub const METRIC_STORE_CONFLICT_TOTAL: &str = "ventus_store_conflict_total";
pub const METRIC_STORE_LOAD_SKIPPED_TOTAL: &str = "ventus_store_load_skipped_total";
pub const METRIC_STORE_WRITE_MS: &str = "ventus_store_write_ms";

pub(crate) fn record_save(backend: &'static str, started_at: Instant) {
    counter!(METRIC_STORE_SAVE_TOTAL, "backend" => backend).increment(1);
    histogram!(METRIC_STORE_WRITE_MS, "backend" => backend)
        .record(started_at.elapsed().as_secs_f64() * 1000.0);
}

pub(crate) fn record_delete(backend: &'static str) {
    counter!(METRIC_STORE_DELETE_TOTAL, "backend" => backend).increment(1);
}

pub(crate) fn record_conflict(backend: &'static str, kind: &'static str) {
    counter!(METRIC_STORE_CONFLICT_TOTAL, "backend" => backend, "kind" => kind).increment(1);
}

pub(crate) fn record_load_skipped() {
    counter!(METRIC_STORE_LOAD_SKIPPED_TOTAL).increment(1);
}

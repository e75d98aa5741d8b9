//! Lightweight global metrics for TxrmIO.
//!
//! Потокобезопасные атомарные счётчики для подсистем:
//! - stream IO (reads / writes / bytes)
//! - save engine (saves, pages written / pruned)
//! - array classifier (const / dynamic)

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

// ----- Stream IO -----
static STREAMS_READ: AtomicU64 = AtomicU64::new(0);
static BYTES_READ: AtomicU64 = AtomicU64::new(0);
static STREAMS_WRITTEN: AtomicU64 = AtomicU64::new(0);
static BYTES_WRITTEN: AtomicU64 = AtomicU64::new(0);

// ----- Save engine -----
static SAVES_TOTAL: AtomicU64 = AtomicU64::new(0);
static SAVES_REJECTED: AtomicU64 = AtomicU64::new(0);
static PAGES_WRITTEN: AtomicU64 = AtomicU64::new(0);
static PAGES_PRUNED: AtomicU64 = AtomicU64::new(0);

// ----- Classifier -----
static ARRAYS_CONST: AtomicU64 = AtomicU64::new(0);
static ARRAYS_DYNAMIC: AtomicU64 = AtomicU64::new(0);

#[derive(Debug, Clone, Default, Serialize)]
pub struct MetricsSnapshot {
    pub streams_read: u64,
    pub bytes_read: u64,
    pub streams_written: u64,
    pub bytes_written: u64,

    pub saves_total: u64,
    pub saves_rejected: u64,
    pub pages_written: u64,
    pub pages_pruned: u64,

    pub arrays_const: u64,
    pub arrays_dynamic: u64,
}

impl MetricsSnapshot {
    pub fn avg_stream_read_bytes(&self) -> f64 {
        if self.streams_read == 0 {
            0.0
        } else {
            self.bytes_read as f64 / self.streams_read as f64
        }
    }
}

// ----- Recorders (Stream IO) -----
pub fn record_stream_read(bytes: usize) {
    STREAMS_READ.fetch_add(1, Ordering::Relaxed);
    BYTES_READ.fetch_add(bytes as u64, Ordering::Relaxed);
}

pub fn record_stream_written(bytes: usize) {
    STREAMS_WRITTEN.fetch_add(1, Ordering::Relaxed);
    BYTES_WRITTEN.fetch_add(bytes as u64, Ordering::Relaxed);
}

// ----- Recorders (Save) -----
pub fn record_save(pages_written: u64, pages_pruned: u64) {
    SAVES_TOTAL.fetch_add(1, Ordering::Relaxed);
    PAGES_WRITTEN.fetch_add(pages_written, Ordering::Relaxed);
    PAGES_PRUNED.fetch_add(pages_pruned, Ordering::Relaxed);
}

pub fn record_save_rejected() {
    SAVES_REJECTED.fetch_add(1, Ordering::Relaxed);
}

// ----- Recorders (Classifier) -----
pub fn record_classified(constant: usize, dynamic: usize) {
    ARRAYS_CONST.fetch_add(constant as u64, Ordering::Relaxed);
    ARRAYS_DYNAMIC.fetch_add(dynamic as u64, Ordering::Relaxed);
}

// ----- Snapshot / Reset -----
pub fn snapshot() -> MetricsSnapshot {
    MetricsSnapshot {
        streams_read: STREAMS_READ.load(Ordering::Relaxed),
        bytes_read: BYTES_READ.load(Ordering::Relaxed),
        streams_written: STREAMS_WRITTEN.load(Ordering::Relaxed),
        bytes_written: BYTES_WRITTEN.load(Ordering::Relaxed),

        saves_total: SAVES_TOTAL.load(Ordering::Relaxed),
        saves_rejected: SAVES_REJECTED.load(Ordering::Relaxed),
        pages_written: PAGES_WRITTEN.load(Ordering::Relaxed),
        pages_pruned: PAGES_PRUNED.load(Ordering::Relaxed),

        arrays_const: ARRAYS_CONST.load(Ordering::Relaxed),
        arrays_dynamic: ARRAYS_DYNAMIC.load(Ordering::Relaxed),
    }
}

pub fn reset() {
    STREAMS_READ.store(0, Ordering::Relaxed);
    BYTES_READ.store(0, Ordering::Relaxed);
    STREAMS_WRITTEN.store(0, Ordering::Relaxed);
    BYTES_WRITTEN.store(0, Ordering::Relaxed);

    SAVES_TOTAL.store(0, Ordering::Relaxed);
    SAVES_REJECTED.store(0, Ordering::Relaxed);
    PAGES_WRITTEN.store(0, Ordering::Relaxed);
    PAGES_PRUNED.store(0, Ordering::Relaxed);

    ARRAYS_CONST.store(0, Ordering::Relaxed);
    ARRAYS_DYNAMIC.store(0, Ordering::Relaxed);
}

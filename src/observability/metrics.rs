//! Thread-safe metrics collection system
//!
//! Provides atomic counters and mutex-protected collections for tracking
//! operational statistics across trace generation, the tutor, and session
//! storage.

use once_cell::sync::Lazy;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

/// Global metrics collector instance
pub static METRICS: Lazy<MetricsCollector> = Lazy::new(MetricsCollector::new);

/// Get reference to global metrics collector
pub fn metrics() -> &'static MetricsCollector {
    &METRICS
}

/// Thread-safe metrics collector using atomics and mutexes
pub struct MetricsCollector {
    // Trace generation metrics (atomic for high frequency)
    traces_generated: AtomicU64,
    traces_failed: AtomicU64,

    // Per-algorithm counts (mutex protected for keyed data)
    traces_by_algorithm: Mutex<HashMap<String, u64>>,

    // Tutor metrics
    tutor_requests: AtomicU64,
    tutor_llm_replies: AtomicU64,
    tutor_fallback_replies: AtomicU64,
    llm_failures: AtomicU64,

    // Session store metrics
    sessions_created: AtomicU64,
    sessions_evicted: AtomicU64,
    sessions_expired: AtomicU64,
    messages_trimmed: AtomicU64,

    // Lifecycle metrics
    uptime_start: AtomicU64,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self {
            traces_generated: AtomicU64::new(0),
            traces_failed: AtomicU64::new(0),
            traces_by_algorithm: Mutex::new(HashMap::new()),
            tutor_requests: AtomicU64::new(0),
            tutor_llm_replies: AtomicU64::new(0),
            tutor_fallback_replies: AtomicU64::new(0),
            llm_failures: AtomicU64::new(0),
            sessions_created: AtomicU64::new(0),
            sessions_evicted: AtomicU64::new(0),
            sessions_expired: AtomicU64::new(0),
            messages_trimmed: AtomicU64::new(0),
            uptime_start: AtomicU64::new(current_timestamp()),
        }
    }

    // Trace generation metrics
    pub fn trace_generated(&self, algorithm: &str) {
        self.traces_generated.fetch_add(1, Ordering::Relaxed);

        if let Ok(mut by_algorithm) = self.traces_by_algorithm.lock() {
            *by_algorithm.entry(algorithm.to_string()).or_insert(0) += 1;
        }
    }

    pub fn trace_failed(&self) {
        self.traces_failed.fetch_add(1, Ordering::Relaxed);
    }

    // Tutor metrics
    pub fn tutor_request(&self) {
        self.tutor_requests.fetch_add(1, Ordering::Relaxed);
    }

    pub fn tutor_llm_reply(&self) {
        self.tutor_llm_replies.fetch_add(1, Ordering::Relaxed);
    }

    pub fn tutor_fallback_reply(&self) {
        self.tutor_fallback_replies.fetch_add(1, Ordering::Relaxed);
    }

    pub fn llm_failure(&self) {
        self.llm_failures.fetch_add(1, Ordering::Relaxed);
    }

    // Session store metrics
    pub fn session_created(&self) {
        self.sessions_created.fetch_add(1, Ordering::Relaxed);
    }

    pub fn session_evicted(&self) {
        self.sessions_evicted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn sessions_expired(&self, count: u64) {
        self.sessions_expired.fetch_add(count, Ordering::Relaxed);
    }

    pub fn messages_trimmed(&self, count: u64) {
        self.messages_trimmed.fetch_add(count, Ordering::Relaxed);
    }

    /// Copy per-algorithm counts out of the mutex (pure function)
    fn snapshot_by_algorithm(&self) -> HashMap<String, u64> {
        self.traces_by_algorithm
            .lock()
            .map(|m| m.clone())
            .unwrap_or_default()
    }

    // Reset all metrics (useful for testing)
    pub fn reset(&self) {
        self.traces_generated.store(0, Ordering::Relaxed);
        self.traces_failed.store(0, Ordering::Relaxed);
        self.tutor_requests.store(0, Ordering::Relaxed);
        self.tutor_llm_replies.store(0, Ordering::Relaxed);
        self.tutor_fallback_replies.store(0, Ordering::Relaxed);
        self.llm_failures.store(0, Ordering::Relaxed);
        self.sessions_created.store(0, Ordering::Relaxed);
        self.sessions_evicted.store(0, Ordering::Relaxed);
        self.sessions_expired.store(0, Ordering::Relaxed);
        self.messages_trimmed.store(0, Ordering::Relaxed);
        self.uptime_start
            .store(current_timestamp(), Ordering::Relaxed);

        if let Ok(mut by_algorithm) = self.traces_by_algorithm.lock() {
            by_algorithm.clear();
        }
    }

    /// Get complete metrics snapshot
    pub fn get_metrics(&self) -> MetricsSnapshot {
        let now = current_timestamp();

        MetricsSnapshot {
            traces: TraceMetrics {
                traces_generated: self.traces_generated.load(Ordering::Relaxed),
                traces_failed: self.traces_failed.load(Ordering::Relaxed),
                by_algorithm: self.snapshot_by_algorithm(),
            },
            tutor: TutorMetrics {
                requests: self.tutor_requests.load(Ordering::Relaxed),
                llm_replies: self.tutor_llm_replies.load(Ordering::Relaxed),
                fallback_replies: self.tutor_fallback_replies.load(Ordering::Relaxed),
                llm_failures: self.llm_failures.load(Ordering::Relaxed),
            },
            sessions: SessionMetrics {
                sessions_created: self.sessions_created.load(Ordering::Relaxed),
                sessions_evicted: self.sessions_evicted.load(Ordering::Relaxed),
                sessions_expired: self.sessions_expired.load(Ordering::Relaxed),
                messages_trimmed: self.messages_trimmed.load(Ordering::Relaxed),
            },
            uptime_seconds: now.saturating_sub(self.uptime_start.load(Ordering::Relaxed)),
            timestamp: now,
        }
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}

// Public metrics structures
#[derive(Debug, Serialize)]
pub struct MetricsSnapshot {
    pub traces: TraceMetrics,
    pub tutor: TutorMetrics,
    pub sessions: SessionMetrics,
    pub uptime_seconds: u64,
    pub timestamp: u64,
}

#[derive(Debug, Serialize)]
pub struct TraceMetrics {
    pub traces_generated: u64,
    pub traces_failed: u64,
    pub by_algorithm: HashMap<String, u64>,
}

#[derive(Debug, Serialize)]
pub struct TutorMetrics {
    pub requests: u64,
    pub llm_replies: u64,
    pub fallback_replies: u64,
    pub llm_failures: u64,
}

#[derive(Debug, Serialize)]
pub struct SessionMetrics {
    pub sessions_created: u64,
    pub sessions_evicted: u64,
    pub sessions_expired: u64,
    pub messages_trimmed: u64,
}

// Helper functions
fn current_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

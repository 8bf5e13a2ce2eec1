// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! In-process delivery metrics.
//!
//! Lightweight counters and timings for queueing, flushing and querying,
//! without an external metrics stack. Background delivery failures are never
//! surfaced to callers, so these counters are the way to notice them.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock};
use std::time::{Duration, Instant};

use once_cell::sync::Lazy;

/// Global metrics instance.
pub static GLOBAL_METRICS: Lazy<Metrics> = Lazy::new(Metrics::new);

/// Central metrics collection.
#[derive(Debug)]
pub struct Metrics {
    /// Timed operations by name (`keen.flush`, `keen.query`, ...).
    operations: RwLock<HashMap<String, OperationMetrics>>,

    /// Event delivery counters.
    delivery: DeliveryCounters,

    /// Start time for calculating uptime.
    start_time: Instant,
}

impl Metrics {
    /// Create a new metrics collector.
    pub fn new() -> Self {
        Self {
            operations: RwLock::new(HashMap::new()),
            delivery: DeliveryCounters::default(),
            start_time: Instant::now(),
        }
    }

    /// Record a timed operation and whether it succeeded.
    pub fn record_operation(&self, name: &str, duration: Duration, success: bool) {
        let mut ops = self.operations.write().unwrap_or_else(PoisonError::into_inner);
        ops.entry(name.to_string())
            .or_insert_with(OperationMetrics::new)
            .record(duration, success);
    }

    /// Events accepted into the queue.
    pub fn record_queued(&self, events: u64) {
        self.delivery.queued.fetch_add(events, Ordering::Relaxed);
    }

    /// Events the API accepted.
    pub fn record_sent(&self, events: u64) {
        self.delivery.sent.fetch_add(events, Ordering::Relaxed);
    }

    /// Events lost to a failed request.
    pub fn record_failed(&self, events: u64) {
        self.delivery.failed.fetch_add(events, Ordering::Relaxed);
    }

    /// One queue flush.
    pub fn record_flush(&self) {
        self.delivery.flushes.fetch_add(1, Ordering::Relaxed);
    }

    /// Get metrics for a specific operation.
    pub fn operation_metrics(&self, name: &str) -> Option<OperationMetrics> {
        self.operations
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    /// Get uptime since metrics were initialized.
    pub fn uptime(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Take a snapshot of all metrics.
    pub fn snapshot(&self) -> MetricsSnapshot {
        let operations = self
            .operations
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();

        MetricsSnapshot {
            operations,
            events_queued: self.delivery.queued.load(Ordering::Relaxed),
            events_sent: self.delivery.sent.load(Ordering::Relaxed),
            events_failed: self.delivery.failed.load(Ordering::Relaxed),
            flushes: self.delivery.flushes.load(Ordering::Relaxed),
            uptime: self.uptime(),
        }
    }

    /// Reset all metrics.
    pub fn reset(&self) {
        self.operations
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        self.delivery.reset();
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Default)]
struct DeliveryCounters {
    queued: AtomicU64,
    sent: AtomicU64,
    failed: AtomicU64,
    flushes: AtomicU64,
}

impl DeliveryCounters {
    fn reset(&self) {
        for counter in [&self.queued, &self.sent, &self.failed, &self.flushes] {
            counter.store(0, Ordering::Relaxed);
        }
    }
}

/// Timing statistics for one kind of operation.
#[derive(Debug, Clone)]
pub struct OperationMetrics {
    pub count: u64,
    pub failures: u64,
    pub total_duration: Duration,
    pub min_duration: Duration,
    pub max_duration: Duration,
}

impl OperationMetrics {
    pub fn new() -> Self {
        Self {
            count: 0,
            failures: 0,
            total_duration: Duration::ZERO,
            min_duration: Duration::MAX,
            max_duration: Duration::ZERO,
        }
    }

    pub fn record(&mut self, duration: Duration, success: bool) {
        self.count += 1;
        if !success {
            self.failures += 1;
        }
        self.total_duration += duration;
        self.min_duration = self.min_duration.min(duration);
        self.max_duration = self.max_duration.max(duration);
    }

    pub fn avg_duration(&self) -> Duration {
        if self.count == 0 {
            Duration::ZERO
        } else {
            self.total_duration / self.count as u32
        }
    }
}

impl Default for OperationMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// A snapshot of all metrics at a point in time.
#[derive(Debug, Clone)]
pub struct MetricsSnapshot {
    pub operations: HashMap<String, OperationMetrics>,
    pub events_queued: u64,
    pub events_sent: u64,
    pub events_failed: u64,
    pub flushes: u64,
    pub uptime: Duration,
}

impl MetricsSnapshot {
    /// Format as a human-readable report.
    pub fn format_report(&self) -> String {
        let mut report = String::new();

        report.push_str("=== Keen Metrics ===\n\n");
        report.push_str(&format!("Uptime: {:.2?}\n", self.uptime));
        report.push_str(&format!(
            "Events: {} queued, {} sent, {} failed ({} flushes)\n",
            self.events_queued, self.events_sent, self.events_failed, self.flushes
        ));

        if !self.operations.is_empty() {
            report.push_str("\nOperations:\n");
            let mut names: Vec<_> = self.operations.keys().collect();
            names.sort();
            for name in names {
                let metrics = &self.operations[name];
                report.push_str(&format!(
                    "  {}: {} ops ({} failed), avg {:.2?}, max {:.2?}\n",
                    name,
                    metrics.count,
                    metrics.failures,
                    metrics.avg_duration(),
                    metrics.max_duration
                ));
            }
        }

        report
    }
}

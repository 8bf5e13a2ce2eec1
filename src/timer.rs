// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Keyed stopwatch for measuring named spans such as model load or render time.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use once_cell::sync::Lazy;
use tokio::time::Instant;

/// Track key used when the caller does not name one.
pub const DEFAULT_TRACK_KEY: &str = "general";

/// Process-wide origin for [`performance_now`].
static ORIGIN: Lazy<Instant> = Lazy::new(Instant::now);

/// Milliseconds since an arbitrary, fixed origin, from a monotonic clock.
///
/// Uses tokio's clock, so paused test runtimes see deterministic values. A
/// paused runtime may report times before the origin; those come out negative.
pub fn performance_now() -> f64 {
    let now = Instant::now();
    match now.checked_duration_since(*ORIGIN) {
        Some(elapsed) => elapsed.as_secs_f64() * 1000.0,
        None => -(ORIGIN.duration_since(now).as_secs_f64() * 1000.0),
    }
}

/// A source of millisecond timestamps.
pub trait Clock: fmt::Debug + Send + Sync {
    fn now_ms(&self) -> f64;
}

/// High-resolution monotonic clock (the default).
#[derive(Debug, Clone, Copy, Default)]
pub struct MonotonicClock;

impl Clock for MonotonicClock {
    fn now_ms(&self) -> f64 {
        performance_now()
    }
}

/// Wall-clock milliseconds since the Unix epoch.
///
/// Less precise and not monotonic, but always available.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> f64 {
        chrono::Utc::now().timestamp_millis() as f64
    }
}

/// Table of in-progress tracks, keyed by name.
#[derive(Debug)]
pub struct PerformanceTimer {
    tracks: HashMap<String, f64>,
    clock: Arc<dyn Clock>,
}

impl PerformanceTimer {
    /// Create a timer backed by the monotonic clock.
    pub fn new() -> Self {
        Self::with_clock(Arc::new(MonotonicClock))
    }

    /// Create a timer with a custom clock.
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            tracks: HashMap::new(),
            clock,
        }
    }

    /// Start tracking `key`, returning the start time.
    ///
    /// Returns `None` and leaves the original start time alone if `key` is
    /// already being tracked.
    pub fn start(&mut self, key: &str) -> Option<f64> {
        if self.tracks.contains_key(key) {
            return None;
        }
        let now = self.clock.now_ms();
        self.tracks.insert(key.to_string(), now);
        Some(now)
    }

    /// Whether `key` has been started and not yet ended.
    pub fn is_tracking(&self, key: &str) -> bool {
        self.tracks.contains_key(key)
    }

    /// Stop tracking `key` and return the elapsed milliseconds.
    ///
    /// Returns `None` if `key` was never started or was already ended.
    pub fn end(&mut self, key: &str) -> Option<f64> {
        let started = self.tracks.remove(key)?;
        Some((self.clock.now_ms() - started).max(0.0))
    }

    /// Number of tracks currently in progress.
    pub fn active_tracks(&self) -> usize {
        self.tracks.len()
    }
}

impl Default for PerformanceTimer {
    fn default() -> Self {
        Self::new()
    }
}

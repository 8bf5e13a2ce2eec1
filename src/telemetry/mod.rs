// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Logging and metrics infrastructure.
//!
//! - **Logging**: structured `tracing` events. Request mirroring (development
//!   mode) logs at `info`, background delivery failures at `warn`.
//! - **Metrics**: delivery counters and operation timings in [`GLOBAL_METRICS`],
//!   recorded when the `telemetry` feature is enabled.
//!
//! # Usage
//!
//! Initialize logging at application startup:
//!
//! ```rust,ignore
//! use keen::telemetry::{init_telemetry, TelemetryConfig};
//!
//! init_telemetry(&TelemetryConfig::development())?;
//! ```
//!
//! Libraries embedding `keen` should leave subscriber setup to the application.

mod init;
pub mod metrics;

pub use init::{init_telemetry, TelemetryConfig};
pub use metrics::{Metrics, MetricsSnapshot, OperationMetrics, GLOBAL_METRICS};

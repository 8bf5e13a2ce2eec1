// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Keen - event analytics client for the Keen.IO API.
//!
//! Batches application events, enriches them with shared metadata and
//! delivers them over HTTP, measures page views, and runs analysis queries.
//!
//! # Architecture
//!
//! The crate is organized into the following modules:
//!
//! - [`value`] - Dynamic event payload values
//! - [`merge`] - Non-mutating deep merge of payload objects
//! - [`timer`] - Keyed performance stopwatch
//! - [`queue`] - Pending events grouped by collection
//! - [`debounce`] - Cancel-and-reschedule flush timer
//! - [`client`] - The [`Keen`] service: sending, flushing, querying
//! - [`page_view`] - Page-view events with load and render timings
//! - [`transport`] - HTTP transport trait and `reqwest` implementation
//! - [`config`] - Configuration loading and merging
//! - [`telemetry`] - Logging setup and delivery metrics
//! - [`error`] - Error types and result aliases
//!
//! # Example
//!
//! ```rust,ignore
//! use keen::config::{load_config, CliOptions};
//! use keen::{Keen, Object};
//!
//! let config = load_config(".".as_ref(), CliOptions::default())?;
//! let keen = Keen::from_config(config)?;
//!
//! keen.send_event("signups", Object::new(), false);
//! let total = keen.query("count", Some("signups"), Object::new()).await?;
//! keen.flush().await?;
//! ```

pub mod client;
pub mod config;
pub mod debounce;
pub mod error;
pub mod merge;
pub mod page_view;
pub mod queue;
pub mod telemetry;
pub mod timer;
pub mod transport;
pub mod value;

// Re-export commonly used types at crate root
pub use client::{Keen, DEFAULT_QUERY_ACTION, DEFAULT_TIMEFRAME};
pub use config::KeenConfig;
pub use error::{ConfigError, KeenError, Result, TransportError};
pub use merge::merge_deep;
pub use page_view::{NavigationSignal, PageRecord, PageViewTracker, RouteInfo};
pub use queue::EventBatch;
pub use timer::{PerformanceTimer, DEFAULT_TRACK_KEY};
pub use transport::{AuthMode, HttpTransport, Transport};
pub use value::{object_from_json, object_to_json, Instance, Object, Value};

/// Keen version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

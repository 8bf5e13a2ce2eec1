// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! The analytics service.
//!
//! [`Keen`] owns everything with a lifetime: the pending event queue, the
//! debounced flush, the performance track table and the previous-page record.
//! It is a cheap `Clone` handle, so every consumer (page-view tracking,
//! background flushes, application code) shares the same state.
//!
//! # Example
//!
//! ```rust,ignore
//! use keen::{Keen, KeenConfig, Object};
//!
//! let keen = Keen::from_config(KeenConfig::for_project("p").with_write_key("w"))?;
//! keen.send_event("signups", Object::new(), false);
//! keen.flush().await?;
//! ```

use std::sync::{Arc, Mutex};
use std::time::Instant;

use chrono::{SecondsFormat, Utc};
use reqwest::Url;
use tokio::runtime::Handle;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::JoinHandle;
use tracing::{info, warn};

#[cfg(feature = "telemetry")]
use tracing::debug;

use crate::config::KeenConfig;
use crate::debounce::{lock, Debouncer};
use crate::error::KeenError;
use crate::merge::merge_deep;
use crate::page_view::{NavigationSignal, PageRecord, PageViewTracker};
use crate::queue::{batch_to_json, EventBatch, EventQueue};
use crate::timer::{Clock, MonotonicClock, PerformanceTimer};
use crate::transport::{HttpTransport, QueryParams, Transport};
use crate::value::{object_to_json, Object, Value};

#[cfg(feature = "telemetry")]
use crate::telemetry::GLOBAL_METRICS;

/// Query action used when the caller does not name one.
pub const DEFAULT_QUERY_ACTION: &str = "count";

/// Timeframe applied to queries that do not set one.
pub const DEFAULT_TIMEFRAME: &str = "this_1_month";

struct Inner {
    config: KeenConfig,
    transport: Arc<dyn Transport>,
    queue: Mutex<EventQueue>,
    debouncer: Debouncer,
    timer: Mutex<PerformanceTimer>,
    previous_page: Mutex<Option<PageRecord>>,
}

/// Handle to the analytics service.
#[derive(Clone)]
pub struct Keen {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for Keen {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Keen")
            .field("config", &self.inner.config.redacted())
            .field("pending_events", &self.pending_events())
            .finish()
    }
}

impl Keen {
    /// Create a service that talks to the API through `transport`.
    pub fn new(config: KeenConfig, transport: Arc<dyn Transport>) -> Self {
        Self::with_clock(config, transport, Arc::new(MonotonicClock))
    }

    /// Create a service whose performance tracks read time from `clock`.
    pub fn with_clock(
        config: KeenConfig,
        transport: Arc<dyn Transport>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let debouncer = Debouncer::new(config.queue_duration());
        Self {
            inner: Arc::new(Inner {
                config,
                transport,
                queue: Mutex::new(EventQueue::new()),
                debouncer,
                timer: Mutex::new(PerformanceTimer::with_clock(clock)),
                previous_page: Mutex::new(None),
            }),
        }
    }

    /// Create a service backed by [`HttpTransport`].
    pub fn from_config(config: KeenConfig) -> Result<Self, KeenError> {
        let transport = HttpTransport::new(config.auth_mode, config.timeout())?;
        Ok(Self::new(config, Arc::new(transport)))
    }

    pub fn config(&self) -> &KeenConfig {
        &self.inner.config
    }

    pub fn can_write(&self) -> bool {
        self.inner.config.can_write()
    }

    pub fn can_read(&self) -> bool {
        self.inner.config.can_read()
    }

    /// Number of events waiting for the next flush.
    pub fn pending_events(&self) -> usize {
        lock(&self.inner.queue).len()
    }

    // ========================================================================
    // Writes
    // ========================================================================

    /// Record an event in `collection`.
    ///
    /// The payload is enriched with `keen.timestamp` and the configured merge
    /// data. Unless `send_instantly` is set, it joins the queue and the
    /// debounced flush is restarted. Returns `false` if write credentials are
    /// missing or there is no runtime to deliver on.
    pub fn send_event(&self, collection: &str, data: Object, send_instantly: bool) -> bool {
        let payload = self.enrich(&data);
        self.log_request(Some(collection), &object_to_json(&payload));

        if !self.can_write() {
            return false;
        }

        if send_instantly {
            return match self.collection_url(collection) {
                Ok(url) => self.spawn_delivery(url, object_to_json(&payload), 1),
                Err(e) => {
                    warn!(collection = %collection, error = %e, "Dropping event");
                    false
                }
            };
        }

        if Handle::try_current().is_err() {
            warn!(collection = %collection, "No tokio runtime, dropping event");
            return false;
        }

        lock(&self.inner.queue).push(collection, payload);

        #[cfg(feature = "telemetry")]
        GLOBAL_METRICS.record_queued(1);

        let keen = self.clone();
        let scheduled = self.inner.debouncer.schedule(move || async move {
            // Failures are logged and counted inside.
            let _ = keen.process_queue().await;
        });

        if let Err(e) = scheduled {
            warn!(error = %e, "Could not schedule queue flush");
            return false;
        }
        true
    }

    /// Enrich and post a single event right away, returning the API response.
    pub async fn send_event_immediately(
        &self,
        collection: &str,
        data: Object,
    ) -> Result<serde_json::Value, KeenError> {
        let payload = object_to_json(&self.enrich(&data));
        self.log_request(Some(collection), &payload);

        let started = Instant::now();
        let result = async {
            let url = self.collection_url(collection)?;
            self.deliver(&url, &payload, 1).await
        }
        .await;

        #[cfg(feature = "telemetry")]
        GLOBAL_METRICS.record_operation("keen.send_event_immediately", started.elapsed(), result.is_ok());
        #[cfg(not(feature = "telemetry"))]
        let _ = started;

        result
    }

    /// Post several collections at once, bypassing the queue.
    ///
    /// Payloads are sent as given, without enrichment.
    pub fn send_events(&self, events: EventBatch) -> bool {
        let payload = batch_to_json(&events);
        self.log_request(None, &payload);

        if !self.can_write() {
            return false;
        }

        let count = events.values().map(Vec::len).sum::<usize>() as u64;
        match self.events_url() {
            Ok(url) => self.spawn_delivery(url, payload, count),
            Err(e) => {
                warn!(events = count, error = %e, "Dropping events");
                false
            }
        }
    }

    /// Cancel the pending debounce and send everything queued now.
    pub async fn flush(&self) -> Result<(), KeenError> {
        self.inner.debouncer.cancel();
        self.process_queue().await
    }

    async fn process_queue(&self) -> Result<(), KeenError> {
        let batch = lock(&self.inner.queue).take();
        if batch.is_empty() {
            return Ok(());
        }

        let count = batch.values().map(Vec::len).sum::<usize>() as u64;

        #[cfg(feature = "telemetry")]
        {
            GLOBAL_METRICS.record_flush();
            debug!(events = count, collections = batch.len(), "Flushing event queue");
        }

        let started = Instant::now();
        let result = async {
            let url = self.events_url()?;
            self.deliver(&url, &batch_to_json(&batch), count).await
        }
        .await;

        #[cfg(feature = "telemetry")]
        GLOBAL_METRICS.record_operation("keen.flush", started.elapsed(), result.is_ok());
        #[cfg(not(feature = "telemetry"))]
        let _ = started;

        result.map(|_| ())
    }

    fn spawn_delivery(&self, url: String, payload: serde_json::Value, events: u64) -> bool {
        let runtime = match Handle::try_current() {
            Ok(runtime) => runtime,
            Err(_) => {
                warn!(url = %url, events, "No tokio runtime, dropping events");
                return false;
            }
        };

        let keen = self.clone();
        runtime.spawn(async move {
            let _ = keen.deliver(&url, &payload, events).await;
        });
        true
    }

    async fn deliver(
        &self,
        url: &str,
        payload: &serde_json::Value,
        events: u64,
    ) -> Result<serde_json::Value, KeenError> {
        let key = self.write_key()?;
        let result = self.inner.transport.post(url, key, payload).await;

        match &result {
            Ok(_) => {
                #[cfg(feature = "telemetry")]
                GLOBAL_METRICS.record_sent(events);
            }
            Err(e) => {
                warn!(url = %url, events, error = %e, "Failed to deliver events");
                #[cfg(feature = "telemetry")]
                GLOBAL_METRICS.record_failed(events);
            }
        }

        result.map_err(KeenError::from)
    }

    // ========================================================================
    // Reads
    // ========================================================================

    /// Run an analysis query and return its `result`.
    ///
    /// `event_collection` is set from `collection` when given, and `timeframe`
    /// defaults to `this_1_month`. Other parameters come from `data`.
    pub async fn query(
        &self,
        action: &str,
        collection: Option<&str>,
        data: Object,
    ) -> Result<serde_json::Value, KeenError> {
        if !self.can_read() {
            return Err(KeenError::missing_read_credentials());
        }
        let key = self.inner.config.read_key.as_deref().unwrap_or_default();

        let params = query_params(collection, &data);
        let url = self.query_url(action)?;
        if self.inner.config.should_log_requests() {
            info!(action = %action, params = %serde_json::Value::Object(params.clone()), "Keen query");
        }

        let started = Instant::now();
        let result = self.run_query(&url, key, &params).await;

        #[cfg(feature = "telemetry")]
        GLOBAL_METRICS.record_operation("keen.query", started.elapsed(), result.is_ok());
        #[cfg(not(feature = "telemetry"))]
        let _ = started;

        result
    }

    async fn run_query(
        &self,
        url: &str,
        key: &str,
        params: &QueryParams,
    ) -> Result<serde_json::Value, KeenError> {
        let mut response = self
            .inner
            .transport
            .get(url, key, params)
            .await
            .map_err(|e| KeenError::Query(e.to_string()))?;

        if let Some(result) = response.get_mut("result") {
            return Ok(result.take());
        }

        warn!(url = %url, response = %response, "Query response has no result");
        Err(KeenError::Query("response has no result".to_string()))
    }

    // ========================================================================
    // Performance tracks
    // ========================================================================

    /// Start timing `key`. No-op if it is already running.
    pub fn start_performance_track(&self, key: &str) -> Option<f64> {
        lock(&self.inner.timer).start(key)
    }

    /// Stop timing `key` and return the elapsed milliseconds.
    pub fn end_performance_track(&self, key: &str) -> Option<f64> {
        lock(&self.inner.timer).end(key)
    }

    pub fn is_performance_tracking(&self, key: &str) -> bool {
        lock(&self.inner.timer).is_tracking(key)
    }

    // ========================================================================
    // Page views
    // ========================================================================

    /// Page-view tracker bound to this service.
    pub fn page_views(&self) -> PageViewTracker {
        PageViewTracker::new(self.clone())
    }

    /// Track every navigation reported on `signals` in the background.
    pub fn track_all_page_views(
        &self,
        signals: UnboundedReceiver<NavigationSignal>,
    ) -> Result<JoinHandle<()>, KeenError> {
        self.page_views().spawn(signals)
    }

    /// The page of the most recent navigation that reached rendering.
    pub fn previous_page(&self) -> Option<PageRecord> {
        lock(&self.inner.previous_page).clone()
    }

    pub(crate) fn replace_previous_page(&self, page: PageRecord) -> Option<PageRecord> {
        lock(&self.inner.previous_page).replace(page)
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    fn enrich(&self, data: &Object) -> Object {
        let timestamp = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
        let mut keen = Object::new();
        keen.insert("timestamp".to_string(), Value::String(timestamp));
        let mut stamp = Object::new();
        stamp.insert("keen".to_string(), Value::Object(keen));

        merge_deep([&stamp, &self.inner.config.merge_data, data])
    }

    fn log_request(&self, collection: Option<&str>, payload: &serde_json::Value) {
        if self.inner.config.should_log_requests() {
            info!(collection = collection.unwrap_or("*"), payload = %payload, "Keen track");
        }
    }

    fn write_key(&self) -> Result<&str, KeenError> {
        if !self.can_write() {
            return Err(KeenError::missing_write_credentials());
        }
        Ok(self.inner.config.write_key.as_deref().unwrap_or_default())
    }

    /// `{base_url}/{project_id}` followed by `segments`, each percent-encoded.
    fn endpoint(&self, segments: &[&str]) -> Result<String, KeenError> {
        let config = &self.inner.config;
        let invalid = || KeenError::InvalidUrl(config.base_url.clone());

        let mut url = Url::parse(&config.base_url).map_err(|_| invalid())?;
        url.path_segments_mut()
            .map_err(|_| invalid())?
            .pop_if_empty()
            .push(config.project_id.as_deref().unwrap_or_default())
            .extend(segments);
        Ok(url.into())
    }

    fn events_url(&self) -> Result<String, KeenError> {
        self.endpoint(&["events"])
    }

    fn collection_url(&self, collection: &str) -> Result<String, KeenError> {
        self.endpoint(&["events", collection])
    }

    fn query_url(&self, action: &str) -> Result<String, KeenError> {
        self.endpoint(&["queries", action])
    }
}

/// Build the query string parameters for a query.
fn query_params(collection: Option<&str>, data: &Object) -> QueryParams {
    let mut base = Object::new();
    if let Some(collection) = collection {
        base.insert("event_collection".to_string(), Value::from(collection));
    }

    let mut params = merge_deep([&base, data]);
    if params.get("timeframe").map_or(true, Value::is_null) {
        params.insert("timeframe".to_string(), Value::from(DEFAULT_TIMEFRAME));
    }

    match object_to_json(&params) {
        serde_json::Value::Object(map) => map,
        _ => QueryParams::new(),
    }
}

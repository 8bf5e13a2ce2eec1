// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Page-view tracking.
//!
//! Each navigation produces one `page-view` event carrying the page, its query
//! parameters, the page visited before it and how long the view took to load
//! and render. A navigation moves through three stages:
//!
//! 1. [`PageViewTracker::enter`] when the route starts loading.
//! 2. [`PendingPageView::resolve`] once its data has loaded.
//! 3. [`ResolvedPageView::rendered`] once it is on screen; this emits the event.
//!
//! Tracking never fails a navigation. Missing measurements are reported as zero.

use std::future::Future;

use tokio::runtime::Handle;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::sync::oneshot;
use tokio::task::{JoinHandle, JoinSet};

#[cfg(feature = "telemetry")]
use tracing::debug;

use crate::client::Keen;
use crate::error::KeenError;
use crate::value::{Object, Value};

/// Collection page-view events are recorded in.
pub const PAGE_VIEW_COLLECTION: &str = "page-view";

/// Track covering route entry until its data has loaded.
pub const PAGE_VIEW_TRACK: &str = "page-view";

/// Track covering the render pass.
///
/// Background tracking suffixes it with the navigation number, so renders that
/// overlap never share a key.
pub const RENDER_TRACK: &str = "page-view-render-time";

fn render_track(navigation: u64) -> String {
    format!("{}:{}", RENDER_TRACK, navigation)
}

/// A route being navigated to.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RouteInfo {
    /// Route identifier, e.g. `nested-route.sub-route`.
    pub target_name: String,
    pub query_params: Object,
}

impl RouteInfo {
    pub fn new(target_name: impl Into<String>) -> Self {
        Self {
            target_name: target_name.into(),
            query_params: Object::new(),
        }
    }

    pub fn with_query_params(mut self, query_params: Object) -> Self {
        self.query_params = query_params;
        self
    }

    fn record(&self) -> PageRecord {
        PageRecord {
            page: self.target_name.clone(),
            query_params: self.query_params.clone(),
        }
    }
}

/// The page a page-view event was recorded for.
#[derive(Debug, Clone, PartialEq)]
pub struct PageRecord {
    pub page: String,
    pub query_params: Object,
}

impl PageRecord {
    fn to_value(&self) -> Value {
        let mut record = Object::new();
        record.insert("page".to_string(), Value::from(self.page.as_str()));
        record.insert("query_params".to_string(), Value::Object(self.query_params.clone()));
        Value::Object(record)
    }
}

/// Router lifecycle notifications consumed by [`Keen::track_all_page_views`].
#[derive(Debug)]
pub enum NavigationSignal {
    /// A transition to `route` has started.
    RouteWillChange(RouteInfo),
    /// The transition finished and `route` is rendering.
    ///
    /// `rendered` fires when the render pass completes. Dropping the sender
    /// counts as completion.
    RouteDidChange {
        route: RouteInfo,
        rendered: oneshot::Receiver<()>,
    },
}

/// Convert milliseconds to seconds with two decimals.
pub fn round_seconds(ms: f64) -> f64 {
    if !ms.is_finite() {
        return 0.0;
    }
    (ms / 10.0).round() / 100.0
}

/// Builds page-view events for one [`Keen`] service.
#[derive(Debug, Clone)]
pub struct PageViewTracker {
    keen: Keen,
}

impl PageViewTracker {
    pub(crate) fn new(keen: Keen) -> Self {
        Self { keen }
    }

    /// Start measuring a navigation to `route`.
    ///
    /// If the page-view track is already running, an enclosing route started it
    /// and the measured load time will include the parent's share.
    pub fn enter(&self, route: RouteInfo) -> PendingPageView {
        let includes_parent = self.keen.is_performance_tracking(PAGE_VIEW_TRACK);
        self.keen.start_performance_track(PAGE_VIEW_TRACK);

        PendingPageView {
            keen: self.keen.clone(),
            route,
            includes_parent,
        }
    }

    /// Record a page view for `route` right away, without timings.
    pub fn track_page_view(&self, route: &RouteInfo) -> bool {
        let previous = self.keen.replace_previous_page(route.record());
        let event = page_view_event(route, previous.as_ref(), None);
        self.keen.send_event(PAGE_VIEW_COLLECTION, event, false)
    }

    /// Consume navigation signals until the channel closes.
    ///
    /// Renders are awaited concurrently, each on its own track. The previous
    /// page is claimed when the navigation arrives, so the trail follows
    /// navigation order even when a later view renders first. The returned
    /// task completes once the channel is closed and every in-flight page view
    /// has been emitted.
    pub(crate) fn spawn(
        self,
        mut signals: UnboundedReceiver<NavigationSignal>,
    ) -> Result<JoinHandle<()>, KeenError> {
        let runtime =
            Handle::try_current().map_err(|_| KeenError::NoRuntime("track page views"))?;

        Ok(runtime.spawn(async move {
            let mut entered: Option<PendingPageView> = None;
            let mut rendering = JoinSet::new();
            let mut navigations: u64 = 0;

            while let Some(signal) = signals.recv().await {
                match signal {
                    NavigationSignal::RouteWillChange(route) => {
                        entered = Some(self.enter(route));
                    }
                    NavigationSignal::RouteDidChange { route, rendered } => {
                        let pending = match entered.take() {
                            Some(pending) => pending.retarget(route),
                            None => self.enter(route),
                        };
                        let view = pending.resolve().start_render(render_track(navigations));
                        navigations += 1;
                        rendering.spawn(view.finish(async move {
                            let _ = rendered.await;
                        }));
                    }
                }
            }

            while rendering.join_next().await.is_some() {}

            #[cfg(feature = "telemetry")]
            debug!("Navigation signals closed, page-view tracking stopped");
        }))
    }
}

/// A navigation whose route is still loading.
#[derive(Debug)]
pub struct PendingPageView {
    keen: Keen,
    route: RouteInfo,
    includes_parent: bool,
}

impl PendingPageView {
    pub fn route(&self) -> &RouteInfo {
        &self.route
    }

    /// Whether the load measurement started in an enclosing route.
    pub fn includes_parent(&self) -> bool {
        self.includes_parent
    }

    fn retarget(self, route: RouteInfo) -> Self {
        Self { route, ..self }
    }

    /// The route's data has loaded. Stops the load measurement.
    pub fn resolve(self) -> ResolvedPageView {
        let model_load_time = self
            .keen
            .end_performance_track(PAGE_VIEW_TRACK)
            .unwrap_or(0.0);

        ResolvedPageView {
            keen: self.keen,
            route: self.route,
            includes_parent: self.includes_parent,
            model_load_time,
        }
    }

    /// Resolve, then wait for `rendered` and emit the event.
    pub async fn complete<F: Future>(self, rendered: F) -> bool {
        self.resolve().rendered(rendered).await
    }
}

/// A navigation whose data has loaded, waiting for its render pass.
#[derive(Debug)]
pub struct ResolvedPageView {
    keen: Keen,
    route: RouteInfo,
    includes_parent: bool,
    model_load_time: f64,
}

impl ResolvedPageView {
    /// Milliseconds spent loading, 0 if the load was never measured.
    pub fn model_load_time(&self) -> f64 {
        self.model_load_time
    }

    /// Time the render pass, then queue the page-view event.
    ///
    /// Returns whether the event was queued.
    pub async fn rendered<F: Future>(self, rendered: F) -> bool {
        self.start_render(RENDER_TRACK.to_string()).finish(rendered).await
    }

    /// Start the render measurement on `track` and take over the
    /// previous-page record.
    fn start_render(self, track: String) -> RenderingPageView {
        self.keen.start_performance_track(&track);
        let previous = self.keen.replace_previous_page(self.route.record());

        RenderingPageView {
            keen: self.keen,
            route: self.route,
            previous,
            track,
            model_load_time: self.model_load_time,
            includes_parent: self.includes_parent,
        }
    }
}

/// A navigation waiting for its render pass to complete.
struct RenderingPageView {
    keen: Keen,
    route: RouteInfo,
    previous: Option<PageRecord>,
    track: String,
    model_load_time: f64,
    includes_parent: bool,
}

impl RenderingPageView {
    async fn finish<F: Future>(self, rendered: F) -> bool {
        rendered.await;
        let render_time = self.keen.end_performance_track(&self.track).unwrap_or(0.0);

        let timings = Timings {
            model_load_time: self.model_load_time,
            render_time,
            includes_parent: self.includes_parent,
        };

        let event = page_view_event(&self.route, self.previous.as_ref(), Some(&timings));
        self.keen.send_event(PAGE_VIEW_COLLECTION, event, false)
    }
}

struct Timings {
    model_load_time: f64,
    render_time: f64,
    includes_parent: bool,
}

impl Timings {
    fn to_value(&self) -> Value {
        let mut performance = Object::new();
        performance.insert(
            "model_load_time".to_string(),
            Value::from(round_seconds(self.model_load_time)),
        );
        performance.insert(
            "render_time".to_string(),
            Value::from(round_seconds(self.render_time)),
        );
        performance.insert(
            "total_time".to_string(),
            Value::from(round_seconds(self.model_load_time + self.render_time)),
        );
        performance.insert(
            "model_load_time_includes_parent".to_string(),
            Value::Bool(self.includes_parent),
        );
        Value::Object(performance)
    }
}

/// `previous_page` is left out on the first view of a session.
fn page_view_event(
    route: &RouteInfo,
    previous: Option<&PageRecord>,
    timings: Option<&Timings>,
) -> Object {
    let mut event = Object::new();
    event.insert("page".to_string(), Value::from(route.target_name.as_str()));
    event.insert("query_params".to_string(), Value::Object(route.query_params.clone()));
    if let Some(previous) = previous {
        event.insert("previous_page".to_string(), previous.to_value());
    }
    if let Some(timings) = timings {
        event.insert("performance".to_string(), timings.to_value());
    }
    event
}

// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Navigation-driven page-view tracking, end to end.

mod common;

use keen::{object_from_json, NavigationSignal, RouteInfo};
use serde_json::{json, Value};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};

use common::{keen_with, test_config};

fn route(name: &str, params: Value) -> RouteInfo {
    RouteInfo::new(name).with_query_params(object_from_json(params))
}

fn navigate(tx: &mpsc::UnboundedSender<NavigationSignal>, to: RouteInfo) {
    tx.send(NavigationSignal::RouteWillChange(to.clone())).unwrap();
    let (rendered_tx, rendered) = oneshot::channel();
    tx.send(NavigationSignal::RouteDidChange { route: to, rendered })
        .unwrap();
    rendered_tx.send(()).unwrap();
}

#[tokio::test]
async fn test_automated_page_view_tracking() {
    let (keen, transport) = keen_with(test_config().with_queue_time(60_000));
    let (tx, rx) = mpsc::unbounded_channel();
    let handle = keen.track_all_page_views(rx).unwrap();

    let visits = [
        route("index", json!({})),
        route("index", json!({ "aa": "test" })),
        route("index", json!({ "aa": "test", "bb": "1" })),
        route("nested-route.index", json!({})),
        route("nested-route.sub-route", json!({})),
        route("index", json!({})),
        route("page-view", json!({})),
    ];

    // Wait for each view to land so the trail is deterministic.
    for visit in &visits {
        let before = keen.pending_events();
        navigate(&tx, visit.clone());
        while keen.pending_events() == before {
            tokio::task::yield_now().await;
        }
    }

    drop(tx);
    handle.await.unwrap();
    keen.flush().await.unwrap();

    let posts = transport.posts();
    assert_eq!(posts.len(), 1);
    let events = posts[0].body["page-view"].as_array().unwrap().clone();
    assert_eq!(events.len(), visits.len());

    let mut expected_previous = Value::Null;
    for (event, visit) in events.iter().zip(&visits) {
        assert_eq!(event["page"], json!(visit.target_name));
        assert_eq!(
            event["query_params"],
            keen::object_to_json(&visit.query_params)
        );
        if expected_previous.is_null() {
            assert!(event.get("previous_page").is_none());
        } else {
            assert_eq!(event["previous_page"], expected_previous);
        }

        let performance = &event["performance"];
        assert!(performance["model_load_time"].as_f64().unwrap() >= 0.0);
        assert!(performance["render_time"].as_f64().unwrap() >= 0.0);
        assert_eq!(performance["model_load_time_includes_parent"], json!(false));

        expected_previous = json!({
            "page": event["page"].clone(),
            "query_params": event["query_params"].clone(),
        });
    }
}

async fn wait_until_current(keen: &keen::Keen, page: &str) {
    while keen.previous_page().map(|p| p.page).as_deref() != Some(page) {
        tokio::task::yield_now().await;
    }
}

fn page_view_events(transport: &common::RecordingTransport) -> Vec<Value> {
    transport
        .posts()
        .iter()
        .filter_map(|post| post.body["page-view"].as_array().cloned())
        .flatten()
        .collect()
}

#[tokio::test(start_paused = true)]
async fn test_slow_render_does_not_reorder_trail() {
    let (keen, transport) = keen_with(test_config().with_queue_time(60_000));
    let (tx, rx) = mpsc::unbounded_channel();
    let handle = keen.track_all_page_views(rx).unwrap();

    tx.send(NavigationSignal::RouteWillChange(RouteInfo::new("a")))
        .unwrap();
    let (render_a, rendered) = oneshot::channel();
    tx.send(NavigationSignal::RouteDidChange {
        route: RouteInfo::new("a"),
        rendered,
    })
    .unwrap();
    wait_until_current(&keen, "a").await;
    tokio::time::advance(Duration::from_millis(300)).await;

    tx.send(NavigationSignal::RouteWillChange(RouteInfo::new("b")))
        .unwrap();
    let (render_b, rendered) = oneshot::channel();
    tx.send(NavigationSignal::RouteDidChange {
        route: RouteInfo::new("b"),
        rendered,
    })
    .unwrap();
    wait_until_current(&keen, "b").await;
    tokio::time::advance(Duration::from_millis(100)).await;

    render_b.send(()).unwrap();
    while keen.pending_events() == 0 {
        tokio::task::yield_now().await;
    }
    tokio::time::advance(Duration::from_millis(200)).await;
    render_a.send(()).unwrap();

    drop(tx);
    handle.await.unwrap();
    keen.flush().await.unwrap();

    let events = page_view_events(&transport);
    assert_eq!(events.len(), 2);

    let a = events.iter().find(|e| e["page"] == "a").unwrap();
    assert_eq!(a["performance"]["render_time"], json!(0.6));
    assert!(a.get("previous_page").is_none());

    let b = events.iter().find(|e| e["page"] == "b").unwrap();
    assert_eq!(b["performance"]["render_time"], json!(0.1));
    assert_eq!(b["previous_page"], json!({ "page": "a", "query_params": {} }));

    assert_eq!(keen.previous_page().unwrap().page, "b");
}

#[tokio::test]
async fn test_app_started_track_marks_parent_time() {
    let (keen, transport) = keen_with(test_config().with_queue_time(60_000));
    let (tx, rx) = mpsc::unbounded_channel();
    let handle = keen.track_all_page_views(rx).unwrap();

    // The application started the page-view track itself before navigating.
    keen.start_performance_track("page-view");
    navigate(&tx, RouteInfo::new("page-view"));

    drop(tx);
    handle.await.unwrap();
    keen.flush().await.unwrap();

    let posts = transport.posts();
    let event = &posts[0].body["page-view"][0];
    assert_eq!(event["performance"]["model_load_time_includes_parent"], json!(true));
    assert!(!keen.is_performance_tracking("page-view"));
    assert!(!keen.is_performance_tracking("page-view-render-time"));
}

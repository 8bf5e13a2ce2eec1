// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! End-to-end tests for queued delivery through a recording transport.

mod common;

use std::time::Duration;

use keen::{object_from_json, EventBatch, KeenConfig, Object};
use serde_json::json;

use common::{keen_with, test_config, BASE_URL};

// ============================================================================
// Debounced Queue Tests
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_burst_is_sent_once_after_default_window() {
    let (keen, transport) = keen_with(test_config());
    assert_eq!(keen.config().queue_time, 5000);

    for n in 0..10 {
        keen.send_event("clicks", object_from_json(json!({ "n": n })), false);
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    assert!(transport.posts().is_empty());

    tokio::time::sleep(Duration::from_millis(5000)).await;

    let posts = transport.posts();
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0].url, format!("{}/TEST_PROJECT_ID/events", BASE_URL));
    assert_eq!(posts[0].api_key, "TEST_WRITE_KEY");

    let clicks = posts[0].body["clicks"].as_array().unwrap();
    let order: Vec<_> = clicks.iter().map(|e| e["n"].as_i64().unwrap()).collect();
    assert_eq!(order, (0..10).collect::<Vec<_>>());
}

#[tokio::test(start_paused = true)]
async fn test_separate_windows_send_separate_batches() {
    let (keen, transport) = keen_with(test_config().with_queue_time(100));

    keen.send_event("a", Object::new(), false);
    tokio::time::sleep(Duration::from_millis(200)).await;
    keen.send_event("b", Object::new(), false);
    tokio::time::sleep(Duration::from_millis(200)).await;

    let posts = transport.posts();
    assert_eq!(posts.len(), 2);
    assert!(posts[0].body.get("a").is_some() && posts[0].body.get("b").is_none());
    assert!(posts[1].body.get("b").is_some() && posts[1].body.get("a").is_none());
}

#[tokio::test(start_paused = true)]
async fn test_merge_data_reaches_the_wire() {
    let merge_data = object_from_json(json!({ "app": { "name": "web" } }));
    let (keen, transport) = keen_with(test_config().with_merge_data(merge_data));

    keen.send_event("signups", object_from_json(json!({ "app": { "page": "home" } })), false);
    keen.flush().await.unwrap();

    let posts = transport.posts();
    let event = &posts[0].body["signups"][0];
    assert_eq!(event["app"], json!({ "name": "web", "page": "home" }));
    assert!(event["keen"]["timestamp"].is_string());
}

#[tokio::test]
async fn test_unconfigured_client_sends_nothing() {
    let (keen, transport) = keen_with(KeenConfig::for_project("TEST_PROJECT_ID"));

    assert!(!keen.send_event("a", Object::new(), false));
    assert!(!keen.send_events(EventBatch::new()));
    assert!(keen.send_event_immediately("a", Object::new()).await.is_err());
    assert!(keen.query("count", None, Object::new()).await.is_err());

    keen.flush().await.unwrap();
    assert!(transport.requests().is_empty());
}

// ============================================================================
// Multi-collection and Query Tests
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_send_events_posts_batch_as_given() {
    let (keen, transport) = keen_with(test_config());

    let mut batch = EventBatch::new();
    batch.insert(
        "test-event".to_string(),
        vec![
            object_from_json(json!({ "myProperty": 1 })),
            object_from_json(json!({ "myProperty": 2 })),
            object_from_json(json!({ "myProperty": 1 })),
        ],
    );
    batch.insert(
        "test-event-2".to_string(),
        vec![object_from_json(json!({ "myProperty": 3 }))],
    );

    assert!(keen.send_events(batch));
    tokio::time::sleep(Duration::from_millis(1)).await;

    let posts = transport.posts();
    assert_eq!(posts.len(), 1);
    assert_eq!(
        posts[0].body,
        json!({
            "test-event": [{ "myProperty": 1 }, { "myProperty": 2 }, { "myProperty": 1 }],
            "test-event-2": [{ "myProperty": 3 }]
        })
    );
    assert_eq!(keen.pending_events(), 0);
}

#[tokio::test]
async fn test_query_round_trip() {
    let (keen, transport) = keen_with(test_config());
    transport.respond_with(json!({ "result": 17 }));

    let result = keen
        .query("count", Some("my-event"), object_from_json(json!({ "data1": "test1" })))
        .await
        .unwrap();
    assert_eq!(result, json!(17));

    let requests = transport.requests();
    assert_eq!(requests[0].method, "GET");
    assert_eq!(requests[0].url, format!("{}/TEST_PROJECT_ID/queries/count", BASE_URL));
    assert_eq!(requests[0].api_key, "TEST_READ_KEY");
    assert_eq!(requests[0].body["event_collection"], json!("my-event"));
    assert_eq!(requests[0].body["timeframe"], json!("this_1_month"));
    assert_eq!(requests[0].body["data1"], json!("test1"));
}

// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Shared helpers for integration tests.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use keen::transport::{QueryParams, Transport};
use keen::{Keen, KeenConfig, TransportError};
use serde_json::{json, Value};

/// One request seen by [`RecordingTransport`].
#[derive(Debug, Clone)]
pub struct Request {
    pub method: &'static str,
    pub url: String,
    pub api_key: String,
    pub body: Value,
}

/// Transport that records every request and answers with a canned response.
#[derive(Debug, Default)]
pub struct RecordingTransport {
    requests: Mutex<Vec<Request>>,
    response: Mutex<Option<Value>>,
}

impl RecordingTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Answer every following request with `response`.
    pub fn respond_with(&self, response: Value) {
        *self.response.lock().unwrap() = Some(response);
    }

    pub fn requests(&self) -> Vec<Request> {
        self.requests.lock().unwrap().clone()
    }

    pub fn posts(&self) -> Vec<Request> {
        self.requests()
            .into_iter()
            .filter(|r| r.method == "POST")
            .collect()
    }

    fn record(&self, method: &'static str, url: &str, api_key: &str, body: Value) -> Value {
        self.requests.lock().unwrap().push(Request {
            method,
            url: url.to_string(),
            api_key: api_key.to_string(),
            body,
        });
        self.response.lock().unwrap().clone().unwrap_or_else(|| json!({}))
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn post(&self, url: &str, api_key: &str, payload: &Value) -> Result<Value, TransportError> {
        Ok(self.record("POST", url, api_key, payload.clone()))
    }

    async fn get(&self, url: &str, api_key: &str, params: &QueryParams) -> Result<Value, TransportError> {
        Ok(self.record("GET", url, api_key, Value::Object(params.clone())))
    }
}

pub const BASE_URL: &str = "https://api.test/3.0/projects";

pub fn test_config() -> KeenConfig {
    KeenConfig::for_project("TEST_PROJECT_ID")
        .with_write_key("TEST_WRITE_KEY")
        .with_read_key("TEST_READ_KEY")
        .with_base_url(BASE_URL)
}

pub fn keen_with(config: KeenConfig) -> (Keen, Arc<RecordingTransport>) {
    let transport = RecordingTransport::new();
    let keen = Keen::new(config, transport.clone());
    (keen, transport)
}

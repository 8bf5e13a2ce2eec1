// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Configuration type definitions.
//!
//! Defines the structure of config files and of the resolved configuration
//! handed to the [`Keen`](crate::Keen) service, supporting JSON and YAML formats.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::transport::http::DEFAULT_TIMEOUT_MS;
use crate::transport::AuthMode;
use crate::value::Object;

/// Base URL of the public Keen.IO projects API.
pub const DEFAULT_BASE_URL: &str = "https://api.keen.io/3.0/projects";

/// Debounce window for queued events, in milliseconds.
pub const DEFAULT_QUEUE_TIME_MS: u64 = 5000;

/// Environment name in which request logging may be enabled.
pub const DEVELOPMENT_ENVIRONMENT: &str = "development";

/// Configuration as written in a config file. Every field is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeenFileConfig {
    /// Project to record events in
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,

    /// Key authorizing event writes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub write_key: Option<String>,

    /// Key authorizing queries
    #[serde(skip_serializing_if = "Option::is_none")]
    pub read_key: Option<String>,

    /// Custom base URL for the API
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    /// Debounce window for queued events (ms)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub queue_time: Option<u64>,

    /// Log every request (only honored in the development environment)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_requests: Option<bool>,

    /// Environment name, e.g. "development" or "production"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub environment: Option<String>,

    /// Data merged into every event
    #[serde(skip_serializing_if = "Option::is_none")]
    pub merge_data: Option<Object>,

    /// How the API key is sent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth_mode: Option<AuthMode>,

    /// HTTP request timeout (ms)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
}

/// Fully resolved configuration with all defaults applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeenConfig {
    pub project_id: Option<String>,
    pub write_key: Option<String>,
    pub read_key: Option<String>,
    pub base_url: String,
    pub queue_time: u64,
    pub log_requests: bool,
    pub environment: String,
    pub merge_data: Object,
    pub auth_mode: AuthMode,
    pub timeout_ms: u64,
}

impl Default for KeenConfig {
    fn default() -> Self {
        Self {
            project_id: None,
            write_key: None,
            read_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            queue_time: DEFAULT_QUEUE_TIME_MS,
            log_requests: false,
            environment: "production".to_string(),
            merge_data: Object::new(),
            auth_mode: AuthMode::default(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }
}

fn is_set(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|v| !v.is_empty())
}

impl KeenConfig {
    /// Configuration for a project, with every other setting at its default.
    pub fn for_project(project_id: impl Into<String>) -> Self {
        Self {
            project_id: Some(project_id.into()),
            ..Default::default()
        }
    }

    pub fn with_write_key(mut self, key: impl Into<String>) -> Self {
        self.write_key = Some(key.into());
        self
    }

    pub fn with_read_key(mut self, key: impl Into<String>) -> Self {
        self.read_key = Some(key.into());
        self
    }

    /// Set the API base URL. A trailing `/` is dropped.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        let url = url.into();
        self.base_url = url.trim_end_matches('/').to_string();
        self
    }

    pub fn with_queue_time(mut self, ms: u64) -> Self {
        self.queue_time = ms;
        self
    }

    pub fn with_merge_data(mut self, data: Object) -> Self {
        self.merge_data = data;
        self
    }

    /// Enable request logging in the development environment.
    pub fn with_request_logging(mut self) -> Self {
        self.environment = DEVELOPMENT_ENVIRONMENT.to_string();
        self.log_requests = true;
        self
    }

    /// Both a project id and a write key are configured.
    pub fn can_write(&self) -> bool {
        is_set(&self.project_id) && is_set(&self.write_key)
    }

    /// Both a project id and a read key are configured.
    pub fn can_read(&self) -> bool {
        is_set(&self.project_id) && is_set(&self.read_key)
    }

    /// Requests are mirrored to the log only in development with logging enabled.
    pub fn should_log_requests(&self) -> bool {
        self.log_requests && self.environment == DEVELOPMENT_ENVIRONMENT
    }

    pub fn queue_duration(&self) -> Duration {
        Duration::from_millis(self.queue_time)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Copy of this config with keys masked, safe to print.
    pub fn redacted(&self) -> Self {
        fn mask(key: &Option<String>) -> Option<String> {
            key.as_deref().map(|k| {
                let visible: String = k.chars().take(4).collect();
                format!("{}…", visible)
            })
        }

        Self {
            write_key: mask(&self.write_key),
            read_key: mask(&self.read_key),
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keen_config_default() {
        let config = KeenConfig::default();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.queue_time, 5000);
        assert!(!config.can_write());
        assert!(!config.can_read());
        assert!(!config.should_log_requests());
    }

    #[test]
    fn test_credentials() {
        let config = KeenConfig::for_project("p").with_write_key("w");
        assert!(config.can_write());
        assert!(!config.can_read());

        let empty_key = KeenConfig::for_project("p").with_write_key("");
        assert!(!empty_key.can_write());

        let no_project = KeenConfig::default().with_write_key("w").with_read_key("r");
        assert!(!no_project.can_write());
        assert!(!no_project.can_read());
    }

    #[test]
    fn test_request_logging_requires_development() {
        let mut config = KeenConfig::default();
        config.log_requests = true;
        assert!(!config.should_log_requests());

        let config = KeenConfig::default().with_request_logging();
        assert!(config.should_log_requests());
    }

    #[test]
    fn test_file_config_deserialize() {
        let config: KeenFileConfig = serde_json::from_str(
            r#"{
                "projectId": "p",
                "writeKey": "w",
                "queueTime": 100,
                "authMode": "query-param",
                "mergeData": { "app": { "version": "1.0" } }
            }"#,
        )
        .unwrap();

        assert_eq!(config.project_id.as_deref(), Some("p"));
        assert_eq!(config.queue_time, Some(100));
        assert_eq!(config.auth_mode, Some(AuthMode::QueryParam));
        assert!(config.merge_data.unwrap().contains_key("app"));
    }

    #[test]
    fn test_base_url_trailing_slash() {
        let config = KeenConfig::default().with_base_url("http://localhost:8080/3.0/projects/");
        assert_eq!(config.base_url, "http://localhost:8080/3.0/projects");
    }

    #[test]
    fn test_redacted() {
        let config = KeenConfig::for_project("p").with_write_key("abcdefgh");
        let redacted = config.redacted();
        assert_eq!(redacted.write_key.as_deref(), Some("abcd…"));
        assert_eq!(redacted.project_id.as_deref(), Some("p"));
        assert!(redacted.read_key.is_none());
    }
}

// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Configuration merging.
//!
//! Handles merging configurations from different sources with proper precedence.

use crate::merge::merge_deep;
use crate::transport::AuthMode;

use super::types::{KeenConfig, KeenFileConfig};

/// CLI options (and their environment variables) that can override configuration.
#[derive(Debug, Clone, Default)]
pub struct CliOptions {
    pub project_id: Option<String>,
    pub write_key: Option<String>,
    pub read_key: Option<String>,
    pub base_url: Option<String>,
    pub environment: Option<String>,
    pub log_requests: Option<bool>,
    pub queue_time: Option<u64>,
    pub auth_mode: Option<AuthMode>,
}

/// Default configuration values.
pub fn default_config() -> KeenConfig {
    KeenConfig::default()
}

/// Merge multiple configurations with precedence.
///
/// Precedence (highest to lowest):
/// 1. CLI options
/// 2. Local config (.keen.local.json)
/// 3. Workspace config (.keen.json)
/// 4. Global config (~/.keen/config.json)
/// 5. Default values
///
/// `mergeData` is deep-merged across layers rather than replaced.
pub fn merge_config(
    global: Option<KeenFileConfig>,
    workspace: Option<KeenFileConfig>,
    local: Option<KeenFileConfig>,
    cli: CliOptions,
) -> KeenConfig {
    let mut result = default_config();

    for config in [global, workspace, local].into_iter().flatten() {
        apply_file_config(&mut result, &config);
    }

    apply_cli_options(&mut result, &cli);

    result
}

/// Blank credentials in a file leave the lower layer's value in place.
fn apply_credential(slot: &mut Option<String>, value: &Option<String>) {
    if let Some(value) = value.as_deref().filter(|v| !v.is_empty()) {
        *slot = Some(value.to_string());
    }
}

fn apply_file_config(result: &mut KeenConfig, config: &KeenFileConfig) {
    apply_credential(&mut result.project_id, &config.project_id);
    apply_credential(&mut result.write_key, &config.write_key);
    apply_credential(&mut result.read_key, &config.read_key);

    if let Some(ref base_url) = config.base_url {
        result.base_url = base_url.trim_end_matches('/').to_string();
    }

    if let Some(queue_time) = config.queue_time {
        result.queue_time = queue_time;
    }

    if let Some(log_requests) = config.log_requests {
        result.log_requests = log_requests;
    }

    if let Some(ref environment) = config.environment {
        result.environment = environment.clone();
    }

    if let Some(ref merge_data) = config.merge_data {
        result.merge_data = merge_deep([&result.merge_data, merge_data]);
    }

    if let Some(auth_mode) = config.auth_mode {
        result.auth_mode = auth_mode;
    }

    if let Some(timeout_ms) = config.timeout_ms {
        result.timeout_ms = timeout_ms;
    }
}

fn apply_cli_options(result: &mut KeenConfig, cli: &CliOptions) {
    if cli.project_id.is_some() {
        result.project_id = cli.project_id.clone();
    }

    if cli.write_key.is_some() {
        result.write_key = cli.write_key.clone();
    }

    if cli.read_key.is_some() {
        result.read_key = cli.read_key.clone();
    }

    if let Some(ref base_url) = cli.base_url {
        result.base_url = base_url.trim_end_matches('/').to_string();
    }

    if let Some(ref environment) = cli.environment {
        result.environment = environment.clone();
    }

    if let Some(log_requests) = cli.log_requests {
        result.log_requests = log_requests;
    }

    if let Some(queue_time) = cli.queue_time {
        result.queue_time = queue_time;
    }

    if let Some(auth_mode) = cli.auth_mode {
        result.auth_mode = auth_mode;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::object_from_json;
    use serde_json::json;

    #[test]
    fn test_default_config() {
        let config = default_config();
        assert!(config.project_id.is_none());
        assert_eq!(config.queue_time, 5000);
    }

    #[test]
    fn test_merge_config_precedence() {
        let global = KeenFileConfig {
            project_id: Some("global-project".to_string()),
            write_key: Some("global-key".to_string()),
            ..Default::default()
        };

        let workspace = KeenFileConfig {
            project_id: Some("workspace-project".to_string()),
            ..Default::default()
        };

        let local = KeenFileConfig {
            project_id: Some("local-project".to_string()),
            ..Default::default()
        };

        let result = merge_config(Some(global), Some(workspace), Some(local), CliOptions::default());
        assert_eq!(result.project_id, Some("local-project".to_string()));
        assert_eq!(result.write_key, Some("global-key".to_string()));
    }

    #[test]
    fn test_blank_file_credentials_keep_lower_layer() {
        let global = KeenFileConfig {
            project_id: Some("global-project".to_string()),
            write_key: Some("global-key".to_string()),
            ..Default::default()
        };
        let workspace = KeenFileConfig {
            project_id: Some(String::new()),
            write_key: Some(String::new()),
            read_key: Some(String::new()),
            ..Default::default()
        };

        let result = merge_config(Some(global), Some(workspace), None, CliOptions::default());
        assert_eq!(result.project_id.as_deref(), Some("global-project"));
        assert_eq!(result.write_key.as_deref(), Some("global-key"));
        assert!(result.read_key.is_none());
    }

    #[test]
    fn test_cli_overrides_all() {
        let workspace = KeenFileConfig {
            write_key: Some("file-key".to_string()),
            queue_time: Some(100),
            ..Default::default()
        };

        let cli = CliOptions {
            write_key: Some("cli-key".to_string()),
            auth_mode: Some(AuthMode::QueryParam),
            ..Default::default()
        };

        let result = merge_config(None, Some(workspace), None, cli);
        assert_eq!(result.write_key, Some("cli-key".to_string()));
        assert_eq!(result.queue_time, 100);
        assert_eq!(result.auth_mode, AuthMode::QueryParam);
    }

    #[test]
    fn test_merge_data_is_deep_merged() {
        let global = KeenFileConfig {
            merge_data: Some(object_from_json(json!({ "app": { "name": "web" }, "tags": ["a"] }))),
            ..Default::default()
        };
        let local = KeenFileConfig {
            merge_data: Some(object_from_json(json!({ "app": { "version": "2" }, "tags": ["b"] }))),
            ..Default::default()
        };

        let result = merge_config(Some(global), None, Some(local), CliOptions::default());
        assert_eq!(
            result.merge_data,
            object_from_json(json!({ "app": { "name": "web", "version": "2" }, "tags": ["a", "b"] }))
        );
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let cli = CliOptions {
            base_url: Some("http://localhost:8080/projects/".to_string()),
            ..Default::default()
        };
        let result = merge_config(None, None, None, cli);
        assert_eq!(result.base_url, "http://localhost:8080/projects");
    }
}

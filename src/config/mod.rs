// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Configuration module for Keen.
//!
//! Handles loading and merging of configuration from multiple sources:
//! - Global config: ~/.keen/config.json
//! - Workspace config: .keen.json, .keen/config.json, keen.config.json or .keen.yaml
//! - Local config: .keen.local.json (gitignored, for personal keys)
//! - CLI options: command-line arguments and `KEEN_*` environment variables
//!
//! Configuration is merged with precedence (CLI > local > workspace > global > defaults).
//! The resolved [`KeenConfig`] is static for the lifetime of a [`Keen`](crate::Keen) service.

mod loader;
mod merger;
mod types;

pub use loader::{
    find_workspace_root, global_config_dir, init_config, load_global_config, load_local_config,
    load_workspace_config, starter_config, workspace_config_path, CONFIG_FILES, GLOBAL_CONFIG_DIR,
    GLOBAL_CONFIG_FILE, LOCAL_CONFIG_FILE, STARTER_CONFIG_FILE,
};

pub use merger::{default_config, merge_config, CliOptions};

pub use types::{
    KeenConfig, KeenFileConfig, DEFAULT_BASE_URL, DEFAULT_QUEUE_TIME_MS, DEVELOPMENT_ENVIRONMENT,
};

use crate::error::ConfigError;
use std::path::Path;

/// Load and merge all configuration sources for a workspace.
///
/// This is the main entry point for configuration loading.
pub fn load_config(workspace_root: &Path, cli_options: CliOptions) -> Result<KeenConfig, ConfigError> {
    let global = load_global_config()?;
    let workspace = load_workspace_config(workspace_root)?;
    let local = load_local_config(workspace_root)?;

    Ok(merge_config(global, workspace, local, cli_options))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_config_with_no_files() {
        let temp = TempDir::new().unwrap();
        let result = load_config(temp.path(), CliOptions::default());
        assert!(result.is_ok());
        assert!(!result.unwrap().base_url.is_empty());
    }

    #[test]
    fn test_load_config_local_overrides_workspace() {
        let temp = TempDir::new().unwrap();
        std::fs::write(
            temp.path().join(".keen.json"),
            r#"{"projectId": "shared", "writeKey": "team-key"}"#,
        )
        .unwrap();
        std::fs::write(
            temp.path().join(LOCAL_CONFIG_FILE),
            r#"{"writeKey": "my-key"}"#,
        )
        .unwrap();

        let config = load_config(temp.path(), CliOptions::default()).unwrap();
        assert_eq!(config.project_id, Some("shared".to_string()));
        assert_eq!(config.write_key, Some("my-key".to_string()));
    }

    #[test]
    fn test_load_config_cli_override() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join(".keen.json"), r#"{"projectId": "file"}"#).unwrap();

        let cli = CliOptions {
            project_id: Some("cli".to_string()),
            ..Default::default()
        };

        let config = load_config(temp.path(), cli).unwrap();
        assert_eq!(config.project_id, Some("cli".to_string()));
    }
}

// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Configuration files on disk.
//!
//! Three file layers are read: the global file in the home directory, the
//! first workspace file found from [`CONFIG_FILES`], and the untracked local
//! override. A missing file is an absent layer, not an error.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::error::ConfigError;
use crate::value::Object;

use super::types::{KeenFileConfig, DEFAULT_BASE_URL, DEFAULT_QUEUE_TIME_MS};

/// Workspace config file names, in lookup order.
pub const CONFIG_FILES: &[&str] = &[".keen.json", ".keen/config.json", "keen.config.json", ".keen.yaml"];

/// File written by [`init_config`].
pub const STARTER_CONFIG_FILE: &str = ".keen.json";

/// Per-checkout override holding personal keys. Keep it out of VCS.
pub const LOCAL_CONFIG_FILE: &str = ".keen.local.json";

/// Global config directory name, under the home directory.
pub const GLOBAL_CONFIG_DIR: &str = ".keen";

/// Global config file name, inside [`GLOBAL_CONFIG_DIR`].
pub const GLOBAL_CONFIG_FILE: &str = "config.json";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FileFormat {
    Json,
    Yaml,
}

impl FileFormat {
    fn of(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml") => {
                Self::Yaml
            }
            _ => Self::Json,
        }
    }

    fn parse(self, content: &str) -> Result<KeenFileConfig, ConfigError> {
        match self {
            Self::Json => Ok(serde_json::from_str(content)?),
            Self::Yaml => Ok(serde_yaml::from_str(content)?),
        }
    }
}

/// Read one config layer, `None` if the file does not exist.
fn read_layer(path: &Path) -> Result<Option<KeenFileConfig>, ConfigError> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    FileFormat::of(path).parse(&content).map(Some)
}

/// `~/.keen`, if the home directory is known.
pub fn global_config_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(GLOBAL_CONFIG_DIR))
}

/// Load `~/.keen/config.json`.
pub fn load_global_config() -> Result<Option<KeenFileConfig>, ConfigError> {
    match global_config_dir() {
        Some(dir) => read_layer(&dir.join(GLOBAL_CONFIG_FILE)),
        None => Ok(None),
    }
}

/// The workspace config file in `dir`, if there is one.
pub fn workspace_config_path(dir: &Path) -> Option<PathBuf> {
    CONFIG_FILES
        .iter()
        .map(|name| dir.join(name))
        .find(|path| path.is_file())
}

/// Load the first of [`CONFIG_FILES`] present in `workspace_root`.
pub fn load_workspace_config(workspace_root: &Path) -> Result<Option<KeenFileConfig>, ConfigError> {
    match workspace_config_path(workspace_root) {
        Some(path) => read_layer(&path),
        None => Ok(None),
    }
}

/// Load `.keen.local.json` from `workspace_root`.
pub fn load_local_config(workspace_root: &Path) -> Result<Option<KeenFileConfig>, ConfigError> {
    read_layer(&workspace_root.join(LOCAL_CONFIG_FILE))
}

/// Nearest directory at or above `start` holding a workspace config file.
pub fn find_workspace_root(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| workspace_config_path(dir).is_some())
        .map(Path::to_path_buf)
}

/// Contents of a freshly initialized config file.
///
/// Credentials are present but blank, so the file shows what to fill in while
/// writes and queries stay disabled. Blank credentials never shadow keys set
/// in the global config.
pub fn starter_config() -> KeenFileConfig {
    KeenFileConfig {
        project_id: Some(String::new()),
        write_key: Some(String::new()),
        read_key: Some(String::new()),
        base_url: Some(DEFAULT_BASE_URL.to_string()),
        queue_time: Some(DEFAULT_QUEUE_TIME_MS),
        log_requests: Some(false),
        merge_data: Some(Object::new()),
        ..Default::default()
    }
}

/// Write [`starter_config`] to `.keen.json` in `dir`.
///
/// Fails with [`ConfigError::AlreadyExists`] if `dir` already has a workspace
/// config, so an existing project is never overwritten.
pub fn init_config(dir: &Path) -> Result<PathBuf, ConfigError> {
    if let Some(existing) = workspace_config_path(dir) {
        return Err(ConfigError::AlreadyExists(existing.display().to_string()));
    }

    let path = dir.join(STARTER_CONFIG_FILE);
    let mut content = serde_json::to_string_pretty(&starter_config())?;
    content.push('\n');

    let mut file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&path)
        .map_err(|e| match e.kind() {
            io::ErrorKind::AlreadyExists => ConfigError::AlreadyExists(path.display().to_string()),
            _ => e.into(),
        })?;
    file.write_all(content.as_bytes())?;

    Ok(path)
}

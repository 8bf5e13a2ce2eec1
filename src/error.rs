// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Error types for the Keen client.
//!
//! This module provides strongly-typed errors for different parts of the library,
//! using `thiserror` for ergonomic error definitions and `anyhow` for error propagation
//! in application code.

use thiserror::Error;

/// Errors that can occur while talking to the analytics API.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("API error: {message}")]
    Api {
        message: String,
        status_code: Option<u16>,
    },

    #[error("Response parsing error: {0}")]
    Parse(String),

    #[error("Timeout after {0}ms")]
    Timeout(u64),
}

impl TransportError {
    /// Create an API error with status code.
    pub fn api(message: impl Into<String>, status_code: u16) -> Self {
        Self::Api {
            message: message.into(),
            status_code: Some(status_code),
        }
    }

    /// The HTTP status code, if the server answered at all.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Api { status_code, .. } => *status_code,
            _ => None,
        }
    }

    /// Check if this error is retryable.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Network(_) | Self::Timeout(_) => true,
            Self::Api { status_code, .. } => {
                matches!(status_code, Some(429) | Some(500..=599))
            }
            Self::Parse(_) => false,
        }
    }
}

/// Errors surfaced by the [`Keen`](crate::Keen) service.
#[derive(Error, Debug)]
pub enum KeenError {
    #[error("Not configured: {0}")]
    NotConfigured(String),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("No async runtime available to {0}")]
    NoRuntime(&'static str),

    #[error("Invalid base URL: {0}")]
    InvalidUrl(String),
}

impl KeenError {
    /// Error for a missing project id or write key.
    pub fn missing_write_credentials() -> Self {
        Self::NotConfigured("project id and write key are required to send events".to_string())
    }

    /// Error for a missing project id or read key.
    pub fn missing_read_credentials() -> Self {
        Self::NotConfigured("project id and read key are required to query".to_string())
    }
}

/// Errors that can occur during configuration loading.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config file not found: {0}")]
    NotFound(String),

    #[error("Invalid config format: {0}")]
    InvalidFormat(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    #[error("IO error reading config: {0}")]
    IoError(String),

    #[error("YAML parsing error: {0}")]
    YamlError(String),

    #[error("JSON parsing error: {0}")]
    JsonError(String),

    #[error("Config file already exists: {0}")]
    AlreadyExists(String),
}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => Self::NotFound(err.to_string()),
            _ => Self::IoError(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        Self::JsonError(err.to_string())
    }
}

impl From<serde_yaml::Error> for ConfigError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::YamlError(err.to_string())
    }
}

/// Result type alias using anyhow for flexible error handling.
pub type Result<T> = anyhow::Result<T>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_error_retryable() {
        assert!(TransportError::Network("connection reset".to_string()).is_retryable());
        assert!(TransportError::Timeout(30000).is_retryable());
        assert!(TransportError::api("busy", 503).is_retryable());
        assert!(TransportError::api("slow down", 429).is_retryable());
        assert!(!TransportError::api("bad key", 401).is_retryable());
        assert!(!TransportError::Parse("eof".to_string()).is_retryable());
    }

    #[test]
    fn test_transport_error_api() {
        let err = TransportError::api("Bad request", 400);
        match err {
            TransportError::Api { ref message, status_code } => {
                assert_eq!(message, "Bad request");
                assert_eq!(status_code, Some(400));
            }
            _ => panic!("Expected Api"),
        }
        assert_eq!(err.status_code(), Some(400));
    }

    #[test]
    fn test_keen_error_from_transport() {
        let err: KeenError = TransportError::Timeout(10).into();
        assert!(matches!(err, KeenError::Transport(TransportError::Timeout(10))));
    }

    #[test]
    fn test_config_error_from_json() {
        let result: std::result::Result<serde_json::Value, _> = serde_json::from_str("invalid json");
        let config_err: ConfigError = result.unwrap_err().into();
        assert!(matches!(config_err, ConfigError::JsonError(_)));
    }

    #[test]
    fn test_error_display() {
        let display = format!("{}", KeenError::missing_read_credentials());
        assert!(display.contains("read key"));
    }
}

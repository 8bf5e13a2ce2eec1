// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! HTTP transport used to reach the analytics API.
//!
//! The [`Keen`](crate::Keen) service never talks to the network directly; it is
//! handed a [`Transport`]. [`HttpTransport`] is the `reqwest` implementation,
//! tests and embedders can supply their own.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use keen::transport::{AuthMode, HttpTransport};
//!
//! let transport = HttpTransport::new(AuthMode::Header, Duration::from_secs(30))?;
//! let keen = Keen::new(config, Arc::new(transport));
//! ```

pub mod http;

pub use http::HttpTransport;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::TransportError;

/// Query parameters for a read request.
pub type QueryParams = serde_json::Map<String, serde_json::Value>;

/// How the API key travels with each request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AuthMode {
    /// `Authorization: <key>` header.
    #[default]
    Header,
    /// `?api_key=<key>` query parameter, for hosts that reject the header under CORS.
    QueryParam,
}

impl std::str::FromStr for AuthMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "header" => Ok(Self::Header),
            "query-param" | "query_param" | "query" => Ok(Self::QueryParam),
            other => Err(format!("unknown auth mode: {}", other)),
        }
    }
}

/// Capability to send JSON to the analytics API and read JSON back.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Transport: Send + Sync {
    /// POST `payload` as JSON to `url`, authenticated with `api_key`.
    async fn post(
        &self,
        url: &str,
        api_key: &str,
        payload: &serde_json::Value,
    ) -> Result<serde_json::Value, TransportError>;

    /// GET `url` with `params` encoded in the query string.
    async fn get(
        &self,
        url: &str,
        api_key: &str,
        params: &QueryParams,
    ) -> Result<serde_json::Value, TransportError>;
}

// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! `reqwest` implementation of [`Transport`].

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, RequestBuilder, Response};

#[cfg(feature = "telemetry")]
use tracing::debug;

use super::{AuthMode, QueryParams, Transport};
use crate::error::TransportError;

/// Content type for every JSON body we send.
const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";

/// Default request timeout in milliseconds.
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

/// HTTP transport backed by a shared `reqwest` client.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    auth: AuthMode,
    timeout: Duration,
}

impl HttpTransport {
    /// Create a transport with the given auth mode and request timeout.
    pub fn new(auth: AuthMode, timeout: Duration) -> Result<Self, TransportError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError::Network(e.to_string()))?;

        Ok(Self {
            client,
            auth,
            timeout,
        })
    }

    pub fn auth_mode(&self) -> AuthMode {
        self.auth
    }

    fn authorize(&self, request: RequestBuilder, api_key: &str) -> RequestBuilder {
        match self.auth {
            AuthMode::Header => request.header(AUTHORIZATION, api_key),
            AuthMode::QueryParam => request.query(&[("api_key", api_key)]),
        }
    }

    fn map_send_error(&self, err: reqwest::Error) -> TransportError {
        if err.is_timeout() {
            TransportError::Timeout(self.timeout.as_millis() as u64)
        } else {
            TransportError::Network(err.to_string())
        }
    }

    async fn read_response(&self, response: Response) -> Result<serde_json::Value, TransportError> {
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| self.map_send_error(e))?;

        if !status.is_success() {
            let message = if body.is_empty() {
                status
                    .canonical_reason()
                    .unwrap_or("request failed")
                    .to_string()
            } else {
                body
            };
            return Err(TransportError::api(message, status.as_u16()));
        }

        parse_body(&body)
    }
}

/// Parse a response body. An empty body is `null`.
fn parse_body(body: &str) -> Result<serde_json::Value, TransportError> {
    if body.trim().is_empty() {
        return Ok(serde_json::Value::Null);
    }
    serde_json::from_str(body).map_err(|e| TransportError::Parse(e.to_string()))
}

/// Flatten query parameters into string pairs.
///
/// Strings are sent verbatim; everything else (filters, intervals, numbers)
/// is JSON-encoded.
pub fn query_pairs(params: &QueryParams) -> Vec<(String, String)> {
    params
        .iter()
        .filter(|(_, value)| !value.is_null())
        .map(|(key, value)| {
            let encoded = match value {
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            (key.clone(), encoded)
        })
        .collect()
}

#[async_trait]
impl Transport for HttpTransport {
    async fn post(
        &self,
        url: &str,
        api_key: &str,
        payload: &serde_json::Value,
    ) -> Result<serde_json::Value, TransportError> {
        let body = serde_json::to_vec(payload).map_err(|e| TransportError::Parse(e.to_string()))?;

        #[cfg(feature = "telemetry")]
        debug!(url = %url, bytes = body.len(), "POST");

        let request = self
            .client
            .post(url)
            .header(CONTENT_TYPE, JSON_CONTENT_TYPE)
            .body(body);

        let response = self
            .authorize(request, api_key)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        self.read_response(response).await
    }

    async fn get(
        &self,
        url: &str,
        api_key: &str,
        params: &QueryParams,
    ) -> Result<serde_json::Value, TransportError> {
        let pairs = query_pairs(params);

        #[cfg(feature = "telemetry")]
        debug!(url = %url, params = pairs.len(), "GET");

        let request = self.client.get(url).query(&pairs);

        let response = self
            .authorize(request, api_key)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        self.read_response(response).await
    }
}

#[cfg(test)]
#[path = "client_test.rs"]
mod tests;

use crate::backend::{ArcBackend, Backend, Reply, endpoint_path, request_body, utils::decode_stream};
use crate::config::{BackendConfig, user_agent};
use crate::models::{ChatBody, PluginKeys, Route};
use async_trait::async_trait;
use eyre::{Context, Result};
use serde::Deserialize;
use std::sync::Arc;
use std::time;
use thiserror::Error;

/// HTTP client of the chat server.
pub struct Client {
    endpoint: String,
    api_key: Option<String>,
    timeout: Option<time::Duration>,
    plugin_keys: PluginKeys,
    http: reqwest::Client,
}

/// Non-2xx answer from the chat server.
#[derive(Debug, Clone, Error, PartialEq)]
#[error("{status} {reason}")]
pub struct RequestError {
    pub status: u16,
    pub reason: String,
}

#[derive(Debug, Deserialize)]
struct PluginAnswer {
    answer: String,
}

#[async_trait]
impl Backend for Client {
    fn name(&self) -> &str {
        &self.endpoint
    }

    async fn chat(&self, route: Route, body: ChatBody) -> Result<Reply> {
        let url = format!(
            "{}/{}",
            self.endpoint.trim_end_matches('/'),
            endpoint_path(route)
        );
        let payload = request_body(route, &body, &self.plugin_keys)?;

        let mut req = self
            .http
            .post(&url)
            .header("Content-Type", "application/json")
            .header("User-Agent", user_agent());

        if let Some(timeout) = self.timeout {
            req = req.timeout(timeout);
        }

        if let Some(token) = &self.api_key {
            req = req.bearer_auth(token);
        }

        log::trace!("Sending chat request to {}: {}", url, payload);

        let res = req
            .json(&payload)
            .send()
            .await
            .wrap_err("sending chat request")?;

        let status = res.status();
        if !status.is_success() {
            let text = res.text().await.unwrap_or_default();
            log::error!("Error response ({}): {}", status.as_u16(), text);
            return Err(RequestError {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or_default().to_string(),
            }
            .into());
        }

        match route {
            Route::Chat => Ok(Reply::Stream(decode_stream(res.bytes_stream()))),
            Route::Plugin(plugin) => {
                let answer: PluginAnswer = res
                    .json()
                    .await
                    .wrap_err(format!("parsing {} answer", plugin))?;
                Ok(Reply::Answer(answer.answer))
            }
        }
    }
}

impl From<Client> for ArcBackend {
    fn from(value: Client) -> Self {
        Arc::new(value)
    }
}

impl From<&BackendConfig> for Client {
    fn from(value: &BackendConfig) -> Self {
        let mut client = Client::default()
            .with_endpoint(&value.endpoint)
            .with_plugin_keys(value.plugins.clone());

        if let Some(api_key) = value.api_key.as_deref() {
            client = client.with_api_key(api_key);
        }

        if let Some(timeout) = value.timeout_secs {
            client = client.with_timeout(time::Duration::from_secs(timeout as u64));
        }
        client
    }
}

impl Client {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_endpoint(mut self, endpoint: &str) -> Self {
        self.endpoint = endpoint.to_string();
        self
    }

    pub fn with_api_key(mut self, api_key: &str) -> Self {
        self.api_key = Some(api_key.to_string());
        self
    }

    pub fn with_timeout(mut self, timeout: time::Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_plugin_keys(mut self, keys: PluginKeys) -> Self {
        self.plugin_keys = keys;
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref()
    }

    pub fn timeout(&self) -> Option<time::Duration> {
        self.timeout
    }
}

impl Default for Client {
    fn default() -> Self {
        Self {
            endpoint: crate::config::constants::DEFAULT_ENDPOINT.to_string(),
            api_key: None,
            timeout: None,
            plugin_keys: PluginKeys::default(),
            http: reqwest::Client::new(),
        }
    }
}

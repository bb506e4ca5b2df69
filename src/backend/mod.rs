pub mod client;
pub mod utils;

pub use client::{Client, RequestError};
pub use utils::Utf8Decoder;

#[cfg(test)]
use mockall::automock;

use crate::{
    config::{BackendConfig, verbose},
    models::{ChatBody, Plugin, PluginKeys, Route},
};
use async_trait::async_trait;
use eyre::{Context, Result};
use futures::stream::BoxStream;
use std::sync::Arc;

/// Incrementally decoded text of a streamed reply, in arrival order.
pub type ChunkStream = BoxStream<'static, Result<String>>;

pub enum Reply {
    Stream(ChunkStream),
    Answer(String),
}

#[async_trait]
#[cfg_attr(test, automock)]
pub trait Backend {
    fn name(&self) -> &str;
    async fn chat(&self, route: Route, body: ChatBody) -> Result<Reply>;
}

pub type ArcBackend = Arc<dyn Backend + Send + Sync>;

pub fn new_backend(config: &BackendConfig) -> Result<ArcBackend> {
    if config.endpoint.trim().is_empty() {
        eyre::bail!("No backend endpoint configured");
    }
    let client = Client::from(config);
    verbose!("  [+] Using endpoint: {}", client.name());
    if config.plugins.google_search.is_none() {
        log::debug!("Google search plugin keys are not configured");
    }
    Ok(Arc::new(client))
}

/// Path, relative to the endpoint, serving `route`.
pub fn endpoint_path(route: Route) -> &'static str {
    match route {
        Route::Chat => "api/chat",
        Route::Plugin(Plugin::GoogleSearch) => "api/google",
    }
}

/// JSON request body for `route`. Plugin routes carry their credentials
/// next to the chat body.
pub fn request_body(route: Route, body: &ChatBody, keys: &PluginKeys) -> Result<serde_json::Value> {
    let mut value = serde_json::to_value(body).wrap_err("serializing chat body")?;
    if let (Route::Plugin(Plugin::GoogleSearch), Some(google)) = (route, &keys.google_search) {
        if let Some(obj) = value.as_object_mut() {
            obj.insert("googleAPIKey".to_string(), google.api_key.clone().into());
            obj.insert("googleCSEId".to_string(), google.cse_id.clone().into());
        }
    }
    Ok(value)
}

impl std::fmt::Debug for Reply {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Reply::Stream(_) => write!(f, "Reply::Stream"),
            Reply::Answer(answer) => f.debug_tuple("Reply::Answer").field(answer).finish(),
        }
    }
}

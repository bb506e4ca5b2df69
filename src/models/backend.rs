use crate::config::constants::{
    DEFAULT_MODEL_ID, DEFAULT_MODEL_MAX_LENGTH, DEFAULT_MODEL_NAME, DEFAULT_MODEL_TOKEN_LIMIT,
};
use crate::models::Message;
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Reference data describing the model a conversation talks to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Model {
    id: String,
    name: String,
    /// Max input characters
    max_length: usize,
    token_limit: usize,
}

/// Outbound payload of one request/response cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatBody {
    pub model: Model,
    pub messages: Vec<Message>,
    pub prompt: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Plugin {
    #[serde(rename = "google-search")]
    GoogleSearch,
}

/// Selects the endpoint and the response shape of a cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Default model endpoint answering with a chunked text stream
    Chat,
    /// Plugin endpoint answering with a single `{ answer }` JSON document
    Plugin(Plugin),
}

#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
pub struct PluginKeys {
    #[serde(default)]
    pub google_search: Option<GoogleSearchKeys>,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct GoogleSearchKeys {
    pub api_key: String,
    pub cse_id: String,
}

impl Model {
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            max_length: DEFAULT_MODEL_MAX_LENGTH,
            token_limit: DEFAULT_MODEL_TOKEN_LIMIT,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_max_length(mut self, max_length: usize) -> Self {
        self.max_length = max_length;
        self
    }

    pub fn with_token_limit(mut self, token_limit: usize) -> Self {
        self.token_limit = token_limit;
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn max_length(&self) -> usize {
        self.max_length
    }

    pub fn token_limit(&self) -> usize {
        self.token_limit
    }
}

impl Default for Model {
    fn default() -> Self {
        Self::new(DEFAULT_MODEL_ID)
            .with_name(DEFAULT_MODEL_NAME)
            .with_max_length(DEFAULT_MODEL_MAX_LENGTH)
            .with_token_limit(DEFAULT_MODEL_TOKEN_LIMIT)
    }
}

impl From<Option<Plugin>> for Route {
    fn from(value: Option<Plugin>) -> Self {
        match value {
            Some(plugin) => Route::Plugin(plugin),
            None => Route::Chat,
        }
    }
}

impl Plugin {
    pub fn id(&self) -> &'static str {
        match self {
            Plugin::GoogleSearch => "google-search",
        }
    }
}

impl Display for Model {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.name, self.id)
    }
}

impl Display for Plugin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.id())
    }
}

impl std::str::FromStr for Plugin {
    type Err = eyre::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "google-search" | "google" => Ok(Plugin::GoogleSearch),
            _ => Err(eyre::eyre!("unknown plugin {}", s)),
        }
    }
}

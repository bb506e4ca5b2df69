#[cfg(test)]
#[path = "prompt_test.rs"]
mod tests;

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::models::Model;

static VARIABLE_RE: OnceLock<Regex> = OnceLock::new();

/// A reusable template. Variables are written as `{{name}}` inside
/// `content` and are derived on demand, never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Prompt {
    id: String,
    name: String,
    description: String,
    content: String,
    model: Model,
    folder_id: Option<String>,
}

impl Prompt {
    pub fn new(name: impl Into<String>, model: Model) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.into(),
            description: String::new(),
            content: String::new(),
            model,
            folder_id: None,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }

    pub fn with_folder_id(mut self, folder_id: Option<String>) -> Self {
        self.folder_id = folder_id;
        self
    }

    pub fn set_folder_id(&mut self, folder_id: Option<String>) {
        self.folder_id = folder_id;
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn model(&self) -> &Model {
        &self.model
    }

    pub fn folder_id(&self) -> Option<&str> {
        self.folder_id.as_deref()
    }

    /// Variable names in order of appearance. Repeated placeholders are
    /// reported once per occurrence.
    pub fn variables(&self) -> Vec<String> {
        variable_re()
            .captures_iter(&self.content)
            .filter_map(|cap| cap.get(1).map(|m| m.as_str().to_string()))
            .collect()
    }

    /// Substitute every placeholder with the value given for its variable.
    /// `values` is indexed like [`Prompt::variables`]; a placeholder whose
    /// value is missing is replaced by an empty string.
    pub fn render(&self, values: &[String]) -> String {
        let variables = self.variables();
        variable_re()
            .replace_all(&self.content, |cap: &regex::Captures| {
                let name = cap.get(1).map(|m| m.as_str()).unwrap_or_default();
                variables
                    .iter()
                    .position(|v| v == name)
                    .and_then(|idx| values.get(idx))
                    .cloned()
                    .unwrap_or_default()
            })
            .into_owned()
    }
}

/// Prompts whose name contains `query`, ignoring case.
pub fn filter_prompts<'a>(prompts: &'a [Prompt], query: &str) -> Vec<&'a Prompt> {
    let query = query.to_lowercase();
    prompts
        .iter()
        .filter(|p| p.name.to_lowercase().contains(&query))
        .collect()
}

fn variable_re() -> &'static Regex {
    VARIABLE_RE.get_or_init(|| Regex::new(r"\{\{(.*?)\}\}").expect("valid variable regex"))
}

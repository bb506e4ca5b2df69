#[cfg(test)]
#[path = "conversation_test.rs"]
mod tests;

use serde::{Deserialize, Serialize};

use crate::{
    config::constants::{CONVERSATION_NAME_LENGTH, NEW_CONVERSATION_NAME},
    models::{ChatBody, Message, Model},
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    id: String,
    name: String,
    messages: Vec<Message>,
    model: Model,
    /// System prompt
    prompt: String,
    folder_id: Option<String>,
}

impl Conversation {
    pub fn new(model: Model, prompt: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: NEW_CONVERSATION_NAME.to_string(),
            messages: vec![],
            model,
            prompt: prompt.into(),
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

    pub fn with_messages(mut self, messages: Vec<Message>) -> Self {
        self.messages = messages;
        self
    }

    pub fn with_model(mut self, model: Model) -> Self {
        self.model = model;
        self
    }

    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = prompt.into();
        self
    }

    pub fn with_folder_id(mut self, folder_id: Option<String>) -> Self {
        self.folder_id = folder_id;
        self
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
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

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn model(&self) -> &Model {
        &self.model
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn folder_id(&self) -> Option<&str> {
        self.folder_id.as_deref()
    }

    pub fn last_message(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Case-insensitive match against the name and every message content.
    pub fn matches(&self, term: &str) -> bool {
        let term = term.to_lowercase();
        if self.name.to_lowercase().contains(&term) {
            return true;
        }
        self.messages
            .iter()
            .any(|msg| msg.content().to_lowercase().contains(&term))
    }

    pub fn chat_body(&self) -> ChatBody {
        ChatBody {
            model: self.model.clone(),
            messages: self.messages.clone(),
            prompt: self.prompt.clone(),
        }
    }
}

/// Derive a display name from the first user message: the first
/// [`CONVERSATION_NAME_LENGTH`] characters followed by an ellipsis when the
/// content is longer, otherwise the content verbatim.
pub fn conversation_name(content: &str) -> String {
    if content.chars().count() <= CONVERSATION_NAME_LENGTH {
        return content.to_string();
    }
    let head: String = content.chars().take(CONVERSATION_NAME_LENGTH).collect();
    format!("{head}...")
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new(Model::default(), "")
    }
}

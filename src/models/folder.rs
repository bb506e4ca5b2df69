use serde::{Deserialize, Serialize};
use std::fmt::Display;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FolderKind {
    Chat,
    Prompt,
}

/// Grouping container for either conversations or prompts, never both.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Folder {
    id: String,
    name: String,
    #[serde(rename = "type")]
    kind: FolderKind,
}

impl Folder {
    pub fn new(name: impl Into<String>, kind: FolderKind) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.into(),
            kind,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> FolderKind {
        self.kind
    }
}

impl Display for FolderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FolderKind::Chat => write!(f, "chat"),
            FolderKind::Prompt => write!(f, "prompt"),
        }
    }
}

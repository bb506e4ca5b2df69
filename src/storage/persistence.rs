#[cfg(test)]
#[path = "persistence_test.rs"]
mod tests;

use eyre::{Context, Result};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;

use super::{
    ArcStorage, CONVERSATION_HISTORY_KEY, FOLDERS_KEY, PROMPTS_KEY, SELECTED_CONVERSATION_KEY,
    clean::{
        Defaults, clean_conversation, clean_conversation_history, clean_folders, clean_prompts,
    },
};
use crate::models::{Action, Conversation, Folder, Prompt};

/// Everything read back from storage at startup.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    pub conversations: Vec<Conversation>,
    pub selected: Option<Conversation>,
    pub folders: Vec<Folder>,
    pub prompts: Vec<Prompt>,
}

/// Executes repository actions against a [`Storage`](super::Storage).
#[derive(Clone)]
pub struct Persistence {
    storage: ArcStorage,
}

impl Persistence {
    pub fn new(storage: ArcStorage) -> Self {
        Self { storage }
    }

    /// Apply `actions` strictly in order. The first failing write aborts
    /// the remaining ones.
    pub async fn apply(&self, actions: &[Action]) -> Result<()> {
        for action in actions {
            log::trace!("Applying {}", action_name(action));
            match action {
                Action::SaveConversation(conversation) => {
                    self.save(SELECTED_CONVERSATION_KEY, conversation).await?
                }
                Action::SaveConversations(conversations) => {
                    self.save(CONVERSATION_HISTORY_KEY, conversations).await?
                }
                Action::RemoveConversation => self.remove(SELECTED_CONVERSATION_KEY).await?,
                Action::RemoveConversations => self.remove(CONVERSATION_HISTORY_KEY).await?,
                Action::SaveFolders(folders) => self.save(FOLDERS_KEY, folders).await?,
                Action::SavePrompts(prompts) => self.save(PROMPTS_KEY, prompts).await?,
            }
        }
        Ok(())
    }

    /// Read all keys back. Conversation records are repaired on the way in.
    pub async fn load(&self, defaults: &Defaults) -> Result<Snapshot> {
        let history: Vec<Value> = self
            .read(CONVERSATION_HISTORY_KEY)
            .await?
            .unwrap_or_default();
        let conversations = clean_conversation_history(history, defaults);

        let selected = match self.read::<Value>(SELECTED_CONVERSATION_KEY).await? {
            Some(value) => match clean_conversation(value, defaults) {
                Ok(conversation) => Some(conversation),
                Err(err) => {
                    log::warn!("Ignoring unreadable selected conversation: {}", err);
                    None
                }
            },
            None => None,
        };

        let folders = self.read(FOLDERS_KEY).await?.unwrap_or_default();
        let folders = clean_folders(folders, defaults);
        let prompts = self.read(PROMPTS_KEY).await?.unwrap_or_default();
        let prompts = clean_prompts(prompts, defaults);

        log::debug!(
            "Loaded {} conversations, selected: {}",
            conversations.len(),
            selected.as_ref().map(|c: &Conversation| c.id()).unwrap_or("none")
        );

        Ok(Snapshot {
            conversations,
            selected,
            folders,
            prompts,
        })
    }

    async fn save<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        let value = serde_json::to_string(value).wrap_err(format!("serializing {}", key))?;
        self.storage
            .set(key, &value)
            .await
            .wrap_err(format!("writing {}", key))
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.storage
            .remove(key)
            .await
            .wrap_err(format!("removing {}", key))
    }

    async fn read<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let Some(raw) = self
            .storage
            .get(key)
            .await
            .wrap_err(format!("reading {}", key))?
        else {
            return Ok(None);
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Ok(Some(value)),
            Err(err) => {
                log::warn!("Discarding unparsable value under {}: {}", key, err);
                Ok(None)
            }
        }
    }
}

fn action_name(action: &Action) -> &'static str {
    match action {
        Action::SaveConversation(_) => "SaveConversation",
        Action::SaveConversations(_) => "SaveConversations",
        Action::RemoveConversation => "RemoveConversation",
        Action::RemoveConversations => "RemoveConversations",
        Action::SaveFolders(_) => "SaveFolders",
        Action::SavePrompts(_) => "SavePrompts",
    }
}

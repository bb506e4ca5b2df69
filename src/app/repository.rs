#[cfg(test)]
#[path = "repository_test.rs"]
mod tests;

use crate::{
    export::ExportData,
    models::{Action, Conversation, Folder, FolderKind, Message, Model, Prompt},
    storage::{Snapshot, clean::Defaults},
};

/// Result of merging one conversation into the list.
#[derive(Debug, Clone, PartialEq)]
pub struct Updated {
    pub single: Conversation,
    pub all: Vec<Conversation>,
}

/// A single field change on a conversation.
#[derive(Debug, Clone, PartialEq)]
pub enum ConversationField {
    Name(String),
    Model(Model),
    Prompt(String),
    FolderId(Option<String>),
    Messages(Vec<Message>),
}

/// Replace the conversation with the same id, or append it when absent.
pub fn update_conversation(conversations: &[Conversation], updated: Conversation) -> Updated {
    let mut all = conversations.to_vec();
    match all.iter_mut().find(|c| c.id() == updated.id()) {
        Some(existing) => *existing = updated.clone(),
        None => all.push(updated.clone()),
    }
    Updated {
        single: updated,
        all,
    }
}

/// In-memory source of truth for conversations, folders and prompts.
///
/// Every mutation is synchronous and returns the persistence actions it
/// implies, in the order they must be applied. Operations addressing an
/// unknown id change nothing and return no actions.
#[derive(Debug, Clone)]
pub struct Repository {
    conversations: Vec<Conversation>,
    selected: Conversation,
    folders: Vec<Folder>,
    prompts: Vec<Prompt>,
    defaults: Defaults,
}

impl Repository {
    pub fn new(defaults: Defaults) -> Self {
        let selected = Conversation::new(defaults.model.clone(), defaults.prompt.as_str());
        Self {
            conversations: vec![],
            selected,
            folders: vec![],
            prompts: vec![],
            defaults,
        }
    }

    /// Restore state read from storage. Without a stored selection a fresh,
    /// unsaved conversation is selected.
    ///
    /// The selected record is written before the list, so when both hold the
    /// same id the record wins.
    pub fn from_snapshot(snapshot: Snapshot, defaults: Defaults) -> Self {
        let mut repo = Self::new(defaults);
        repo.conversations = snapshot.conversations;
        repo.folders = snapshot.folders;
        repo.prompts = snapshot.prompts;
        if let Some(selected) = snapshot.selected {
            if let Some(entry) = repo
                .conversations
                .iter_mut()
                .find(|c| c.id() == selected.id())
            {
                if *entry != selected {
                    log::warn!(
                        "Conversation {} is stale in history, using the selected record",
                        selected.id()
                    );
                    *entry = selected.clone();
                }
            }
            repo.selected = selected;
        }
        repo
    }

    pub fn conversations(&self) -> &[Conversation] {
        &self.conversations
    }

    pub fn selected(&self) -> &Conversation {
        &self.selected
    }

    pub fn folders(&self) -> &[Folder] {
        &self.folders
    }

    pub fn prompts(&self) -> &[Prompt] {
        &self.prompts
    }

    pub fn defaults(&self) -> &Defaults {
        &self.defaults
    }

    pub fn conversation(&self, id: &str) -> Option<&Conversation> {
        if self.selected.id() == id {
            return Some(&self.selected);
        }
        self.conversations.iter().find(|c| c.id() == id)
    }

    /// Replace the selected conversation without persisting it. Used for
    /// the transient states of a streaming cycle.
    pub fn set_selected(&mut self, conversation: Conversation) {
        self.selected = conversation;
    }

    pub fn update_conversation(&mut self, updated: Conversation) -> Vec<Action> {
        let Updated { single, all } = update_conversation(&self.conversations, updated);
        self.selected = single.clone();
        self.conversations = all.clone();
        vec![Action::SaveConversation(single), Action::SaveConversations(all)]
    }

    pub fn patch_conversation(&mut self, id: &str, field: ConversationField) -> Vec<Action> {
        let Some(conversation) = self.conversation(id) else {
            log::debug!("Ignoring update of unknown conversation {}", id);
            return vec![];
        };
        let mut conversation = conversation.clone();
        conversation = match field {
            ConversationField::Name(name) => conversation.with_name(name),
            ConversationField::Model(model) => conversation.with_model(model),
            ConversationField::Prompt(prompt) => conversation.with_prompt(prompt),
            ConversationField::Messages(messages) => conversation.with_messages(messages),
            ConversationField::FolderId(folder_id) => {
                if !self.folder_accepts(folder_id.as_deref(), FolderKind::Chat) {
                    return vec![];
                }
                conversation.with_folder_id(folder_id)
            }
        };
        self.update_conversation(conversation)
    }

    pub fn create_conversation(&mut self) -> Vec<Action> {
        let model = self
            .conversations
            .last()
            .map(|c| c.model().clone())
            .unwrap_or_else(|| self.defaults.model.clone());
        let conversation = Conversation::new(model, self.defaults.prompt.as_str());
        log::debug!("Created conversation {}", conversation.id());

        self.conversations.push(conversation.clone());
        self.selected = conversation.clone();
        vec![
            Action::SaveConversation(conversation),
            Action::SaveConversations(self.conversations.clone()),
        ]
    }

    pub fn select_conversation(&mut self, id: &str) -> Vec<Action> {
        let Some(conversation) = self.conversations.iter().find(|c| c.id() == id) else {
            log::debug!("Ignoring selection of unknown conversation {}", id);
            return vec![];
        };
        self.selected = conversation.clone();
        vec![Action::SaveConversation(self.selected.clone())]
    }

    pub fn delete_conversation(&mut self, id: &str) -> Vec<Action> {
        let before = self.conversations.len();
        self.conversations.retain(|c| c.id() != id);
        if self.conversations.len() == before {
            log::debug!("Ignoring removal of unknown conversation {}", id);
            return vec![];
        }

        let mut actions = vec![Action::SaveConversations(self.conversations.clone())];
        match self.conversations.last() {
            Some(last) => {
                self.selected = last.clone();
                actions.push(Action::SaveConversation(last.clone()));
            }
            None => {
                self.selected = self.fresh_conversation();
                actions.push(Action::RemoveConversation);
            }
        }
        actions
    }

    /// Drop every conversation and every chat folder. Prompt folders stay.
    pub fn clear_all(&mut self) -> Vec<Action> {
        self.conversations.clear();
        self.selected = self.fresh_conversation();
        self.folders.retain(|f| f.kind() != FolderKind::Chat);
        vec![
            Action::RemoveConversations,
            Action::RemoveConversation,
            Action::SaveFolders(self.folders.clone()),
        ]
    }

    pub fn create_folder(&mut self, name: &str, kind: FolderKind) -> Vec<Action> {
        self.folders.push(Folder::new(name, kind));
        vec![Action::SaveFolders(self.folders.clone())]
    }

    pub fn rename_folder(&mut self, id: &str, name: &str) -> Vec<Action> {
        let Some(folder) = self.folders.iter_mut().find(|f| f.id() == id) else {
            log::debug!("Ignoring rename of unknown folder {}", id);
            return vec![];
        };
        folder.set_name(name);
        vec![Action::SaveFolders(self.folders.clone())]
    }

    /// Remove a folder. Everything filed in it becomes unfiled.
    pub fn delete_folder(&mut self, id: &str) -> Vec<Action> {
        let before = self.folders.len();
        self.folders.retain(|f| f.id() != id);
        if self.folders.len() == before {
            log::debug!("Ignoring removal of unknown folder {}", id);
            return vec![];
        }

        for conversation in self.conversations.iter_mut() {
            if conversation.folder_id() == Some(id) {
                conversation.set_folder_id(None);
            }
        }
        for prompt in self.prompts.iter_mut() {
            if prompt.folder_id() == Some(id) {
                prompt.set_folder_id(None);
            }
        }

        let mut actions = vec![
            Action::SaveFolders(self.folders.clone()),
            Action::SaveConversations(self.conversations.clone()),
            Action::SavePrompts(self.prompts.clone()),
        ];
        if self.selected.folder_id() == Some(id) {
            self.selected.set_folder_id(None);
            actions.push(Action::SaveConversation(self.selected.clone()));
        }
        actions
    }

    pub fn folders_of(&self, kind: FolderKind) -> Vec<&Folder> {
        self.folders.iter().filter(|f| f.kind() == kind).collect()
    }

    pub fn create_prompt(&mut self) -> Vec<Action> {
        let name = format!("Prompt {}", self.prompts.len() + 1);
        self.prompts.push(Prompt::new(name, self.defaults.model.clone()));
        vec![Action::SavePrompts(self.prompts.clone())]
    }

    pub fn update_prompt(&mut self, prompt: Prompt) -> Vec<Action> {
        let Some(existing) = self.prompts.iter_mut().find(|p| p.id() == prompt.id()) else {
            log::debug!("Ignoring update of unknown prompt {}", prompt.id());
            return vec![];
        };
        *existing = prompt;
        vec![Action::SavePrompts(self.prompts.clone())]
    }

    pub fn delete_prompt(&mut self, id: &str) -> Vec<Action> {
        let before = self.prompts.len();
        self.prompts.retain(|p| p.id() != id);
        if self.prompts.len() == before {
            log::debug!("Ignoring removal of unknown prompt {}", id);
            return vec![];
        }
        vec![Action::SavePrompts(self.prompts.clone())]
    }

    pub fn move_prompt(&mut self, id: &str, folder_id: Option<String>) -> Vec<Action> {
        if !self.folder_accepts(folder_id.as_deref(), FolderKind::Prompt) {
            return vec![];
        }
        let Some(prompt) = self.prompts.iter_mut().find(|p| p.id() == id) else {
            log::debug!("Ignoring move of unknown prompt {}", id);
            return vec![];
        };
        prompt.set_folder_id(folder_id);
        vec![Action::SavePrompts(self.prompts.clone())]
    }

    /// Conversations whose name or any message contains `term`, ignoring
    /// case. An empty term matches everything.
    pub fn search_conversations(&self, term: &str) -> Vec<&Conversation> {
        let term = term.trim();
        self.conversations
            .iter()
            .filter(|c| term.is_empty() || c.matches(term))
            .collect()
    }

    /// Conversations filed in `folder_id`, or the unfiled ones for `None`.
    pub fn conversations_in(&self, folder_id: Option<&str>) -> Vec<&Conversation> {
        self.conversations
            .iter()
            .filter(|c| c.folder_id() == folder_id)
            .collect()
    }

    /// Replace all state with an import. The last imported conversation
    /// becomes the selection.
    pub fn import(&mut self, data: ExportData) -> Vec<Action> {
        self.conversations = data.history;
        self.folders = data.folders;
        self.prompts = data.prompts;

        let mut actions = vec![Action::SaveConversations(self.conversations.clone())];
        match self.conversations.last() {
            Some(last) => {
                self.selected = last.clone();
                actions.push(Action::SaveConversation(last.clone()));
            }
            None => {
                self.selected = self.fresh_conversation();
                actions.push(Action::RemoveConversation);
            }
        }
        actions.push(Action::SaveFolders(self.folders.clone()));
        actions.push(Action::SavePrompts(self.prompts.clone()));
        actions
    }

    pub fn export(&self) -> ExportData {
        crate::export::export_data(self)
    }

    fn fresh_conversation(&self) -> Conversation {
        Conversation::new(self.defaults.model.clone(), self.defaults.prompt.as_str())
    }

    fn folder_accepts(&self, folder_id: Option<&str>, kind: FolderKind) -> bool {
        let Some(folder_id) = folder_id else {
            return true;
        };
        match self.folders.iter().find(|f| f.id() == folder_id) {
            Some(folder) if folder.kind() == kind => true,
            Some(folder) => {
                log::debug!(
                    "Folder {} holds {} items, refusing a {} item",
                    folder_id,
                    folder.kind(),
                    kind
                );
                false
            }
            None => {
                log::debug!("Ignoring move into unknown folder {}", folder_id);
                false
            }
        }
    }
}

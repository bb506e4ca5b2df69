use super::{Conversation, Folder, Prompt};

/// A durable write produced by a repository mutation. Actions are applied
/// in the order they are returned.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    SaveConversation(Conversation), // Selected conversation record
    SaveConversations(Vec<Conversation>),
    RemoveConversation, // Drop the selected conversation record
    RemoveConversations,
    SaveFolders(Vec<Folder>),
    SavePrompts(Vec<Prompt>),
}

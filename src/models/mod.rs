pub mod action;
pub mod backend;
pub mod conversation;
pub mod event;
pub mod folder;
pub mod message;
pub mod notice;
pub mod prompt;

pub use backend::*;
pub use conversation::{Conversation, conversation_name};
pub use folder::{Folder, FolderKind};
pub use message::{Message, Role};
pub use notice::*;
pub use prompt::{Prompt, filter_prompts};

pub use action::*;
pub use event::{ArcEventTx, Event, EventTx, SessionState, Status};

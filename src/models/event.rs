use std::sync::Arc;

use tokio::sync::mpsc;

use super::{Conversation, NoticeMessage};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Idle,
    Sending,
    StreamingText,
    WaitingJson,
}

/// Externally observable progress of the streaming session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Status {
    pub state: SessionState,
    pub loading: bool,
    pub message_is_streaming: bool,
}

#[derive(Debug, Clone)]
pub enum Event {
    Notice(NoticeMessage),

    /// The selected conversation changed (new selection, new message or a
    /// streamed chunk applied to the last message)
    ConversationUpdated(Conversation),
    /// The conversation list changed
    ConversationsUpdated(Vec<Conversation>),
    /// Raw text of one applied chunk
    StreamChunk(String),
    StatusChanged(Status),
}

#[macro_export]
macro_rules! notice_info {
    ($msg:expr) => {
        $crate::models::Event::Notice($crate::models::NoticeMessage::info($msg))
    };
}

#[macro_export]
macro_rules! notice_warning {
    ($msg:expr) => {
        $crate::models::Event::Notice($crate::models::NoticeMessage::warning($msg))
    };
}

#[macro_export]
macro_rules! notice_error {
    ($msg:expr) => {
        $crate::models::Event::Notice($crate::models::NoticeMessage::error($msg))
    };
}

#[async_trait::async_trait]
pub trait EventTx {
    async fn send(&self, event: Event) -> Result<(), mpsc::error::SendError<Event>>;
}

impl Status {
    pub fn idle() -> Self {
        Self::default()
    }

    pub fn sending() -> Self {
        Self {
            state: SessionState::Sending,
            loading: true,
            message_is_streaming: true,
        }
    }

    pub fn with_state(mut self, state: SessionState) -> Self {
        self.state = state;
        self
    }

    pub fn is_idle(&self) -> bool {
        self.state == SessionState::Idle
    }
}

#[async_trait::async_trait]
impl EventTx for mpsc::Sender<Event> {
    async fn send(&self, event: Event) -> Result<(), mpsc::error::SendError<Event>> {
        self.send(event).await
    }
}

#[async_trait::async_trait]
impl EventTx for mpsc::UnboundedSender<Event> {
    async fn send(&self, event: Event) -> Result<(), mpsc::error::SendError<Event>> {
        self.send(event)
    }
}

pub type ArcEventTx = Arc<dyn EventTx + Send + Sync>;

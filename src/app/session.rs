#[cfg(test)]
#[path = "session_test.rs"]
mod tests;

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};
use std::time::Duration;

use futures::StreamExt;
use tokio::sync::watch;

use crate::{
    backend::{ArcBackend, ChunkStream, Reply},
    models::{
        ArcEventTx, Conversation, Event, Message, Route, SessionState, Status, conversation_name,
    },
    notice_error,
};

/// How a request/response cycle ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Completed,
    /// Stopped by the user. Text applied so far is kept.
    Cancelled,
    /// Request or reply failed. Nothing was persisted.
    Failed(String),
    /// Refused before any request was made
    Rejected(String),
    /// Nothing to do
    Skipped,
}

/// The conversation a cycle produced, and how the cycle ended.
#[derive(Debug, Clone)]
pub struct Cycle {
    pub conversation: Conversation,
    pub outcome: Outcome,
}

/// Cancels the running cycle at the next chunk boundary. The flag lowers
/// itself again after a fixed delay.
#[derive(Debug, Clone)]
pub struct StopHandle {
    flag: Arc<AtomicBool>,
    reset_delay: Duration,
}

impl StopHandle {
    pub fn new(reset_delay: Duration) -> Self {
        Self {
            flag: Arc::new(AtomicBool::new(false)),
            reset_delay,
        }
    }

    pub fn stop(&self) {
        self.flag.store(true, Ordering::SeqCst);
        log::debug!("Stop requested");

        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            log::warn!("No runtime to schedule the stop reset, lowering the flag now");
            self.reset();
            return;
        };
        let flag = Arc::clone(&self.flag);
        let delay = self.reset_delay;
        runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            flag.store(false, Ordering::SeqCst);
        });
    }

    pub fn is_stopped(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    pub fn reset(&self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

/// Truncate the last `delete_count` messages and append `message`.
pub fn prepare_conversation(
    conversation: &Conversation,
    delete_count: usize,
    message: Message,
) -> Conversation {
    let keep = conversation.len().saturating_sub(delete_count);
    let mut messages = conversation.messages()[..keep].to_vec();
    messages.push(message);
    conversation.clone().with_messages(messages)
}

pub fn push_assistant(conversation: &Conversation, content: &str) -> Conversation {
    let mut messages = conversation.messages().to_vec();
    messages.push(Message::new_assistant(content));
    conversation.clone().with_messages(messages)
}

/// Swap the last message for a copy carrying `content`.
pub fn replace_last_content(conversation: &Conversation, content: &str) -> Conversation {
    let mut messages = conversation.messages().to_vec();
    if let Some(last) = messages.last_mut() {
        *last = last.with_content(content);
    }
    conversation.clone().with_messages(messages)
}

/// Name a conversation after its first message.
pub fn auto_name(conversation: Conversation) -> Conversation {
    if conversation.len() != 1 {
        return conversation;
    }
    let name = conversation
        .last_message()
        .map(|m| conversation_name(m.content()));
    match name {
        Some(name) => conversation.with_name(name),
        None => conversation,
    }
}

/// Drives one request/response cycle against the backend and reports its
/// progress on the event channel.
pub struct Session {
    backend: ArcBackend,
    event_tx: ArcEventTx,
    stop: StopHandle,
    status: watch::Sender<Status>,
}

impl Session {
    pub fn new(backend: ArcBackend, event_tx: ArcEventTx, stop: StopHandle) -> Self {
        let (status, _) = watch::channel(Status::idle());
        Self {
            backend,
            event_tx,
            stop,
            status,
        }
    }

    pub fn status(&self) -> Status {
        *self.status.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<Status> {
        self.status.subscribe()
    }

    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    /// Send `working` (already truncated, new message last) and apply the
    /// reply to it. Status is left busy; call [`Session::finish`] once the
    /// result has been stored.
    pub async fn run(&self, working: Conversation, route: Route) -> Cycle {
        self.set_status(Status::sending()).await;
        self.emit(Event::ConversationUpdated(working.clone())).await;

        log::debug!(
            "Sending {} messages of {} to {} ({:?})",
            working.len(),
            working.id(),
            self.backend.name(),
            route
        );
        let reply = match self.backend.chat(route, working.chat_body()).await {
            Ok(reply) => reply,
            Err(err) => return self.fail(working, err).await,
        };

        let working = auto_name(working);
        match reply {
            Reply::Stream(stream) => self.consume_stream(working, stream).await,
            Reply::Answer(answer) => {
                self.set_status(Status::sending().with_state(SessionState::WaitingJson))
                    .await;
                let conversation = push_assistant(&working, &answer);
                self.emit(Event::ConversationUpdated(conversation.clone()))
                    .await;
                Cycle {
                    conversation,
                    outcome: Outcome::Completed,
                }
            }
        }
    }

    pub async fn finish(&self) {
        self.set_status(Status::idle()).await;
    }

    async fn consume_stream(
        &self,
        working: Conversation,
        mut stream: ChunkStream,
    ) -> Cycle {
        self.set_status(Status::sending().with_state(SessionState::StreamingText))
            .await;

        let mut conversation = working;
        let mut text = String::new();
        let mut applied = 0usize;
        let mut outcome = Outcome::Completed;

        while let Some(chunk) = stream.next().await {
            let chunk = match chunk {
                Ok(chunk) => chunk,
                Err(err) => {
                    log::warn!("Reply stream ended early: {:?}", err);
                    break;
                }
            };
            if self.stop.is_stopped() {
                log::debug!("Stopping {} after {} chunks", conversation.id(), applied);
                outcome = Outcome::Cancelled;
                break;
            }

            text.push_str(&chunk);
            conversation = if applied == 0 {
                push_assistant(&conversation, &text)
            } else {
                replace_last_content(&conversation, &text)
            };
            applied += 1;

            self.emit(Event::ConversationUpdated(conversation.clone()))
                .await;
            self.emit(Event::StreamChunk(chunk)).await;
        }

        if applied == 0 && outcome == Outcome::Completed {
            conversation = push_assistant(&conversation, "");
            self.emit(Event::ConversationUpdated(conversation.clone()))
                .await;
        }

        Cycle {
            conversation,
            outcome,
        }
    }

    async fn fail(&self, working: Conversation, err: eyre::Report) -> Cycle {
        log::error!("Chat request for {} failed: {:?}", working.id(), err);
        let reason = err.to_string();
        self.emit(notice_error!(reason.clone())).await;
        Cycle {
            conversation: working,
            outcome: Outcome::Failed(reason),
        }
    }

    async fn set_status(&self, status: Status) {
        self.status.send_replace(status);
        self.emit(Event::StatusChanged(status)).await;
    }

    async fn emit(&self, event: Event) {
        if let Err(err) = self.event_tx.send(event).await {
            log::debug!("Dropping event, no receiver: {}", err);
        }
    }
}

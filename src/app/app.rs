#[cfg(test)]
#[path = "app_test.rs"]
mod tests;

use std::time::Duration;

use eyre::{Context, Result};
use tokio::sync::watch;

use crate::{
    backend::ArcBackend,
    export::ExportData,
    models::{
        Action, ArcEventTx, Conversation, Event, FolderKind, Message, Plugin, Prompt, Route,
        Status,
    },
    notice_info, notice_warning,
    storage::{ArcStorage, Persistence, clean::Defaults},
};

use super::{
    repository::{ConversationField, Repository},
    session::{Outcome, Session, StopHandle, prepare_conversation},
};

/// Front-end facing coordinator. Owns the repository and runs every
/// mutation through storage before announcing it on the event channel.
pub struct App {
    repository: Repository,
    persistence: Persistence,
    session: Session,
    event_tx: ArcEventTx,
}

impl App {
    pub fn new(
        backend: ArcBackend,
        storage: ArcStorage,
        event_tx: ArcEventTx,
        defaults: Defaults,
        stop_reset_delay: Duration,
    ) -> Self {
        let session = Session::new(
            backend,
            event_tx.clone(),
            StopHandle::new(stop_reset_delay),
        );
        Self {
            repository: Repository::new(defaults),
            persistence: Persistence::new(storage),
            session,
            event_tx,
        }
    }

    /// Replace in-memory state with what storage holds.
    pub async fn load(&mut self) -> Result<()> {
        let defaults = self.repository.defaults().clone();
        let snapshot = self
            .persistence
            .load(&defaults)
            .await
            .wrap_err("loading saved conversations")?;
        self.repository = Repository::from_snapshot(snapshot, defaults);
        self.publish().await;
        Ok(())
    }

    pub fn repository(&self) -> &Repository {
        &self.repository
    }

    pub fn selected(&self) -> &Conversation {
        self.repository.selected()
    }

    pub fn status(&self) -> Status {
        self.session.status()
    }

    pub fn subscribe_status(&self) -> watch::Receiver<Status> {
        self.session.subscribe()
    }

    pub fn stop_handle(&self) -> StopHandle {
        self.session.stop_handle()
    }

    pub fn stop(&self) {
        self.session.stop_handle().stop();
    }

    /// Send `message` on the selected conversation after dropping its last
    /// `delete_count` messages.
    ///
    /// Transport and reply errors are reported through [`Outcome::Failed`]
    /// and leave the selected conversation as it was. Only storage errors
    /// are returned as `Err`.
    pub async fn send(
        &mut self,
        message: Message,
        delete_count: usize,
        plugin: Option<Plugin>,
    ) -> Result<Outcome> {
        if let Some(reason) = self.validate(&message) {
            return Ok(self.reject(reason).await);
        }

        let original = self.repository.selected().clone();
        let working = prepare_conversation(&original, delete_count, message);
        self.repository.set_selected(working.clone());

        let cycle = self.session.run(working, Route::from(plugin)).await;
        if let Outcome::Failed(_) = cycle.outcome {
            self.repository.set_selected(original.clone());
            self.emit(Event::ConversationUpdated(original)).await;
            self.session.finish().await;
            return Ok(cycle.outcome);
        }

        let actions = self.repository.update_conversation(cycle.conversation);
        let saved = self.commit(actions).await;
        self.session.finish().await;
        saved?;
        Ok(cycle.outcome)
    }

    /// Re-send the last user message in place of the last exchange.
    pub async fn regenerate(&mut self) -> Result<Outcome> {
        let messages = self.repository.selected().messages();
        let Some(message) = messages
            .len()
            .checked_sub(2)
            .map(|idx| &messages[idx])
            .filter(|m| m.is_user())
            .cloned()
        else {
            return Ok(Outcome::Skipped);
        };
        self.send(message, 2, None).await
    }

    /// Drop every message from `index` on, then send `message`.
    ///
    /// The truncation only becomes durable once the reply succeeds.
    pub async fn edit_message(
        &mut self,
        message: Message,
        index: usize,
        plugin: Option<Plugin>,
    ) -> Result<Outcome> {
        let delete_count = self.repository.selected().len().saturating_sub(index);
        self.send(message, delete_count, plugin).await
    }

    pub async fn new_conversation(&mut self) -> Result<()> {
        let actions = self.repository.create_conversation();
        self.commit(actions).await
    }

    pub async fn select_conversation(&mut self, id: &str) -> Result<()> {
        let actions = self.repository.select_conversation(id);
        self.commit(actions).await
    }

    pub async fn delete_conversation(&mut self, id: &str) -> Result<()> {
        let actions = self.repository.delete_conversation(id);
        self.commit(actions).await
    }

    pub async fn update_conversation(&mut self, id: &str, field: ConversationField) -> Result<()> {
        let actions = self.repository.patch_conversation(id, field);
        self.commit(actions).await
    }

    pub async fn clear_conversations(&mut self) -> Result<()> {
        let actions = self.repository.clear_all();
        self.commit(actions).await
    }

    pub async fn create_folder(&mut self, name: &str, kind: FolderKind) -> Result<()> {
        let actions = self.repository.create_folder(name, kind);
        self.commit(actions).await
    }

    pub async fn rename_folder(&mut self, id: &str, name: &str) -> Result<()> {
        let actions = self.repository.rename_folder(id, name);
        self.commit(actions).await
    }

    pub async fn delete_folder(&mut self, id: &str) -> Result<()> {
        let actions = self.repository.delete_folder(id);
        self.commit(actions).await
    }

    pub async fn create_prompt(&mut self) -> Result<()> {
        let actions = self.repository.create_prompt();
        self.commit(actions).await
    }

    pub async fn update_prompt(&mut self, prompt: Prompt) -> Result<()> {
        let actions = self.repository.update_prompt(prompt);
        self.commit(actions).await
    }

    pub async fn delete_prompt(&mut self, id: &str) -> Result<()> {
        let actions = self.repository.delete_prompt(id);
        self.commit(actions).await
    }

    pub async fn move_prompt(&mut self, id: &str, folder_id: Option<String>) -> Result<()> {
        let actions = self.repository.move_prompt(id, folder_id);
        self.commit(actions).await
    }

    pub async fn import(&mut self, data: ExportData) -> Result<()> {
        let count = data.history.len();
        let actions = self.repository.import(data);
        self.commit(actions).await?;
        self.emit(notice_info!(format!("Imported {} conversations", count)))
            .await;
        Ok(())
    }

    pub fn export(&self) -> ExportData {
        self.repository.export()
    }

    pub fn search(&self, term: &str) -> Vec<&Conversation> {
        self.repository.search_conversations(term)
    }

    fn validate(&self, message: &Message) -> Option<String> {
        if message.content().is_empty() {
            return Some("Please enter a message".to_string());
        }
        if !self.status().is_idle() {
            return Some("A reply is still streaming".to_string());
        }
        let max_length = self.repository.selected().model().max_length();
        let length = message.content().chars().count();
        if max_length > 0 && length > max_length {
            return Some(format!(
                "Message limit is {} characters. You have entered {} characters.",
                max_length, length
            ));
        }
        None
    }

    async fn reject(&self, reason: String) -> Outcome {
        log::debug!("Rejected message: {}", reason);
        self.emit(notice_warning!(reason.clone())).await;
        Outcome::Rejected(reason)
    }

    async fn commit(&mut self, actions: Vec<Action>) -> Result<()> {
        if actions.is_empty() {
            return Ok(());
        }
        self.persistence
            .apply(&actions)
            .await
            .wrap_err("saving changes")?;
        self.publish().await;
        Ok(())
    }

    async fn publish(&self) {
        self.emit(Event::ConversationsUpdated(
            self.repository.conversations().to_vec(),
        ))
        .await;
        self.emit(Event::ConversationUpdated(self.repository.selected().clone()))
            .await;
    }

    async fn emit(&self, event: Event) {
        if let Err(err) = self.event_tx.send(event).await {
            log::debug!("Dropping event, no receiver: {}", err);
        }
    }
}

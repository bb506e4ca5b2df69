pub mod clean;
pub mod memory;
pub mod persistence;
pub mod sqlite;

use std::sync::Arc;

use crate::config::{StorageConfig, constants::DEFAULT_DB_PATH, resolve_path};
use async_trait::async_trait;
use eyre::{Context, Result};

pub use memory::Memory;
pub use persistence::{Persistence, Snapshot};
pub use sqlite::Sqlite;

pub const CONVERSATION_HISTORY_KEY: &str = "conversationHistory";
pub const SELECTED_CONVERSATION_KEY: &str = "selectedConversation";
pub const FOLDERS_KEY: &str = "folders";
pub const PROMPTS_KEY: &str = "prompts";

/// Durable string store offering single-key operations only. There is no
/// atomicity across keys.
#[async_trait]
pub trait Storage {
    async fn get(&self, key: &str) -> Result<Option<String>>;
    async fn set(&self, key: &str, value: &str) -> Result<()>;
    async fn remove(&self, key: &str) -> Result<()>;
}

pub type ArcStorage = Arc<dyn Storage + Send + Sync>;

pub async fn new_storage(config: &StorageConfig) -> Result<ArcStorage> {
    let storage: ArcStorage = match config {
        StorageConfig::Sqlite(sqlite_config) => {
            let path = resolve_path(sqlite_config.path.as_deref().unwrap_or(DEFAULT_DB_PATH))
                .wrap_err("resolving database path")?;
            if let Some(dir) = std::path::Path::new(&path).parent() {
                std::fs::create_dir_all(dir)
                    .wrap_err(format!("creating directory {}", dir.display()))?;
            }
            Arc::new(Sqlite::new(Some(&path)).await?)
        }
        StorageConfig::Memory => Arc::new(Memory::default()),
    };
    Ok(storage)
}

use std::collections::HashMap;

use async_trait::async_trait;
use eyre::Result;
use tokio::sync::RwLock;

use super::Storage;

/// Process-local store. Nothing survives a restart.
#[derive(Default)]
pub struct Memory {
    values: RwLock<HashMap<String, String>>,
}

impl Memory {
    pub async fn len(&self) -> usize {
        self.values.read().await.len()
    }
}

#[async_trait]
impl Storage for Memory {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.values.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.values
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.values.write().await.remove(key);
        Ok(())
    }
}

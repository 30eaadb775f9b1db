//! In-memory agent store (non-persistent).

use super::{AgentRecord, AgentStore, StoreError};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Clone, Default)]
pub struct InMemoryAgentStore {
    // Vec keeps insertion order for listings; the agent population is small.
    records: Arc<RwLock<Vec<AgentRecord>>>,
}

impl InMemoryAgentStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AgentStore for InMemoryAgentStore {
    fn is_persistent(&self) -> bool {
        false
    }

    async fn provision(&self, record: AgentRecord) -> Result<(), StoreError> {
        record.validate()?;
        let mut records = self.records.write().await;
        if records.iter().any(|r| r.id == record.id) {
            return Err(StoreError::IdConflict(record.id));
        }
        records.push(record);
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Option<AgentRecord>, StoreError> {
        Ok(self
            .records
            .read()
            .await
            .iter()
            .find(|r| r.id == id)
            .cloned())
    }

    async fn list(&self) -> Result<Vec<AgentRecord>, StoreError> {
        Ok(self.records.read().await.clone())
    }
}

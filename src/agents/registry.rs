//! Agent registry: provisioning plus the hydration cache.
//!
//! Hydrated configs are memoized per id. Concurrent hydration of the same id
//! may race; the last publication wins, which is harmless because hydration
//! is a pure function of the stored record.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use super::AgentConfig;
use crate::store::{AgentRecord, AgentStore, StoreError};
use crate::tools::ToolFactory;

pub struct AgentRegistry {
    store: Arc<dyn AgentStore>,
    tool_factory: ToolFactory,
    cache: RwLock<HashMap<String, Arc<AgentConfig>>>,
}

impl AgentRegistry {
    pub fn new(store: Arc<dyn AgentStore>, tool_factory: ToolFactory) -> Self {
        Self {
            store,
            tool_factory,
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Persist a new definition. Does not touch the cache.
    pub async fn provision(&self, record: AgentRecord) -> Result<(), StoreError> {
        let id = record.id.clone();
        self.store.provision(record).await?;
        tracing::info!("Provisioned agent '{}'", id);
        Ok(())
    }

    /// Hydrated config for `agent_id`, or `None` if no such agent is stored.
    ///
    /// Misses are not cached, so a later `provision` of the same id is seen.
    pub async fn load_config(&self, agent_id: &str) -> Result<Option<Arc<AgentConfig>>, StoreError> {
        if let Some(config) = self.cache.read().await.get(agent_id) {
            tracing::debug!("Config cache hit for agent '{}'", agent_id);
            return Ok(Some(Arc::clone(config)));
        }

        tracing::debug!("Config cache miss for agent '{}', loading from store", agent_id);
        let Some(record) = self.store.get(agent_id).await? else {
            return Ok(None);
        };

        let config = Arc::new(AgentConfig::hydrate(record, &self.tool_factory));
        self.cache
            .write()
            .await
            .insert(agent_id.to_string(), Arc::clone(&config));
        Ok(Some(config))
    }

    /// Drop one cached config. Idempotent.
    pub async fn invalidate(&self, agent_id: &str) {
        if self.cache.write().await.remove(agent_id).is_some() {
            tracing::debug!("Invalidated cached config for agent '{}'", agent_id);
        }
    }

    /// Drop every cached config.
    pub async fn clear(&self) {
        self.cache.write().await.clear();
        tracing::debug!("Cleared agent config cache");
    }

    pub async fn cached_count(&self) -> usize {
        self.cache.read().await.len()
    }

    /// All stored definitions, uncached.
    pub async fn list(&self) -> Result<Vec<AgentRecord>, StoreError> {
        self.store.list().await
    }
}

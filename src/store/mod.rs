//! Agent definition storage with pluggable backends.
//!
//! Supports:
//! - `memory`: In-memory storage (non-persistent, for testing)
//! - `sqlite`: SQLite database, the durable `agents` table

mod memory;
mod sqlite;

pub use memory::InMemoryAgentStore;
pub use sqlite::SqliteAgentStore;

use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

/// A persisted virtual agent definition.
///
/// `id` is immutable once stored. Both lists keep the order they were provisioned with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentRecord {
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default)]
    pub system_prompt: Option<String>,
    /// Tool identifiers, e.g. `weather`
    #[serde(default, deserialize_with = "null_as_default")]
    pub enabled_tools: Vec<String>,
    /// Ids of agents on this gateway that this one may delegate to
    #[serde(default, deserialize_with = "null_as_default")]
    pub downstream_peers: Vec<String>,
}

/// Explicit JSON `null` reads the same as an absent field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl AgentRecord {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            system_prompt: None,
            enabled_tools: Vec::new(),
            downstream_peers: Vec::new(),
        }
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    pub fn with_tools<I, S>(mut self, tools: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.enabled_tools = tools.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_peers<I, S>(mut self, peers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.downstream_peers = peers.into_iter().map(Into::into).collect();
        self
    }

    /// Reject records that can never be addressed.
    pub fn validate(&self) -> Result<(), StoreError> {
        if self.id.trim().is_empty() {
            return Err(StoreError::InvalidRecord(
                "Agent id must not be empty".to_string(),
            ));
        }
        if self.id.contains('/') {
            return Err(StoreError::InvalidRecord(format!(
                "Agent id '{}' must not contain '/'",
                self.id
            )));
        }
        Ok(())
    }
}

/// Errors raised by agent stores.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Agent ID '{0}' is already taken.")]
    IdConflict(String),

    #[error("Invalid agent record: {0}")]
    InvalidRecord(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        Self::Database(e.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}

/// Agent store trait - implemented by all storage backends.
#[async_trait]
pub trait AgentStore: Send + Sync {
    /// Whether this store persists data across restarts.
    fn is_persistent(&self) -> bool;

    /// Insert a new definition. Fails with `IdConflict` if the id exists.
    async fn provision(&self, record: AgentRecord) -> Result<(), StoreError>;

    /// Get a single definition by id.
    async fn get(&self, id: &str) -> Result<Option<AgentRecord>, StoreError>;

    /// All definitions in insertion order.
    async fn list(&self) -> Result<Vec<AgentRecord>, StoreError>;
}

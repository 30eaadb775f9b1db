//! SQLite-based agent store.

use super::{AgentRecord, AgentStore, StoreError};
use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;

const SCHEMA: &str = r#"
PRAGMA journal_mode = WAL;

CREATE TABLE IF NOT EXISTS agents (
    id TEXT PRIMARY KEY NOT NULL,
    name TEXT NOT NULL,
    system_prompt TEXT,
    enabled_tools TEXT NOT NULL DEFAULT '[]',
    downstream_peers TEXT NOT NULL DEFAULT '[]'
);
"#;

pub struct SqliteAgentStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteAgentStore {
    /// Open (or create) the database at `db_path` and apply the schema.
    ///
    /// `:memory:` opens a private in-memory database.
    pub async fn open(db_path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let db_path = db_path.as_ref().to_path_buf();

        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await.map_err(|e| {
                    StoreError::Database(format!("Failed to create database dir: {}", e))
                })?;
            }
        }

        let conn = tokio::task::spawn_blocking(move || {
            let conn = Connection::open(&db_path)?;
            conn.execute_batch(SCHEMA)?;
            tracing::info!("Opened agent database at {}", db_path.display());
            Ok::<_, StoreError>(conn)
        })
        .await
        .map_err(|e| StoreError::Database(format!("Task join error: {}", e)))??;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }
}

/// Decode a JSON list column; corrupt values read as empty.
fn decode_list(raw: Option<String>) -> Vec<String> {
    raw.and_then(|s| serde_json::from_str(&s).ok())
        .unwrap_or_default()
}

fn row_to_record(row: &Row<'_>) -> rusqlite::Result<AgentRecord> {
    Ok(AgentRecord {
        id: row.get(0)?,
        name: row.get(1)?,
        system_prompt: row.get(2)?,
        enabled_tools: decode_list(row.get(3)?),
        downstream_peers: decode_list(row.get(4)?),
    })
}

#[async_trait]
impl AgentStore for SqliteAgentStore {
    fn is_persistent(&self) -> bool {
        true
    }

    async fn provision(&self, record: AgentRecord) -> Result<(), StoreError> {
        record.validate()?;
        let enabled_tools = serde_json::to_string(&record.enabled_tools)?;
        let downstream_peers = serde_json::to_string(&record.downstream_peers)?;
        let conn = self.conn.clone();

        tokio::task::spawn_blocking(move || {
            let mut conn = conn.blocking_lock();
            let tx = conn.transaction()?;

            let exists = tx
                .prepare("SELECT 1 FROM agents WHERE id = ?1")?
                .exists(params![&record.id])?;
            if exists {
                // Dropping the transaction rolls it back
                return Err(StoreError::IdConflict(record.id));
            }

            tx.execute(
                "INSERT INTO agents (id, name, system_prompt, enabled_tools, downstream_peers)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    &record.id,
                    &record.name,
                    &record.system_prompt,
                    &enabled_tools,
                    &downstream_peers
                ],
            )?;
            tx.commit()?;
            Ok::<_, StoreError>(())
        })
        .await
        .map_err(|e| StoreError::Database(format!("Task join error: {}", e)))?
    }

    async fn get(&self, id: &str) -> Result<Option<AgentRecord>, StoreError> {
        let conn = self.conn.clone();
        let id = id.to_string();

        tokio::task::spawn_blocking(move || {
            let conn = conn.blocking_lock();
            let record = conn
                .query_row(
                    "SELECT id, name, system_prompt, enabled_tools, downstream_peers
                     FROM agents WHERE id = ?1",
                    params![&id],
                    row_to_record,
                )
                .optional()?;
            Ok::<_, StoreError>(record)
        })
        .await
        .map_err(|e| StoreError::Database(format!("Task join error: {}", e)))?
    }

    async fn list(&self) -> Result<Vec<AgentRecord>, StoreError> {
        let conn = self.conn.clone();

        tokio::task::spawn_blocking(move || {
            let conn = conn.blocking_lock();
            let mut stmt = conn.prepare(
                "SELECT id, name, system_prompt, enabled_tools, downstream_peers
                 FROM agents ORDER BY rowid",
            )?;
            let records = stmt
                .query_map([], row_to_record)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok::<_, StoreError>(records)
        })
        .await
        .map_err(|e| StoreError::Database(format!("Task join error: {}", e)))?
    }
}

//! API request and response types.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::store::AgentRecord;
use crate::util::prompt_preview;

/// Body of `POST /agents/{id}/message`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MessageRequest {
    /// The user message (missing or null reads as empty)
    #[serde(default)]
    pub message: Option<String>,

    /// Hop counter set by delegating agents; string or number on the wire
    #[serde(rename = "_delegationDepth", default)]
    pub delegation_depth: Option<Value>,
}

impl MessageRequest {
    pub fn message(&self) -> &str {
        self.message.as_deref().unwrap_or("")
    }

    pub fn depth(&self) -> u32 {
        parse_delegation_depth(self.delegation_depth.as_ref())
    }
}

/// Successful reply from an agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub reply: String,
}

/// Error body for failed message handling.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Well-known metadata document for one agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentCard {
    pub id: String,
    pub name: String,
    pub description: String,
    pub homepage: String,
}

/// Row of the registry view.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentInfo {
    pub id: String,
    pub name: String,
    /// First 100 characters of the system prompt plus `...`, or empty
    pub prompt_preview: String,
    pub enabled_tools: Vec<String>,
    pub downstream_peers: Vec<String>,
}

impl From<AgentRecord> for AgentInfo {
    fn from(record: AgentRecord) -> Self {
        Self {
            prompt_preview: prompt_preview(record.system_prompt.as_deref()),
            id: record.id,
            name: record.name,
            enabled_tools: record.enabled_tools,
            downstream_peers: record.downstream_peers,
        }
    }
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Service status
    pub status: String,

    /// Service version
    pub version: String,

    /// Whether a real LLM key is configured
    pub llm_enabled: bool,

    /// Maximum delegation hops served
    pub max_delegation_depth: u32,
}

/// Interpret a wire `_delegationDepth`.
///
/// Accepts a non-negative integer as a string or a number; anything else is 0.
/// Values beyond `u32::MAX` saturate.
pub fn parse_delegation_depth(raw: Option<&Value>) -> u32 {
    let parsed = match raw {
        Some(Value::String(s)) => s.trim().parse::<u64>().ok(),
        Some(Value::Number(n)) => n.as_u64(),
        _ => None,
    };
    parsed
        .map(|depth| u32::try_from(depth).unwrap_or(u32::MAX))
        .unwrap_or(0)
}

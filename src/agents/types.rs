//! Runtime agent configuration.

use crate::store::AgentRecord;
use crate::tools::{Tool, ToolFactory};

/// Executable configuration hydrated from an `AgentRecord`.
///
/// # Invariants
/// - `tools` is built once at hydration and never mutated afterwards
/// - `id` equals the registry cache key it is published under
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentConfig {
    pub id: String,
    pub name: String,
    pub system_prompt: Option<String>,
    pub enabled_tools: Vec<String>,
    pub downstream_peers: Vec<String>,
    pub tools: Vec<Tool>,
}

impl AgentConfig {
    /// Copy the record's fields and realize its tools.
    pub fn hydrate(record: AgentRecord, factory: &ToolFactory) -> Self {
        let tools = factory.create_tools_for(&record.enabled_tools, &record.downstream_peers);
        Self {
            id: record.id,
            name: record.name,
            system_prompt: record.system_prompt,
            enabled_tools: record.enabled_tools,
            downstream_peers: record.downstream_peers,
            tools,
        }
    }

    /// System prompt text, empty when the definition has none.
    pub fn system_prompt(&self) -> &str {
        self.system_prompt.as_deref().unwrap_or("")
    }

    pub fn has_peers(&self) -> bool {
        !self.downstream_peers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hydrate_copies_fields_and_builds_tools() {
        let record = AgentRecord::new("router", "Router")
            .with_system_prompt("Route things.")
            .with_tools(["weather", "unknown"])
            .with_peers(["billing"]);
        let config = AgentConfig::hydrate(record, &ToolFactory::new("http://gw"));

        assert_eq!(config.id, "router");
        assert_eq!(config.name, "Router");
        assert_eq!(config.system_prompt(), "Route things.");
        assert_eq!(config.enabled_tools, vec!["weather", "unknown"]);
        assert_eq!(config.downstream_peers, vec!["billing"]);
        assert_eq!(config.tools.len(), 2);
        assert!(config.has_peers());
    }

    #[test]
    fn missing_prompt_reads_as_empty() {
        let config = AgentConfig::hydrate(AgentRecord::new("a", "A"), &ToolFactory::new("http://gw"));
        assert_eq!(config.system_prompt(), "");
        assert!(config.tools.is_empty());
    }
}

//! Tool system for virtual agents.
//!
//! An agent's tool list is realized once per hydration from its definition:
//! built-in stubs first (in `enabledTools` order), then one delegation handle
//! per downstream peer (in `downstreamPeers` order).

mod delegation;
mod weather;

pub use delegation::{PeerClient, PeerDelegationTool, PeerError, DELEGATION_DEPTH_FIELD};
pub use weather::WeatherTool;

use crate::util::dedup_preserving_order;

/// A realized tool handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Tool {
    Weather(WeatherTool),
    PeerDelegation(PeerDelegationTool),
}

impl Tool {
    /// Function-style name shown to the LLM.
    pub fn name(&self) -> &str {
        match self {
            Tool::Weather(_) => WeatherTool::NAME,
            Tool::PeerDelegation(_) => PeerDelegationTool::NAME,
        }
    }

    pub fn description(&self) -> &str {
        match self {
            Tool::Weather(_) => WeatherTool::DESCRIPTION,
            Tool::PeerDelegation(_) => PeerDelegationTool::DESCRIPTION,
        }
    }

    pub fn as_delegation(&self) -> Option<&PeerDelegationTool> {
        match self {
            Tool::PeerDelegation(tool) => Some(tool),
            _ => None,
        }
    }
}

/// Find the delegation handle for `peer_id` (case-insensitive).
pub fn find_delegation_tool<'a>(tools: &'a [Tool], peer_id: &str) -> Option<&'a PeerDelegationTool> {
    let wanted = peer_id.to_lowercase();
    tools
        .iter()
        .filter_map(Tool::as_delegation)
        .find(|tool| tool.peer_id().to_lowercase() == wanted)
}

/// Builds runtime tool lists for agent definitions.
#[derive(Debug, Clone)]
pub struct ToolFactory {
    gateway_base_url: String,
}

impl ToolFactory {
    pub fn new(gateway_base_url: impl Into<String>) -> Self {
        Self {
            gateway_base_url: gateway_base_url.into(),
        }
    }

    pub fn gateway_base_url(&self) -> &str {
        &self.gateway_base_url
    }

    /// Realize the tools for one agent definition.
    ///
    /// Unrecognized tool ids are skipped so definitions naming newer tools still run.
    pub fn create_tools_for(&self, enabled_tools: &[String], peers: &[String]) -> Vec<Tool> {
        let mut tools = Vec::with_capacity(enabled_tools.len() + peers.len());

        for tool_id in dedup_preserving_order(enabled_tools) {
            match tool_id.as_str() {
                WeatherTool::ID => tools.push(Tool::Weather(WeatherTool)),
                other => tracing::debug!("Skipping unknown tool '{}'", other),
            }
        }

        for peer_id in peers {
            tools.push(Tool::PeerDelegation(PeerDelegationTool::new(
                peer_id.clone(),
                self.gateway_base_url.clone(),
            )));
        }

        tools
    }
}

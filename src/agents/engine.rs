//! Delegation engine: per-request orchestration for a hydrated agent.
//!
//! # Algorithm
//! 1. Short-circuit on missing credential, blank message, or exhausted depth
//! 2. With downstream peers: one routing call, then either answer locally or
//!    delegate to the chosen peer at `depth + 1`
//! 3. Without peers: a single chat call, with a tool listing if the agent has tools
//!
//! The engine always returns reply text. LLM failures are folded into a canned
//! error reply here; peer failures arrive as text from the delegation tool.

use std::sync::Arc;

use thiserror::Error;

use super::routing::{extract_reason, parse_routing_decision, routing_prompt, RoutingDecision};
use super::AgentConfig;
use crate::config::Config;
use crate::llm::{ChatMessage, LlmClient};
use crate::tools::{find_delegation_tool, PeerClient, Tool};

pub const EMPTY_MESSAGE_REPLY: &str = "Please provide a non-empty 'message' field.";
pub const DEPTH_LIMIT_REPLY: &str = "Delegation depth limit reached. Please refine your request.";

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("{0}")]
    Llm(#[from] anyhow::Error),

    #[error("LLM returned an empty response")]
    EmptyResponse,
}

pub struct DelegationEngine {
    llm: Arc<dyn LlmClient>,
    peer_client: PeerClient,
    model: String,
    max_delegation_depth: u32,
    llm_enabled: bool,
}

impl DelegationEngine {
    pub fn new(config: &Config, llm: Arc<dyn LlmClient>, peer_client: PeerClient) -> Self {
        Self {
            llm,
            peer_client,
            model: config.default_model.clone(),
            max_delegation_depth: config.max_delegation_depth,
            llm_enabled: config.llm_enabled(),
        }
    }

    pub fn max_delegation_depth(&self) -> u32 {
        self.max_delegation_depth
    }

    /// Produce the reply for `user_message` addressed to `config` at hop `depth`.
    pub async fn process_request(&self, config: &AgentConfig, user_message: &str, depth: u32) -> String {
        tracing::debug!("Processing request for agent '{}' at depth {}", config.id, depth);

        if !self.llm_enabled {
            tracing::warn!("LLM API key is not configured. Set OPENAI_API_KEY to enable replies.");
            return format!(
                "I am {} (Agent ID: {}). However, I cannot process your request because \
                 the LLM API key is not configured. Please set the OPENAI_API_KEY environment variable. \
                 Your message was: '{}'",
                config.name, config.id, user_message
            );
        }

        if user_message.trim().is_empty() {
            return EMPTY_MESSAGE_REPLY.to_string();
        }

        if depth > self.max_delegation_depth {
            tracing::warn!(
                "Agent '{}' refused request at depth {} (max {})",
                config.id,
                depth,
                self.max_delegation_depth
            );
            return DEPTH_LIMIT_REPLY.to_string();
        }

        let result = if config.has_peers() {
            self.orchestrate(config, user_message, depth).await
        } else if config.tools.is_empty() {
            self.simple_chat(config, user_message).await
        } else {
            tracing::debug!(
                "Agent '{}' has {} tools available, describing them in the prompt",
                config.id,
                config.tools.len()
            );
            self.chat_with_tools(config, user_message).await
        };

        match result {
            Ok(reply) => reply,
            Err(e) => {
                tracing::error!("Error processing request for agent '{}': {}", config.id, e);
                format!(
                    "Error processing request: {}. Please check the server logs for more details.",
                    e
                )
            }
        }
    }

    /// One system + user exchange.
    async fn chat(&self, system: &str, user: &str) -> Result<String, EngineError> {
        let messages = [ChatMessage::system(system), ChatMessage::user(user)];
        let response = self.llm.chat_completion(&self.model, &messages).await?;
        response.content.ok_or(EngineError::EmptyResponse)
    }

    async fn simple_chat(&self, config: &AgentConfig, user_message: &str) -> Result<String, EngineError> {
        self.chat(config.system_prompt(), user_message).await
    }

    /// Routing call first, then act on the decision.
    async fn orchestrate(
        &self,
        config: &AgentConfig,
        user_message: &str,
        depth: u32,
    ) -> Result<String, EngineError> {
        let prompt = routing_prompt(&config.downstream_peers);
        let raw = self.chat(&prompt, user_message).await?;
        let decision = parse_routing_decision(&raw, &config.downstream_peers);
        let reason = extract_reason(&raw);

        tracing::info!(
            agent = %config.id,
            depth,
            reason = reason.as_deref().unwrap_or("-"),
            "Routing decision: {:?}",
            decision
        );

        match decision {
            RoutingDecision::SelfAnswer => self.simple_chat(config, user_message).await,
            RoutingDecision::Peer(peer_id) => {
                let Some(tool) = find_delegation_tool(&config.tools, &peer_id) else {
                    return Ok(format!(
                        "Unable to delegate to {} because delegation is not configured.",
                        peer_id
                    ));
                };
                let reply = tool
                    .call_agent(&self.peer_client, user_message, depth.saturating_add(1))
                    .await;
                Ok(format!("Delegated to {}:\n{}", peer_id, reply))
            }
        }
    }

    /// Single call with the agent's tools described in the system prompt; nothing is invoked.
    async fn chat_with_tools(&self, config: &AgentConfig, user_message: &str) -> Result<String, EngineError> {
        self.chat(&tool_prompt(config), user_message).await
    }
}

/// The agent's system prompt followed by a human-readable tool listing.
pub(crate) fn tool_prompt(config: &AgentConfig) -> String {
    let mut prompt = String::from(config.system_prompt());
    prompt.push_str("\n\nYou have access to the following tools:\n");

    for tool in &config.tools {
        match tool {
            Tool::PeerDelegation(_) => {
                prompt.push_str("- callAgent(peerId, query): Delegate to specialist agents: ");
                prompt.push_str(&config.downstream_peers.join(", "));
                prompt.push('\n');
            }
            Tool::Weather(_) => {
                prompt.push_str(&format!("- {}(location): {}\n", tool.name(), tool.description()));
            }
        }
    }

    prompt.push_str(
        "\nFor now, please indicate which agent you would delegate to and what you would ask them.",
    );
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEMO_API_KEY;
    use crate::llm::ScriptedLlmClient;
    use crate::store::AgentRecord;
    use crate::tools::ToolFactory;

    fn engine_with(llm: &ScriptedLlmClient, config: &Config) -> DelegationEngine {
        DelegationEngine::new(config, Arc::new(llm.clone()), PeerClient::new())
    }

    fn test_config() -> Config {
        Config::new("sk-test", "http://127.0.0.1:1")
    }

    fn agent(record: AgentRecord) -> AgentConfig {
        AgentConfig::hydrate(record, &ToolFactory::new("http://127.0.0.1:1"))
    }

    #[tokio::test]
    async fn demo_key_short_circuits_without_llm() {
        let llm = ScriptedLlmClient::echo();
        let engine = engine_with(&llm, &Config::new(DEMO_API_KEY, "http://127.0.0.1:1"));
        let bot = agent(AgentRecord::new("bot", "Bot"));

        let reply = engine.process_request(&bot, "hello there", 0).await;
        assert!(reply.starts_with("I am Bot (Agent ID: bot)."));
        assert!(reply.contains("Your message was: 'hello there'"));
        assert_eq!(llm.call_count(), 0);
    }

    #[tokio::test]
    async fn blank_message_is_rejected() {
        let llm = ScriptedLlmClient::echo();
        let engine = engine_with(&llm, &test_config());
        let bot = agent(AgentRecord::new("bot", "Bot"));

        assert_eq!(engine.process_request(&bot, "   ", 0).await, EMPTY_MESSAGE_REPLY);
        assert_eq!(llm.call_count(), 0);
    }

    #[tokio::test]
    async fn depth_beyond_limit_skips_llm() {
        let llm = ScriptedLlmClient::echo();
        let engine = engine_with(&llm, &test_config().with_max_delegation_depth(2));
        let router = agent(AgentRecord::new("r", "R").with_peers(["x"]));

        for depth in [3, 4, 100] {
            assert_eq!(engine.process_request(&router, "hi", depth).await, DEPTH_LIMIT_REPLY);
        }
        assert_eq!(llm.call_count(), 0);

        // At the limit itself the request is still served.
        let bot = agent(AgentRecord::new("bot", "Bot"));
        assert_eq!(engine.process_request(&bot, "hi", 2).await, "echo:hi");
    }

    #[tokio::test]
    async fn simple_chat_uses_system_prompt() {
        let llm = ScriptedLlmClient::echo();
        let engine = engine_with(&llm, &test_config());
        let bot = agent(AgentRecord::new("bot", "Bot").with_system_prompt("You are helpful."));

        assert_eq!(engine.process_request(&bot, "hi", 0).await, "echo:hi");
        let calls = llm.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].system, "You are helpful.");
        assert_eq!(calls[0].user, "hi");
    }

    #[tokio::test]
    async fn routing_call_precedes_self_answer() {
        let llm = ScriptedLlmClient::new(|system, user| {
            if system.starts_with("You are a strict routing engine") {
                Ok(r#"{"target":"SELF","reason":"greeting"}"#.to_string())
            } else {
                Ok(format!("local:{}", user))
            }
        });
        let engine = engine_with(&llm, &test_config());
        let router = agent(
            AgentRecord::new("router", "Router")
                .with_system_prompt("You coordinate.")
                .with_peers(["billing", "tech"]),
        );

        assert_eq!(engine.process_request(&router, "hello", 0).await, "local:hello");
        let calls = llm.calls();
        assert_eq!(calls.len(), 2);
        assert!(calls[0].system.contains("[billing, tech]"));
        assert_eq!(calls[1].system, "You coordinate.");
    }

    #[tokio::test]
    async fn chosen_peer_without_tool_is_reported() {
        let llm = ScriptedLlmClient::new(|_, _| Ok(r#"{"target":"billing"}"#.to_string()));
        let engine = engine_with(&llm, &test_config());
        let mut router = agent(AgentRecord::new("router", "Router").with_peers(["billing"]));
        router.tools.clear();

        assert_eq!(
            engine.process_request(&router, "refund please", 0).await,
            "Unable to delegate to billing because delegation is not configured."
        );
        assert_eq!(llm.call_count(), 1);
    }

    #[tokio::test]
    async fn unreachable_peer_is_folded_into_reply() {
        let llm = ScriptedLlmClient::new(|_, _| Ok(r#"{"target":"billing"}"#.to_string()));
        let engine = engine_with(&llm, &test_config());
        let router = agent(AgentRecord::new("router", "Router").with_peers(["billing"]));

        let reply = engine.process_request(&router, "refund please", 0).await;
        assert!(
            reply.starts_with("Delegated to billing:\nError: Unable to reach the billing agent. "),
            "unexpected reply: {}",
            reply
        );
    }

    #[tokio::test]
    async fn delegation_at_max_depth_saturates() {
        let llm = ScriptedLlmClient::new(|_, _| Ok(r#"{"target":"billing"}"#.to_string()));
        let engine = engine_with(&llm, &test_config().with_max_delegation_depth(u32::MAX));
        let router = agent(AgentRecord::new("router", "Router").with_peers(["billing"]));

        let reply = engine.process_request(&router, "refund please", u32::MAX).await;
        assert!(reply.starts_with("Delegated to billing:\n"), "unexpected reply: {}", reply);
    }

    #[tokio::test]
    async fn llm_failure_becomes_error_reply() {
        let llm = ScriptedLlmClient::new(|_, _| anyhow::bail!("upstream exploded"));
        let engine = engine_with(&llm, &test_config());
        let bot = agent(AgentRecord::new("bot", "Bot"));

        assert_eq!(
            engine.process_request(&bot, "hi", 0).await,
            "Error processing request: upstream exploded. Please check the server logs for more details."
        );
    }

    #[tokio::test]
    async fn tool_augmented_chat_lists_tools() {
        let llm = ScriptedLlmClient::new(|_, _| Ok("I'd check the weather.".to_string()));
        let engine = engine_with(&llm, &test_config());
        let forecaster = agent(
            AgentRecord::new("wx", "Forecaster")
                .with_system_prompt("You talk about weather.")
                .with_tools(["weather"]),
        );

        assert_eq!(
            engine.process_request(&forecaster, "rain?", 0).await,
            "I'd check the weather."
        );
        let system = &llm.calls()[0].system;
        assert!(system.starts_with("You talk about weather.\n\nYou have access to the following tools:\n"));
        assert!(system.contains("- getWeather(location): Get the current weather for a location\n"));
        assert!(system.ends_with("what you would ask them."));
    }

    #[test]
    fn tool_prompt_describes_delegation() {
        let config = agent(AgentRecord::new("a", "A").with_peers(["billing", "tech"]));
        let prompt = tool_prompt(&config);
        assert_eq!(
            prompt
                .matches("- callAgent(peerId, query): Delegate to specialist agents: billing, tech\n")
                .count(),
            2
        );
    }
}

//! # Agent Gateway
//!
//! Multi-tenant host for virtual agents defined as data.
//!
//! Each agent is a stored record (name, system prompt, tool ids, downstream
//! peers). The gateway exposes every record as its own HTTP endpoint and, when
//! an agent has peers, lets an LLM route each message either to the agent itself
//! or to one peer through a recursive HTTP call back into the gateway.
//!
//! ## Architecture
//!
//! ```text
//!   POST /agents/{id}/message
//!              │
//!              ▼
//!   ┌─────────────────────┐    cache miss    ┌──────────────┐
//!   │   AgentRegistry     │ ───────────────▶ │  AgentStore  │
//!   │  (hydration cache)  │                  │   (SQLite)   │
//!   └──────────┬──────────┘                  └──────────────┘
//!              ▼
//!   ┌─────────────────────┐   routing call   ┌──────────────┐
//!   │  DelegationEngine   │ ───────────────▶ │  LlmClient   │
//!   └──────────┬──────────┘                  └──────────────┘
//!              │ depth + 1
//!              ▼
//!   POST /agents/{peer}/message   (same gateway or another one)
//! ```
//!
//! ## Modules
//! - `agents`: hydrated configs, registry cache, routing, delegation engine
//! - `store`: agent definition persistence
//! - `tools`: built-in tool stubs and peer delegation
//! - `llm`: chat client abstraction and an OpenAI-compatible client
//! - `api`: HTTP surface

pub mod agents;
pub mod api;
pub mod config;
pub mod llm;
pub mod store;
pub mod tools;
pub mod util;

pub use agents::{AgentConfig, AgentRegistry, DelegationEngine};
pub use config::Config;
pub use store::{AgentRecord, AgentStore, StoreError};

//! HTTP API for the agent gateway.
//!
//! ## Endpoints
//!
//! - `GET /api/health` - Health check
//! - `GET /api/agents` - List agent definitions with prompt previews
//! - `POST /agents` - Provision a new agent
//! - `GET /agents/{id}/.well-known/agent-card.json` - Agent metadata
//! - `POST /agents/{id}/message` - Send a message to an agent

mod agents;
mod gateway;
mod routes;
pub mod types;

pub use gateway::{VirtualAgent, AGENT_CARD_DESCRIPTION};
pub use routes::{router, serve, AppState};
pub use types::*;

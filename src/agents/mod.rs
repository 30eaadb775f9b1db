//! Agents module - virtual agent definitions and request execution.
//!
//! # Components
//! - **AgentConfig**: executable config hydrated from a stored definition
//! - **AgentRegistry**: provisioning plus a per-id hydration cache
//! - **DelegationEngine**: answers a message, routing to peers when configured
//!
//! # Design Principles
//! - One stored definition serves every request for that id
//! - Delegation is an HTTP call back into the gateway, bounded by a hop counter
//! - The engine always produces reply text; failures become text too

mod engine;
mod registry;
pub mod routing;
mod types;

pub use engine::{DelegationEngine, EngineError, DEPTH_LIMIT_REPLY, EMPTY_MESSAGE_REPLY};
pub use registry::AgentRegistry;
pub use routing::RoutingDecision;
pub use types::AgentConfig;

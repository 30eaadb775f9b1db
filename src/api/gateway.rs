//! Gateway dispatcher for `/agents`.
//!
//! Every `/agents/{id}/...` request resolves the id through the registry and
//! builds a short-lived `VirtualAgent` bound to the cached config. Nothing about
//! the handler outlives the request.

use std::any::Any;
use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::agents::{AgentConfig, DelegationEngine};
use crate::store::{AgentRecord, StoreError};

use super::routes::AppState;
use super::types::{AgentCard, ErrorResponse, MessageRequest, MessageResponse};

pub const AGENT_CARD_DESCRIPTION: &str = "I am a virtual agent powered by agent-gateway.";

/// Per-request handler for one hydrated agent.
pub struct VirtualAgent {
    config: Arc<AgentConfig>,
    engine: Arc<DelegationEngine>,
}

impl VirtualAgent {
    pub fn new(config: Arc<AgentConfig>, engine: Arc<DelegationEngine>) -> Self {
        Self { config, engine }
    }

    pub fn agent_card(&self) -> AgentCard {
        AgentCard {
            id: self.config.id.clone(),
            name: self.config.name.clone(),
            description: AGENT_CARD_DESCRIPTION.to_string(),
            homepage: format!("/agents/{}", self.config.id),
        }
    }

    /// Run the engine in its own task so a panic surfaces as an error detail
    /// instead of tearing down the connection.
    pub async fn handle_message(&self, request: MessageRequest) -> Result<MessageResponse, String> {
        let depth = request.depth();
        let message = request.message.unwrap_or_default();
        let config = Arc::clone(&self.config);
        let engine = Arc::clone(&self.engine);

        let handle =
            tokio::spawn(async move { engine.process_request(&config, &message, depth).await });

        match handle.await {
            Ok(reply) => Ok(MessageResponse { reply }),
            Err(e) if e.is_panic() => Err(panic_detail(e.into_panic())),
            Err(e) => Err(e.to_string()),
        }
    }
}

fn panic_detail(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "agent task panicked".to_string()
    }
}

/// Look up `id` and bind a handler to it.
async fn resolve(state: &AppState, id: &str) -> Result<VirtualAgent, (StatusCode, String)> {
    match state.registry.load_config(id).await {
        Ok(Some(config)) => Ok(VirtualAgent::new(config, Arc::clone(&state.engine))),
        Ok(None) => Err((
            StatusCode::NOT_FOUND,
            format!("Virtual Agent '{}' does not exist.", id),
        )),
        Err(e) => {
            tracing::error!("Failed to load agent '{}': {}", id, e);
            Err((StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
        }
    }
}

/// Provision a new agent definition.
pub async fn provision_agent(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<AgentRecord>, JsonRejection>,
) -> Result<StatusCode, (StatusCode, String)> {
    let Json(record) = payload.map_err(|rejection| {
        tracing::warn!("Rejected agent definition body: {}", rejection.body_text());
        (StatusCode::BAD_REQUEST, rejection.body_text())
    })?;

    match state.registry.provision(record).await {
        Ok(()) => Ok(StatusCode::CREATED),
        Err(e @ (StoreError::IdConflict(_) | StoreError::InvalidRecord(_))) => {
            tracing::warn!("Rejected agent definition: {}", e);
            Err((StatusCode::BAD_REQUEST, e.to_string()))
        }
        Err(e) => {
            tracing::error!("Failed to provision agent: {}", e);
            Err((StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
        }
    }
}

/// Well-known agent card.
pub async fn get_agent_card(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<AgentCard>, (StatusCode, String)> {
    let agent = resolve(&state, &id).await?;
    Ok(Json(agent.agent_card()))
}

/// Send a message to an agent.
pub async fn send_message(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(request): Json<MessageRequest>,
) -> Response {
    let agent = match resolve(&state, &id).await {
        Ok(agent) => agent,
        Err(rejection) => return rejection.into_response(),
    };

    match agent.handle_message(request).await {
        Ok(response) => Json(response).into_response(),
        Err(error) => {
            tracing::error!("Agent '{}' failed to handle message: {}", id, error);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse { error }),
            )
                .into_response()
        }
    }
}

//! Registry view API.

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Json};

use super::routes::AppState;
use super::types::AgentInfo;

/// List every stored agent definition.
pub async fn list_agents(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<AgentInfo>>, (StatusCode, String)> {
    state
        .registry
        .list()
        .await
        .map(|records| Json(records.into_iter().map(AgentInfo::from).collect()))
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
}

//! HTTP routing and server start-up.

use std::sync::Arc;

use axum::{
    extract::State,
    response::Json,
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::agents::{AgentRegistry, DelegationEngine};
use crate::config::Config;
use crate::llm::{LlmClient, OpenAiClient};
use crate::store::{AgentStore, SqliteAgentStore};
use crate::tools::{PeerClient, ToolFactory};

use super::agents as agents_api;
use super::gateway;
use super::types::HealthResponse;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    /// Agent definitions plus the hydration cache
    pub registry: Arc<AgentRegistry>,
    /// Request engine shared by every virtual agent
    pub engine: Arc<DelegationEngine>,
}

impl AppState {
    /// Wire the registry and engine around a store and an LLM client.
    pub fn new(config: Config, store: Arc<dyn AgentStore>, llm: Arc<dyn LlmClient>) -> Self {
        let tool_factory = ToolFactory::new(config.gateway_base_url.clone());
        let registry = Arc::new(AgentRegistry::new(store, tool_factory));
        let engine = Arc::new(DelegationEngine::new(&config, llm, PeerClient::new()));
        Self {
            config,
            registry,
            engine,
        }
    }
}

/// Build the application router.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/agents", get(agents_api::list_agents))
        .route("/agents", post(gateway::provision_agent))
        .route(
            "/agents/:id/.well-known/agent-card.json",
            get(gateway::get_agent_card),
        )
        .route("/agents/:id/message", post(gateway::send_message))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the HTTP server.
pub async fn serve(config: Config) -> anyhow::Result<()> {
    let store = SqliteAgentStore::open(&config.database_path).await?;
    tracing::info!(
        "Agent store opened at {} (persistent: {})",
        config.database_path.display(),
        store.is_persistent()
    );

    let llm = OpenAiClient::new(
        config.llm_base_url.clone(),
        config.api_key.clone().unwrap_or_default(),
    );
    if !config.llm_enabled() {
        tracing::warn!("OPENAI_API_KEY is not set; agents will reply with a configuration notice");
    }

    let state = Arc::new(AppState::new(config.clone(), Arc::new(store), Arc::new(llm)));
    let app = router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!(
        "Server listening on {} (peers reached via {}, max delegation depth {})",
        addr,
        config.gateway_base_url,
        config.max_delegation_depth
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// Wait for Ctrl-C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, draining in-flight requests");
}

/// Health check endpoint.
async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        llm_enabled: state.config.llm_enabled(),
        max_delegation_depth: state.engine.max_delegation_depth(),
    })
}

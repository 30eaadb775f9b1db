//! Configuration management for the agent gateway.
//!
//! Configuration can be set via environment variables:
//! - `AGENT_GATEWAY_BASE_URL` - Optional. Base URL peers are called through. Defaults to `http://localhost:8080`.
//! - `AGENT_ORCHESTRATION_MAX_DEPTH` - Optional. Maximum delegation hops. Defaults to `3`.
//! - `OPENAI_API_KEY` - Optional. LLM API key. Defaults to `demo-key-not-set`, which disables LLM calls.
//! - `LLM_BASE_URL` - Optional. OpenAI-compatible API root. Defaults to `https://api.openai.com/v1`.
//! - `DEFAULT_MODEL` - Optional. Model used for every chat call. Defaults to `gpt-4o-mini`.
//! - `DATABASE_PATH` - Optional. SQLite database file. Defaults to `agents.db`.
//! - `HOST` - Optional. Server host. Defaults to `0.0.0.0`.
//! - `PORT` - Optional. Server port. Defaults to `8080`.

use std::path::PathBuf;
use thiserror::Error;

/// Placeholder API key that keeps the gateway serving canned replies.
pub const DEMO_API_KEY: &str = "demo-key-not-set";

pub const DEFAULT_GATEWAY_BASE_URL: &str = "http://localhost:8080";
pub const DEFAULT_MAX_DELEGATION_DEPTH: u32 = 3;
pub const DEFAULT_LLM_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

/// Gateway configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// LLM API key (`DEMO_API_KEY` when unset)
    pub api_key: Option<String>,

    /// OpenAI-compatible API root
    pub llm_base_url: String,

    /// Model identifier sent with each chat call
    pub default_model: String,

    /// Base URL used by delegation tools to reach peers (no trailing slash)
    pub gateway_base_url: String,

    /// Requests arriving deeper than this are refused
    pub max_delegation_depth: u32,

    /// SQLite database holding agent definitions
    pub database_path: PathBuf,

    /// Server host
    pub host: String,

    /// Server port
    pub port: u16,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if a numeric or URL variable cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty())
            .or_else(|| Some(DEMO_API_KEY.to_string()));

        let llm_base_url = std::env::var("LLM_BASE_URL")
            .unwrap_or_else(|_| DEFAULT_LLM_BASE_URL.to_string());
        let llm_base_url = normalize_base_url("LLM_BASE_URL", &llm_base_url)?;

        let default_model =
            std::env::var("DEFAULT_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());

        let gateway_base_url = std::env::var("AGENT_GATEWAY_BASE_URL")
            .unwrap_or_else(|_| DEFAULT_GATEWAY_BASE_URL.to_string());
        let gateway_base_url = normalize_base_url("AGENT_GATEWAY_BASE_URL", &gateway_base_url)?;

        let max_delegation_depth = std::env::var("AGENT_ORCHESTRATION_MAX_DEPTH")
            .unwrap_or_else(|_| DEFAULT_MAX_DELEGATION_DEPTH.to_string())
            .trim()
            .parse()
            .map_err(|e| {
                ConfigError::InvalidValue(
                    "AGENT_ORCHESTRATION_MAX_DEPTH".to_string(),
                    format!("{}", e),
                )
            })?;

        let database_path = std::env::var("DATABASE_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("agents.db"));

        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());

        let port = std::env::var("PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse()
            .map_err(|e| ConfigError::InvalidValue("PORT".to_string(), format!("{}", e)))?;

        Ok(Self {
            api_key,
            llm_base_url,
            default_model,
            gateway_base_url,
            max_delegation_depth,
            database_path,
            host,
            port,
        })
    }

    /// Create a config with custom values (useful for testing).
    pub fn new(api_key: impl Into<String>, gateway_base_url: impl Into<String>) -> Self {
        Self {
            api_key: Some(api_key.into()),
            llm_base_url: DEFAULT_LLM_BASE_URL.to_string(),
            default_model: DEFAULT_MODEL.to_string(),
            gateway_base_url: gateway_base_url.into().trim_end_matches('/').to_string(),
            max_delegation_depth: DEFAULT_MAX_DELEGATION_DEPTH,
            database_path: PathBuf::from(":memory:"),
            host: "127.0.0.1".to_string(),
            port: 8080,
        }
    }

    /// Set the maximum delegation depth.
    pub fn with_max_delegation_depth(mut self, depth: u32) -> Self {
        self.max_delegation_depth = depth;
        self
    }

    /// Whether real LLM calls are possible (key present and not the demo placeholder).
    pub fn llm_enabled(&self) -> bool {
        match self.api_key.as_deref() {
            Some(key) => key != DEMO_API_KEY,
            None => false,
        }
    }
}

/// Validate a base URL and strip any trailing slash.
fn normalize_base_url(name: &str, raw: &str) -> Result<String, ConfigError> {
    url::Url::parse(raw.trim())
        .map_err(|e| ConfigError::InvalidValue(name.to_string(), format!("{}", e)))?;
    Ok(raw.trim().trim_end_matches('/').to_string())
}

//! Peer delegation over HTTP.
//!
//! A delegation calls another agent's `message` endpoint on this gateway (or on
//! whichever gateway `gateway_base_url` points at) and hands back its reply.
//! Failures never escape: they become reply text the caller folds into its own answer.

use std::time::Duration;

use reqwest::{Client, StatusCode, Url};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Request-body field carrying the hop count across recursive calls.
pub const DELEGATION_DEPTH_FIELD: &str = "_delegationDepth";

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
const READ_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum PeerError {
    #[error("Invalid gateway URL '{0}'")]
    InvalidUrl(String),

    #[error("{0}")]
    Transport(#[from] reqwest::Error),

    #[error("HTTP {0}")]
    Status(StatusCode),
}

#[derive(Debug, Serialize)]
struct PeerRequest<'a> {
    message: &'a str,
    #[serde(rename = "_delegationDepth")]
    delegation_depth: String,
}

#[derive(Debug, Deserialize)]
struct PeerResponse {
    #[serde(default)]
    reply: Option<String>,
}

/// Shared HTTP client for peer calls.
#[derive(Debug, Clone)]
pub struct PeerClient {
    client: Client,
}

impl PeerClient {
    pub fn new() -> Self {
        let client = match Self::build_client() {
            Ok(client) => client,
            Err(e) => {
                tracing::error!(
                    "Failed to build peer HTTP client with {:?} connect / {:?} read timeouts, \
                     falling back to reqwest defaults: {}",
                    CONNECT_TIMEOUT,
                    READ_TIMEOUT,
                    e
                );
                Client::new()
            }
        };
        Self { client }
    }

    fn build_client() -> Result<Client, reqwest::Error> {
        Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(READ_TIMEOUT)
            .build()
    }

    /// `{base}/agents/{peer}/message`, with the peer id escaped as a path segment.
    fn message_url(base_url: &str, peer_id: &str) -> Result<Url, PeerError> {
        let mut url =
            Url::parse(base_url).map_err(|_| PeerError::InvalidUrl(base_url.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| PeerError::InvalidUrl(base_url.to_string()))?
            .pop_if_empty()
            .extend(["agents", peer_id, "message"]);
        Ok(url)
    }

    /// POST a message to a peer and return its `reply` field, if any.
    pub async fn send_message(
        &self,
        base_url: &str,
        peer_id: &str,
        question: &str,
        delegation_depth: u32,
    ) -> Result<Option<String>, PeerError> {
        let url = Self::message_url(base_url, peer_id)?;
        let body = PeerRequest {
            message: question,
            delegation_depth: delegation_depth.to_string(),
        };

        let response = self.client.post(url).json(&body).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(PeerError::Status(status));
        }

        let parsed: PeerResponse = response.json().await?;
        Ok(parsed.reply)
    }
}

impl Default for PeerClient {
    fn default() -> Self {
        Self::new()
    }
}

/// Delegation handle for one downstream peer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerDelegationTool {
    peer_id: String,
    gateway_base_url: String,
}

impl PeerDelegationTool {
    pub const NAME: &'static str = "callAgent";
    pub const DESCRIPTION: &'static str = "Delegate a question or task to a specialized agent";

    pub fn new(peer_id: impl Into<String>, gateway_base_url: impl Into<String>) -> Self {
        Self {
            peer_id: peer_id.into(),
            gateway_base_url: gateway_base_url.into(),
        }
    }

    pub fn peer_id(&self) -> &str {
        &self.peer_id
    }

    pub fn gateway_base_url(&self) -> &str {
        &self.gateway_base_url
    }

    /// Ask the peer `question` at hop `delegation_depth`.
    ///
    /// Always yields text: the peer's reply, an empty-reply placeholder, or an error line.
    pub async fn call_agent(
        &self,
        client: &PeerClient,
        question: &str,
        delegation_depth: u32,
    ) -> String {
        tracing::info!(
            peer = %self.peer_id,
            depth = delegation_depth,
            "Delegating to agent '{}': {}",
            self.peer_id,
            crate::util::truncate_for_log(question, 200)
        );

        match client
            .send_message(&self.gateway_base_url, &self.peer_id, question, delegation_depth)
            .await
        {
            Ok(Some(reply)) if !reply.trim().is_empty() => {
                tracing::info!(
                    "Agent '{}' responded: {}",
                    self.peer_id,
                    crate::util::truncate_for_log(&reply, 200)
                );
                reply
            }
            Ok(_) => {
                tracing::info!("Agent '{}' returned an empty reply", self.peer_id);
                format!("Delegation to {} returned an empty response.", self.peer_id)
            }
            Err(e) => {
                tracing::error!("Failed to call agent '{}': {}", self.peer_id, e);
                format!("Error: Unable to reach the {} agent. {}", self.peer_id, e)
            }
        }
    }
}

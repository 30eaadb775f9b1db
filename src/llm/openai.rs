//! Client for OpenAI-compatible `/chat/completions` endpoints.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header::RETRY_AFTER, Client, Response};
use serde::{Deserialize, Serialize};

use super::error::{LlmError, RetryPolicy};
use super::{ChatMessage, ChatResponse, LlmClient};

pub struct OpenAiClient {
    client: Client,
    base_url: String,
    api_key: String,
    retry: RetryPolicy,
}

impl OpenAiClient {
    /// `base_url` is the API root, e.g. `https://api.openai.com/v1`.
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    async fn post_once(&self, request: &CompletionRequest<'_>) -> Result<ChatResponse, LlmError> {
        let response = self
            .client
            .post(self.completions_url())
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(status_error(response).await);
        }

        let body = response.text().await?;
        parse_completion(&body)
    }
}

/// Turn a non-2xx response into `LlmError::Status`, keeping `Retry-After` (seconds form).
async fn status_error(response: Response) -> LlmError {
    let status = response.status();
    let retry_after = response
        .headers()
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse::<u64>().ok())
        .map(Duration::from_secs);
    let body = response.text().await.unwrap_or_default();
    LlmError::Status {
        status,
        body,
        retry_after,
    }
}

/// First choice's message content; a reply with no choices is malformed.
fn parse_completion(body: &str) -> Result<ChatResponse, LlmError> {
    let parsed: CompletionResponse = serde_json::from_str(body)
        .map_err(|e| LlmError::Malformed(format!("{} in body {}", e, body)))?;

    parsed
        .choices
        .into_iter()
        .next()
        .map(|choice| ChatResponse {
            content: choice.message.content,
        })
        .ok_or_else(|| LlmError::Malformed("no choices".to_string()))
}

#[async_trait]
impl LlmClient for OpenAiClient {
    async fn chat_completion(
        &self,
        model: &str,
        messages: &[ChatMessage],
    ) -> anyhow::Result<ChatResponse> {
        let request = CompletionRequest { model, messages };
        let mut attempt = 0;

        loop {
            match self.post_once(&request).await {
                Ok(response) => return Ok(response),
                Err(e) if e.is_retryable() && attempt + 1 < self.retry.max_attempts => {
                    let delay = self.retry.delay_for(attempt, &e);
                    attempt += 1;
                    tracing::warn!(
                        model,
                        attempt,
                        "Chat completion failed, retrying in {:?}: {}",
                        delay,
                        e
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => {
                    tracing::error!(model, attempts = attempt + 1, "Chat completion failed: {}", e);
                    return Err(e.into());
                }
            }
        }
    }
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
}

#[derive(Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<CompletionChoice>,
}

#[derive(Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
}

#[derive(Deserialize)]
struct CompletionMessage {
    #[serde(default)]
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use axum::{http::StatusCode, routing::post, Json, Router};
    use serde_json::{json, Value};

    /// Serve a completions endpoint that fails with `failure` for the first `failures` calls.
    async fn flaky_backend(failures: usize, failure: StatusCode) -> (String, Arc<AtomicUsize>) {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);
        let app = Router::new().route(
            "/v1/chat/completions",
            post(move |Json(body): Json<Value>| {
                let counter = Arc::clone(&counter);
                async move {
                    let n = counter.fetch_add(1, Ordering::SeqCst);
                    if n < failures {
                        return (failure, Json(json!({"error": "nope"})));
                    }
                    let user = body["messages"][1]["content"].as_str().unwrap_or("").to_string();
                    (
                        StatusCode::OK,
                        Json(json!({"choices": [{"message": {"role": "assistant", "content": user}}]})),
                    )
                }
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}/v1", listener.local_addr().unwrap());
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (base, hits)
    }

    fn fast_retries() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 3,
            base_delay: Duration::from_millis(5),
            max_delay: Duration::from_millis(20),
        }
    }

    fn messages() -> Vec<ChatMessage> {
        vec![ChatMessage::system("sys"), ChatMessage::user("ping")]
    }

    #[tokio::test]
    async fn transient_failures_are_retried() {
        let (base, hits) = flaky_backend(2, StatusCode::SERVICE_UNAVAILABLE).await;
        let client = OpenAiClient::new(base, "key").with_retry_policy(fast_retries());

        let response = client.chat_completion("m", &messages()).await.unwrap();
        assert_eq!(response.content.as_deref(), Some("ping"));
        assert_eq!(hits.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn retries_stop_at_max_attempts() {
        let (base, hits) = flaky_backend(10, StatusCode::TOO_MANY_REQUESTS).await;
        let client = OpenAiClient::new(base, "key").with_retry_policy(fast_retries());

        let err = client.chat_completion("m", &messages()).await.unwrap_err();
        assert!(err.to_string().contains("429"));
        assert_eq!(hits.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn client_errors_are_not_retried() {
        let (base, hits) = flaky_backend(10, StatusCode::UNAUTHORIZED).await;
        let client = OpenAiClient::new(base, "key").with_retry_policy(fast_retries());

        assert!(client.chat_completion("m", &messages()).await.is_err());
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn parses_first_choice() {
        let body = r#"{
            "choices": [
                {"message": {"role": "assistant", "content": "hello"}, "finish_reason": "stop"},
                {"message": {"role": "assistant", "content": "ignored"}}
            ]
        }"#;
        assert_eq!(parse_completion(body).unwrap().content.as_deref(), Some("hello"));
    }

    #[test]
    fn null_content_is_kept_as_none() {
        let body = r#"{"choices": [{"message": {"role": "assistant", "content": null}}]}"#;
        assert_eq!(parse_completion(body).unwrap().content, None);
    }

    #[test]
    fn empty_or_garbage_bodies_are_malformed() {
        assert!(matches!(parse_completion(r#"{"choices": []}"#), Err(LlmError::Malformed(_))));
        assert!(matches!(parse_completion("<html>"), Err(LlmError::Malformed(_))));
    }

    #[test]
    fn base_url_trailing_slash_is_dropped() {
        let client = OpenAiClient::new("http://llm.local/v1/", "key");
        assert_eq!(client.completions_url(), "http://llm.local/v1/chat/completions");
    }
}

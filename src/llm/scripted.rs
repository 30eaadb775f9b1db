//! In-process LLM stand-in driven by a closure.
//!
//! Used by tests and offline demos: the closure sees the system and user text of
//! each call and decides the reply. Every call is recorded.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use super::{ChatMessage, ChatResponse, LlmClient, Role};

type Responder = dyn Fn(&str, &str) -> anyhow::Result<String> + Send + Sync;

/// One recorded chat call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    pub system: String,
    pub user: String,
}

#[derive(Clone)]
pub struct ScriptedLlmClient {
    responder: Arc<Responder>,
    calls: Arc<Mutex<Vec<RecordedCall>>>,
}

impl ScriptedLlmClient {
    /// Reply with whatever `responder(system, user)` returns.
    pub fn new<F>(responder: F) -> Self
    where
        F: Fn(&str, &str) -> anyhow::Result<String> + Send + Sync + 'static,
    {
        Self {
            responder: Arc::new(responder),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Reply `echo:{user}` to everything.
    pub fn echo() -> Self {
        Self::new(|_, user| Ok(format!("echo:{}", user)))
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls
            .lock()
            .map(|calls| calls.clone())
            .unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().map(|calls| calls.len()).unwrap_or(0)
    }
}

fn text_for(messages: &[ChatMessage], role: Role) -> String {
    messages
        .iter()
        .filter(|m| m.role == role)
        .map(|m| m.content.as_str())
        .collect::<Vec<_>>()
        .join("\n")
}

#[async_trait]
impl LlmClient for ScriptedLlmClient {
    async fn chat_completion(
        &self,
        _model: &str,
        messages: &[ChatMessage],
    ) -> anyhow::Result<ChatResponse> {
        let call = RecordedCall {
            system: text_for(messages, Role::System),
            user: text_for(messages, Role::User),
        };
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call.clone());
        }
        let reply = (self.responder)(&call.system, &call.user)?;
        Ok(ChatResponse::text(reply))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn records_calls_and_replies() {
        let llm = ScriptedLlmClient::echo();
        let response = llm
            .chat_completion(
                "m",
                &[ChatMessage::system("be nice"), ChatMessage::user("hi")],
            )
            .await
            .unwrap();

        assert_eq!(response.content.as_deref(), Some("echo:hi"));
        assert_eq!(
            llm.calls(),
            vec![RecordedCall {
                system: "be nice".to_string(),
                user: "hi".to_string()
            }]
        );
    }

    #[tokio::test]
    async fn responder_errors_propagate() {
        let llm = ScriptedLlmClient::new(|_, _| anyhow::bail!("quota exhausted"));
        let err = llm
            .chat_completion("m", &[ChatMessage::user("hi")])
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "quota exhausted");
        assert_eq!(llm.call_count(), 1);
    }
}

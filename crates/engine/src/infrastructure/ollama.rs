//! Ollama LLM client (OpenAI-compatible API)

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::infrastructure::ports::{
    FinishReason, LlmError, LlmPort, LlmRequest, LlmResponse, MessageRole, TokenUsage,
};

/// Client for Ollama's OpenAI-compatible API
#[derive(Clone)]
pub struct OllamaClient {
    client: Client,
    base_url: String,
    model: String,
}

/// Default Ollama base URL.
pub const DEFAULT_OLLAMA_BASE_URL: &str = "http://localhost:11434";

/// Default model for Ollama.
pub const DEFAULT_OLLAMA_MODEL: &str = "llama3.2";

impl OllamaClient {
    pub fn new(base_url: &str, model: &str) -> Self {
        // Use 120 second timeout for LLM requests (they can be slow)
        Self::with_timeout(base_url, model, 120)
    }

    /// Create client with custom timeout (for testing).
    pub fn with_timeout(base_url: &str, model: &str, timeout_secs: u64) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

impl Default for OllamaClient {
    fn default() -> Self {
        Self::new(DEFAULT_OLLAMA_BASE_URL, DEFAULT_OLLAMA_MODEL)
    }
}

#[async_trait]
impl LlmPort for OllamaClient {
    async fn generate(&self, request: LlmRequest) -> Result<LlmResponse, LlmError> {
        let body = CompletionRequest {
            model: &self.model,
            messages: wire_messages(&request),
            temperature: request.temperature,
            max_tokens: request.max_tokens,
            stream: false,
        };

        let response = self
            .client
            .post(format!("{}/v1/chat/completions", self.base_url))
            .json(&body)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            tracing::warn!(
                status = status.as_u16(),
                model = %self.model,
                "Narrator request rejected"
            );
            return Err(status_error(status, &detail));
        }

        let completion: CompletionResponse = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(e.to_string()))?;

        into_llm_response(completion)
    }
}

/// Connection failures and timeouts mean the service is down, not that the
/// request was wrong.
fn transport_error(e: reqwest::Error) -> LlmError {
    if e.is_connect() || e.is_timeout() {
        LlmError::Unavailable(e.to_string())
    } else {
        LlmError::RequestFailed(e.to_string())
    }
}

fn status_error(status: StatusCode, detail: &str) -> LlmError {
    let message = format!("{}: {}", status.as_u16(), detail.trim());
    if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
        LlmError::Unavailable(message)
    } else {
        LlmError::RequestFailed(message)
    }
}

fn wire_messages(request: &LlmRequest) -> Vec<WireMessage<'_>> {
    let system = request
        .system_prompt
        .as_deref()
        .map(|content| WireMessage {
            role: "system",
            content,
        });

    system
        .into_iter()
        .chain(request.messages.iter().map(|m| WireMessage {
            role: match m.role {
                MessageRole::User => "user",
                MessageRole::Assistant => "assistant",
                MessageRole::System => "system",
            },
            content: &m.content,
        }))
        .collect()
}

fn into_llm_response(completion: CompletionResponse) -> Result<LlmResponse, LlmError> {
    let choice = completion
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| LlmError::InvalidResponse("No choices in LLM response".to_string()))?;

    let finish_reason = match choice.finish_reason.as_deref() {
        Some("stop") | None => FinishReason::Stop,
        Some("length") => FinishReason::Length,
        Some("content_filter") => FinishReason::ContentFilter,
        Some(_) => FinishReason::Unknown,
    };

    Ok(LlmResponse {
        content: choice.message.content.unwrap_or_default(),
        finish_reason,
        usage: completion.usage,
    })
}

// =============================================================================
// Chat completion wire types
// =============================================================================

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct WireMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoice>,
    /// Same field names as ours
    usage: Option<TokenUsage>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CompletionMessage {
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::ports::ChatMessage;

    #[test]
    fn system_prompt_leads_the_message_list() {
        let request = LlmRequest::new(vec![
            ChatMessage::user("I open the door"),
            ChatMessage::assistant("It creaks."),
        ])
        .with_system_prompt("You are the narrator.");

        let messages = wire_messages(&request);
        let roles: Vec<&str> = messages.iter().map(|m| m.role).collect();
        assert_eq!(roles, vec!["system", "user", "assistant"]);
        assert_eq!(messages[0].content, "You are the narrator.");
    }

    #[test]
    fn converts_choice_and_usage() {
        let raw = r#"{
            "choices": [{
                "message": {"role": "assistant", "content": "The goblin snarls."},
                "finish_reason": "length"
            }],
            "usage": {"prompt_tokens": 120, "completion_tokens": 30, "total_tokens": 150}
        }"#;
        let completion: CompletionResponse = serde_json::from_str(raw).unwrap();
        let response = into_llm_response(completion).unwrap();

        assert_eq!(response.content, "The goblin snarls.");
        assert_eq!(response.finish_reason, FinishReason::Length);
        assert_eq!(response.usage.unwrap().total_tokens, 150);
    }

    #[test]
    fn empty_choices_is_invalid() {
        let completion: CompletionResponse = serde_json::from_str(r#"{"choices": []}"#).unwrap();
        assert!(matches!(
            into_llm_response(completion),
            Err(LlmError::InvalidResponse(_))
        ));
    }

    #[test]
    fn overload_is_retryable_but_bad_requests_are_not() {
        let busy = status_error(StatusCode::SERVICE_UNAVAILABLE, "model loading");
        let throttled = status_error(StatusCode::TOO_MANY_REQUESTS, "");
        let missing = status_error(StatusCode::NOT_FOUND, "model 'llama9' not found");

        assert!(matches!(busy, LlmError::Unavailable(_)));
        assert!(throttled.is_retryable());
        assert!(!missing.is_retryable());
        assert_eq!(missing.to_string(), "LLM request failed: 404: model 'llama9' not found");
    }
}

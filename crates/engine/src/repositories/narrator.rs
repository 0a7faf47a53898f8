//! Narrator operations wrapper.
//!
//! The narrator is untrusted: whatever it returns is prose plus an optional
//! JSON hint, and nothing here interprets either.

use std::sync::Arc;

use crate::infrastructure::ports::{
    ChatMessage, FinishReason, LlmError, LlmPort, LlmRequest, TokenUsage,
};

/// Raw narrator output with the tokens it cost.
#[derive(Debug, Clone, PartialEq)]
pub struct NarratorReply {
    pub text: String,
    pub usage: TokenUsage,
    /// True when the transport did not report usage and it was estimated
    pub usage_estimated: bool,
}

/// Narrator service wrapper for use cases.
pub struct Narrator {
    llm: Arc<dyn LlmPort>,
    max_tokens: u32,
    temperature: f32,
}

impl Narrator {
    pub fn new(llm: Arc<dyn LlmPort>, max_tokens: u32, temperature: f32) -> Self {
        Self {
            llm,
            max_tokens,
            temperature,
        }
    }

    /// Send `text` after the `context` messages, under `system_prompt`.
    pub async fn send(
        &self,
        system_prompt: &str,
        context: Vec<ChatMessage>,
        text: &str,
    ) -> Result<NarratorReply, LlmError> {
        let mut messages = context;
        messages.push(ChatMessage::user(text));
        let request = LlmRequest::new(messages)
            .with_system_prompt(system_prompt)
            .with_temperature(self.temperature)
            .with_max_tokens(Some(self.max_tokens));
        let input_chars = request.char_count();

        let response = self.llm.generate(request).await?;

        if response.finish_reason == FinishReason::Length {
            tracing::warn!(
                max_tokens = self.max_tokens,
                "Narrator reply was cut off at the token limit"
            );
        }

        let (usage, usage_estimated) = match response.usage {
            Some(usage) => (usage, false),
            None => {
                let prompt_tokens = estimate_tokens(input_chars);
                let completion_tokens = estimate_tokens(response.content.chars().count());
                (
                    TokenUsage {
                        prompt_tokens,
                        completion_tokens,
                        total_tokens: prompt_tokens.saturating_add(completion_tokens),
                    },
                    true,
                )
            }
        };

        Ok(NarratorReply {
            text: response.content,
            usage,
            usage_estimated,
        })
    }
}

/// Rough token count for text the transport did not meter: one per four chars.
pub fn estimate_tokens(chars: usize) -> u32 {
    u32::try_from(chars.div_ceil(4)).unwrap_or(u32::MAX)
}

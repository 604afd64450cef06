pub mod decode;
pub mod openai;
pub mod prompts;
pub mod tutor;

pub use decode::{AnswerVerdict, GeneratedQuestion};
pub use openai::OpenAIClient;
pub use tutor::{Tutor, CHAT_FALLBACK_REPLY, MISSING_KEY_REPLY};

use crate::config::CompletionConfig;
use crate::error::Result;
use crate::state::ChatMessage;
use async_trait::async_trait;

/// One chat-completion call, independent of the wire format.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub max_tokens: Option<u32>,
    /// Ask the endpoint for a JSON object instead of free text.
    pub json_mode: bool,
}

impl ChatRequest {
    pub fn text(messages: Vec<ChatMessage>, temperature: f32, max_tokens: Option<u32>) -> Self {
        Self {
            messages,
            temperature,
            max_tokens,
            json_mode: false,
        }
    }

    pub fn json(messages: Vec<ChatMessage>, temperature: f32) -> Self {
        Self {
            messages,
            temperature,
            max_tokens: None,
            json_mode: true,
        }
    }
}

/// Sends a chat request and returns the assistant's raw content.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    async fn complete(&self, config: &CompletionConfig, request: &ChatRequest) -> Result<String>;
}

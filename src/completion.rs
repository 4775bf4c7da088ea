//! Chat-completion request and result types.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// A single summarisation request.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    /// Deployment (model) the request is routed to
    pub deployment: String,
    pub messages: Vec<Message>,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl CompletionRequest {
    /// System instruction followed by the text to summarise
    pub fn summarise(
        deployment: impl Into<String>,
        system_message: &str,
        input: &str,
        temperature: f32,
        max_tokens: u32,
    ) -> Self {
        Self {
            deployment: deployment.into(),
            messages: vec![Message::system(system_message), Message::user(input)],
            temperature,
            max_tokens,
        }
    }
}

/// Token counters reported by the provider
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    #[serde(default)]
    pub total_tokens: u32,
}

impl Usage {
    /// Prompt plus completion tokens
    pub fn total(&self) -> u32 {
        self.prompt_tokens.saturating_add(self.completion_tokens)
    }
}

/// Generated text plus usage, straight from the provider response
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionResult {
    pub text: String,
    pub usage: Usage,
}

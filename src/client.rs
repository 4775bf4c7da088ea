//! Azure OpenAI chat-completion client.
//!
//! The [`CompletionClient`] trait is the seam between the summariser and the
//! provider; [`AzureOpenAiClient`] talks to the real REST endpoint with reqwest.

use crate::completion::{CompletionRequest, CompletionResult, Message, Usage};
use crate::config::RunConfig;
use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// User-Agent string identifying this client
pub const USER_AGENT: &str = concat!("textsummary/", env!("CARGO_PKG_VERSION"));

#[derive(Error, Debug)]
pub enum CompletionError {
    #[error("request failed: {0}")]
    HttpError(#[from] reqwest::Error),
    #[error("Error code: {status} - {message}")]
    Api { status: u16, message: String },
    #[error("no completion returned by the model")]
    EmptyResponse,
    #[error("failed to parse response: {0}")]
    ParseError(#[from] serde_json::Error),
    #[error("invalid endpoint: {0}")]
    Endpoint(String),
}

/// Anything that can turn a [`CompletionRequest`] into a [`CompletionResult`].
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(
        &self,
        request: &CompletionRequest,
    ) -> Result<CompletionResult, CompletionError>;
}

/// Client bound to one Azure OpenAI resource.
#[derive(Debug, Clone)]
pub struct AzureOpenAiClient {
    http: Client,
    endpoint: String,
    api_key: String,
    api_version: String,
}

#[derive(Serialize)]
struct ChatBody<'a> {
    messages: &'a [Message],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Usage,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Deserialize)]
struct ApiErrorDetail {
    message: String,
}

/// Shared builder for the HTTP clients used by the tool
pub fn http_client(timeout: Option<Duration>) -> Result<Client, reqwest::Error> {
    let mut builder = Client::builder().user_agent(USER_AGENT);
    if let Some(timeout) = timeout {
        builder = builder.timeout(timeout);
    }
    builder.build()
}

impl AzureOpenAiClient {
    pub fn new(
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
        api_version: impl Into<String>,
        timeout: Option<Duration>,
    ) -> Result<Self, CompletionError> {
        Ok(Self {
            http: http_client(timeout)?,
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            api_version: api_version.into(),
        })
    }

    pub fn from_config(config: &RunConfig) -> Result<Self, CompletionError> {
        Self::new(
            &config.endpoint,
            &config.api_key,
            &config.api_version,
            config.timeout,
        )
    }

    /// `{endpoint}/openai/deployments/{deployment}/chat/completions?api-version=...`
    fn chat_url(&self, deployment: &str) -> Result<Url, CompletionError> {
        let raw = format!(
            "{}/openai/deployments/{}/chat/completions",
            self.endpoint.trim_end_matches('/'),
            deployment
        );
        let mut url =
            Url::parse(&raw).map_err(|e| CompletionError::Endpoint(format!("{raw}: {e}")))?;
        url.query_pairs_mut()
            .append_pair("api-version", &self.api_version);
        Ok(url)
    }
}

#[async_trait]
impl CompletionClient for AzureOpenAiClient {
    async fn complete(
        &self,
        request: &CompletionRequest,
    ) -> Result<CompletionResult, CompletionError> {
        let url = self.chat_url(&request.deployment)?;
        tracing::debug!(%url, max_tokens = request.max_tokens, "sending chat completion");

        let body = ChatBody {
            messages: &request.messages,
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        };

        let response = self
            .http
            .post(url)
            .header("api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<ApiErrorBody>(&text)
                .map(|body| body.error.message)
                .unwrap_or(text);
            return Err(CompletionError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: ChatResponse = serde_json::from_str(&text)?;
        let choice = parsed
            .choices
            .into_iter()
            .next()
            .ok_or(CompletionError::EmptyResponse)?;

        let usage = parsed.usage;
        if usage.total_tokens != 0 && usage.total_tokens != usage.total() {
            tracing::warn!(
                reported = usage.total_tokens,
                computed = usage.total(),
                "provider total_tokens differs from prompt + completion"
            );
        }
        tracing::debug!(
            prompt_tokens = usage.prompt_tokens,
            completion_tokens = usage.completion_tokens,
            "completion received"
        );

        Ok(CompletionResult {
            text: choice.message.content.unwrap_or_default(),
            usage,
        })
    }
}

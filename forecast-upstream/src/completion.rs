//! Natural-language completion via the OpenAI chat API

use std::time::Duration;

use async_openai::{
    config::OpenAIConfig,
    types::chat::{ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs},
    Client,
};
use async_trait::async_trait;
use tracing::{debug, instrument};

use crate::error::UpstreamError;
use crate::request::normalize_base_url;
use crate::Completion;

/// Default OpenAI-compatible API base
pub const DEFAULT_OPENAI_API_BASE: &str = "https://api.openai.com/v1";

/// Default chat model
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";

/// Upper bound on generated tokens per reply
const MAX_REPLY_TOKENS: u32 = 150;

#[derive(Debug, Clone)]
pub struct CompletionClient {
    client: Client<OpenAIConfig>,
    model: String,
    timeout: Duration,
}

impl CompletionClient {
    /// Create a completion client against an OpenAI-compatible API
    pub fn new(api_key: &str, api_base: &str, timeout: Duration) -> Result<Self, UpstreamError> {
        if api_key.is_empty() {
            return Err(UpstreamError::InvalidConfig("OpenAI API key is empty".to_string()));
        }

        let config = OpenAIConfig::new()
            .with_api_key(api_key)
            .with_api_base(normalize_base_url(api_base)?);

        Ok(Self {
            client: Client::with_config(config),
            model: DEFAULT_OPENAI_MODEL.to_string(),
            timeout,
        })
    }

    pub fn with_model(mut self, model: &str) -> Self {
        self.model = model.to_string();
        self
    }

    /// Generate a reply to a single user prompt
    #[instrument(skip(self, prompt), fields(model = %self.model, prompt_len = prompt.len()))]
    pub async fn complete(&self, prompt: &str) -> Result<String, UpstreamError> {
        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .max_completion_tokens(MAX_REPLY_TOKENS)
            .messages([ChatCompletionRequestUserMessageArgs::default()
                .content(prompt)
                .build()
                .map_err(|e| UpstreamError::InvalidConfig(e.to_string()))?
                .into()])
            .build()
            .map_err(|e| UpstreamError::InvalidConfig(e.to_string()))?;

        let response = tokio::time::timeout(self.timeout, self.client.chat().create(request))
            .await
            .map_err(|_| UpstreamError::Timeout(self.timeout.as_secs()))?
            .map_err(|e| UpstreamError::RequestFailed(format!("OpenAI API error: {}", e)))?;

        let reply = response
            .choices
            .first()
            .and_then(|c| c.message.content.as_ref())
            .map(|content| content.trim().to_string())
            .ok_or_else(|| UpstreamError::ParseError("No response from OpenAI".to_string()))?;

        debug!(reply_len = reply.len(), "Completion received");
        Ok(reply)
    }
}

#[async_trait]
impl Completion for CompletionClient {
    async fn complete(&self, prompt: &str) -> Result<String, UpstreamError> {
        CompletionClient::complete(self, prompt).await
    }
}

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::server::configuration::AzureOpenAiSettings;
use crate::server::services::auth::TokenCache;

pub const COGNITIVE_SERVICES_SCOPE: &str = "https://cognitiveservices.azure.com/.default";

const MAX_TOKENS: i32 = 500;
const TEMPERATURE: f32 = 0.7;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Serialize)]
struct CompletionRequest {
    messages: Vec<ChatMessage>,
    max_tokens: i32,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoice>,
}

pub struct AzureChatService {
    config: AzureOpenAiSettings,
    tokens: TokenCache,
    client: reqwest::Client,
}

impl AzureChatService {
    pub fn new(config: AzureOpenAiSettings, tokens: TokenCache) -> Self {
        Self {
            config,
            tokens,
            client: reqwest::Client::new(),
        }
    }

    pub fn endpoint(&self) -> Option<&str> {
        self.config.endpoint.as_deref()
    }

    /// Sends a single user-turn prompt and returns the first choice's content.
    pub async fn chat(&self, prompt: String) -> Result<String> {
        let endpoint = self
            .config
            .endpoint
            .as_ref()
            .ok_or_else(|| anyhow!("Azure OpenAI endpoint is not configured"))?;

        let token = self.tokens.get().await?;

        let request = CompletionRequest {
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: prompt,
            }],
            max_tokens: MAX_TOKENS,
            temperature: TEMPERATURE,
        };

        let url = format!(
            "{}/openai/deployments/{}/chat/completions?api-version={}",
            endpoint, self.config.deployment, self.config.api_version
        );

        let response = self
            .client
            .post(&url)
            .bearer_auth(token)
            .json(&request)
            .send()
            .await
            .context("Failed to reach Azure OpenAI")?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("Completion request failed: HTTP {}: {}", status, body));
        }

        let completion: CompletionResponse = response
            .json()
            .await
            .context("Failed to decode completion response")?;

        let reply = completion
            .choices
            .first()
            .map(|choice| choice.message.content.clone())
            .ok_or_else(|| anyhow!("Completion returned no choices"))?;

        info!(length = reply.len(), "Received completion");

        Ok(reply)
    }
}

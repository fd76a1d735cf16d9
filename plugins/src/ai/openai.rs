use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use pitchforge_core::api::{AiProvider, OpenAiConfig};

use crate::http::{build_client, parse_json_response, ProviderHttpError};

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessageResponse,
}

#[derive(Debug, Deserialize)]
struct ChatMessageResponse {
    #[serde(default)]
    content: Option<String>,
}

/// Client for any OpenAI-compatible `/chat/completions` endpoint.
#[derive(Clone)]
pub struct OpenAiCompatibleProvider {
    name: String,
    model: String,
    api_key: String,
    temperature: f32,
    http: reqwest::Client,
    url_chat: String,
}

impl OpenAiCompatibleProvider {
    pub fn new(cfg: &OpenAiConfig) -> Result<Self> {
        let normalized = cfg.base_url.trim_end_matches('/');
        Ok(Self {
            name: cfg.name.clone(),
            model: cfg.model.clone(),
            api_key: cfg.api_key.clone(),
            temperature: cfg.temperature,
            http: build_client(cfg.timeout_ms, None)?,
            url_chat: format!("{normalized}/chat/completions"),
        })
    }

    fn auth(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        if self.api_key.trim().is_empty() {
            req
        } else {
            req.bearer_auth(&self.api_key)
        }
    }
}

#[async_trait]
impl AiProvider for OpenAiCompatibleProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn generate(&self, prompt: &str, max_tokens: u32) -> Result<String> {
        let url = &self.url_chat;
        tracing::debug!(
            provider = %self.name,
            model = %self.model,
            prompt_chars = prompt.chars().count(),
            max_tokens,
            "chat completion request"
        );
        let body = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: "You are a market analyst. Answer with concrete, evidence-based content.",
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            temperature: self.temperature,
            max_tokens,
        };
        let resp = self
            .auth(self.http.post(url).json(&body))
            .send()
            .await
            .map_err(|err| ProviderHttpError::from_reqwest(&self.name, err, url.clone()))?;
        let value = parse_json_response(&self.name, resp).await?;

        let parsed: ChatResponse = serde_json::from_value(value)
            .map_err(|e| anyhow!("{}: unexpected completion shape: {e}", self.name))?;
        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .ok_or_else(|| anyhow!("{}: empty completion", self.name))?;

        tracing::debug!(provider = %self.name, reply_chars = content.chars().count(), "chat completion received");
        Ok(content)
    }
}

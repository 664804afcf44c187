//! OpenAI-compatible chat completions provider.
//!
//! Talks to anything serving `POST {base_url}/chat/completions`: OpenAI
//! itself, Ollama, vLLM, LM Studio.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use lovebot_core::error::{LovebotError, LovebotResult};
use lovebot_core::traits::{GenerationOptions, Llm, LlmConfig, LlmResponse, TokenUsage};
use lovebot_core::types::{Message, MessageRole};

use crate::endpoint;

const OPENAI_API_URL: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// OpenAI-compatible completion provider.
pub struct OpenAiCompatibleLlm {
    client: Client,
    config: LlmConfig,
    base_url: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: Option<ChatUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatError {
    error: ChatErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ChatErrorDetail {
    message: String,
}

impl OpenAiCompatibleLlm {
    /// Create a new provider. The API key comes from the config or
    /// `OPENAI_API_KEY`; it may be omitted when a custom `base_url` points at
    /// a local server.
    pub fn new(config: LlmConfig) -> LovebotResult<Self> {
        let api_key = config
            .api_key
            .clone()
            .or_else(|| std::env::var("OPENAI_API_KEY").ok());
        if api_key.is_none() && config.base_url.is_none() {
            return Err(LovebotError::Configuration(
                "OpenAI API key not found. Set OPENAI_API_KEY environment variable or provide api_key in config.".to_string(),
            ));
        }

        let mut headers = reqwest::header::HeaderMap::new();
        if let Some(key) = api_key {
            headers.insert(
                reqwest::header::AUTHORIZATION,
                format!("Bearer {}", key)
                    .parse()
                    .map_err(|_| LovebotError::Configuration("Invalid API key format".to_string()))?,
            );
        }

        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| {
                LovebotError::Configuration(format!("Failed to create HTTP client: {}", e))
            })?;

        let base_url = endpoint::base_url(config.base_url.as_deref(), OPENAI_API_URL)?;

        let mut config = config;
        if config.model.is_empty() {
            config.model = DEFAULT_MODEL.to_string();
        }

        Ok(Self {
            client,
            config,
            base_url,
        })
    }

    fn build_request<'a>(
        &'a self,
        messages: &'a [Message],
        options: &GenerationOptions,
    ) -> ChatRequest<'a> {
        ChatRequest {
            model: &self.config.model,
            messages: messages
                .iter()
                .map(|m| ChatMessage {
                    role: match m.role {
                        MessageRole::System => "system",
                        MessageRole::User => "user",
                        MessageRole::Assistant => "assistant",
                    },
                    content: &m.content,
                })
                .collect(),
            temperature: options.temperature.unwrap_or(self.config.temperature),
            max_tokens: options.max_tokens.unwrap_or(self.config.max_tokens),
        }
    }
}

fn parse_response(body: &str) -> LovebotResult<LlmResponse> {
    let response: ChatResponse = serde_json::from_str(body)
        .map_err(|e| {
            LovebotError::llm_invalid_response(format!("Failed to parse response: {}", e))
        })?;

    let content = response
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .filter(|c| !c.is_empty());

    Ok(LlmResponse {
        content,
        usage: response.usage.map(|u| TokenUsage {
            prompt_tokens: u.prompt_tokens,
            completion_tokens: u.completion_tokens,
            total_tokens: u.total_tokens,
        }),
    })
}

fn error_message(body: &str) -> String {
    serde_json::from_str::<ChatError>(body)
        .map(|e| e.error.message)
        .unwrap_or_else(|_| body.to_string())
}

#[async_trait]
impl Llm for OpenAiCompatibleLlm {
    async fn generate(
        &self,
        messages: &[Message],
        options: Option<GenerationOptions>,
    ) -> LovebotResult<LlmResponse> {
        let options = options.unwrap_or_default();
        let request = self.build_request(messages, &options);

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                LovebotError::llm_connection(format!("Chat completions request failed: {}", e))
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| LovebotError::llm(format!("Failed to read response body: {}", e)))?;

        if !status.is_success() {
            return Err(LovebotError::from_http_status(
                status.as_u16(),
                &error_message(&body),
            ));
        }

        let response = parse_response(&body)?;
        debug!(
            model = %self.config.model,
            total_tokens = response.usage.as_ref().map(|u| u.total_tokens),
            "Chat completion"
        );
        Ok(response)
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}

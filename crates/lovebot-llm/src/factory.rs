//! Factory for creating completion providers.

use std::sync::Arc;

use tracing::info;

use lovebot_core::config::{LlmProvider, LlmProviderConfig};
use lovebot_core::error::LovebotResult;
use lovebot_core::traits::{Llm, LlmConfig};

use crate::anthropic::AnthropicLlm;
use crate::openai::OpenAiCompatibleLlm;

/// Factory for creating completion providers.
pub struct LlmFactory;

impl LlmFactory {
    /// Create a provider from the `llm` section of the configuration.
    pub fn from_config(config: &LlmProviderConfig) -> LovebotResult<Arc<dyn Llm>> {
        Self::create(config.provider, config.config.clone())
    }

    /// Create a provider of the given type.
    pub fn create(provider: LlmProvider, config: LlmConfig) -> LovebotResult<Arc<dyn Llm>> {
        let llm: Arc<dyn Llm> = match provider {
            LlmProvider::Anthropic => Arc::new(AnthropicLlm::new(config)?),
            LlmProvider::OpenAI => Arc::new(OpenAiCompatibleLlm::new(config)?),
        };
        info!(provider = ?provider, model = llm.model_name(), "Completion provider ready");
        Ok(llm)
    }

    /// Create an Anthropic provider with a specific model.
    pub fn anthropic_with_model(model: impl Into<String>) -> LovebotResult<Arc<dyn Llm>> {
        let config = LlmConfig {
            model: model.into(),
            ..Default::default()
        };
        Self::create(LlmProvider::Anthropic, config)
    }

    /// Create an OpenAI-compatible provider for a local server such as Ollama.
    pub fn local(base_url: impl Into<String>, model: impl Into<String>) -> LovebotResult<Arc<dyn Llm>> {
        let config = LlmConfig {
            model: model.into(),
            base_url: Some(base_url.into()),
            ..Default::default()
        };
        Self::create(LlmProvider::OpenAI, config)
    }
}

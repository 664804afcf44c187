//! lovebot-llm - Completion provider implementations for lovebot.
//!
//! # Supported Providers
//!
//! - **Anthropic** - Messages API
//! - **OpenAI-compatible** - OpenAI, Ollama, vLLM, LM Studio via `base_url`
//!
//! # Example
//!
//! ```ignore
//! use lovebot_llm::LlmFactory;
//!
//! let llm = LlmFactory::from_config(&config.llm)?;
//!
//! // Or a local Ollama model
//! let llm = LlmFactory::local("http://localhost:11434/v1", "llama3.1")?;
//! ```

mod anthropic;
mod endpoint;
mod factory;
mod openai;

pub use anthropic::AnthropicLlm;
pub use factory::LlmFactory;
pub use openai::OpenAiCompatibleLlm;

// Re-export core types for convenience
pub use lovebot_core::config::{LlmProvider, LlmProviderConfig};
pub use lovebot_core::traits::{GenerationOptions, Llm, LlmConfig, LlmResponse};

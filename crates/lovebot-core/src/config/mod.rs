//! Configuration system for lovebot.
//!
//! One [`LovebotConfig`] value is built at startup and handed to every
//! component explicitly. Nothing reads configuration from globals.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{LovebotError, LovebotResult};
use crate::traits::LlmConfig;

/// Upper bound for every interval setting (cooldown, profile refresh, save),
/// one year in seconds.
pub const MAX_INTERVAL_SECS: u64 = 365 * 24 * 60 * 60;

fn bounded_seconds(secs: u64) -> chrono::Duration {
    chrono::Duration::seconds(secs.min(MAX_INTERVAL_SECS) as i64)
}

/// LLM provider type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    #[default]
    Anthropic,
    /// Any OpenAI-compatible chat completions endpoint (OpenAI, Ollama, vLLM, ...).
    OpenAI,
}

/// Provider configuration with type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmProviderConfig {
    /// Provider type.
    pub provider: LlmProvider,
    /// Provider-specific configuration.
    #[serde(flatten)]
    pub config: LlmConfig,
}

impl Default for LlmProviderConfig {
    fn default() -> Self {
        Self {
            provider: LlmProvider::Anthropic,
            config: LlmConfig {
                model: "claude-3-5-haiku-20241022".to_string(),
                ..Default::default()
            },
        }
    }
}

/// Relevance scoring settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RelevanceConfig {
    /// Display name of the bot; mentions of it (with or without spaces) are direct requests.
    pub bot_name: String,
    /// Extra names that count as a mention.
    pub bot_aliases: Vec<String>,
    /// Leading character that marks a direct request in group chats.
    pub direct_request_marker: char,
    /// Minimum per-language score for a message to be relevant.
    pub relevance_threshold: f64,
    /// Messages longer than this many characters get a small score bonus.
    pub long_message_chars: usize,
}

impl Default for RelevanceConfig {
    fn default() -> Self {
        Self {
            bot_name: "LoveBot".to_string(),
            bot_aliases: vec!["love bot".to_string()],
            direct_request_marker: '!',
            relevance_threshold: 1.0,
            long_message_chars: 100,
        }
    }
}

/// Intervention engine settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InterventionConfig {
    /// Minimum seconds between non-direct interventions in one conversation.
    pub cooldown_secs: u64,
    /// Group messages scoring at or above this get proactive advice.
    pub proactive_threshold: f64,
    /// Disable the cooldown entirely (operator/test mode).
    pub skip_cooldown: bool,
}

impl Default for InterventionConfig {
    fn default() -> Self {
        Self {
            cooldown_secs: 30 * 60,
            proactive_threshold: 3.0,
            skip_cooldown: false,
        }
    }
}

impl InterventionConfig {
    pub fn cooldown(&self) -> chrono::Duration {
        bounded_seconds(self.cooldown_secs)
    }
}

/// Conversation context settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextConfig {
    /// Recent messages retained per conversation.
    pub max_messages: usize,
    /// Minimum seconds between relationship profile refreshes.
    pub profile_refresh_secs: u64,
    /// Seconds between durable saves of all conversations.
    pub save_interval_secs: u64,
    /// Lines of imported history included when rendering for completion.
    pub imported_sample_lines: usize,
    /// The bot's own sender id, never counted as a participant.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bot_id: Option<String>,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            max_messages: 20,
            profile_refresh_secs: 60 * 60,
            save_interval_secs: 5 * 60,
            imported_sample_lines: 10,
            bot_id: None,
        }
    }
}

impl ContextConfig {
    pub fn profile_refresh_interval(&self) -> chrono::Duration {
        bounded_seconds(self.profile_refresh_secs)
    }

    pub fn save_interval(&self) -> chrono::Duration {
        bounded_seconds(self.save_interval_secs)
    }
}

/// Durable storage backend for conversation contexts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackend {
    #[default]
    Sqlite,
    /// One JSON file per conversation in a directory.
    JsonDir,
}

/// Storage configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    /// Database file (sqlite) or directory (json_dir).
    pub path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Sqlite,
            path: lovebot_dir().join("contexts.db"),
        }
    }
}

fn lovebot_dir() -> PathBuf {
    dirs::home_dir()
        .map(|h| h.join(".lovebot"))
        .unwrap_or_else(|| PathBuf::from(".lovebot"))
}

fn default_fallback_response() -> String {
    "Sorry, I couldn't put my thoughts together just now. Please try again in a moment."
        .to_string()
}

fn default_command_prefix() -> String {
    "#lovebot".to_string()
}

/// Main lovebot configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LovebotConfig {
    pub relevance: RelevanceConfig,
    pub intervention: InterventionConfig,
    pub context: ContextConfig,
    pub storage: StorageConfig,
    pub llm: LlmProviderConfig,
    /// Sent in place of a completion that failed.
    pub fallback_response: String,
    /// Messages starting with this are commands, not conversation.
    pub command_prefix: String,
}

impl Default for LovebotConfig {
    fn default() -> Self {
        Self {
            relevance: RelevanceConfig::default(),
            intervention: InterventionConfig::default(),
            context: ContextConfig::default(),
            storage: StorageConfig::default(),
            llm: LlmProviderConfig::default(),
            fallback_response: default_fallback_response(),
            command_prefix: default_command_prefix(),
        }
    }
}

impl LovebotConfig {
    /// Load configuration from a file (TOML, JSON, or YAML).
    pub fn from_file(path: impl AsRef<Path>) -> LovebotResult<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let ext = path.as_ref().extension().and_then(|e| e.to_str());

        let config: Self = match ext {
            Some("toml") => {
                toml::from_str(&content).map_err(|e| LovebotError::Configuration(e.to_string()))?
            }
            Some("json") => serde_json::from_str(&content)
                .map_err(|e| LovebotError::Configuration(e.to_string()))?,
            Some("yaml" | "yml") => serde_yaml::from_str(&content)
                .map_err(|e| LovebotError::Configuration(e.to_string()))?,
            _ => {
                return Err(LovebotError::Configuration(
                    "Unsupported config file format. Use .toml, .json, or .yaml".to_string(),
                ))
            }
        };
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from environment variables.
    ///
    /// Starts from `LOVEBOT_CONFIG` (a config file) when set, otherwise from
    /// defaults, then applies individual overrides.
    pub fn from_env() -> LovebotResult<Self> {
        let mut config = match std::env::var("LOVEBOT_CONFIG") {
            Ok(path) => Self::from_file(path)?,
            Err(_) => Self::default(),
        };

        if let Ok(name) = std::env::var("LOVEBOT_BOT_NAME") {
            config.relevance.bot_name = name;
        }
        if let Ok(id) = std::env::var("LOVEBOT_BOT_ID") {
            config.context.bot_id = Some(id);
        }
        if let Ok(marker) = std::env::var("LOVEBOT_MARKER") {
            if let Some(c) = marker.chars().next() {
                config.relevance.direct_request_marker = c;
            }
        }
        if let Ok(secs) = std::env::var("LOVEBOT_COOLDOWN_SECS") {
            config.intervention.cooldown_secs = secs.parse().map_err(|_| {
                LovebotError::Configuration("LOVEBOT_COOLDOWN_SECS must be an integer".to_string())
            })?;
        }
        if std::env::var("LOVEBOT_SKIP_COOLDOWN").is_ok() {
            config.intervention.skip_cooldown = true;
        }

        if let Ok(backend) = std::env::var("LOVEBOT_STORAGE_BACKEND") {
            config.storage.backend = match backend.to_lowercase().as_str() {
                "sqlite" => StorageBackend::Sqlite,
                "json" | "json_dir" => StorageBackend::JsonDir,
                other => {
                    return Err(LovebotError::Configuration(format!(
                        "Unknown storage backend '{}'",
                        other
                    )))
                }
            };
            if config.storage.backend == StorageBackend::JsonDir {
                config.storage.path = lovebot_dir().join("contexts");
            }
        }
        if let Ok(path) = std::env::var("LOVEBOT_STORAGE_PATH") {
            config.storage.path = PathBuf::from(path);
        }

        if let Ok(provider) = std::env::var("LOVEBOT_LLM_PROVIDER") {
            config.llm.provider = match provider.to_lowercase().as_str() {
                "anthropic" => LlmProvider::Anthropic,
                "openai" => LlmProvider::OpenAI,
                other => {
                    return Err(LovebotError::UnsupportedProvider {
                        provider: other.to_string(),
                    })
                }
            };
        }
        if let Ok(model) = std::env::var("LOVEBOT_LLM_MODEL") {
            config.llm.config.model = model;
        }
        if let Ok(base_url) = std::env::var("LOVEBOT_LLM_BASE_URL") {
            config.llm.config.base_url = Some(base_url);
        }

        config.validate()?;
        Ok(config)
    }

    /// Reject settings the pipeline cannot work with.
    pub fn validate(&self) -> LovebotResult<()> {
        if self.context.max_messages == 0 {
            return Err(LovebotError::Configuration(
                "context.max_messages must be at least 1".to_string(),
            ));
        }
        if self.relevance.bot_name.trim().is_empty() {
            return Err(LovebotError::Configuration(
                "relevance.bot_name must not be empty".to_string(),
            ));
        }
        for (name, secs) in [
            ("intervention.cooldown_secs", self.intervention.cooldown_secs),
            ("context.profile_refresh_secs", self.context.profile_refresh_secs),
            ("context.save_interval_secs", self.context.save_interval_secs),
        ] {
            if secs > MAX_INTERVAL_SECS {
                return Err(LovebotError::Configuration(format!(
                    "{} must be at most {} seconds, got {}",
                    name, MAX_INTERVAL_SECS, secs
                )));
            }
        }
        if self.command_prefix.trim().is_empty() {
            return Err(LovebotError::Configuration(
                "command_prefix must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Build configuration using builder pattern.
    pub fn builder() -> LovebotConfigBuilder {
        LovebotConfigBuilder::default()
    }
}

/// Builder for LovebotConfig.
#[derive(Default)]
pub struct LovebotConfigBuilder {
    config: LovebotConfig,
}

impl LovebotConfigBuilder {
    /// Set the bot's display name.
    pub fn bot_name(mut self, name: impl Into<String>) -> Self {
        self.config.relevance.bot_name = name.into();
        self
    }

    /// Set the bot's own sender id.
    pub fn bot_id(mut self, id: impl Into<String>) -> Self {
        self.config.context.bot_id = Some(id.into());
        self
    }

    /// Set the intervention cooldown.
    pub fn cooldown_secs(mut self, secs: u64) -> Self {
        self.config.intervention.cooldown_secs = secs;
        self
    }

    /// Disable the intervention cooldown.
    pub fn skip_cooldown(mut self, skip: bool) -> Self {
        self.config.intervention.skip_cooldown = skip;
        self
    }

    /// Set the number of retained messages per conversation.
    pub fn max_messages(mut self, max: usize) -> Self {
        self.config.context.max_messages = max;
        self
    }

    /// Set storage configuration.
    pub fn storage(mut self, backend: StorageBackend, path: impl Into<PathBuf>) -> Self {
        self.config.storage = StorageConfig {
            backend,
            path: path.into(),
        };
        self
    }

    /// Set LLM configuration.
    pub fn llm(mut self, config: LlmProviderConfig) -> Self {
        self.config.llm = config;
        self
    }

    /// Set the fallback response used when completion fails.
    pub fn fallback_response(mut self, text: impl Into<String>) -> Self {
        self.config.fallback_response = text.into();
        self
    }

    /// Build the configuration.
    pub fn build(self) -> LovebotConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = LovebotConfig::default();
        assert_eq!(config.context.max_messages, 20);
        assert_eq!(config.intervention.cooldown_secs, 1800);
        assert_eq!(config.intervention.proactive_threshold, 3.0);
        assert_eq!(config.relevance.direct_request_marker, '!');
        assert_eq!(config.command_prefix, "#lovebot");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder() {
        let config = LovebotConfig::builder()
            .bot_name("Cupid")
            .bot_id("bot@c.us")
            .cooldown_secs(60)
            .skip_cooldown(true)
            .max_messages(5)
            .build();
        assert_eq!(config.relevance.bot_name, "Cupid");
        assert_eq!(config.context.bot_id.as_deref(), Some("bot@c.us"));
        assert_eq!(config.intervention.cooldown(), chrono::Duration::seconds(60));
        assert!(config.intervention.skip_cooldown);
        assert_eq!(config.context.max_messages, 5);
    }

    #[test]
    fn test_oversized_intervals_rejected_and_clamped() {
        let config = LovebotConfig::builder().cooldown_secs(u64::MAX / 2).build();
        assert!(matches!(
            config.validate(),
            Err(LovebotError::Configuration(msg)) if msg.contains("intervention.cooldown_secs")
        ));
        assert_eq!(
            config.intervention.cooldown(),
            chrono::Duration::seconds(MAX_INTERVAL_SECS as i64)
        );

        let mut config = LovebotConfig::default();
        config.context.save_interval_secs = u64::MAX;
        assert!(config.validate().is_err());
        assert_eq!(
            config.context.save_interval(),
            chrono::Duration::seconds(MAX_INTERVAL_SECS as i64)
        );

        let mut config = LovebotConfig::default();
        config.intervention.cooldown_secs = MAX_INTERVAL_SECS;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_toml_file_partial() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
fallback_response = "oops"

[intervention]
cooldown_secs = 10

[storage]
backend = "json_dir"
path = "/tmp/lovebot-contexts"

[llm]
provider = "openai"
model = "gpt-4o-mini"
"#
        )
        .unwrap();

        let config = LovebotConfig::from_file(file.path()).unwrap();
        assert_eq!(config.fallback_response, "oops");
        assert_eq!(config.intervention.cooldown_secs, 10);
        assert_eq!(config.intervention.proactive_threshold, 3.0);
        assert_eq!(config.storage.backend, StorageBackend::JsonDir);
        assert_eq!(config.llm.provider, LlmProvider::OpenAI);
        assert_eq!(config.llm.config.model, "gpt-4o-mini");
        assert_eq!(config.context.max_messages, 20);
    }

    #[test]
    fn test_unsupported_extension() {
        let file = tempfile::Builder::new().suffix(".ini").tempfile().unwrap();
        assert!(matches!(
            LovebotConfig::from_file(file.path()),
            Err(LovebotError::Configuration(_))
        ));
    }

    #[test]
    fn test_validate_rejects_zero_capacity() {
        let config = LovebotConfig::builder().max_messages(0).build();
        assert!(config.validate().is_err());
    }
}

//! lovebot-core - Decision core for lovebot.
//!
//! Decides, for each inbound chat message, whether the bot should respond,
//! how, and to whom, while keeping per-conversation context across time and
//! languages.
//!
//! # Example
//!
//! ```ignore
//! use lovebot_core::{AdvisoryOrchestrator, ContextStore, Lexicon, LovebotConfig};
//!
//! let config = LovebotConfig::from_env()?;
//! let persistence = lovebot_core::context::persistence_from_config(&config.storage)?;
//! let store = Arc::new(ContextStore::open(persistence, &config).await);
//! let orchestrator = AdvisoryOrchestrator::new(config, Arc::new(Lexicon::builtin()?), store, llm);
//!
//! let outcome = orchestrator.handle(&message).await;
//! for send in outcome.outbound {
//!     transport.send(&send.recipient, &send.text).await?;
//! }
//! ```

pub mod commands;
pub mod config;
pub mod context;
pub mod error;
pub mod intervention;
pub mod lexicon;
pub mod orchestrator;
pub mod relevance;
pub mod traits;
pub mod transcript;
pub mod types;

// Re-export commonly used types
pub use commands::{Command, CommandHandler};
pub use config::{LlmProvider, LlmProviderConfig, LovebotConfig, StorageBackend};
pub use context::{
    ContextPatch, ContextPersistence, ContextSaveScheduler, ContextStore, ConversationContext,
    JsonDirPersistence, MessageEntry, RelationshipProfile, RelationshipType,
    SqliteContextPersistence,
};
pub use error::{ErrorCode, LovebotError, LovebotResult};
pub use intervention::{InterventionDecision, InterventionEngine, InterventionKind};
pub use lexicon::{LanguageSpec, Lexicon};
pub use orchestrator::{AdvisoryOrchestrator, HandleOutcome, ResponseUnit};
pub use relevance::{RelevanceReason, RelevanceResult, RelevanceScorer};
pub use traits::{GenerationOptions, Llm, LlmConfig, LlmResponse, TokenUsage};
pub use transcript::{ArchiveImportReport, ImportStats, TranscriptEntry};
pub use types::{
    ConversationId, IncomingMessage, Message, MessageRole, OutboundMessage, PromptPair,
    QuotedMessage,
};

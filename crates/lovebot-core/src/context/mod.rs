//! Conversation context: bounded history, relationship profile, imported
//! transcripts and durable persistence.

mod json_dir;
mod persistence;
pub mod profile;
mod render;
mod scheduler;
mod sqlite;
mod store;
mod types;

pub use json_dir::JsonDirPersistence;
pub use persistence::{storage_key, ContextPersistence, LoadedRecord};
pub use render::{render_context, NO_HISTORY};
pub use scheduler::ContextSaveScheduler;
pub use sqlite::SqliteContextPersistence;
pub use store::ContextStore;
pub use types::{
    ContextPatch, ConversationContext, MessageEntry, RelationshipProfile, RelationshipType,
};

use std::sync::Arc;

use crate::config::{StorageBackend, StorageConfig};
use crate::error::LovebotResult;

/// Build the persistence backend named by `config`.
pub fn persistence_from_config(config: &StorageConfig) -> LovebotResult<Arc<dyn ContextPersistence>> {
    Ok(match config.backend {
        StorageBackend::Sqlite => Arc::new(SqliteContextPersistence::new(&config.path)?),
        StorageBackend::JsonDir => Arc::new(JsonDirPersistence::new(config.path.clone())?),
    })
}

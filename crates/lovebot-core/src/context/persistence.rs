//! Durable storage seam for conversation contexts.

use sha2::{Digest, Sha256};

use crate::error::LovebotResult;
use crate::types::ConversationId;

use super::types::ConversationContext;

/// One record read back at startup. A record that failed to decode keeps its
/// key so the failure can be reported.
pub type LoadedRecord = (String, LovebotResult<ConversationContext>);

/// Whole-record storage keyed by a sanitized conversation id.
///
/// Writes overwrite the full record; writing the same context twice is
/// harmless.
#[cfg_attr(test, mockall::automock)]
pub trait ContextPersistence: Send + Sync {
    /// Read every stored record.
    fn load_all(&self) -> LovebotResult<Vec<LoadedRecord>>;

    /// Store `context` under `key`, replacing any previous record.
    fn save(&self, key: &str, context: &ConversationContext) -> LovebotResult<()>;

    /// Remove the record under `key`. Missing records are not an error.
    fn delete(&self, key: &str) -> LovebotResult<()>;

    /// Backend name for logs.
    fn name(&self) -> &'static str;
}

/// Hex digits of the id hash appended to every key.
const KEY_HASH_LEN: usize = 8;

/// Map a conversation id to a storage-safe key: every character that is not
/// ASCII alphanumeric becomes `_`, followed by a short SHA-256 prefix of the
/// raw id so ids that sanitize alike still get distinct keys.
pub fn storage_key(id: &ConversationId) -> String {
    let sanitized: String = id
        .as_str()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    let digest = hex::encode(Sha256::digest(id.as_str().as_bytes()));
    format!("{}_{}", sanitized, &digest[..KEY_HASH_LEN])
}

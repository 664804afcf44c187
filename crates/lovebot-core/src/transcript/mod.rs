//! Bulk import of chat exports into a conversation's imported history.

mod archive;
mod parser;

pub use archive::{extract_archive, ArchiveEntryReport, ExtractedArchive, MAX_NESTING};
pub use parser::{is_export_format, is_media_placeholder, parse, TranscriptEntry};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use crate::context::{ContextPatch, ContextStore};
use crate::error::{LovebotError, LovebotResult};
use crate::types::ConversationId;

/// Counts from one import.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ImportStats {
    /// Messages parsed, media included.
    pub parsed: usize,
    /// Media placeholders dropped.
    pub media_skipped: usize,
    /// Lines written to the imported history.
    pub imported: usize,
}

/// Result of importing an archive.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ArchiveImportReport {
    pub entries: Vec<ArchiveEntryReport>,
    pub imported: usize,
}

/// Render entries as one history blob, oldest first. Media placeholders are
/// dropped; equal timestamps keep their file order.
pub fn render_history(entries: &[TranscriptEntry]) -> (String, usize) {
    let mut kept: Vec<&TranscriptEntry> =
        entries.iter().filter(|e| !e.is_media_placeholder).collect();
    kept.sort_by_key(|e| e.timestamp);
    let count = kept.len();
    let blob = kept
        .iter()
        .map(|e| e.render())
        .collect::<Vec<_>>()
        .join("\n");
    (blob, count)
}

/// Parse a plain-text export and attach it to the conversation.
pub async fn import_into(
    store: &ContextStore,
    conversation_id: &ConversationId,
    blob: &str,
) -> LovebotResult<ImportStats> {
    import_into_at(store, conversation_id, blob, Utc::now()).await
}

pub async fn import_into_at(
    store: &ContextStore,
    conversation_id: &ConversationId,
    blob: &str,
    now: DateTime<Utc>,
) -> LovebotResult<ImportStats> {
    if conversation_id.is_empty() {
        return Err(LovebotError::missing_field("conversation id"));
    }
    let entries = parse(blob);
    if entries.is_empty() {
        return Err(LovebotError::transcript("no chat messages found in transcript"));
    }

    let imported = merge_entries(store, conversation_id, &entries, now).await?;
    let stats = ImportStats {
        parsed: entries.len(),
        media_skipped: entries.len() - imported,
        imported,
    };
    info!(
        conversation_id = %conversation_id,
        parsed = stats.parsed,
        imported = stats.imported,
        "Transcript imported"
    );
    Ok(stats)
}

/// Import every chat export found in a zip archive.
///
/// All recognized entries are combined into one history, so a later entry
/// never overwrites an earlier one.
pub async fn import_archive_into(
    store: &ContextStore,
    conversation_id: &ConversationId,
    bytes: &[u8],
) -> LovebotResult<ArchiveImportReport> {
    if conversation_id.is_empty() {
        return Err(LovebotError::missing_field("conversation id"));
    }
    let extracted = extract_archive(bytes)?;
    if !extracted.reports.iter().any(|r| r.recognized) {
        return Err(LovebotError::transcript(
            "archive contains no recognizable chat export",
        ));
    }

    let imported = merge_entries(store, conversation_id, &extracted.entries, Utc::now()).await?;
    info!(
        conversation_id = %conversation_id,
        entries = extracted.reports.len(),
        imported,
        "Archive imported"
    );
    Ok(ArchiveImportReport {
        entries: extracted.reports,
        imported,
    })
}

async fn merge_entries(
    store: &ContextStore,
    conversation_id: &ConversationId,
    entries: &[TranscriptEntry],
    now: DateTime<Utc>,
) -> LovebotResult<usize> {
    let (history, count) = render_history(entries);
    if count == 0 {
        return Ok(0);
    }
    store
        .merge_at(
            conversation_id,
            ContextPatch::imported_history(history, now),
            now,
        )
        .await?;
    Ok(count)
}

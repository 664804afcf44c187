//! Conversation inspection and transcript import endpoints.

use axum::{
    body::Bytes,
    extract::{Path, State},
    Json,
};
use serde::Serialize;

use lovebot_core::transcript::{import_archive_into, import_into};
use lovebot_core::{
    ArchiveImportReport, ConversationContext, ConversationId, ImportStats, LovebotError,
};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct ConversationList {
    pub conversations: Vec<ConversationId>,
}

#[derive(Debug, Serialize)]
pub struct RenderedContext {
    pub conversation_id: ConversationId,
    pub rendered: String,
}

/// List known conversations.
/// GET /conversations
pub async fn list_conversations(State(state): State<AppState>) -> Json<ConversationList> {
    let mut conversations = state.store().conversation_ids().await;
    conversations.sort_by(|a, b| a.as_str().cmp(b.as_str()));
    Json(ConversationList { conversations })
}

/// Get the stored context of one conversation.
/// GET /conversations/:id
pub async fn get_conversation(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<ConversationContext>> {
    let id = ConversationId::new(id);
    state
        .store()
        .get(&id)
        .await
        .map(Json)
        .ok_or_else(|| LovebotError::not_found(id.as_str()).into())
}

/// Render the context exactly as a completion would see it.
/// GET /conversations/:id/render
pub async fn render_conversation(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Json<RenderedContext> {
    let id = ConversationId::new(id);
    let rendered = state.store().render_for_completion(&id).await;
    Json(RenderedContext {
        conversation_id: id,
        rendered,
    })
}

/// Import a plain-text chat export.
/// POST /conversations/:id/import
pub async fn import_transcript(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: String,
) -> ApiResult<Json<ImportStats>> {
    if body.trim().is_empty() {
        return Err(ApiError::bad_request("Transcript body is empty"));
    }
    let id = ConversationId::new(id);
    let stats = import_into(state.store(), &id, &body).await?;
    Ok(Json(stats))
}

/// Import a zipped chat export.
/// POST /conversations/:id/import-archive
pub async fn import_archive(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Bytes,
) -> ApiResult<Json<ArchiveImportReport>> {
    if body.is_empty() {
        return Err(ApiError::bad_request("Archive body is empty"));
    }
    let id = ConversationId::new(id);
    let report = import_archive_into(state.store(), &id, &body).await?;
    Ok(Json(report))
}

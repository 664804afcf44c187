//! Transport webhook: one inbound chat message in, outbound sends out.

use axum::{extract::State, Json};

use lovebot_core::{HandleOutcome, IncomingMessage};

use crate::error::ApiResult;
use crate::state::AppState;

/// Handle one inbound message.
/// POST /messages
///
/// The response lists the texts the transport should send; it is empty when
/// the bot stays quiet.
pub async fn handle_message(
    State(state): State<AppState>,
    Json(message): Json<IncomingMessage>,
) -> ApiResult<Json<HandleOutcome>> {
    let outcome = state.orchestrator.handle(&message).await;
    Ok(Json(outcome))
}

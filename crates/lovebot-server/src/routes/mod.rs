//! Route definitions for the HTTP shell.

mod conversations;
mod health;
mod messages;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::state::AppState;

/// Upper bound for uploaded chat export archives.
pub const MAX_ARCHIVE_BYTES: usize = 64 * 1024 * 1024;

/// Create the main application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health::health_check))
        // Transport webhook
        .route("/messages", post(messages::handle_message))
        // Conversations
        .route("/conversations", get(conversations::list_conversations))
        .route("/conversations/:id", get(conversations::get_conversation))
        .route(
            "/conversations/:id/render",
            get(conversations::render_conversation),
        )
        .route(
            "/conversations/:id/import",
            post(conversations::import_transcript),
        )
        .route(
            "/conversations/:id/import-archive",
            post(conversations::import_archive).layer(DefaultBodyLimit::max(MAX_ARCHIVE_BYTES)),
        )
        // Attach state
        .with_state(state)
}

pub use conversations::*;
pub use health::*;
pub use messages::*;

//! Server state management.

use std::sync::Arc;

use lovebot_core::{AdvisoryOrchestrator, ContextStore};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<AdvisoryOrchestrator>,
}

impl AppState {
    pub fn new(orchestrator: Arc<AdvisoryOrchestrator>) -> Self {
        Self { orchestrator }
    }

    /// The context store behind the orchestrator.
    pub fn store(&self) -> &Arc<ContextStore> {
        self.orchestrator.store()
    }
}

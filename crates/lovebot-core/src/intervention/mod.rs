//! Intervention decisions.
//!
//! Given a message, decides whether to intervene, how, and for whom. The only
//! state is the last intervention time per conversation, which drives the
//! cooldown. Direct requests always bypass the cooldown.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::config::InterventionConfig;
use crate::context::ContextStore;
use crate::error::LovebotResult;
use crate::relevance::{RelevanceResult, RelevanceScorer};
use crate::types::{ConversationId, IncomingMessage};

/// How the bot intervenes.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, strum::Display, strum::EnumString,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum InterventionKind {
    None,
    RespondInConversation,
    /// Never chosen by the current classification; kept with its recipient
    /// resolution.
    RespondPrivately,
    ProactiveAdvice,
}

/// The outcome of [`InterventionEngine::decide`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InterventionDecision {
    pub should_intervene: bool,
    pub kind: InterventionKind,
    pub recipients: Vec<String>,
    pub reason: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relevance: Option<RelevanceResult>,
}

impl InterventionDecision {
    pub fn none(reason: impl Into<String>) -> Self {
        Self {
            should_intervene: false,
            kind: InterventionKind::None,
            recipients: Vec::new(),
            reason: reason.into(),
            relevance: None,
        }
    }

    fn with_relevance(mut self, relevance: RelevanceResult) -> Self {
        self.relevance = Some(relevance);
        self
    }
}

pub const REASON_NO_CONVERSATION: &str = "no conversation id";
pub const REASON_COOLDOWN: &str = "intervened too recently";
pub const REASON_ERROR: &str = "error during decision";

/// The intervention state machine.
pub struct InterventionEngine {
    scorer: RelevanceScorer,
    config: InterventionConfig,
    store: Arc<ContextStore>,
    last_intervention: Mutex<HashMap<ConversationId, DateTime<Utc>>>,
}

impl InterventionEngine {
    pub fn new(scorer: RelevanceScorer, config: InterventionConfig, store: Arc<ContextStore>) -> Self {
        Self {
            scorer,
            config,
            store,
            last_intervention: Mutex::new(HashMap::new()),
        }
    }

    pub fn scorer(&self) -> &RelevanceScorer {
        &self.scorer
    }

    pub async fn decide(&self, message: &IncomingMessage) -> InterventionDecision {
        self.decide_at(message, Utc::now()).await
    }

    /// Decide as of `now`. Never fails: internal faults yield a NONE
    /// decision with reason "error during decision".
    pub async fn decide_at(
        &self,
        message: &IncomingMessage,
        now: DateTime<Utc>,
    ) -> InterventionDecision {
        match self.try_decide_at(message, now).await {
            Ok(decision) => {
                debug!(
                    conversation_id = %message.conversation_id,
                    kind = %decision.kind,
                    reason = %decision.reason,
                    recipients = ?decision.recipients,
                    "Intervention decided"
                );
                decision
            }
            Err(e) => {
                warn!(
                    conversation_id = %message.conversation_id,
                    error = %e,
                    "Intervention decision failed"
                );
                InterventionDecision::none(REASON_ERROR)
            }
        }
    }

    pub async fn try_decide_at(
        &self,
        message: &IncomingMessage,
        now: DateTime<Utc>,
    ) -> LovebotResult<InterventionDecision> {
        let conversation_id = &message.conversation_id;
        if conversation_id.is_empty() {
            return Ok(InterventionDecision::none(REASON_NO_CONVERSATION));
        }

        let relevance = self.scorer.analyze(message, message.is_private);

        if !self.config.skip_cooldown && !relevance.is_direct_request() {
            let last = self.last_intervention.lock().await.get(conversation_id).copied();
            if let Some(last) = last {
                if now - last < self.config.cooldown() {
                    return Ok(InterventionDecision::none(REASON_COOLDOWN).with_relevance(relevance));
                }
            }
        }

        if !relevance.needs_processing {
            return Ok(
                InterventionDecision::none(relevance.reason.to_string()).with_relevance(relevance)
            );
        }

        let kind = self.classify(message, &relevance);
        let recipients = self.resolve_recipients(message, kind).await;

        self.last_intervention
            .lock()
            .await
            .insert(conversation_id.clone(), now);

        info!(
            conversation_id = %conversation_id,
            kind = %kind,
            score = relevance.score,
            "Intervening"
        );

        Ok(InterventionDecision {
            should_intervene: true,
            kind,
            recipients,
            reason: relevance.reason.to_string(),
            relevance: Some(relevance),
        })
    }

    fn classify(&self, message: &IncomingMessage, relevance: &RelevanceResult) -> InterventionKind {
        if message.is_private {
            InterventionKind::RespondInConversation
        } else if relevance.score >= self.config.proactive_threshold {
            InterventionKind::ProactiveAdvice
        } else {
            InterventionKind::RespondInConversation
        }
    }

    async fn resolve_recipients(
        &self,
        message: &IncomingMessage,
        kind: InterventionKind,
    ) -> Vec<String> {
        let conversation = message.conversation_id.to_string();
        if message.is_private {
            return vec![conversation];
        }
        match kind {
            InterventionKind::None => Vec::new(),
            InterventionKind::RespondInConversation => vec![conversation],
            InterventionKind::RespondPrivately => vec![message.sender_id.clone()],
            InterventionKind::ProactiveAdvice => self
                .store
                .get(&message.conversation_id)
                .await
                .and_then(|ctx| ctx.relationship_profile)
                .map(|p| p.participants.into_iter().collect::<Vec<_>>())
                .filter(|p| !p.is_empty())
                .unwrap_or_else(|| vec![conversation]),
        }
    }

    /// When the bot last intervened in a conversation.
    pub async fn last_intervention(&self, conversation_id: &ConversationId) -> Option<DateTime<Utc>> {
        self.last_intervention.lock().await.get(conversation_id).copied()
    }
}

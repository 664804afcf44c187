//! Top-level message handling.
//!
//! For each inbound message: handle commands, record it into context, ask the
//! intervention engine for a decision, build one prompt per recipient, run
//! the completion and record the reply. Messages for one conversation are
//! handled one at a time.

pub mod prompts;

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::commands::CommandHandler;
use crate::config::LovebotConfig;
use crate::context::ContextStore;
use crate::intervention::{
    InterventionDecision, InterventionEngine, InterventionKind, REASON_NO_CONVERSATION,
};
use crate::lexicon::Lexicon;
use crate::relevance::RelevanceScorer;
use crate::traits::{GenerationOptions, Llm};
use crate::types::{ConversationId, IncomingMessage, OutboundMessage, PromptPair};

/// One completion to run: who receives it and with which prompt.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResponseUnit {
    pub recipient: String,
    pub kind: InterventionKind,
    pub prompt: PromptPair,
}

/// Result of handling one message.
#[derive(Debug, Clone, Default, Serialize)]
pub struct HandleOutcome {
    /// Texts for the transport to send.
    pub outbound: Vec<OutboundMessage>,
    /// The intervention decision, when one was made.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decision: Option<InterventionDecision>,
    /// Why the message bypassed the decision path.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skipped: Option<String>,
}

impl HandleOutcome {
    fn skipped(reason: impl Into<String>) -> Self {
        Self {
            skipped: Some(reason.into()),
            ..Default::default()
        }
    }
}

pub struct AdvisoryOrchestrator {
    config: LovebotConfig,
    store: Arc<ContextStore>,
    engine: InterventionEngine,
    commands: CommandHandler,
    llm: Arc<dyn Llm>,
    flow_locks: Mutex<HashMap<ConversationId, Arc<Mutex<()>>>>,
}

impl AdvisoryOrchestrator {
    pub fn new(
        config: LovebotConfig,
        lexicon: Arc<Lexicon>,
        store: Arc<ContextStore>,
        llm: Arc<dyn Llm>,
    ) -> Self {
        let scorer = RelevanceScorer::new(lexicon, config.relevance.clone());
        let engine = InterventionEngine::new(scorer, config.intervention.clone(), store.clone());
        let commands = CommandHandler::new(store.clone(), config.command_prefix.clone());
        Self {
            config,
            store,
            engine,
            commands,
            llm,
            flow_locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn store(&self) -> &Arc<ContextStore> {
        &self.store
    }

    pub fn engine(&self) -> &InterventionEngine {
        &self.engine
    }

    pub fn model_name(&self) -> &str {
        self.llm.model_name()
    }

    pub async fn handle(&self, message: &IncomingMessage) -> HandleOutcome {
        self.handle_at(message, Utc::now()).await
    }

    pub async fn handle_at(&self, message: &IncomingMessage, now: DateTime<Utc>) -> HandleOutcome {
        if !message.has_text() {
            return HandleOutcome::skipped("empty text");
        }
        if message.is_from_self {
            return HandleOutcome::skipped("message from self");
        }
        let id = &message.conversation_id;
        if id.is_empty() {
            return HandleOutcome {
                decision: Some(InterventionDecision::none(REASON_NO_CONVERSATION)),
                ..Default::default()
            };
        }

        let flow = self.flow_lock(id).await;
        let _guard = flow.lock().await;

        if let Some(command) = self.commands.parse(&message.text) {
            debug!(conversation_id = %id, ?command, "Handling command");
            let reply = match self.commands.execute(message, command).await {
                Ok(reply) => reply,
                Err(e) => {
                    warn!(conversation_id = %id, error = %e, "Command failed");
                    self.config.fallback_response.clone()
                }
            };
            self.store.record_bot_response_at(id, &reply, now).await;
            return HandleOutcome {
                outbound: vec![OutboundMessage::new(id.as_str(), reply)],
                decision: None,
                skipped: Some("command".to_string()),
            };
        }

        self.store.record_incoming_at(message, now).await;

        if self.store.is_paused(id).await {
            return HandleOutcome::skipped("conversation paused");
        }

        let decision = self.engine.decide_at(message, now).await;
        if !decision.should_intervene {
            return HandleOutcome {
                decision: Some(decision),
                ..Default::default()
            };
        }

        let units = self.plan(message, &decision).await;
        let mut outbound = Vec::with_capacity(units.len());
        for unit in units {
            let text = self.complete(&unit).await;
            self.store.record_bot_response_at(id, &text, now).await;
            outbound.push(OutboundMessage::new(unit.recipient, text));
        }

        info!(
            conversation_id = %id,
            kind = %decision.kind,
            responses = outbound.len(),
            "Message handled"
        );
        HandleOutcome {
            outbound,
            decision: Some(decision),
            skipped: None,
        }
    }

    /// One response unit per recipient of a positive decision.
    pub async fn plan(
        &self,
        message: &IncomingMessage,
        decision: &InterventionDecision,
    ) -> Vec<ResponseUnit> {
        if !decision.should_intervene {
            return Vec::new();
        }
        let rendered = self
            .store
            .render_for_completion(&message.conversation_id)
            .await;
        let prompt = prompts::build_prompt(
            decision.kind,
            message,
            &rendered,
            &self.config.relevance.bot_name,
        );
        decision
            .recipients
            .iter()
            .map(|recipient| ResponseUnit {
                recipient: recipient.clone(),
                kind: decision.kind,
                prompt: prompt.clone(),
            })
            .collect()
    }

    /// Run one completion. Failures and empty replies become the fallback
    /// response.
    async fn complete(&self, unit: &ResponseUnit) -> String {
        let options = GenerationOptions {
            temperature: Some(self.config.llm.config.temperature),
            max_tokens: Some(self.config.llm.config.max_tokens),
        };
        match self.llm.generate(&unit.prompt.to_messages(), Some(options)).await {
            Ok(response) => {
                let text = response.content_or_empty().trim();
                if text.is_empty() {
                    warn!(recipient = %unit.recipient, "Empty completion, using fallback");
                    self.config.fallback_response.clone()
                } else {
                    text.to_string()
                }
            }
            Err(e) => {
                warn!(
                    recipient = %unit.recipient,
                    model = self.llm.model_name(),
                    error = %e,
                    "Completion failed, using fallback"
                );
                self.config.fallback_response.clone()
            }
        }
    }

    async fn flow_lock(&self, id: &ConversationId) -> Arc<Mutex<()>> {
        self.flow_locks
            .lock()
            .await
            .entry(id.clone())
            .or_default()
            .clone()
    }
}

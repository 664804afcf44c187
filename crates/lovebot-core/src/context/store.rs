//! The in-memory conversation table and its durable persistence.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::config::{ContextConfig, LovebotConfig};
use crate::error::LovebotResult;
use crate::types::{ConversationId, IncomingMessage};

use super::persistence::{storage_key, ContextPersistence};
use super::profile;
use super::render::render_context;
use super::types::{ContextPatch, ConversationContext, MessageEntry};

struct Inner {
    contexts: HashMap<ConversationId, ConversationContext>,
    last_save: DateTime<Utc>,
}

/// Per-conversation context, guarded by a single async lock shared by the
/// message path and the periodic saver.
pub struct ContextStore {
    inner: Mutex<Inner>,
    persistence: Arc<dyn ContextPersistence>,
    config: ContextConfig,
    bot_name: String,
}

impl ContextStore {
    /// Create an empty store. Use [`ContextStore::open`] to load persisted
    /// conversations.
    pub fn new(persistence: Arc<dyn ContextPersistence>, config: &LovebotConfig) -> Self {
        Self {
            inner: Mutex::new(Inner {
                contexts: HashMap::new(),
                last_save: Utc::now(),
            }),
            persistence,
            config: config.context.clone(),
            bot_name: config.relevance.bot_name.clone(),
        }
    }

    /// Create a store and load every persisted conversation.
    ///
    /// Records that fail to load are logged and skipped; those conversations
    /// start empty.
    pub async fn open(persistence: Arc<dyn ContextPersistence>, config: &LovebotConfig) -> Self {
        let store = Self::new(persistence, config);
        let loaded = store.load().await;
        info!(
            backend = store.persistence.name(),
            conversations = loaded,
            "Context store opened"
        );
        store
    }

    /// Load persisted conversations into memory, returning how many loaded.
    pub async fn load(&self) -> usize {
        let persistence = self.persistence.clone();
        let records = match tokio::task::spawn_blocking(move || persistence.load_all()).await {
            Ok(Ok(records)) => records,
            Ok(Err(e)) => {
                error!(error = %e, "Failed to read persisted contexts");
                return 0;
            }
            Err(e) => {
                error!(error = %e, "Context load task failed");
                return 0;
            }
        };

        let mut inner = self.inner.lock().await;
        let mut loaded = 0;
        for (key, result) in records {
            match result {
                Ok(mut ctx) if !ctx.conversation_id.is_empty() => {
                    while ctx.messages.len() > self.config.max_messages {
                        ctx.messages.pop_front();
                    }
                    inner.contexts.insert(ctx.conversation_id.clone(), ctx);
                    loaded += 1;
                }
                Ok(_) => warn!(key = %key, "Skipping persisted context without conversation id"),
                Err(e) => warn!(key = %key, error = %e, "Skipping unloadable context"),
            }
        }
        loaded
    }

    pub fn config(&self) -> &ContextConfig {
        &self.config
    }

    /// Record an inbound message.
    pub async fn record_incoming(&self, message: &IncomingMessage) {
        self.record_incoming_at(message, Utc::now()).await
    }

    /// Record an inbound message as of `now`.
    ///
    /// Evicts beyond capacity, refreshes the relationship profile when due
    /// and runs a durable save when the save interval has elapsed.
    pub async fn record_incoming_at(&self, message: &IncomingMessage, now: DateTime<Utc>) {
        let save_due = {
            let mut inner = self.inner.lock().await;
            let ctx = inner
                .contexts
                .entry(message.conversation_id.clone())
                .or_insert_with(|| ConversationContext::new(message.conversation_id.clone(), now));

            ctx.push_message(
                MessageEntry {
                    conversation_id: message.conversation_id.clone(),
                    sender: message.sender_id.clone(),
                    sender_name: message.sender_display_name.clone(),
                    text: message.text.clone(),
                    timestamp: message.timestamp,
                    is_from_bot: false,
                },
                self.config.max_messages,
            );
            ctx.touch(now);

            if profile::refresh_due(ctx, now, self.config.profile_refresh_interval()) {
                profile::refresh(ctx, message.is_private, self.config.bot_id.as_deref(), now);
                debug!(conversation_id = %message.conversation_id, "Relationship profile refreshed");
            }

            if now - inner.last_save >= self.config.save_interval() {
                inner.last_save = now;
                true
            } else {
                false
            }
        };

        if save_due {
            self.save_all().await;
        }
    }

    /// Record a bot-authored message. The relationship profile is untouched.
    pub async fn record_bot_response(&self, conversation_id: &ConversationId, text: &str) {
        self.record_bot_response_at(conversation_id, text, Utc::now())
            .await
    }

    pub async fn record_bot_response_at(
        &self,
        conversation_id: &ConversationId,
        text: &str,
        now: DateTime<Utc>,
    ) {
        let mut inner = self.inner.lock().await;
        let ctx = inner
            .contexts
            .entry(conversation_id.clone())
            .or_insert_with(|| ConversationContext::new(conversation_id.clone(), now));

        ctx.push_message(
            MessageEntry {
                conversation_id: conversation_id.clone(),
                sender: self
                    .config
                    .bot_id
                    .clone()
                    .unwrap_or_else(|| self.bot_name.clone()),
                sender_name: self.bot_name.clone(),
                text: text.to_string(),
                timestamp: now,
                is_from_bot: true,
            },
            self.config.max_messages,
        );
        ctx.touch(now);
    }

    /// A snapshot of one conversation.
    pub async fn get(&self, conversation_id: &ConversationId) -> Option<ConversationContext> {
        self.inner.lock().await.contexts.get(conversation_id).cloned()
    }

    /// Ids of every known conversation, sorted.
    pub async fn conversation_ids(&self) -> Vec<ConversationId> {
        let mut ids: Vec<ConversationId> =
            self.inner.lock().await.contexts.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub async fn is_paused(&self, conversation_id: &ConversationId) -> bool {
        self.inner
            .lock()
            .await
            .contexts
            .get(conversation_id)
            .map(|c| c.paused)
            .unwrap_or(false)
    }

    /// Render one conversation for the completion prompt.
    pub async fn render_for_completion(&self, conversation_id: &ConversationId) -> String {
        let inner = self.inner.lock().await;
        render_context(
            inner.contexts.get(conversation_id),
            self.config.imported_sample_lines,
        )
    }

    /// Shallow-merge `patch` into a conversation and save it immediately.
    pub async fn merge(
        &self,
        conversation_id: &ConversationId,
        patch: ContextPatch,
    ) -> LovebotResult<()> {
        self.merge_at(conversation_id, patch, Utc::now()).await
    }

    pub async fn merge_at(
        &self,
        conversation_id: &ConversationId,
        patch: ContextPatch,
        now: DateTime<Utc>,
    ) -> LovebotResult<()> {
        let snapshot = {
            let mut inner = self.inner.lock().await;
            let ctx = inner
                .contexts
                .entry(conversation_id.clone())
                .or_insert_with(|| ConversationContext::new(conversation_id.clone(), now));
            ctx.apply(patch);
            ctx.touch(now);
            ctx.clone()
        };

        let key = storage_key(conversation_id);
        let persistence = self.persistence.clone();
        tokio::task::spawn_blocking(move || persistence.save(&key, &snapshot))
            .await
            .map_err(|e| crate::error::LovebotError::internal(e.to_string()))?
    }

    /// Durably write every conversation holding at least one message.
    ///
    /// Failures are logged per conversation and retried on the next call.
    /// Returns the number of conversations written.
    pub async fn save_all(&self) -> usize {
        let snapshot: Vec<(String, ConversationContext)> = {
            let inner = self.inner.lock().await;
            inner
                .contexts
                .values()
                .filter(|c| !c.messages.is_empty())
                .map(|c| (storage_key(&c.conversation_id), c.clone()))
                .collect()
        };
        if snapshot.is_empty() {
            return 0;
        }

        let total = snapshot.len();
        let persistence = self.persistence.clone();
        let saved = tokio::task::spawn_blocking(move || {
            let mut saved = 0;
            for (key, ctx) in &snapshot {
                match persistence.save(key, ctx) {
                    Ok(()) => saved += 1,
                    Err(e) => warn!(
                        conversation_id = %ctx.conversation_id,
                        error = %e,
                        "Failed to save context"
                    ),
                }
            }
            saved
        })
        .await;

        match saved {
            Ok(saved) => {
                debug!(saved, total, "Contexts saved");
                saved
            }
            Err(e) => {
                error!(error = %e, "Context save task failed");
                0
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::persistence::MockContextPersistence;
    use crate::context::sqlite::SqliteContextPersistence;
    use crate::error::LovebotError;
    use chrono::{Duration, TimeZone};

    fn config() -> LovebotConfig {
        LovebotConfig::builder().bot_id("bot@c.us").build()
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
    }

    fn group_msg(sender: &str, text: &str) -> IncomingMessage {
        IncomingMessage::new("100@g.us", format!("{}@c.us", sender), sender, text)
    }

    fn sqlite_store() -> ContextStore {
        let persistence = Arc::new(SqliteContextPersistence::in_memory().unwrap());
        ContextStore::new(persistence, &config())
    }

    #[tokio::test]
    async fn test_capacity_keeps_most_recent() {
        let store = sqlite_store();
        for i in 0..30 {
            store
                .record_incoming_at(&group_msg("ana", &format!("m{}", i)), t0())
                .await;
        }
        let ctx = store.get(&"100@g.us".into()).await.unwrap();
        assert_eq!(ctx.messages.len(), 20);
        let texts: Vec<&str> = ctx.messages.iter().map(|m| m.text.as_str()).collect();
        assert_eq!(texts.first(), Some(&"m10"));
        assert_eq!(texts.last(), Some(&"m29"));
    }

    #[tokio::test]
    async fn test_last_updated_monotonic() {
        let store = sqlite_store();
        let id: ConversationId = "100@g.us".into();
        store.record_incoming_at(&group_msg("ana", "later"), t0()).await;
        store
            .record_incoming_at(&group_msg("ana", "clock skew"), t0() - Duration::minutes(5))
            .await;
        assert_eq!(store.get(&id).await.unwrap().last_updated, t0());
    }

    #[tokio::test]
    async fn test_bot_response_not_a_participant() {
        let store = sqlite_store();
        let id: ConversationId = "100@g.us".into();
        store.record_incoming_at(&group_msg("ana", "hi"), t0()).await;
        store.record_bot_response_at(&id, "hello!", t0()).await;
        store
            .record_incoming_at(&group_msg("ben", "hey"), t0() + Duration::hours(2))
            .await;

        let ctx = store.get(&id).await.unwrap();
        let profile = ctx.relationship_profile.unwrap();
        assert_eq!(profile.participants.len(), 2);
        assert!(!profile.participants.contains("bot@c.us"));
        assert!(ctx.messages[1].is_from_bot);
        assert_eq!(ctx.messages[1].sender_name, "LoveBot");
    }

    #[tokio::test]
    async fn test_profile_refresh_rate_limited() {
        let store = sqlite_store();
        let id: ConversationId = "100@g.us".into();
        store.record_incoming_at(&group_msg("ana", "hi"), t0()).await;
        store
            .record_incoming_at(&group_msg("ben", "hi"), t0() + Duration::minutes(10))
            .await;
        let profile = store.get(&id).await.unwrap().relationship_profile.unwrap();
        assert_eq!(profile.participants.len(), 1);
        assert_eq!(profile.last_updated, t0());
    }

    #[tokio::test]
    async fn test_save_all_and_reopen_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("contexts.db");
        let id: ConversationId = "100@g.us".into();

        let store = ContextStore::new(
            Arc::new(SqliteContextPersistence::new(&path).unwrap()),
            &config(),
        );
        store.record_incoming_at(&group_msg("ana", "one"), t0()).await;
        store.record_incoming_at(&group_msg("ben", "two"), t0()).await;
        store
            .merge_at(&"empty@g.us".into(), ContextPatch::summary("no messages"), t0())
            .await
            .unwrap();
        assert_eq!(store.save_all().await, 1);
        let before = store.get(&id).await.unwrap();

        let reopened = ContextStore::open(
            Arc::new(SqliteContextPersistence::new(&path).unwrap()),
            &config(),
        )
        .await;
        assert_eq!(reopened.get(&id).await.unwrap(), before);
        assert_eq!(reopened.conversation_ids().await.len(), 2);
    }

    #[tokio::test]
    async fn test_merge_saves_immediately() {
        let mut mock = MockContextPersistence::new();
        mock.expect_save()
            .withf(|key, ctx| key == storage_key(&"100@g.us".into()) && ctx.paused)
            .times(1)
            .returning(|_, _| Ok(()));
        mock.expect_name().return_const("mock");

        let store = ContextStore::new(Arc::new(mock), &config());
        store
            .merge(&"100@g.us".into(), ContextPatch::paused(true))
            .await
            .unwrap();
        assert!(store.is_paused(&"100@g.us".into()).await);
    }

    #[tokio::test]
    async fn test_failed_save_is_not_fatal() {
        let mut mock = MockContextPersistence::new();
        mock.expect_save()
            .times(2)
            .returning(|key, _| Err(LovebotError::storage_save(key, "disk full")));

        let store = ContextStore::new(Arc::new(mock), &config());
        store.record_incoming_at(&group_msg("ana", "hi"), t0()).await;
        assert_eq!(store.save_all().await, 0);
        // Retried on the next tick.
        assert_eq!(store.save_all().await, 0);
        assert_eq!(store.get(&"100@g.us".into()).await.unwrap().messages.len(), 1);
    }

    #[tokio::test]
    async fn test_interval_save_triggered_by_incoming() {
        let mut mock = MockContextPersistence::new();
        mock.expect_save().times(1).returning(|_, _| Ok(()));

        let store = ContextStore::new(Arc::new(mock), &config());
        let later = Utc::now() + Duration::minutes(6);
        store.record_incoming_at(&group_msg("ana", "hi"), later).await;
        // Within the interval of the previous save: no second write.
        store
            .record_incoming_at(&group_msg("ana", "again"), later + Duration::minutes(1))
            .await;
    }

    #[tokio::test]
    async fn test_unloadable_records_skipped() {
        let mut mock = MockContextPersistence::new();
        mock.expect_load_all().returning(|| {
            Ok(vec![
                (
                    "bad".to_string(),
                    Err(LovebotError::storage_load("bad", "corrupt")),
                ),
                (
                    "good_c_us".to_string(),
                    Ok(ConversationContext::new("good@c.us".into(), Utc::now())),
                ),
            ])
        });
        mock.expect_name().return_const("mock");

        let store = ContextStore::open(Arc::new(mock), &config()).await;
        assert_eq!(store.conversation_ids().await, vec![ConversationId::new("good@c.us")]);
    }

    #[tokio::test]
    async fn test_render_for_completion() {
        let store = sqlite_store();
        let id: ConversationId = "100@g.us".into();
        assert_eq!(
            store.render_for_completion(&id).await,
            super::super::render::NO_HISTORY
        );
        store.record_incoming_at(&group_msg("ana", "we fought"), t0()).await;
        assert!(store
            .render_for_completion(&id)
            .await
            .ends_with("Recent messages:\nana: we fought"));
    }
}

//! Conversation context records.
//!
//! These are the persisted shapes: field names serialize in camelCase and a
//! persisted context carries its own `conversationId` so a sanitized storage
//! key can always be mapped back.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::ConversationId;

/// One message in a conversation's retained history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageEntry {
    pub conversation_id: ConversationId,
    pub sender: String,
    pub sender_name: String,
    pub text: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub is_from_bot: bool,
}

/// Inferred shape of a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RelationshipType {
    #[serde(rename = "couple-with-bot")]
    CoupleWithBot,
    #[serde(rename = "group-with-bot")]
    GroupWithBot,
    #[serde(rename = "one-on-one")]
    OneOnOne,
}

impl RelationshipType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CoupleWithBot => "couple-with-bot",
            Self::GroupWithBot => "group-with-bot",
            Self::OneOnOne => "one-on-one",
        }
    }
}

/// Participants and relationship structure inferred from the message window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelationshipProfile {
    /// Distinct non-bot sender ids.
    pub participants: BTreeSet<String>,
    /// Sender id to last-seen display name.
    pub participant_names: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relationship_type: Option<RelationshipType>,
    #[serde(default)]
    pub known_issues: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub communication_style: Option<String>,
    pub last_updated: DateTime<Utc>,
}

impl RelationshipProfile {
    /// Display names of the participants, falling back to ids.
    pub fn participant_display_names(&self) -> Vec<&str> {
        self.participants
            .iter()
            .map(|id| {
                self.participant_names
                    .get(id)
                    .map(String::as_str)
                    .unwrap_or(id.as_str())
            })
            .collect()
    }
}

/// Everything the bot remembers about one conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationContext {
    pub conversation_id: ConversationId,
    /// Oldest first; bounded by the store's capacity.
    pub messages: VecDeque<MessageEntry>,
    pub last_updated: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relationship_profile: Option<RelationshipProfile>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub imported_chat_history: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_import_timestamp: Option<DateTime<Utc>>,
    /// Interventions are suspended while set.
    #[serde(default)]
    pub paused: bool,
}

impl ConversationContext {
    pub fn new(conversation_id: ConversationId, now: DateTime<Utc>) -> Self {
        Self {
            conversation_id,
            messages: VecDeque::new(),
            last_updated: now,
            summary: None,
            relationship_profile: None,
            imported_chat_history: None,
            last_import_timestamp: None,
            paused: false,
        }
    }

    /// Append an entry, evicting the oldest ones beyond `capacity`.
    pub fn push_message(&mut self, entry: MessageEntry, capacity: usize) {
        self.messages.push_back(entry);
        while self.messages.len() > capacity {
            self.messages.pop_front();
        }
    }

    /// Advance `last_updated`; it never moves backwards.
    pub fn touch(&mut self, now: DateTime<Utc>) {
        if now > self.last_updated {
            self.last_updated = now;
        }
    }

    pub fn apply(&mut self, patch: ContextPatch) {
        if let Some(summary) = patch.summary {
            self.summary = Some(summary);
        }
        if let Some(profile) = patch.relationship_profile {
            self.relationship_profile = Some(profile);
        }
        if let Some(history) = patch.imported_chat_history {
            self.imported_chat_history = Some(history);
        }
        if let Some(ts) = patch.last_import_timestamp {
            self.last_import_timestamp = Some(ts);
        }
        if let Some(paused) = patch.paused {
            self.paused = paused;
        }
    }
}

/// Partial update for [`ConversationContext`]; `None` leaves a field alone.
#[derive(Debug, Clone, Default)]
pub struct ContextPatch {
    pub summary: Option<String>,
    pub relationship_profile: Option<RelationshipProfile>,
    pub imported_chat_history: Option<String>,
    pub last_import_timestamp: Option<DateTime<Utc>>,
    pub paused: Option<bool>,
}

impl ContextPatch {
    pub fn imported_history(history: impl Into<String>, imported_at: DateTime<Utc>) -> Self {
        Self {
            imported_chat_history: Some(history.into()),
            last_import_timestamp: Some(imported_at),
            ..Default::default()
        }
    }

    pub fn paused(paused: bool) -> Self {
        Self {
            paused: Some(paused),
            ..Default::default()
        }
    }

    pub fn summary(summary: impl Into<String>) -> Self {
        Self {
            summary: Some(summary.into()),
            ..Default::default()
        }
    }
}

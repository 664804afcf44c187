//! Conversation identifiers and the normalized transport message records.

use std::borrow::Borrow;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Address suffix the chat network uses for group conversations.
pub const GROUP_ID_SUFFIX: &str = "@g.us";

/// Opaque, stable identifier of a chat (group or one-to-one).
///
/// Equality is exact string match.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConversationId(String);

impl ConversationId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for ConversationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ConversationId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for ConversationId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl AsRef<str> for ConversationId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for ConversationId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Whether a conversation id addresses a one-to-one chat.
///
/// Group chats carry the [`GROUP_ID_SUFFIX`]; everything else is private.
pub fn is_private_conversation_id(id: &str) -> bool {
    !id.ends_with(GROUP_ID_SUFFIX)
}

/// The message a reply quotes, as far as the transport could resolve it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuotedMessage {
    pub text: String,
    #[serde(default)]
    pub is_from_bot: bool,
}

/// A normalized inbound chat message handed over by the transport.
///
/// `text` may be empty when the message had no extractable text; such
/// messages are not processed further. When `is_private` is absent from the
/// serialized form it is derived from the conversation id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "IncomingMessageRecord")]
pub struct IncomingMessage {
    pub conversation_id: ConversationId,
    pub sender_id: String,
    pub sender_display_name: String,
    pub text: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub is_from_self: bool,
    pub is_private: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quoted: Option<QuotedMessage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
}

#[derive(Deserialize)]
struct IncomingMessageRecord {
    conversation_id: ConversationId,
    sender_id: String,
    sender_display_name: String,
    text: String,
    timestamp: DateTime<Utc>,
    #[serde(default)]
    is_from_self: bool,
    #[serde(default)]
    is_private: Option<bool>,
    #[serde(default)]
    quoted: Option<QuotedMessage>,
    #[serde(default)]
    message_id: Option<String>,
}

impl From<IncomingMessageRecord> for IncomingMessage {
    fn from(r: IncomingMessageRecord) -> Self {
        let is_private = r
            .is_private
            .unwrap_or_else(|| is_private_conversation_id(r.conversation_id.as_str()));
        Self {
            conversation_id: r.conversation_id,
            sender_id: r.sender_id,
            sender_display_name: r.sender_display_name,
            text: r.text,
            timestamp: r.timestamp,
            is_from_self: r.is_from_self,
            is_private,
            quoted: r.quoted,
            message_id: r.message_id,
        }
    }
}

impl IncomingMessage {
    /// Create a message stamped with the current time.
    ///
    /// Privacy is derived from the conversation id suffix; use
    /// [`IncomingMessage::with_private`] when the transport knows better.
    pub fn new(
        conversation_id: impl Into<ConversationId>,
        sender_id: impl Into<String>,
        sender_display_name: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        let conversation_id = conversation_id.into();
        let is_private = is_private_conversation_id(conversation_id.as_str());
        Self {
            conversation_id,
            sender_id: sender_id.into(),
            sender_display_name: sender_display_name.into(),
            text: text.into(),
            timestamp: Utc::now(),
            is_from_self: false,
            is_private,
            quoted: None,
            message_id: None,
        }
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn with_private(mut self, is_private: bool) -> Self {
        self.is_private = is_private;
        self
    }

    pub fn with_quoted(mut self, text: impl Into<String>, is_from_bot: bool) -> Self {
        self.quoted = Some(QuotedMessage {
            text: text.into(),
            is_from_bot,
        });
        self
    }

    pub fn with_message_id(mut self, id: impl Into<String>) -> Self {
        self.message_id = Some(id.into());
        self
    }

    pub fn from_self(mut self) -> Self {
        self.is_from_self = true;
        self
    }

    /// Whether the message carries any text worth processing.
    pub fn has_text(&self) -> bool {
        !self.text.trim().is_empty()
    }
}

/// A "send this text to this recipient" command for the transport.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutboundMessage {
    pub recipient: String,
    pub text: String,
}

impl OutboundMessage {
    pub fn new(recipient: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            recipient: recipient.into(),
            text: text.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_privacy_from_suffix() {
        assert!(is_private_conversation_id("15551234567@c.us"));
        assert!(!is_private_conversation_id("120363025@g.us"));

        let group = IncomingMessage::new("120363025@g.us", "a@c.us", "Ana", "hola");
        assert!(!group.is_private);
        let direct = IncomingMessage::new("a@c.us", "a@c.us", "Ana", "hola");
        assert!(direct.is_private);
    }

    #[test]
    fn test_has_text() {
        let msg = IncomingMessage::new("a@c.us", "a@c.us", "Ana", "   ");
        assert!(!msg.has_text());
    }

    #[test]
    fn test_conversation_id_borrows_as_str() {
        let mut map = HashMap::new();
        map.insert(ConversationId::new("x@g.us"), 1);
        assert_eq!(map.get("x@g.us"), Some(&1));
        assert!(ConversationId::new("  ").is_empty());
    }

    #[test]
    fn test_incoming_message_json() {
        let json = r#"{
            "conversation_id": "1@g.us",
            "sender_id": "a@c.us",
            "sender_display_name": "Ana",
            "text": "hi",
            "timestamp": "2024-01-01T10:00:00Z",
            "is_private": false
        }"#;
        let msg: IncomingMessage = serde_json::from_str(json).unwrap();
        assert_eq!(msg.conversation_id.as_str(), "1@g.us");
        assert!(!msg.is_from_self);
        assert!(msg.quoted.is_none());
    }

    #[test]
    fn test_missing_is_private_follows_id() {
        let record = |id: &str| {
            format!(
                r#"{{"conversation_id": "{}", "sender_id": "a@c.us",
                    "sender_display_name": "Ana", "text": "hi",
                    "timestamp": "2024-01-01T10:00:00Z"}}"#,
                id
            )
        };
        let group: IncomingMessage = serde_json::from_str(&record("1@g.us")).unwrap();
        assert!(!group.is_private);
        let direct: IncomingMessage = serde_json::from_str(&record("ana@c.us")).unwrap();
        assert!(direct.is_private);

        // An explicit flag wins over the suffix.
        let json = r#"{"conversation_id": "ana@c.us", "sender_id": "a@c.us",
            "sender_display_name": "Ana", "text": "hi",
            "timestamp": "2024-01-01T10:00:00Z", "is_private": false}"#;
        let explicit: IncomingMessage = serde_json::from_str(json).unwrap();
        assert!(!explicit.is_private);
    }
}

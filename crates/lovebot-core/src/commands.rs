//! In-chat commands, e.g. `#lovebot pause`.
//!
//! Commands are answered directly and never go through relevance scoring.

use std::sync::Arc;

use tracing::info;

use crate::context::{ContextPatch, ContextStore};
use crate::error::LovebotResult;
use crate::types::IncomingMessage;

/// A parsed command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    Pause,
    Resume,
    Status,
    Feedback(String),
    Unknown(String),
}

/// Parse `text` as a command if it starts with `prefix` (case-insensitive)
/// followed by whitespace or nothing.
pub fn parse_command(text: &str, prefix: &str) -> Option<Command> {
    let text = text.trim();
    let head = text.get(..prefix.len())?;
    if !head.eq_ignore_ascii_case(prefix) {
        return None;
    }
    let rest = &text[prefix.len()..];
    if !rest.is_empty() && !rest.starts_with(char::is_whitespace) {
        return None;
    }

    let rest = rest.trim();
    let (name, args) = match rest.split_once(char::is_whitespace) {
        Some((name, args)) => (name, args.trim()),
        None => (rest, ""),
    };

    Some(match name.to_lowercase().as_str() {
        "" | "help" => Command::Help,
        "pause" => Command::Pause,
        "resume" => Command::Resume,
        "status" => Command::Status,
        "feedback" => Command::Feedback(args.to_string()),
        other => Command::Unknown(other.to_string()),
    })
}

/// Executes commands against the context store.
pub struct CommandHandler {
    store: Arc<ContextStore>,
    prefix: String,
}

impl CommandHandler {
    pub fn new(store: Arc<ContextStore>, prefix: impl Into<String>) -> Self {
        Self {
            store,
            prefix: prefix.into(),
        }
    }

    pub fn parse(&self, text: &str) -> Option<Command> {
        parse_command(text, &self.prefix)
    }

    pub fn help_text(&self) -> String {
        let p = &self.prefix;
        format!(
            "Available commands:\n\
             {p} help - show this message\n\
             {p} pause - stop giving advice in this chat\n\
             {p} resume - start giving advice again\n\
             {p} status - show what I know about this chat\n\
             {p} feedback <message> - tell us how I'm doing"
        )
    }

    /// Run `command` for `message` and return the reply text.
    pub async fn execute(&self, message: &IncomingMessage, command: Command) -> LovebotResult<String> {
        let id = &message.conversation_id;
        match command {
            Command::Help => Ok(self.help_text()),
            Command::Unknown(name) => Ok(format!(
                "I don't know the command '{}'.\n\n{}",
                name,
                self.help_text()
            )),
            Command::Pause => {
                self.store.merge(id, ContextPatch::paused(true)).await?;
                info!(conversation_id = %id, "Conversation paused");
                Ok(format!(
                    "Paused. I'll stay quiet here until someone sends '{} resume'.",
                    self.prefix
                ))
            }
            Command::Resume => {
                self.store.merge(id, ContextPatch::paused(false)).await?;
                info!(conversation_id = %id, "Conversation resumed");
                Ok("Resumed. I'm here if you need me.".to_string())
            }
            Command::Status => {
                let ctx = self.store.get(id).await;
                let paused = ctx.as_ref().map(|c| c.paused).unwrap_or(false);
                let messages = ctx.as_ref().map(|c| c.messages.len()).unwrap_or(0);
                let profile = ctx.as_ref().and_then(|c| c.relationship_profile.as_ref());

                let participants = profile
                    .map(|p| p.participant_display_names().join(", "))
                    .filter(|s| !s.is_empty())
                    .unwrap_or_else(|| "none yet".to_string());
                let relationship = profile
                    .and_then(|p| p.relationship_type)
                    .map(|t| t.as_str())
                    .unwrap_or("unknown");

                Ok(format!(
                    "Status: {}\nParticipants: {}\nRelationship: {}\nMessages remembered: {}",
                    if paused { "paused" } else { "active" },
                    participants,
                    relationship,
                    messages
                ))
            }
            Command::Feedback(text) if text.is_empty() => {
                Ok(format!("Usage: {} feedback <your message>", self.prefix))
            }
            Command::Feedback(text) => {
                info!(
                    conversation_id = %id,
                    sender = %message.sender_id,
                    feedback = %text,
                    "Feedback received"
                );
                Ok("Thanks for the feedback!".to_string())
            }
        }
    }
}

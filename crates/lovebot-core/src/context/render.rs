//! Render a conversation context into the text block handed to the
//! completion provider.

use super::types::{ConversationContext, RelationshipProfile};

/// Returned when a conversation has nothing to render.
pub const NO_HISTORY: &str = "No conversation history available.";

/// Render `ctx` as profile, imported history sample, summary and recent
/// messages, in that order. Sections that are absent are skipped.
pub fn render_context(ctx: Option<&ConversationContext>, imported_sample_lines: usize) -> String {
    let ctx = match ctx {
        Some(ctx) if !ctx.messages.is_empty() => ctx,
        _ => return NO_HISTORY.to_string(),
    };

    let mut sections: Vec<String> = Vec::new();

    if let Some(profile) = &ctx.relationship_profile {
        sections.push(render_profile(profile));
    }

    if let Some(history) = ctx.imported_chat_history.as_deref() {
        let lines: Vec<&str> = history.lines().filter(|l| !l.trim().is_empty()).collect();
        if !lines.is_empty() {
            let start = lines.len().saturating_sub(imported_sample_lines);
            sections.push(format!(
                "Imported chat history (most recent):\n{}",
                lines[start..].join("\n")
            ));
        }
    }

    if let Some(summary) = ctx.summary.as_deref().filter(|s| !s.trim().is_empty()) {
        sections.push(format!("Summary:\n{}", summary));
    }

    let recent: Vec<String> = ctx
        .messages
        .iter()
        .map(|m| format!("{}: {}", m.sender_name, m.text))
        .collect();
    sections.push(format!("Recent messages:\n{}", recent.join("\n")));

    sections.join("\n\n")
}

fn render_profile(profile: &RelationshipProfile) -> String {
    let mut out = String::from("Relationship profile:");
    if let Some(kind) = profile.relationship_type {
        out.push_str(&format!("\n- Type: {}", kind.as_str()));
    }
    let names = profile.participant_display_names();
    if !names.is_empty() {
        out.push_str(&format!("\n- Participants: {}", names.join(", ")));
    }
    if !profile.known_issues.is_empty() {
        out.push_str(&format!("\n- Known issues: {}", profile.known_issues.join("; ")));
    }
    if let Some(style) = &profile.communication_style {
        out.push_str(&format!("\n- Communication style: {}", style));
    }
    out
}

//! Relationship profile inference.
//!
//! A cheap re-derivation from the retained message window, never an
//! incremental update.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Duration, Utc};

use super::types::{ConversationContext, MessageEntry, RelationshipProfile, RelationshipType};

/// A refresh is due when there is no profile or the current one is older
/// than `interval`.
pub fn refresh_due(ctx: &ConversationContext, now: DateTime<Utc>, interval: Duration) -> bool {
    match &ctx.relationship_profile {
        None => true,
        Some(profile) => now - profile.last_updated > interval,
    }
}

/// Recompute participants and relationship type from `messages`.
///
/// Bot-authored entries and `bot_id` are never participants. Known issues
/// and communication style are carried over from `previous`.
pub fn infer_profile<'a>(
    messages: impl IntoIterator<Item = &'a MessageEntry>,
    is_private: bool,
    bot_id: Option<&str>,
    previous: Option<&RelationshipProfile>,
    now: DateTime<Utc>,
) -> RelationshipProfile {
    let mut participants = BTreeSet::new();
    let mut participant_names = BTreeMap::new();

    for entry in messages {
        if entry.is_from_bot || Some(entry.sender.as_str()) == bot_id {
            continue;
        }
        participants.insert(entry.sender.clone());
        participant_names.insert(entry.sender.clone(), entry.sender_name.clone());
    }

    let relationship_type = if is_private {
        Some(RelationshipType::OneOnOne)
    } else {
        match participants.len() {
            0 | 1 => None,
            2 => Some(RelationshipType::CoupleWithBot),
            _ => Some(RelationshipType::GroupWithBot),
        }
    };

    RelationshipProfile {
        participants,
        participant_names,
        relationship_type,
        known_issues: previous.map(|p| p.known_issues.clone()).unwrap_or_default(),
        communication_style: previous.and_then(|p| p.communication_style.clone()),
        last_updated: now,
    }
}

/// Refresh `ctx`'s profile in place.
pub fn refresh(
    ctx: &mut ConversationContext,
    is_private: bool,
    bot_id: Option<&str>,
    now: DateTime<Utc>,
) {
    let profile = infer_profile(
        ctx.messages.iter(),
        is_private,
        bot_id,
        ctx.relationship_profile.as_ref(),
        now,
    );
    ctx.relationship_profile = Some(profile);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ConversationId;

    fn entry(sender: &str, name: &str, is_from_bot: bool) -> MessageEntry {
        MessageEntry {
            conversation_id: ConversationId::new("1@g.us"),
            sender: sender.to_string(),
            sender_name: name.to_string(),
            text: "hi".to_string(),
            timestamp: Utc::now(),
            is_from_bot,
        }
    }

    #[test]
    fn test_couple_excludes_bot() {
        let messages = vec![
            entry("a@c.us", "Ana", false),
            entry("bot@c.us", "LoveBot", true),
            entry("b@c.us", "Ben", false),
            entry("bot@c.us", "LoveBot", false),
        ];
        let profile = infer_profile(&messages, false, Some("bot@c.us"), None, Utc::now());
        assert_eq!(profile.participants.len(), 2);
        assert!(!profile.participants.contains("bot@c.us"));
        assert_eq!(profile.relationship_type, Some(RelationshipType::CoupleWithBot));
    }

    #[test]
    fn test_relationship_types() {
        let one = vec![entry("a@c.us", "Ana", false)];
        assert_eq!(
            infer_profile(&one, false, None, None, Utc::now()).relationship_type,
            None
        );
        assert_eq!(
            infer_profile(&one, true, None, None, Utc::now()).relationship_type,
            Some(RelationshipType::OneOnOne)
        );

        let three = vec![
            entry("a@c.us", "Ana", false),
            entry("b@c.us", "Ben", false),
            entry("c@c.us", "Cleo", false),
        ];
        assert_eq!(
            infer_profile(&three, false, None, None, Utc::now()).relationship_type,
            Some(RelationshipType::GroupWithBot)
        );
    }

    #[test]
    fn test_last_seen_name_wins() {
        let messages = vec![entry("a@c.us", "Ana", false), entry("a@c.us", "Ana B.", false)];
        let profile = infer_profile(&messages, false, None, None, Utc::now());
        assert_eq!(profile.participant_names["a@c.us"], "Ana B.");
    }

    #[test]
    fn test_refresh_due_after_interval() {
        let now = Utc::now();
        let mut ctx = ConversationContext::new("1@g.us".into(), now);
        assert!(refresh_due(&ctx, now, Duration::hours(1)));

        refresh(&mut ctx, false, None, now);
        assert!(!refresh_due(&ctx, now + Duration::minutes(59), Duration::hours(1)));
        assert!(refresh_due(&ctx, now + Duration::minutes(61), Duration::hours(1)));
    }

    #[test]
    fn test_known_issues_survive_refresh() {
        let previous = RelationshipProfile {
            participants: BTreeSet::new(),
            participant_names: BTreeMap::new(),
            relationship_type: None,
            known_issues: vec!["chores".to_string()],
            communication_style: Some("direct".to_string()),
            last_updated: Utc::now(),
        };
        let messages = vec![entry("a@c.us", "Ana", false)];
        let profile = infer_profile(&messages, false, None, Some(&previous), Utc::now());
        assert_eq!(profile.known_issues, vec!["chores".to_string()]);
        assert_eq!(profile.communication_style.as_deref(), Some("direct"));
    }
}

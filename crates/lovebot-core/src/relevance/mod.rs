//! Multi-language relevance scoring.
//!
//! Every supported language is scored independently against its own lexicon
//! and the best score wins, so no language identification step is needed.
//! Private conversations, the direct-request marker and bot mentions
//! short-circuit the scoring.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, warn};

use crate::config::RelevanceConfig;
use crate::error::{LovebotError, LovebotResult};
use crate::lexicon::{LanguageLexicon, Lexicon};
use crate::types::IncomingMessage;

/// Score given to private messages and marker requests.
pub const DIRECT_SCORE: f64 = 3.0;
/// Score given to mentions of the bot and replies to its advice.
pub const MENTION_SCORE: f64 = 2.0;

const RELATIONSHIP_WEIGHT: f64 = 1.0;
const EMOTIONAL_WEIGHT: f64 = 0.3;
const QUESTION_WEIGHT: f64 = 0.7;
const DIRECT_REQUEST_WEIGHT: f64 = 1.0;
const LONG_MESSAGE_WEIGHT: f64 = 0.2;

/// Why a message was (or was not) judged relevant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RelevanceReason {
    PrivateConversation,
    DirectMarker,
    BotMention,
    ThresholdMet { language: String },
    BelowThreshold,
    ErrorDuringAnalysis,
}

impl RelevanceReason {
    /// Direct requests (marker or bot mention) bypass the intervention
    /// cooldown. A private conversation alone is not one.
    pub fn is_direct_request(&self) -> bool {
        matches!(self, Self::DirectMarker | Self::BotMention)
    }
}

impl fmt::Display for RelevanceReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PrivateConversation => f.write_str("direct message in private conversation"),
            Self::DirectMarker => f.write_str("direct request via marker"),
            Self::BotMention => f.write_str("direct request to the bot"),
            Self::ThresholdMet { language } => {
                write!(f, "relevance threshold met ({})", language)
            }
            Self::BelowThreshold => f.write_str("below relevance threshold"),
            Self::ErrorDuringAnalysis => f.write_str("error during analysis"),
        }
    }
}

/// Outcome of scoring one message.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RelevanceResult {
    pub needs_processing: bool,
    pub reason: RelevanceReason,
    pub score: f64,
}

impl RelevanceResult {
    fn relevant(reason: RelevanceReason, score: f64) -> Self {
        Self {
            needs_processing: true,
            reason,
            score,
        }
    }

    fn error() -> Self {
        Self {
            needs_processing: false,
            reason: RelevanceReason::ErrorDuringAnalysis,
            score: 0.0,
        }
    }

    pub fn is_direct_request(&self) -> bool {
        self.needs_processing && self.reason.is_direct_request()
    }
}

/// Per-language breakdown of a lexicon score.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LanguageScore {
    pub language: String,
    pub relationship_matches: usize,
    pub emotional_matches: usize,
    pub question: bool,
    pub direct_request: bool,
    pub long_message: bool,
    pub score: f64,
}

/// Scores messages against the lexicon. Cheap to clone.
#[derive(Debug, Clone)]
pub struct RelevanceScorer {
    lexicon: Arc<Lexicon>,
    config: RelevanceConfig,
    /// Lowercased bot names, with and without spaces.
    mention_names: Vec<String>,
}

impl RelevanceScorer {
    pub fn new(lexicon: Arc<Lexicon>, config: RelevanceConfig) -> Self {
        let mut mention_names = Vec::new();
        for name in std::iter::once(&config.bot_name).chain(config.bot_aliases.iter()) {
            let lowered = name.trim().to_lowercase();
            let squashed: String = lowered.chars().filter(|c| !c.is_whitespace()).collect();
            for candidate in [lowered, squashed] {
                if !candidate.is_empty() && !mention_names.contains(&candidate) {
                    mention_names.push(candidate);
                }
            }
        }

        Self {
            lexicon,
            config,
            mention_names,
        }
    }

    pub fn config(&self) -> &RelevanceConfig {
        &self.config
    }

    /// Score a message. Never fails: internal faults yield a non-relevant
    /// result with [`RelevanceReason::ErrorDuringAnalysis`].
    pub fn analyze(&self, message: &IncomingMessage, is_private: bool) -> RelevanceResult {
        match self.try_analyze(message, is_private) {
            Ok(result) => {
                debug!(
                    conversation_id = %message.conversation_id,
                    score = result.score,
                    reason = %result.reason,
                    "Relevance analyzed"
                );
                result
            }
            Err(e) => {
                warn!(
                    conversation_id = %message.conversation_id,
                    error = %e,
                    "Relevance analysis failed"
                );
                RelevanceResult::error()
            }
        }
    }

    pub fn try_analyze(
        &self,
        message: &IncomingMessage,
        is_private: bool,
    ) -> LovebotResult<RelevanceResult> {
        if is_private {
            return Ok(RelevanceResult::relevant(
                RelevanceReason::PrivateConversation,
                DIRECT_SCORE,
            ));
        }

        let text = message.text.trim();
        if text.is_empty() {
            return Err(LovebotError::validation("message has no text to analyze"));
        }

        if text.starts_with(self.config.direct_request_marker) {
            return Ok(RelevanceResult::relevant(
                RelevanceReason::DirectMarker,
                DIRECT_SCORE,
            ));
        }

        let lowered = text.to_lowercase();
        if self.mentions_bot(&lowered) || self.replies_to_bot_advice(message) {
            return Ok(RelevanceResult::relevant(
                RelevanceReason::BotMention,
                MENTION_SCORE,
            ));
        }

        let best = self
            .score_languages(text)
            .into_iter()
            .fold(None::<LanguageScore>, |best, candidate| match best {
                Some(b) if b.score >= candidate.score => Some(b),
                _ => Some(candidate),
            })
            .ok_or_else(|| LovebotError::internal("lexicon has no languages"))?;

        if best.score >= self.config.relevance_threshold {
            Ok(RelevanceResult::relevant(
                RelevanceReason::ThresholdMet {
                    language: best.language,
                },
                best.score,
            ))
        } else {
            Ok(RelevanceResult {
                needs_processing: false,
                reason: RelevanceReason::BelowThreshold,
                score: best.score,
            })
        }
    }

    /// Score `text` against every language, in lexicon order.
    pub fn score_languages(&self, text: &str) -> Vec<LanguageScore> {
        let lowered = text.to_lowercase();
        let long_message = text.chars().count() > self.config.long_message_chars;
        self.lexicon
            .languages()
            .iter()
            .map(|lang| score_language(lang, text, &lowered, long_message))
            .collect()
    }

    fn mentions_bot(&self, lowered: &str) -> bool {
        self.mention_names.iter().any(|n| lowered.contains(n.as_str()))
    }

    fn replies_to_bot_advice(&self, message: &IncomingMessage) -> bool {
        message
            .quoted
            .as_ref()
            .map(|q| q.is_from_bot && self.lexicon.contains_advice_keyword(&q.text))
            .unwrap_or(false)
    }
}

fn score_language(
    lang: &LanguageLexicon,
    text: &str,
    lowered: &str,
    long_message: bool,
) -> LanguageScore {
    let relationship_matches = lang.matched_relationship_keywords(lowered).len();
    let emotional_matches = lang.matched_emotional_keywords(lowered).len();
    let question = lang.has_question(text);
    let direct_request = lang.has_direct_request(text);

    let mut score = RELATIONSHIP_WEIGHT * relationship_matches as f64
        + EMOTIONAL_WEIGHT * emotional_matches as f64;
    if question {
        score += QUESTION_WEIGHT;
    }
    if direct_request {
        score += DIRECT_REQUEST_WEIGHT;
    }
    if long_message {
        score += LONG_MESSAGE_WEIGHT;
    }

    LanguageScore {
        language: lang.name().to_string(),
        relationship_matches,
        emotional_matches,
        question,
        direct_request,
        long_message,
        score,
    }
}

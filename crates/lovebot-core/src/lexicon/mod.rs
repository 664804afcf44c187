//! Per-language keyword and pattern tables used by the relevance scorer.
//!
//! Languages are data, not code: each one is a [`LanguageSpec`] compiled once
//! into a [`LanguageLexicon`]. Adding a language means adding a spec.

mod builtin;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{LovebotError, LovebotResult};

pub use builtin::builtin_specs;

/// Raw, serializable description of one language's lexicon.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LanguageSpec {
    /// Short code, e.g. "en".
    pub code: String,
    /// Name used in relevance reasons, e.g. "english".
    pub name: String,
    pub relationship_keywords: Vec<String>,
    pub emotional_keywords: Vec<String>,
    /// Words that mark a bot message as advice (used for reply detection).
    pub advice_keywords: Vec<String>,
    /// Regexes; any match counts once.
    pub question_patterns: Vec<String>,
    /// Regexes; any match counts once.
    pub direct_request_patterns: Vec<String>,
}

/// A compiled language lexicon. Keywords are lowercased and deduplicated.
#[derive(Debug, Clone)]
pub struct LanguageLexicon {
    code: String,
    name: String,
    relationship_keywords: Vec<String>,
    emotional_keywords: Vec<String>,
    advice_keywords: Vec<String>,
    question_patterns: Vec<Regex>,
    direct_request_patterns: Vec<Regex>,
}

impl LanguageLexicon {
    /// Compile a spec. Patterns are matched case-insensitively.
    pub fn compile(spec: &LanguageSpec) -> LovebotResult<Self> {
        if spec.name.trim().is_empty() {
            return Err(LovebotError::Configuration(
                "language lexicon needs a name".to_string(),
            ));
        }

        let compile_all = |patterns: &[String]| -> LovebotResult<Vec<Regex>> {
            patterns
                .iter()
                .map(|p| {
                    Regex::new(&format!("(?i){}", p)).map_err(|e| {
                        LovebotError::Configuration(format!(
                            "invalid pattern '{}' in {} lexicon: {}",
                            p, spec.name, e
                        ))
                    })
                })
                .collect()
        };

        Ok(Self {
            code: spec.code.clone(),
            name: spec.name.clone(),
            relationship_keywords: normalize_keywords(&spec.relationship_keywords),
            emotional_keywords: normalize_keywords(&spec.emotional_keywords),
            advice_keywords: normalize_keywords(&spec.advice_keywords),
            question_patterns: compile_all(&spec.question_patterns)?,
            direct_request_patterns: compile_all(&spec.direct_request_patterns)?,
        })
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Relationship keywords contained in `lowered`, each at most once.
    pub fn matched_relationship_keywords(&self, lowered: &str) -> Vec<&str> {
        matched(&self.relationship_keywords, lowered)
    }

    /// Emotional keywords contained in `lowered`, each at most once.
    pub fn matched_emotional_keywords(&self, lowered: &str) -> Vec<&str> {
        matched(&self.emotional_keywords, lowered)
    }

    pub fn has_question(&self, text: &str) -> bool {
        self.question_patterns.iter().any(|p| p.is_match(text))
    }

    pub fn has_direct_request(&self, text: &str) -> bool {
        self.direct_request_patterns.iter().any(|p| p.is_match(text))
    }

    pub fn has_advice_keyword(&self, lowered: &str) -> bool {
        self.advice_keywords.iter().any(|k| lowered.contains(k.as_str()))
    }
}

fn normalize_keywords(keywords: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(keywords.len());
    for keyword in keywords {
        let k = keyword.trim().to_lowercase();
        if !k.is_empty() && !out.contains(&k) {
            out.push(k);
        }
    }
    out
}

fn matched<'a>(keywords: &'a [String], lowered: &str) -> Vec<&'a str> {
    keywords
        .iter()
        .filter(|k| lowered.contains(k.as_str()))
        .map(String::as_str)
        .collect()
}

/// The full set of compiled languages. Immutable once built.
#[derive(Debug, Clone)]
pub struct Lexicon {
    languages: Vec<LanguageLexicon>,
}

impl Lexicon {
    /// Compile a lexicon from specs. At least one language is required.
    pub fn from_specs(specs: &[LanguageSpec]) -> LovebotResult<Self> {
        if specs.is_empty() {
            return Err(LovebotError::Configuration(
                "lexicon needs at least one language".to_string(),
            ));
        }
        let languages = specs
            .iter()
            .map(LanguageLexicon::compile)
            .collect::<LovebotResult<Vec<_>>>()?;
        Ok(Self { languages })
    }

    /// English, Spanish, Hebrew and Thai.
    pub fn builtin() -> LovebotResult<Self> {
        Self::from_specs(&builtin_specs())
    }

    /// Builtin languages plus extra specs (e.g. loaded from a config file).
    pub fn builtin_with(extra: &[LanguageSpec]) -> LovebotResult<Self> {
        let mut specs = builtin_specs();
        specs.extend_from_slice(extra);
        Self::from_specs(&specs)
    }

    pub fn languages(&self) -> &[LanguageLexicon] {
        &self.languages
    }

    pub fn language(&self, code: &str) -> Option<&LanguageLexicon> {
        self.languages.iter().find(|l| l.code == code)
    }

    /// Whether `text` contains an advice keyword in any language.
    pub fn contains_advice_keyword(&self, text: &str) -> bool {
        let lowered = text.to_lowercase();
        self.languages.iter().any(|l| l.has_advice_keyword(&lowered))
    }
}

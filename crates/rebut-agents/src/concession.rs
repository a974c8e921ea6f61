//! Concession detection
//!
//! A lexical rule over the latest user utterance. An utterance concedes when
//! it contains one of the concession phrases, or when it is at most ten words
//! long and one of those words is a short agreement such as "ok" or "fine".

use serde::{Deserialize, Serialize};

const CONCESSION_PHRASES: &[&str] = &[
    "i agree",
    "you're right",
    "you win",
    "i concede",
    "fair point",
    "i give up",
    "you've convinced me",
    "that's true",
    "i see your point",
    "valid point",
    "good point",
    "touché",
    "you got me",
];

const SHORT_AGREEMENTS: &[&str] = &["yeah", "yep", "ok", "okay", "fine", "true", "agreed"];

const SHORT_UTTERANCE_WORDS: usize = 10;

/// Classifier verdict
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Concession {
    pub is_conceding: bool,
    /// Confidence in the verdict, 0.0-1.0
    pub confidence: f64,
}

/// Deterministic concession classifier
#[derive(Debug, Clone)]
pub struct ConcessionClassifier {
    phrases: Vec<String>,
    short_agreements: Vec<String>,
}

impl Default for ConcessionClassifier {
    fn default() -> Self {
        Self {
            phrases: CONCESSION_PHRASES.iter().map(|p| p.to_string()).collect(),
            short_agreements: SHORT_AGREEMENTS.iter().map(|p| p.to_string()).collect(),
        }
    }
}

impl ConcessionClassifier {
    /// Classify the latest user utterance
    pub fn classify(&self, utterance: &str) -> Concession {
        let lower = utterance.to_lowercase().replace('’', "'");

        if self.phrases.iter().any(|p| lower.contains(p.as_str())) {
            return Concession {
                is_conceding: true,
                confidence: 0.9,
            };
        }

        let words: Vec<&str> = lower
            .split_whitespace()
            .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric()))
            .filter(|w| !w.is_empty())
            .collect();
        if words.len() <= SHORT_UTTERANCE_WORDS
            && words
                .iter()
                .any(|w| self.short_agreements.iter().any(|a| a == w))
        {
            return Concession {
                is_conceding: true,
                confidence: 0.7,
            };
        }

        Concession {
            is_conceding: false,
            confidence: 0.1,
        }
    }

    /// Shorthand for `classify(..).is_conceding`
    pub fn is_conceding(&self, utterance: &str) -> bool {
        self.classify(utterance).is_conceding
    }
}

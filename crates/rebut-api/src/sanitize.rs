//! Input validation for debate requests
//!
//! Lengths are counted in characters after trimming. Control characters
//! other than newlines and tabs are stripped before the text reaches a
//! prompt.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SanitizeError {
    #[error("{field} is too long: {actual} chars (max {max})")]
    TooLong {
        field: &'static str,
        actual: usize,
        max: usize,
    },

    #[error("{field} is too short: {actual} chars (min {min})")]
    TooShort {
        field: &'static str,
        actual: usize,
        min: usize,
    },

    #[error("{field} is empty or whitespace only")]
    EmptyInput { field: &'static str },

    #[error("{field} contains a forbidden instruction: {pattern}")]
    ForbiddenPattern {
        field: &'static str,
        pattern: &'static str,
    },

    #[error("max_rounds must be between {min} and {max}, got {actual}")]
    RoundsOutOfRange { actual: u32, min: u32, max: u32 },
}

/// Length bounds for one text field
#[derive(Debug, Clone, Copy)]
pub struct FieldRules {
    pub field: &'static str,
    pub min_length: usize,
    pub max_length: usize,
}

pub const TOPIC: FieldRules = FieldRules {
    field: "topic",
    min_length: 10,
    max_length: 500,
};

pub const USER_STANCE: FieldRules = FieldRules {
    field: "user_stance",
    min_length: 20,
    max_length: 1000,
};

pub const USER_ARGUMENT: FieldRules = FieldRules {
    field: "user_argument",
    min_length: 1,
    max_length: 1000,
};

pub const MIN_ROUNDS: u32 = 3;
pub const MAX_ROUNDS: u32 = 15;

/// Attempts to override the agents' instructions
const INJECTION_PATTERNS: &[&str] = &[
    "ignore previous instructions",
    "ignore all previous",
    "disregard previous",
    "new instructions:",
    "system prompt:",
];

/// Trim, validate and strip control characters
pub fn sanitize(input: &str, rules: &FieldRules) -> Result<String, SanitizeError> {
    let text = input.trim();
    let field = rules.field;

    if text.is_empty() {
        return Err(SanitizeError::EmptyInput { field });
    }

    let actual = text.chars().count();
    if actual < rules.min_length {
        return Err(SanitizeError::TooShort {
            field,
            actual,
            min: rules.min_length,
        });
    }
    if actual > rules.max_length {
        return Err(SanitizeError::TooLong {
            field,
            actual,
            max: rules.max_length,
        });
    }

    let lower = text.to_lowercase();
    if let Some(pattern) = INJECTION_PATTERNS.iter().copied().find(|p| lower.contains(p)) {
        tracing::warn!(field, pattern, "Potential prompt injection detected");
        return Err(SanitizeError::ForbiddenPattern { field, pattern });
    }

    Ok(text
        .chars()
        .filter(|c| *c == '\n' || *c == '\t' || !c.is_control())
        .collect())
}

pub fn sanitize_topic(input: &str) -> Result<String, SanitizeError> {
    sanitize(input, &TOPIC)
}

pub fn sanitize_stance(input: &str) -> Result<String, SanitizeError> {
    sanitize(input, &USER_STANCE)
}

pub fn sanitize_argument(input: &str) -> Result<String, SanitizeError> {
    sanitize(input, &USER_ARGUMENT)
}

pub fn validate_max_rounds(max_rounds: u32) -> Result<u32, SanitizeError> {
    if (MIN_ROUNDS..=MAX_ROUNDS).contains(&max_rounds) {
        Ok(max_rounds)
    } else {
        Err(SanitizeError::RoundsOutOfRange {
            actual: max_rounds,
            min: MIN_ROUNDS,
            max: MAX_ROUNDS,
        })
    }
}

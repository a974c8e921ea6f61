//! Evidence snippets retrieved to support a counter-argument

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::text::truncate_chars;

/// Maximum snippet length kept per evidence item
pub const SNIPPET_MAX_CHARS: usize = 300;

/// Credibility assigned when the search service does not report a score
pub const DEFAULT_CREDIBILITY: f64 = 0.5;

/// A single piece of retrieved evidence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Evidence {
    /// Source title
    pub source: String,
    pub url: String,
    /// Snippet, at most [`SNIPPET_MAX_CHARS`] characters
    pub snippet: String,
    /// Credibility in [0, 1]
    pub credibility_score: f64,
}

impl Evidence {
    /// Build a normalized evidence record. The snippet is truncated and the
    /// credibility clamped into [0, 1], defaulting to [`DEFAULT_CREDIBILITY`].
    pub fn new(
        source: impl Into<String>,
        url: impl Into<String>,
        snippet: &str,
        credibility: Option<f64>,
    ) -> Self {
        let credibility_score = credibility
            .filter(|c| c.is_finite())
            .unwrap_or(DEFAULT_CREDIBILITY)
            .clamp(0.0, 1.0);
        Self {
            source: source.into(),
            url: url.into(),
            snippet: truncate_chars(snippet, SNIPPET_MAX_CHARS),
            credibility_score,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snippet_truncated() {
        let long = "x".repeat(1000);
        let ev = Evidence::new("Source", "https://example.org", &long, Some(0.9));
        assert_eq!(ev.snippet.chars().count(), SNIPPET_MAX_CHARS);
        assert_eq!(ev.credibility_score, 0.9);
    }

    #[test]
    fn test_credibility_defaults_and_clamps() {
        assert_eq!(Evidence::new("a", "b", "c", None).credibility_score, 0.5);
        assert_eq!(Evidence::new("a", "b", "c", Some(3.0)).credibility_score, 1.0);
        assert_eq!(Evidence::new("a", "b", "c", Some(f64::NAN)).credibility_score, 0.5);
    }
}

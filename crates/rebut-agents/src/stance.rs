//! Stance detection on the user's opening position

use rebut_core::text::truncate_chars;
use rebut_core::StanceAnalysis;
use rebut_llm::{LlmProvider, LlmRequest, Metrics};
use serde::Deserialize;
use std::sync::Arc;

use crate::config::AgentConfig;
use crate::invoke::complete_text;
use crate::parse::parse_json;

const SYSTEM_PROMPT: &str = "You are a debate stance analyzer. You answer only with JSON.";

#[derive(Debug, Deserialize)]
struct RawStance {
    stance: Option<String>,
    key_claims: Option<Vec<String>>,
    argument_structure: Option<String>,
    strength: Option<f64>,
}

/// Extracts stance, key claims and argument structure
#[derive(Debug, Clone)]
pub struct StanceDetector {
    llm: Arc<dyn LlmProvider>,
    config: AgentConfig,
    metrics: Arc<Metrics>,
}

impl StanceDetector {
    pub fn new(llm: Arc<dyn LlmProvider>, config: AgentConfig, metrics: Arc<Metrics>) -> Self {
        Self {
            llm,
            config,
            metrics,
        }
    }

    /// Build the analysis prompt
    pub fn prompt(topic: &str, argument: &str) -> String {
        format!(
            r#"You are analyzing a debate argument. Extract the following in JSON format:

Topic: {}
User's Argument: {}

Extract:
1. "stance": The user's clear position (for/against/neutral)
2. "key_claims": List of 3-5 main claims the user is making
3. "argument_structure": How the argument is structured (logical/emotional/mixed)
4. "strength": Rate argument strength (1-10)

Return ONLY valid JSON, no other text:
{{
    "stance": "string",
    "key_claims": ["claim1", "claim2"],
    "argument_structure": "string",
    "strength": number
}}"#,
            topic, argument
        )
    }

    /// Detect the stance of `argument`. Never fails; unusable output yields
    /// [`StanceAnalysis::fallback`].
    pub async fn detect(&self, topic: &str, argument: &str) -> StanceAnalysis {
        let request = LlmRequest::with_role(SYSTEM_PROMPT, &Self::prompt(topic, argument))
            .temperature(self.config.temperature)
            .max_tokens(self.config.max_tokens);

        let raw = match complete_text(self.llm.as_ref(), request, self.config.timeout).await {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(adapter = "stance", error = %e, "Stance detection failed, using fallback");
                return self.fallback(argument);
            }
        };

        match parse_json::<RawStance>(&raw) {
            Ok(parsed) => Self::merge(parsed, argument),
            Err(e) => {
                tracing::warn!(adapter = "stance", error = %e, "Unparseable stance output, using fallback");
                self.fallback(argument)
            }
        }
    }

    fn fallback(&self, argument: &str) -> StanceAnalysis {
        self.metrics.record_fallback();
        metrics::counter!("rebut_adapter_fallbacks_total", "adapter" => "stance").increment(1);
        StanceAnalysis::fallback(argument)
    }

    fn merge(parsed: RawStance, argument: &str) -> StanceAnalysis {
        let defaults = StanceAnalysis::fallback(argument);
        let key_claims = parsed
            .key_claims
            .filter(|claims| !claims.is_empty())
            .map(|claims| claims.iter().map(|c| truncate_chars(c, 200)).collect())
            .unwrap_or(defaults.key_claims);
        StanceAnalysis {
            stance: parsed
                .stance
                .filter(|s| !s.trim().is_empty())
                .unwrap_or(defaults.stance),
            key_claims,
            argument_structure: parsed
                .argument_structure
                .unwrap_or(defaults.argument_structure),
            strength: parsed
                .strength
                .map(|s| s.round().clamp(1.0, 10.0) as u8)
                .unwrap_or(defaults.strength),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rebut_llm::MockProvider;
    use std::time::Duration;

    fn detector(llm: MockProvider) -> (StanceDetector, Arc<Metrics>) {
        let metrics = Arc::new(Metrics::new());
        (
            StanceDetector::new(Arc::new(llm), AgentConfig::default(), metrics.clone()),
            metrics,
        )
    }

    #[tokio::test]
    async fn test_parses_fenced_json() {
        let (d, metrics) = detector(MockProvider::constant(
            "```json\n{\"stance\": \"against\", \"key_claims\": [\"Costly\"], \"argument_structure\": \"logical\", \"strength\": 8}\n```",
        ));
        let stance = d.detect("School uniforms", "Uniforms are costly").await;
        assert_eq!(stance.stance, "against");
        assert_eq!(stance.key_claims, vec!["Costly"]);
        assert_eq!(stance.strength, 8);
        assert_eq!(metrics.snapshot().adapter_fallbacks, 0);
    }

    #[tokio::test]
    async fn test_malformed_output_falls_back() {
        let (d, metrics) = detector(MockProvider::constant("I think they are for it."));
        let argument = "a".repeat(400);
        let stance = d.detect("Topic", &argument).await;
        assert_eq!(stance.stance, "unclear");
        assert_eq!(stance.key_claims[0].len(), 200);
        assert_eq!(stance.argument_structure, "mixed");
        assert_eq!(stance.strength, 5);
        assert_eq!(metrics.snapshot().adapter_fallbacks, 1);
    }

    #[tokio::test]
    async fn test_partial_json_fills_defaults() {
        let (d, _) = detector(MockProvider::constant(r#"{"stance": "for", "strength": 42}"#));
        let stance = d.detect("Topic", "My argument").await;
        assert_eq!(stance.stance, "for");
        assert_eq!(stance.strength, 10);
        assert_eq!(stance.key_claims, vec!["My argument"]);
    }

    #[tokio::test]
    async fn test_timeout_falls_back() {
        let metrics = Arc::new(Metrics::new());
        let d = StanceDetector::new(
            Arc::new(MockProvider::smart().with_latency(200)),
            AgentConfig::default().with_timeout(Duration::from_millis(10)),
            metrics.clone(),
        );
        let stance = d.detect("Topic", "argument").await;
        assert_eq!(stance.stance, "unclear");
        assert_eq!(metrics.snapshot().adapter_fallbacks, 1);
    }
}

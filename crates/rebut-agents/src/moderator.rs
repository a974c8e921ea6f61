//! Debate moderation: scores, feedback and the termination verdict
//!
//! Scores are re-derived from the full transcript on every call. When the
//! round number has reached the configured maximum the verdict is forced to
//! `should_end`, whatever the model said.

use rebut_core::Round;
use rebut_llm::{LlmProvider, LlmRequest, Metrics};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::config::AgentConfig;
use crate::invoke::complete_text;
use crate::parse::parse_json;
use crate::prompt::render_transcript;

const SYSTEM_PROMPT: &str = "You are a debate moderator. You answer only with JSON.";

/// Moderator verdict for one point in the debate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Moderation {
    pub should_end: bool,
    pub user_score: u8,
    pub ai_score: u8,
    pub user_strengths: Vec<String>,
    pub user_weaknesses: Vec<String>,
    /// Advice for the user's next argument
    pub suggestions: String,
    /// Closing remarks used when the debate ends
    pub final_feedback: String,
}

impl Moderation {
    /// Substitute used when moderation output is unusable
    pub fn fallback(round_number: u32, max_rounds: u32) -> Self {
        Self {
            should_end: round_number >= max_rounds,
            user_score: 50,
            ai_score: 50,
            user_strengths: vec!["Engagement".to_string()],
            user_weaknesses: vec!["Could provide more evidence".to_string()],
            suggestions: "Try to support your points with specific examples.".to_string(),
            final_feedback: "Good debate!".to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawModeration {
    should_end: Option<bool>,
    user_score: Option<f64>,
    ai_score: Option<f64>,
    user_strengths: Option<Vec<String>>,
    user_weaknesses: Option<Vec<String>>,
    suggestions: Option<String>,
    final_feedback: Option<String>,
}

/// Inputs for one moderation pass
#[derive(Debug, Clone, Copy)]
pub struct ModerationRequest<'a> {
    pub topic: &'a str,
    /// Rounds the moderator may see
    pub history: &'a [Round],
    pub round_number: u32,
    pub max_rounds: u32,
}

/// Scores the debate and decides when it should stop
#[derive(Debug, Clone)]
pub struct Moderator {
    llm: Arc<dyn LlmProvider>,
    config: AgentConfig,
    metrics: Arc<Metrics>,
}

impl Moderator {
    pub fn new(llm: Arc<dyn LlmProvider>, config: AgentConfig, metrics: Arc<Metrics>) -> Self {
        Self {
            llm,
            config,
            metrics,
        }
    }

    pub fn prompt(req: &ModerationRequest<'_>) -> String {
        format!(
            r#"You are a debate moderator. Analyze this debate and provide scores and feedback.

{}
Current Round: {}/{}

Evaluate and return ONLY valid JSON:
{{
    "should_end": boolean (true if debate is getting repetitive, going in circles, or max rounds reached),
    "user_score": number (0-100, based on logic, evidence, and argument quality),
    "ai_score": number (0-100),
    "user_strengths": ["strength1", "strength2"],
    "user_weaknesses": ["weakness1", "weakness2"],
    "suggestions": "Brief suggestion for user's next argument (if debate continues)",
    "final_feedback": "Overall feedback (if debate ending)"
}}"#,
            render_transcript(req.topic, req.history),
            req.round_number,
            req.max_rounds
        )
    }

    /// Moderate. Never fails; unusable output yields [`Moderation::fallback`].
    pub async fn moderate(&self, req: &ModerationRequest<'_>) -> Moderation {
        let request = LlmRequest::with_role(SYSTEM_PROMPT, &Self::prompt(req))
            .temperature(self.config.temperature)
            .max_tokens(self.config.max_tokens);

        let mut moderation =
            match complete_text(self.llm.as_ref(), request, self.config.timeout).await {
                Ok(raw) => match parse_json::<RawModeration>(&raw) {
                    Ok(parsed) => Self::merge(parsed, req),
                    Err(e) => {
                        tracing::warn!(adapter = "moderator", error = %e, "Unparseable moderation output, using fallback");
                        self.fallback(req)
                    }
                },
                Err(e) => {
                    tracing::warn!(adapter = "moderator", error = %e, "Moderation failed, using fallback");
                    self.fallback(req)
                }
            };

        if req.round_number >= req.max_rounds {
            moderation.should_end = true;
        }
        moderation
    }

    fn fallback(&self, req: &ModerationRequest<'_>) -> Moderation {
        self.metrics.record_fallback();
        metrics::counter!("rebut_adapter_fallbacks_total", "adapter" => "moderator").increment(1);
        Moderation::fallback(req.round_number, req.max_rounds)
    }

    fn merge(parsed: RawModeration, req: &ModerationRequest<'_>) -> Moderation {
        let defaults = Moderation::fallback(req.round_number, req.max_rounds);
        Moderation {
            should_end: parsed.should_end.unwrap_or(defaults.should_end),
            user_score: parsed.user_score.map(to_score).unwrap_or(defaults.user_score),
            ai_score: parsed.ai_score.map(to_score).unwrap_or(defaults.ai_score),
            user_strengths: parsed.user_strengths.unwrap_or(defaults.user_strengths),
            user_weaknesses: parsed.user_weaknesses.unwrap_or(defaults.user_weaknesses),
            suggestions: parsed.suggestions.unwrap_or(defaults.suggestions),
            final_feedback: parsed.final_feedback.unwrap_or(defaults.final_feedback),
        }
    }
}

fn to_score(value: f64) -> u8 {
    if value.is_finite() {
        value.round().clamp(0.0, 100.0) as u8
    } else {
        50
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rebut_llm::MockProvider;

    fn moderator(response: &str) -> (Moderator, Arc<MockProvider>, Arc<Metrics>) {
        let llm = Arc::new(MockProvider::constant(response));
        let metrics = Arc::new(Metrics::new());
        (
            Moderator::new(llm.clone(), AgentConfig::default(), metrics.clone()),
            llm,
            metrics,
        )
    }

    fn req(round_number: u32, max_rounds: u32) -> ModerationRequest<'static> {
        ModerationRequest {
            topic: "Nuclear energy",
            history: &[],
            round_number,
            max_rounds,
        }
    }

    #[tokio::test]
    async fn test_parses_verdict() {
        let (m, llm, _) = moderator(
            r#"{"should_end": false, "user_score": 72, "ai_score": 64.6,
                "user_strengths": ["Data"], "user_weaknesses": ["Tone"],
                "suggestions": "Address cost.", "final_feedback": "Strong."}"#,
        );
        let verdict = m.moderate(&req(2, 5)).await;
        assert!(!verdict.should_end);
        assert_eq!(verdict.user_score, 72);
        assert_eq!(verdict.ai_score, 65);
        assert_eq!(verdict.suggestions, "Address cost.");
        assert!(llm.requests()[0].prompt.contains("Current Round: 2/5"));
    }

    #[tokio::test]
    async fn test_fallback_on_malformed_output() {
        let (m, _, metrics) = moderator("The user did great!");
        let verdict = m.moderate(&req(2, 5)).await;
        assert_eq!(verdict, Moderation::fallback(2, 5));
        assert!(!verdict.should_end);
        assert_eq!((verdict.user_score, verdict.ai_score), (50, 50));
        assert_eq!(metrics.snapshot().adapter_fallbacks, 1);

        let verdict = m.moderate(&req(5, 5)).await;
        assert!(verdict.should_end);
    }

    #[tokio::test]
    async fn test_max_rounds_forces_end() {
        let (m, _, _) = moderator(r#"{"should_end": false, "user_score": 80, "ai_score": 20}"#);
        assert!(!m.moderate(&req(4, 5)).await.should_end);
        let verdict = m.moderate(&req(5, 5)).await;
        assert!(verdict.should_end);
        assert_eq!(verdict.user_score, 80);
    }

    #[tokio::test]
    async fn test_scores_clamped() {
        let (m, _, _) = moderator(r#"{"user_score": 140, "ai_score": -3}"#);
        let verdict = m.moderate(&req(1, 5)).await;
        assert_eq!((verdict.user_score, verdict.ai_score), (100, 0));
        assert_eq!(verdict.final_feedback, "Good debate!");
    }

    #[tokio::test]
    async fn test_transport_failure_falls_back() {
        let metrics = Arc::new(Metrics::new());
        let m = Moderator::new(
            Arc::new(MockProvider::failing("down")),
            AgentConfig::default(),
            metrics.clone(),
        );
        assert_eq!(m.moderate(&req(3, 3)).await, Moderation::fallback(3, 3));
        assert_eq!(metrics.snapshot().adapter_fallbacks, 1);
    }
}

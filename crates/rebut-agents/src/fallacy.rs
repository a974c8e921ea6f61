//! Fallacy detection on user utterances
//!
//! Detection is best-effort and all-or-nothing: if any reported item names a
//! type or severity outside the closed enumerations, the whole result is
//! discarded and the call yields no fallacies.

use rebut_core::{Fallacy, FallacyType, Severity, UnknownVariant};
use rebut_llm::{LlmProvider, LlmRequest, Metrics};
use serde::Deserialize;
use std::sync::Arc;

use crate::config::AgentConfig;
use crate::invoke::complete_text;
use crate::parse::parse_json;

const SYSTEM_PROMPT: &str = "You are a logical fallacy detector. You answer only with JSON.";

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawFallacies {
    List(Vec<RawFallacy>),
    Wrapped { fallacies: Vec<RawFallacy> },
}

#[derive(Debug, Deserialize)]
struct RawFallacy {
    #[serde(rename = "type", default = "none_type")]
    kind: String,
    #[serde(default)]
    explanation: String,
    #[serde(default = "low_severity")]
    severity: String,
}

fn none_type() -> String {
    FallacyType::None.to_string()
}

fn low_severity() -> String {
    "low".to_string()
}

impl RawFallacy {
    fn into_fallacy(self) -> Result<Fallacy, UnknownVariant> {
        Ok(Fallacy::new(
            self.kind.parse::<FallacyType>()?,
            self.explanation,
            self.severity.parse::<Severity>()?,
        ))
    }
}

/// Flags logical fallacies in a single argument
#[derive(Debug, Clone)]
pub struct FallacyDetector {
    llm: Arc<dyn LlmProvider>,
    config: AgentConfig,
    metrics: Arc<Metrics>,
}

impl FallacyDetector {
    pub fn new(llm: Arc<dyn LlmProvider>, config: AgentConfig, metrics: Arc<Metrics>) -> Self {
        Self {
            llm,
            config,
            metrics,
        }
    }

    pub fn prompt(argument: &str) -> String {
        format!(
            r#"Analyze this argument for logical fallacies:

Argument: {}

Identify any logical fallacies from these types:
- ad_hominem: Attacking the person instead of the argument
- strawman: Misrepresenting opponent's argument
- false_dilemma: Presenting only two options when more exist
- slippery_slope: Claiming one thing will lead to extreme consequences
- appeal_to_authority: Relying on authority instead of evidence
- hasty_generalization: Drawing conclusions from insufficient evidence

Return ONLY valid JSON array, no other text:
[
    {{
        "type": "fallacy_type",
        "explanation": "why this is a fallacy",
        "severity": "low/medium/high"
    }}
]

If NO fallacies found, return empty array: []"#,
            argument
        )
    }

    /// Detect fallacies. Never fails; anything unusable yields an empty list.
    pub async fn detect(&self, argument: &str) -> Vec<Fallacy> {
        let request = LlmRequest::with_role(SYSTEM_PROMPT, &Self::prompt(argument))
            .temperature(self.config.temperature)
            .max_tokens(self.config.max_tokens);

        let raw = match complete_text(self.llm.as_ref(), request, self.config.timeout).await {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(adapter = "fallacy", error = %e, "Fallacy detection failed, reporting none");
                return self.fallback();
            }
        };

        let items = match parse_json::<RawFallacies>(&raw) {
            Ok(RawFallacies::List(items)) | Ok(RawFallacies::Wrapped { fallacies: items }) => items,
            Err(e) => {
                tracing::warn!(adapter = "fallacy", error = %e, "Unparseable fallacy output, reporting none");
                return self.fallback();
            }
        };

        match items
            .into_iter()
            .map(RawFallacy::into_fallacy)
            .collect::<Result<Vec<_>, _>>()
        {
            Ok(fallacies) => fallacies.into_iter().filter(|f| !f.is_none()).collect(),
            Err(e) => {
                tracing::warn!(adapter = "fallacy", error = %e, "Fallacy output outside known categories, reporting none");
                self.fallback()
            }
        }
    }

    fn fallback(&self) -> Vec<Fallacy> {
        self.metrics.record_fallback();
        metrics::counter!("rebut_adapter_fallbacks_total", "adapter" => "fallacy").increment(1);
        Vec::new()
    }
}

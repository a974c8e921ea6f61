//! # Rebut Agents
//!
//! The per-round transforms the debate pipeline is built from:
//! - [`ConcessionClassifier`]: Deterministic check for a user yielding
//! - [`StanceDetector`]: Detects the user's opening position
//! - [`EvidenceRetriever`]: Searches for evidence backing the counter-position
//! - [`ArgumentGenerator`]: Writes the AI's counter-argument
//! - [`FallacyDetector`]: Flags logical fallacies in the user's text
//! - [`Moderator`]: Scores both sides and decides when to stop
//!
//! Structured agents never fail: malformed model output, transport errors
//! and timeouts are replaced by a documented fallback value. Only the
//! argument generator can return an error.

pub mod argument;
pub mod concession;
pub mod config;
pub mod error;
pub mod evidence;
pub mod fallacy;
pub mod moderator;
pub mod parse;
pub mod prompt;
pub mod stance;

mod invoke;

use rebut_llm::{LlmProvider, Metrics, SearchProvider};
use std::sync::Arc;

pub use argument::{ArgumentGenerator, ArgumentRequest};
pub use concession::{Concession, ConcessionClassifier};
pub use config::AgentConfig;
pub use error::AgentError;
pub use evidence::EvidenceRetriever;
pub use fallacy::FallacyDetector;
pub use moderator::{Moderation, ModerationRequest, Moderator};
pub use stance::StanceDetector;

/// All agents a debate needs, sharing one set of providers
#[derive(Debug, Clone)]
pub struct DebateAgents {
    pub concession: ConcessionClassifier,
    pub stance: StanceDetector,
    pub evidence: EvidenceRetriever,
    pub argument: ArgumentGenerator,
    pub fallacy: FallacyDetector,
    pub moderator: Moderator,
}

impl DebateAgents {
    pub fn new(
        llm: Arc<dyn LlmProvider>,
        search: Arc<dyn SearchProvider>,
        config: AgentConfig,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self {
            concession: ConcessionClassifier::default(),
            stance: StanceDetector::new(llm.clone(), config.clone(), metrics.clone()),
            evidence: EvidenceRetriever::new(search, config.clone(), metrics.clone()),
            argument: ArgumentGenerator::new(llm.clone(), config.clone()),
            fallacy: FallacyDetector::new(llm.clone(), config.clone(), metrics.clone()),
            moderator: Moderator::new(llm, config, metrics),
        }
    }
}

//! Round pipeline: the debate state machine
//!
//! ```text
//!  start ──► IN_PROGRESS ──continue──► IN_PROGRESS
//!                 │
//!                 ├─ concession ───────┐
//!                 ├─ past max_rounds ──┼──► end ──► ENDED
//!                 └─ moderator verdict ┘
//! ```
//!
//! Within a round, fallacy detection runs concurrently with the
//! evidence → argument chain. Both finish before the round is appended.
//! The session lock is held from the first read to the last write of a
//! submission, including the end transition.

use chrono::Utc;
use rebut_agents::{ArgumentRequest, DebateAgents, ModerationRequest};
use rebut_core::{
    DebateConclusion, DebateId, DebateMode, DebateOutcome, DebateSession, DebateSummary,
    EndReason, Evidence, Fallacy, Owner,
};
use rebut_llm::Metrics;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, error, info};
use utoipa::ToSchema;

use crate::config::PipelineConfig;
use crate::error::DebateError;
use crate::ledger::StatsLedger;
use crate::session_store::SessionStore;

const OPENING_SUGGESTION: &str = "Make your next argument stronger with specific evidence!";
const CONCESSION_REPLY: &str = "You've conceded the point. Excellent debate - knowing when to acknowledge a strong argument is a sign of intellectual maturity.";
const CONCESSION_FEEDBACK: &str = "You conceded, showing intellectual honesty. Great debate!";
const DEFAULT_FEEDBACK: &str = "You argued well!";

/// What every start/continue call returns
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DebateResponse {
    #[schema(value_type = String, format = Uuid)]
    pub debate_id: DebateId,
    pub ai_counter_argument: String,
    pub evidence: Vec<Evidence>,
    pub fallacies_detected: Vec<Fallacy>,
    /// Equals the number of rounds stored for the session
    pub round_number: u32,
    pub is_debate_ended: bool,
    pub ai_score: u8,
    pub user_score: u8,
    pub suggestions: Option<String>,
}

/// Request to open a debate
#[derive(Debug, Clone)]
pub struct StartDebate {
    pub topic: String,
    pub user_stance: String,
    pub mode: DebateMode,
    /// Falls back to [`PipelineConfig::default_max_rounds`]
    pub max_rounds: Option<u32>,
    pub owner: Owner,
}

/// Drives debates from opening statement to conclusion
#[derive(Debug, Clone)]
pub struct RoundPipeline {
    agents: DebateAgents,
    sessions: SessionStore,
    ledger: StatsLedger,
    metrics: Arc<Metrics>,
    config: PipelineConfig,
}

impl RoundPipeline {
    pub fn new(
        agents: DebateAgents,
        ledger: StatsLedger,
        metrics: Arc<Metrics>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            agents,
            sessions: SessionStore::new(&config.sessions),
            ledger,
            metrics,
            config,
        }
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    pub fn ledger(&self) -> &StatsLedger {
        &self.ledger
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Open a debate and play round 1. The moderator is not consulted.
    pub async fn start(&self, request: StartDebate) -> Result<DebateResponse, DebateError> {
        let max_rounds = request.max_rounds.unwrap_or(self.config.default_max_rounds);
        let stance = self
            .agents
            .stance
            .detect(&request.topic, &request.user_stance)
            .await;
        let counter_query = format!("{} {}", stance.counter_stance(), request.topic);

        let (argued, fallacies) = tokio::join!(
            async {
                let evidence = self
                    .agents
                    .evidence
                    .retrieve(&request.topic, &counter_query)
                    .await;
                let argument = self
                    .agents
                    .argument
                    .generate(&ArgumentRequest {
                        topic: &request.topic,
                        user_position: &stance.stance,
                        user_argument: &request.user_stance,
                        evidence: &evidence,
                        mode: request.mode,
                        round_number: 1,
                        history: &[],
                    })
                    .await;
                argument.map(|text| (text, evidence))
            },
            self.agents.fallacy.detect(&request.user_stance),
        );
        let (ai_argument, evidence) = argued?;

        let mut session = DebateSession::new(
            request.topic,
            request.mode,
            max_rounds,
            request.owner,
            request.user_stance,
            stance,
        );
        let opening = session.user_stance.clone();
        session.push_round(opening, ai_argument.clone(), fallacies.clone(), evidence.clone())?;

        let debate_id = session.id;
        let (user_score, ai_score) = (session.user_score(), session.ai_score());
        info!(
            debate_id = %debate_id,
            owner = %session.owner,
            mode = ?session.mode,
            max_rounds,
            stance = %session.stance.stance,
            "Debate started"
        );
        self.sessions.create(session).await;
        self.metrics.record_debate_started();
        self.metrics.record_round();

        Ok(DebateResponse {
            debate_id,
            ai_counter_argument: ai_argument,
            evidence,
            fallacies_detected: fallacies,
            round_number: 1,
            is_debate_ended: false,
            ai_score,
            user_score,
            suggestions: Some(OPENING_SUGGESTION.to_string()),
        })
    }

    /// Play the user's next submission
    pub async fn continue_debate(
        &self,
        debate_id: DebateId,
        user_argument: &str,
    ) -> Result<DebateResponse, DebateError> {
        let shared = self
            .sessions
            .get(&debate_id)
            .await
            .ok_or(DebateError::NotFound(debate_id))?;
        let mut session = shared.lock().await;

        if let Some(conclusion) = session.conclusion() {
            debug!(debate_id = %debate_id, "Debate already ended, replaying conclusion");
            return Ok(concluded_response(&session, conclusion));
        }

        let round_number = session.next_round_number();

        if self.agents.concession.is_conceding(user_argument) {
            session.push_round(user_argument, CONCESSION_REPLY, Vec::new(), Vec::new())?;
            return self.end(&mut session, EndReason::Conceded).await;
        }

        if round_number > session.max_rounds {
            // The late submission is not stored
            return self.end(&mut session, EndReason::MaxRounds).await;
        }

        let (argued, fallacies) = tokio::join!(
            async {
                let evidence = self
                    .agents
                    .evidence
                    .retrieve(&session.topic, user_argument)
                    .await;
                let argument = self
                    .agents
                    .argument
                    .generate(&ArgumentRequest {
                        topic: &session.topic,
                        user_position: &session.stance.stance,
                        user_argument,
                        evidence: &evidence,
                        mode: session.mode,
                        round_number,
                        history: session.rounds(),
                    })
                    .await;
                argument.map(|text| (text, evidence))
            },
            self.agents.fallacy.detect(user_argument),
        );
        let (ai_argument, evidence) = argued?;

        // Moderation sees the rounds before this one
        let moderation = self
            .agents
            .moderator
            .moderate(&ModerationRequest {
                topic: &session.topic,
                history: session.rounds(),
                round_number,
                max_rounds: session.max_rounds,
            })
            .await;

        session.set_scores(moderation.user_score, moderation.ai_score);
        session.push_round(
            user_argument,
            ai_argument.clone(),
            fallacies.clone(),
            evidence.clone(),
        )?;
        self.metrics.record_round();
        info!(
            debate_id = %debate_id,
            round = round_number,
            user_score = moderation.user_score,
            ai_score = moderation.ai_score,
            "Round played"
        );

        if moderation.should_end {
            return self.end(&mut session, EndReason::Moderator).await;
        }

        Ok(DebateResponse {
            debate_id,
            ai_counter_argument: ai_argument,
            evidence,
            fallacies_detected: fallacies,
            round_number: session.round_count(),
            is_debate_ended: false,
            ai_score: session.ai_score(),
            user_score: session.user_score(),
            suggestions: Some(moderation.suggestions),
        })
    }

    /// Final moderator pass, conclusion, then the ledger for registered owners
    async fn end(
        &self,
        session: &mut DebateSession,
        reason: EndReason,
    ) -> Result<DebateResponse, DebateError> {
        let moderation = self
            .agents
            .moderator
            .moderate(&ModerationRequest {
                topic: &session.topic,
                history: session.rounds(),
                round_number: session.round_count(),
                max_rounds: session.max_rounds,
            })
            .await;

        let feedback = match reason {
            EndReason::Conceded => CONCESSION_FEEDBACK.to_string(),
            _ if moderation.final_feedback.trim().is_empty() => DEFAULT_FEEDBACK.to_string(),
            _ => moderation.final_feedback,
        };
        let conclusion = DebateConclusion {
            reason,
            user_score: moderation.user_score,
            ai_score: moderation.ai_score,
            feedback,
            strengths: moderation.user_strengths,
            weaknesses: moderation.user_weaknesses,
            concluded_at: Utc::now(),
        };
        session.conclude(conclusion.clone())?;

        self.metrics
            .record_debate_ended(reason == EndReason::Conceded);
        metrics::counter!("rebut_debates_concluded_total", "reason" => reason.as_str())
            .increment(1);
        info!(
            debate_id = %session.id,
            reason = reason.as_str(),
            rounds = session.round_count(),
            user_score = conclusion.user_score,
            ai_score = conclusion.ai_score,
            "Debate ended"
        );

        match &session.owner {
            Owner::User(user_id) => {
                let outcome = DebateOutcome {
                    won: conclusion.user_won(),
                    rounds: session.round_count(),
                    evidence_count: session.total_evidence(),
                    fallacy_count: session.total_fallacies(),
                    conceded: reason == EndReason::Conceded,
                };
                if let Err(e) = self.ledger.record(user_id, &outcome).await {
                    self.metrics.record_ledger_failure();
                    error!(
                        debate_id = %session.id,
                        user_id = %user_id,
                        error = %e,
                        "Failed to record debate stats"
                    );
                }
            }
            Owner::Guest => debug!(debate_id = %session.id, "Skipping stats for guest"),
        }

        Ok(concluded_response(session, &conclusion))
    }

    /// Copy of a stored session
    pub async fn session(&self, debate_id: DebateId) -> Result<DebateSession, DebateError> {
        self.sessions
            .snapshot(&debate_id)
            .await
            .ok_or(DebateError::NotFound(debate_id))
    }

    /// Recap of an ended debate
    pub async fn summary(&self, debate_id: DebateId) -> Result<DebateSummary, DebateError> {
        let session = self.session(debate_id).await?;
        DebateSummary::from_session(&session).ok_or(DebateError::NotEnded(debate_id))
    }
}

fn concluded_response(session: &DebateSession, conclusion: &DebateConclusion) -> DebateResponse {
    DebateResponse {
        debate_id: session.id,
        ai_counter_argument: format!("Debate concluded. {}", conclusion.feedback),
        evidence: Vec::new(),
        fallacies_detected: Vec::new(),
        round_number: session.round_count(),
        is_debate_ended: true,
        ai_score: conclusion.ai_score,
        user_score: conclusion.user_score,
        suggestions: Some(conclusion.feedback.clone()),
    }
}

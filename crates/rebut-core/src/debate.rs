//! Debate sessions and their round history
//!
//! A [`DebateSession`] owns an append-only list of [`Round`]s and an explicit
//! [`DebateStatus`]. Rounds are numbered from 1 and their number always equals
//! the length of the history at the moment they were appended. The session is
//! concluded exactly once; after that no further rounds are accepted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::DebateStateError;
use crate::evidence::Evidence;
use crate::fallacy::Fallacy;
use crate::text::truncate_chars;

/// Unique identifier for a debate
pub type DebateId = Uuid;

/// Scores every debate starts with
pub const INITIAL_SCORE: u8 = 50;

/// Tone of the AI opponent
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum DebateMode {
    #[default]
    Normal,
    Roast,
}

impl fmt::Display for DebateMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DebateMode::Normal => f.write_str("normal"),
            DebateMode::Roast => f.write_str("roast"),
        }
    }
}

/// Who a debate belongs to. Serialized as the user id, or `"guest"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Owner {
    Guest,
    User(String),
}

impl Owner {
    pub const GUEST: &'static str = "guest";

    pub fn is_guest(&self) -> bool {
        matches!(self, Owner::Guest)
    }

    /// The registered user id, if any
    pub fn user_id(&self) -> Option<&str> {
        match self {
            Owner::Guest => None,
            Owner::User(id) => Some(id),
        }
    }
}

impl From<String> for Owner {
    fn from(value: String) -> Self {
        if value.is_empty() || value == Owner::GUEST {
            Owner::Guest
        } else {
            Owner::User(value)
        }
    }
}

impl From<Owner> for String {
    fn from(owner: Owner) -> Self {
        match owner {
            Owner::Guest => Owner::GUEST.to_string(),
            Owner::User(id) => id,
        }
    }
}

impl fmt::Display for Owner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Owner::Guest => f.write_str(Owner::GUEST),
            Owner::User(id) => f.write_str(id),
        }
    }
}

/// Lifecycle state of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum DebateStatus {
    InProgress,
    Ended,
}

/// Why a debate ended, in priority order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum EndReason {
    /// The user yielded
    Conceded,
    /// A submission arrived after the last allowed round
    MaxRounds,
    /// The moderator judged the exchange finished
    Moderator,
}

impl EndReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Conceded => "conceded",
            Self::MaxRounds => "max_rounds",
            Self::Moderator => "moderator",
        }
    }
}

/// Result of stance detection on the user's opening position
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct StanceAnalysis {
    /// Directional stance, e.g. "for", "against" or "unclear"
    pub stance: String,
    pub key_claims: Vec<String>,
    /// "logical", "emotional" or "mixed"
    pub argument_structure: String,
    /// Self-reported strength, 1-10
    pub strength: u8,
}

impl StanceAnalysis {
    pub const UNCLEAR: &'static str = "unclear";

    /// Substitute used when stance detection cannot be parsed
    pub fn fallback(argument: &str) -> Self {
        Self {
            stance: Self::UNCLEAR.to_string(),
            key_claims: vec![truncate_chars(argument, 200)],
            argument_structure: "mixed".to_string(),
            strength: 5,
        }
    }

    /// The position the AI argues: "against" when the detected stance
    /// mentions "for", otherwise "for".
    pub fn counter_stance(&self) -> &'static str {
        if self.stance.to_lowercase().contains("for") {
            "against"
        } else {
            "for"
        }
    }
}

/// One user/AI exchange
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Round {
    /// 1-based position in the session
    pub round: u32,
    pub user_argument: String,
    pub ai_argument: String,
    /// Fallacies found in `user_argument`
    pub user_fallacies: Vec<Fallacy>,
    /// Evidence used to build `ai_argument`
    pub evidence: Vec<Evidence>,
    pub created_at: DateTime<Utc>,
}

/// Final state recorded by the end transition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct DebateConclusion {
    pub reason: EndReason,
    pub user_score: u8,
    pub ai_score: u8,
    pub feedback: String,
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
    pub concluded_at: DateTime<Utc>,
}

impl DebateConclusion {
    pub fn user_won(&self) -> bool {
        self.user_score > self.ai_score
    }
}

/// A debate between one user and the AI opponent
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DebateSession {
    #[schema(value_type = String, format = Uuid)]
    pub id: DebateId,
    pub topic: String,
    pub mode: DebateMode,
    pub max_rounds: u32,
    #[schema(value_type = String)]
    pub owner: Owner,
    /// The opening position as submitted
    pub user_stance: String,
    /// Stance detected from the opening position
    pub stance: StanceAnalysis,
    rounds: Vec<Round>,
    user_score: u8,
    ai_score: u8,
    status: DebateStatus,
    conclusion: Option<DebateConclusion>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DebateSession {
    /// Create a new in-progress session with 50/50 scores and no rounds
    pub fn new(
        topic: impl Into<String>,
        mode: DebateMode,
        max_rounds: u32,
        owner: Owner,
        user_stance: impl Into<String>,
        stance: StanceAnalysis,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            topic: topic.into(),
            mode,
            max_rounds,
            owner,
            user_stance: user_stance.into(),
            stance,
            rounds: Vec::new(),
            user_score: INITIAL_SCORE,
            ai_score: INITIAL_SCORE,
            status: DebateStatus::InProgress,
            conclusion: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn rounds(&self) -> &[Round] {
        &self.rounds
    }

    pub fn round_count(&self) -> u32 {
        self.rounds.len() as u32
    }

    /// Number the next appended round would get
    pub fn next_round_number(&self) -> u32 {
        self.round_count() + 1
    }

    pub fn user_score(&self) -> u8 {
        self.user_score
    }

    pub fn ai_score(&self) -> u8 {
        self.ai_score
    }

    pub fn status(&self) -> DebateStatus {
        self.status
    }

    pub fn is_ended(&self) -> bool {
        self.status == DebateStatus::Ended
    }

    pub fn conclusion(&self) -> Option<&DebateConclusion> {
        self.conclusion.as_ref()
    }

    /// Evidence items cited across all rounds
    pub fn total_evidence(&self) -> u32 {
        self.rounds.iter().map(|r| r.evidence.len() as u32).sum()
    }

    /// Fallacies detected across all rounds
    pub fn total_fallacies(&self) -> u32 {
        self.rounds
            .iter()
            .map(|r| r.user_fallacies.iter().filter(|f| !f.is_none()).count() as u32)
            .sum()
    }

    /// Append the next round. Fails once the session has ended.
    pub fn push_round(
        &mut self,
        user_argument: impl Into<String>,
        ai_argument: impl Into<String>,
        user_fallacies: Vec<Fallacy>,
        evidence: Vec<Evidence>,
    ) -> Result<&Round, DebateStateError> {
        if self.is_ended() {
            return Err(DebateStateError::AlreadyEnded(self.id));
        }
        let now = Utc::now();
        let round = self.next_round_number();
        self.rounds.push(Round {
            round,
            user_argument: user_argument.into(),
            ai_argument: ai_argument.into(),
            user_fallacies,
            evidence,
            created_at: now,
        });
        self.updated_at = now;
        Ok(&self.rounds[self.rounds.len() - 1])
    }

    /// Replace both scores, clamped to [0, 100]
    pub fn set_scores(&mut self, user_score: u8, ai_score: u8) {
        self.user_score = user_score.min(100);
        self.ai_score = ai_score.min(100);
        self.updated_at = Utc::now();
    }

    /// Move to [`DebateStatus::Ended`]. The conclusion's scores become the
    /// session's final scores. Can only happen once.
    pub fn conclude(&mut self, conclusion: DebateConclusion) -> Result<(), DebateStateError> {
        if self.is_ended() {
            return Err(DebateStateError::AlreadyEnded(self.id));
        }
        self.set_scores(conclusion.user_score, conclusion.ai_score);
        self.status = DebateStatus::Ended;
        self.conclusion = Some(conclusion);
        Ok(())
    }
}

/// Outcome from the user's point of view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Winner {
    User,
    Ai,
    Draw,
}

/// Post-debate recap of an ended session
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DebateSummary {
    #[schema(value_type = String, format = Uuid)]
    pub debate_id: DebateId,
    pub topic: String,
    pub total_rounds: u32,
    pub winner: Winner,
    pub end_reason: EndReason,
    pub user_final_score: u8,
    pub ai_final_score: u8,
    /// The user's main arguments, shortened
    pub key_arguments: Vec<String>,
    pub user_strengths: Vec<String>,
    pub user_weaknesses: Vec<String>,
    pub overall_feedback: String,
}

impl DebateSummary {
    const MAX_KEY_ARGUMENTS: usize = 5;
    const KEY_ARGUMENT_CHARS: usize = 150;

    /// Build a summary; `None` while the debate is still in progress.
    pub fn from_session(session: &DebateSession) -> Option<Self> {
        let conclusion = session.conclusion()?;
        let winner = match conclusion.user_score.cmp(&conclusion.ai_score) {
            std::cmp::Ordering::Greater => Winner::User,
            std::cmp::Ordering::Less => Winner::Ai,
            std::cmp::Ordering::Equal => Winner::Draw,
        };
        let key_arguments = session
            .rounds()
            .iter()
            .take(Self::MAX_KEY_ARGUMENTS)
            .map(|r| truncate_chars(&r.user_argument, Self::KEY_ARGUMENT_CHARS))
            .collect();

        Some(Self {
            debate_id: session.id,
            topic: session.topic.clone(),
            total_rounds: session.round_count(),
            winner,
            end_reason: conclusion.reason,
            user_final_score: conclusion.user_score,
            ai_final_score: conclusion.ai_score,
            key_arguments,
            user_strengths: conclusion.strengths.clone(),
            user_weaknesses: conclusion.weaknesses.clone(),
            overall_feedback: conclusion.feedback.clone(),
        })
    }
}

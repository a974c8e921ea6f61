//! Persistent per-user statistics and the points formula

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Points needed per level
pub const POINTS_PER_LEVEL: u64 = 500;

/// Everything the ledger needs to know about a concluded debate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DebateOutcome {
    /// Final user score strictly above final AI score
    pub won: bool,
    pub rounds: u32,
    pub evidence_count: u32,
    pub fallacy_count: u32,
    pub conceded: bool,
}

impl DebateOutcome {
    /// Won without a single fallacy
    pub fn is_perfect_game(&self) -> bool {
        self.won && self.fallacy_count == 0
    }
}

/// Points earned for one debate.
///
/// A win is worth `100 + 10 * rounds`, anything else a flat 25. Each evidence
/// item adds 5 and each fallacy costs 10; the total never goes below zero.
///
/// # Example
/// ```
/// use rebut_core::{points_for, DebateOutcome};
///
/// let outcome = DebateOutcome { won: true, rounds: 5, evidence_count: 2, fallacy_count: 0, conceded: false };
/// assert_eq!(points_for(&outcome), 160);
/// ```
pub fn points_for(outcome: &DebateOutcome) -> u64 {
    let base: i64 = if outcome.won {
        100 + 10 * i64::from(outcome.rounds)
    } else {
        25
    };
    let total = base + 5 * i64::from(outcome.evidence_count) - 10 * i64::from(outcome.fallacy_count);
    total.max(0) as u64
}

/// Level for a point total: `points / 500 + 1`
pub fn level_for(total_points: u64) -> u32 {
    (total_points / POINTS_PER_LEVEL + 1) as u32
}

/// Cumulative counters for one registered user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct UserStats {
    pub user_id: String,
    pub total_debates: u32,
    pub debates_won: u32,
    pub debates_lost: u32,
    /// Reported for completeness; ties count as losses
    pub debates_drawn: u32,
    pub total_rounds: u32,
    pub fallacies_caught: u32,
    pub evidence_cited: u32,
    pub concessions: u32,
    pub current_streak: u32,
    pub longest_streak: u32,
    pub total_points: u64,
    pub level: u32,
    pub updated_at: DateTime<Utc>,
}

impl UserStats {
    /// Zeroed record at level 1
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            total_debates: 0,
            debates_won: 0,
            debates_lost: 0,
            debates_drawn: 0,
            total_rounds: 0,
            fallacies_caught: 0,
            evidence_cited: 0,
            concessions: 0,
            current_streak: 0,
            longest_streak: 0,
            total_points: 0,
            level: 1,
            updated_at: Utc::now(),
        }
    }

    /// Fold one concluded debate into the counters and return the points earned.
    ///
    /// Win takes priority over concession when both are set.
    pub fn apply_outcome(&mut self, outcome: &DebateOutcome) -> u64 {
        self.total_debates += 1;
        self.total_rounds += outcome.rounds;
        self.evidence_cited += outcome.evidence_count;
        self.fallacies_caught += outcome.fallacy_count;

        if outcome.won {
            self.debates_won += 1;
            self.current_streak += 1;
            self.longest_streak = self.longest_streak.max(self.current_streak);
        } else {
            self.debates_lost += 1;
            self.current_streak = 0;
            if outcome.conceded {
                self.concessions += 1;
            }
        }

        let earned = points_for(outcome);
        self.award_points(earned);
        earned
    }

    /// Add points and recompute the level
    pub fn award_points(&mut self, points: u64) {
        self.total_points += points;
        self.level = level_for(self.total_points);
        self.updated_at = Utc::now();
    }
}

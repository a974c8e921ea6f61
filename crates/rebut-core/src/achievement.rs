//! Achievement catalog
//!
//! Each achievement carries a typed predicate over [`AchievementCounters`]
//! instead of an expression string, so unlocking never evaluates user data.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::stats::{DebateOutcome, UserStats};

/// Counters an unlock condition may look at
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AchievementCounters {
    pub total_debates: u32,
    pub debates_won: u32,
    pub total_rounds: u32,
    pub evidence_cited: u32,
    pub fallacies_caught: u32,
    pub concessions: u32,
    pub current_streak: u32,
    /// The debate just recorded was won with no fallacies
    pub perfect_game: bool,
}

impl AchievementCounters {
    /// Snapshot freshly updated stats together with the debate that produced them
    pub fn after(stats: &UserStats, outcome: &DebateOutcome) -> Self {
        Self {
            total_debates: stats.total_debates,
            debates_won: stats.debates_won,
            total_rounds: stats.total_rounds,
            evidence_cited: stats.evidence_cited,
            fallacies_caught: stats.fallacies_caught,
            concessions: stats.concessions,
            current_streak: stats.current_streak,
            perfect_game: outcome.is_perfect_game(),
        }
    }
}

/// Static catalog entry
#[derive(Debug, Clone, Copy)]
pub struct Achievement {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub icon: &'static str,
    /// Human-readable form of the unlock rule
    pub condition: &'static str,
    pub points: u64,
    predicate: fn(&AchievementCounters) -> bool,
}

impl Achievement {
    pub fn is_satisfied_by(&self, counters: &AchievementCounters) -> bool {
        (self.predicate)(counters)
    }
}

/// Every achievement a user can unlock
pub static ACHIEVEMENTS: [Achievement; 8] = [
    Achievement {
        id: "first_blood",
        name: "First Blood",
        description: "Win your first debate",
        icon: "trophy",
        condition: "debates_won >= 1",
        points: 50,
        predicate: |c| c.debates_won >= 1,
    },
    Achievement {
        id: "evidence_master",
        name: "Evidence Master",
        description: "Cite 10+ evidence sources",
        icon: "book",
        condition: "evidence_cited >= 10",
        points: 100,
        predicate: |c| c.evidence_cited >= 10,
    },
    Achievement {
        id: "fallacy_hunter",
        name: "Fallacy Hunter",
        description: "Get 5 fallacies detected in your arguments",
        icon: "target",
        condition: "fallacies_caught >= 5",
        points: 75,
        predicate: |c| c.fallacies_caught >= 5,
    },
    Achievement {
        id: "marathon_debater",
        name: "Marathon Debater",
        description: "Complete 10 debates",
        icon: "flame",
        condition: "total_debates >= 10",
        points: 150,
        predicate: |c| c.total_debates >= 10,
    },
    Achievement {
        id: "graceful_concession",
        name: "Graceful Concession",
        description: "Concede with honor 3 times",
        icon: "handshake",
        condition: "concessions >= 3",
        points: 100,
        predicate: |c| c.concessions >= 3,
    },
    Achievement {
        id: "winning_streak",
        name: "Winning Streak",
        description: "Win 5 debates in a row",
        icon: "fire",
        condition: "current_streak >= 5",
        points: 200,
        predicate: |c| c.current_streak >= 5,
    },
    Achievement {
        id: "debate_veteran",
        name: "Debate Veteran",
        description: "Complete 50 rounds across all debates",
        icon: "star",
        condition: "total_rounds >= 50",
        points: 250,
        predicate: |c| c.total_rounds >= 50,
    },
    Achievement {
        id: "perfectionist",
        name: "Perfectionist",
        description: "Win a debate with no fallacies detected",
        icon: "gem",
        condition: "perfect_game",
        points: 150,
        predicate: |c| c.perfect_game,
    },
];

/// Look up a catalog entry by id
pub fn find_achievement(id: &str) -> Option<&'static Achievement> {
    ACHIEVEMENTS.iter().find(|a| a.id == id)
}

/// A stored unlock row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct UnlockedAchievement {
    pub achievement_id: String,
    pub unlocked_at: DateTime<Utc>,
}

/// Catalog entry crossed with one user's unlock state
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AchievementStatus {
    pub id: String,
    pub name: String,
    pub description: String,
    pub icon: String,
    pub condition: String,
    pub points: u64,
    pub unlocked: bool,
    pub unlocked_at: Option<DateTime<Utc>>,
}

impl AchievementStatus {
    /// Render the whole catalog against a user's unlocks
    pub fn catalog_for(unlocked: &[UnlockedAchievement]) -> Vec<Self> {
        ACHIEVEMENTS
            .iter()
            .map(|a| {
                let unlocked_at = unlocked
                    .iter()
                    .find(|u| u.achievement_id == a.id)
                    .map(|u| u.unlocked_at);
                Self {
                    id: a.id.to_string(),
                    name: a.name.to_string(),
                    description: a.description.to_string(),
                    icon: a.icon.to_string(),
                    condition: a.condition.to_string(),
                    points: a.points,
                    unlocked: unlocked_at.is_some(),
                    unlocked_at,
                }
            })
            .collect()
    }
}

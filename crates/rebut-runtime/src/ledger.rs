//! Stats/achievement ledger
//!
//! Folds one concluded debate into a user's persistent counters, then runs
//! the achievement unlock pass. The sequence is not atomic: a failure
//! between writes can leave the counters updated without the unlocks. It is
//! also not idempotent, so the pipeline calls it at most once per session.
//!
//! Recording is a load/modify/save of the user's row. Calls through one
//! ledger (and its clones) are serialized so concurrent endings for the same
//! user both land; processes sharing a database are not coordinated and the
//! last save wins.

use chrono::Utc;
use rebut_core::{
    AchievementCounters, AchievementStatus, DebateOutcome, UnlockedAchievement, UserStats,
    ACHIEVEMENTS,
};
use rebut_persist::{ProfileStore, StatsStore, StorageBackend, StorageError};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};
use utoipa::ToSchema;

/// A user's counters together with the whole achievement catalog
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StatsView {
    #[serde(flatten)]
    pub stats: UserStats,
    pub achievements: Vec<AchievementStatus>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct LeaderboardEntry {
    /// 1-based position
    pub rank: u32,
    pub user_id: String,
    pub username: String,
    pub total_points: u64,
    pub debates_won: u32,
    pub level: u32,
    pub achievement_count: u32,
}

/// Persistent stats bookkeeping
#[derive(Debug, Clone)]
pub struct StatsLedger {
    stats: Arc<dyn StatsStore>,
    profiles: ProfileStore<dyn StorageBackend>,
    record_lock: Arc<Mutex<()>>,
}

impl StatsLedger {
    pub fn new(stats: Arc<dyn StatsStore>, profiles: ProfileStore<dyn StorageBackend>) -> Self {
        Self {
            stats,
            profiles,
            record_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn profiles(&self) -> &ProfileStore<dyn StorageBackend> {
        &self.profiles
    }

    async fn load_or_create(&self, user_id: &str) -> Result<UserStats, StorageError> {
        match self.stats.load_stats(user_id).await? {
            Some(stats) => Ok(stats),
            None => {
                let stats = UserStats::new(user_id);
                self.stats.save_stats(&stats).await?;
                Ok(stats)
            }
        }
    }

    /// Record one concluded debate and return the updated stats.
    /// Held under the ledger's record lock for the whole read-modify-write.
    pub async fn record(
        &self,
        user_id: &str,
        outcome: &DebateOutcome,
    ) -> Result<UserStats, StorageError> {
        let _guard = self.record_lock.lock().await;
        let mut stats = self.load_or_create(user_id).await?;
        let earned = stats.apply_outcome(outcome);
        self.stats.save_stats(&stats).await?;

        info!(
            user_id,
            won = outcome.won,
            conceded = outcome.conceded,
            points = earned,
            total_points = stats.total_points,
            "Recorded debate outcome"
        );

        let unlocked = self.stats.unlocked(user_id).await?;
        let counters = AchievementCounters::after(&stats, outcome);

        for achievement in ACHIEVEMENTS.iter() {
            if unlocked.iter().any(|u| u.achievement_id == achievement.id) {
                continue;
            }
            if !achievement.is_satisfied_by(&counters) {
                continue;
            }

            let unlock = UnlockedAchievement {
                achievement_id: achievement.id.to_string(),
                unlocked_at: Utc::now(),
            };
            if self.stats.insert_unlock(user_id, &unlock).await? {
                stats.award_points(achievement.points);
                self.stats.save_stats(&stats).await?;
                info!(
                    user_id,
                    achievement = achievement.id,
                    points = achievement.points,
                    "Achievement unlocked"
                );
            } else {
                debug!(user_id, achievement = achievement.id, "Achievement already recorded");
            }
        }

        Ok(stats)
    }

    /// Counters plus the catalog crossed with this user's unlocks.
    /// Unknown users get a zeroed record, which is persisted.
    pub async fn stats_view(&self, user_id: &str) -> Result<StatsView, StorageError> {
        let stats = self.load_or_create(user_id).await?;
        let unlocked = self.stats.unlocked(user_id).await?;
        Ok(StatsView {
            stats,
            achievements: AchievementStatus::catalog_for(&unlocked),
        })
    }

    /// Top users by points. Usernames fall back to the user id.
    pub async fn leaderboard(&self, limit: usize) -> Result<Vec<LeaderboardEntry>, StorageError> {
        let top = self.stats.top_by_points(limit).await?;
        let mut entries = Vec::with_capacity(top.len());

        for (idx, stats) in top.into_iter().enumerate() {
            let username = self
                .profiles
                .username_of(&stats.user_id)
                .await?
                .unwrap_or_else(|| stats.user_id.clone());
            let achievement_count = self.stats.unlock_count(&stats.user_id).await?;
            entries.push(LeaderboardEntry {
                rank: idx as u32 + 1,
                user_id: stats.user_id,
                username,
                total_points: stats.total_points,
                debates_won: stats.debates_won,
                level: stats.level,
                achievement_count,
            });
        }

        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rebut_persist::{MemoryBackend, MemoryStatsStore};

    fn ledger() -> StatsLedger {
        let backend: Arc<dyn StorageBackend> = Arc::new(MemoryBackend::new());
        StatsLedger::new(Arc::new(MemoryStatsStore::new()), ProfileStore::new(backend))
    }

    fn win(rounds: u32, evidence_count: u32, fallacy_count: u32) -> DebateOutcome {
        DebateOutcome {
            won: true,
            rounds,
            evidence_count,
            fallacy_count,
            conceded: false,
        }
    }

    #[tokio::test]
    async fn test_first_win_unlocks_once() {
        let ledger = ledger();

        // 160 for the win, 50 first_blood, 150 perfectionist
        let stats = ledger.record("alice", &win(5, 2, 0)).await.unwrap();
        assert_eq!(stats.total_points, 360);
        assert_eq!(stats.level, 1);
        assert_eq!(stats.debates_won, 1);

        let stats = ledger.record("alice", &win(5, 2, 0)).await.unwrap();
        assert_eq!(stats.total_points, 520);
        assert_eq!(stats.level, 2);
        assert_eq!(stats.current_streak, 2);

        let view = ledger.stats_view("alice").await.unwrap();
        let unlocked: Vec<_> = view
            .achievements
            .iter()
            .filter(|a| a.unlocked)
            .map(|a| a.id.as_str())
            .collect();
        assert_eq!(unlocked, vec!["first_blood", "perfectionist"]);
    }

    #[tokio::test]
    async fn test_concession_resets_streak() {
        let ledger = ledger();
        ledger.record("bob", &win(3, 0, 1)).await.unwrap();

        let stats = ledger
            .record(
                "bob",
                &DebateOutcome {
                    won: false,
                    rounds: 2,
                    evidence_count: 0,
                    fallacy_count: 0,
                    conceded: true,
                },
            )
            .await
            .unwrap();

        assert_eq!(stats.total_debates, 2);
        assert_eq!(stats.debates_lost, 1);
        assert_eq!(stats.concessions, 1);
        assert_eq!(stats.current_streak, 0);
        assert_eq!(stats.longest_streak, 1);
        assert_eq!(stats.debates_drawn, 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_endings_for_one_user_all_count() {
        let ledger = ledger();
        let tasks: Vec<_> = (0..16)
            .map(|_| {
                let ledger = ledger.clone();
                tokio::spawn(async move { ledger.record("erin", &win(3, 1, 0)).await })
            })
            .collect();
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        let stats = ledger.stats_view("erin").await.unwrap().stats;
        assert_eq!(stats.total_debates, 16);
        assert_eq!(stats.debates_won, 16);
        assert_eq!(stats.current_streak, 16);
    }

    #[tokio::test]
    async fn test_stats_view_creates_zeroed_record() {
        let ledger = ledger();
        let view = ledger.stats_view("newcomer").await.unwrap();

        assert_eq!(view.stats.total_debates, 0);
        assert_eq!(view.stats.level, 1);
        assert_eq!(view.achievements.len(), ACHIEVEMENTS.len());
        assert!(view.achievements.iter().all(|a| !a.unlocked));

        let board = ledger.leaderboard(10).await.unwrap();
        assert_eq!(board.len(), 1);
        assert_eq!(board[0].user_id, "newcomer");
    }

    #[tokio::test]
    async fn test_leaderboard_ranks_and_usernames() {
        let ledger = ledger();
        ledger.profiles().upsert("carol", Some("Carol")).await.unwrap();

        ledger.record("carol", &win(5, 0, 0)).await.unwrap();
        ledger
            .record(
                "dave",
                &DebateOutcome {
                    won: false,
                    rounds: 1,
                    evidence_count: 0,
                    fallacy_count: 0,
                    conceded: false,
                },
            )
            .await
            .unwrap();

        let board = ledger.leaderboard(10).await.unwrap();
        assert_eq!(board.len(), 2);
        assert_eq!(board[0].rank, 1);
        assert_eq!(board[0].username, "Carol");
        assert_eq!(board[0].achievement_count, 2);
        assert_eq!(board[1].rank, 2);
        assert_eq!(board[1].username, "dave");
        assert_eq!(board[1].total_points, 25);

        assert_eq!(ledger.leaderboard(1).await.unwrap().len(), 1);
    }
}

//! User statistics and achievement unlock storage

use async_trait::async_trait;
use rebut_core::{UnlockedAchievement, UserStats};
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::backend::StorageError;

/// Typed storage for [`UserStats`] rows and achievement unlocks
#[async_trait]
pub trait StatsStore: Send + Sync + std::fmt::Debug {
    /// Load a user's stats, if a record exists
    async fn load_stats(&self, user_id: &str) -> Result<Option<UserStats>, StorageError>;

    /// Insert or replace a user's stats
    async fn save_stats(&self, stats: &UserStats) -> Result<(), StorageError>;

    /// Every achievement the user has unlocked, oldest first
    async fn unlocked(&self, user_id: &str) -> Result<Vec<UnlockedAchievement>, StorageError>;

    /// Record an unlock. Returns false if it was already recorded.
    async fn insert_unlock(
        &self,
        user_id: &str,
        unlock: &UnlockedAchievement,
    ) -> Result<bool, StorageError>;

    /// Number of achievements the user has unlocked
    async fn unlock_count(&self, user_id: &str) -> Result<u32, StorageError>;

    /// Top users by total points, descending. Ties keep insertion order.
    async fn top_by_points(&self, limit: usize) -> Result<Vec<UserStats>, StorageError>;
}

/// In-memory [`StatsStore`]
#[derive(Debug, Default)]
pub struct MemoryStatsStore {
    /// Insertion-ordered rows
    stats: RwLock<Vec<UserStats>>,
    unlocks: RwLock<HashMap<String, Vec<UnlockedAchievement>>>,
}

impl MemoryStatsStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StatsStore for MemoryStatsStore {
    async fn load_stats(&self, user_id: &str) -> Result<Option<UserStats>, StorageError> {
        let stats = self.stats.read().await;
        Ok(stats.iter().find(|s| s.user_id == user_id).cloned())
    }

    async fn save_stats(&self, record: &UserStats) -> Result<(), StorageError> {
        let mut stats = self.stats.write().await;
        match stats.iter_mut().find(|s| s.user_id == record.user_id) {
            Some(existing) => *existing = record.clone(),
            None => stats.push(record.clone()),
        }
        Ok(())
    }

    async fn unlocked(&self, user_id: &str) -> Result<Vec<UnlockedAchievement>, StorageError> {
        let unlocks = self.unlocks.read().await;
        Ok(unlocks.get(user_id).cloned().unwrap_or_default())
    }

    async fn insert_unlock(
        &self,
        user_id: &str,
        unlock: &UnlockedAchievement,
    ) -> Result<bool, StorageError> {
        let mut unlocks = self.unlocks.write().await;
        let entries = unlocks.entry(user_id.to_string()).or_default();
        if entries
            .iter()
            .any(|u| u.achievement_id == unlock.achievement_id)
        {
            return Ok(false);
        }
        entries.push(unlock.clone());
        Ok(true)
    }

    async fn unlock_count(&self, user_id: &str) -> Result<u32, StorageError> {
        let unlocks = self.unlocks.read().await;
        Ok(unlocks.get(user_id).map(|u| u.len() as u32).unwrap_or(0))
    }

    async fn top_by_points(&self, limit: usize) -> Result<Vec<UserStats>, StorageError> {
        let mut rows = self.stats.read().await.clone();
        // Stable sort keeps insertion order among equal totals
        rows.sort_by(|a, b| b.total_points.cmp(&a.total_points));
        rows.truncate(limit);
        Ok(rows)
    }
}

#[cfg(feature = "sqlite")]
pub use sqlite_impl::SqliteStatsStore;

#[cfg(feature = "sqlite")]
mod sqlite_impl {
    use super::*;
    use chrono::{DateTime, Utc};
    use sqlx::sqlite::{SqlitePool, SqliteRow};
    use sqlx::Row;

    const STATS_COLUMNS: &str = "user_id, total_debates, debates_won, debates_lost, debates_drawn, \
         total_rounds, fallacies_caught, evidence_cited, concessions, current_streak, \
         longest_streak, total_points, level, updated_at";

    /// SQLite [`StatsStore`] over the `user_stats` and `user_achievements` tables
    #[derive(Debug, Clone)]
    pub struct SqliteStatsStore {
        pool: SqlitePool,
    }

    impl SqliteStatsStore {
        /// The pool must already have the migrations applied
        pub fn new(pool: SqlitePool) -> Self {
            Self { pool }
        }

        fn row_to_stats(row: &SqliteRow) -> Result<UserStats, sqlx::Error> {
            let count = |name: &str| -> Result<u32, sqlx::Error> {
                Ok(row.try_get::<i64, _>(name)?.max(0) as u32)
            };
            Ok(UserStats {
                user_id: row.try_get("user_id")?,
                total_debates: count("total_debates")?,
                debates_won: count("debates_won")?,
                debates_lost: count("debates_lost")?,
                debates_drawn: count("debates_drawn")?,
                total_rounds: count("total_rounds")?,
                fallacies_caught: count("fallacies_caught")?,
                evidence_cited: count("evidence_cited")?,
                concessions: count("concessions")?,
                current_streak: count("current_streak")?,
                longest_streak: count("longest_streak")?,
                total_points: row.try_get::<i64, _>("total_points")?.max(0) as u64,
                level: count("level")?,
                updated_at: row.try_get::<DateTime<Utc>, _>("updated_at")?,
            })
        }
    }

    #[async_trait]
    impl StatsStore for SqliteStatsStore {
        async fn load_stats(&self, user_id: &str) -> Result<Option<UserStats>, StorageError> {
            let row = sqlx::query(&format!(
                "SELECT {} FROM user_stats WHERE user_id = ?",
                STATS_COLUMNS
            ))
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
            Ok(row.as_ref().map(Self::row_to_stats).transpose()?)
        }

        async fn save_stats(&self, stats: &UserStats) -> Result<(), StorageError> {
            sqlx::query(&format!(
                r#"
                INSERT INTO user_stats ({}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                ON CONFLICT(user_id) DO UPDATE SET
                    total_debates = excluded.total_debates,
                    debates_won = excluded.debates_won,
                    debates_lost = excluded.debates_lost,
                    debates_drawn = excluded.debates_drawn,
                    total_rounds = excluded.total_rounds,
                    fallacies_caught = excluded.fallacies_caught,
                    evidence_cited = excluded.evidence_cited,
                    concessions = excluded.concessions,
                    current_streak = excluded.current_streak,
                    longest_streak = excluded.longest_streak,
                    total_points = excluded.total_points,
                    level = excluded.level,
                    updated_at = excluded.updated_at
                "#,
                STATS_COLUMNS
            ))
            .bind(&stats.user_id)
            .bind(i64::from(stats.total_debates))
            .bind(i64::from(stats.debates_won))
            .bind(i64::from(stats.debates_lost))
            .bind(i64::from(stats.debates_drawn))
            .bind(i64::from(stats.total_rounds))
            .bind(i64::from(stats.fallacies_caught))
            .bind(i64::from(stats.evidence_cited))
            .bind(i64::from(stats.concessions))
            .bind(i64::from(stats.current_streak))
            .bind(i64::from(stats.longest_streak))
            .bind(stats.total_points as i64)
            .bind(i64::from(stats.level))
            .bind(stats.updated_at)
            .execute(&self.pool)
            .await?;
            Ok(())
        }

        async fn unlocked(&self, user_id: &str) -> Result<Vec<UnlockedAchievement>, StorageError> {
            let rows = sqlx::query(
                "SELECT achievement_id, unlocked_at FROM user_achievements WHERE user_id = ? ORDER BY id",
            )
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;

            let mut unlocked = Vec::with_capacity(rows.len());
            for row in rows {
                unlocked.push(UnlockedAchievement {
                    achievement_id: row.try_get("achievement_id")?,
                    unlocked_at: row.try_get("unlocked_at")?,
                });
            }
            Ok(unlocked)
        }

        async fn insert_unlock(
            &self,
            user_id: &str,
            unlock: &UnlockedAchievement,
        ) -> Result<bool, StorageError> {
            let result = sqlx::query(
                "INSERT OR IGNORE INTO user_achievements (user_id, achievement_id, unlocked_at) VALUES (?, ?, ?)",
            )
            .bind(user_id)
            .bind(&unlock.achievement_id)
            .bind(unlock.unlocked_at)
            .execute(&self.pool)
            .await?;
            Ok(result.rows_affected() == 1)
        }

        async fn unlock_count(&self, user_id: &str) -> Result<u32, StorageError> {
            let count: i64 =
                sqlx::query_scalar("SELECT COUNT(*) FROM user_achievements WHERE user_id = ?")
                    .bind(user_id)
                    .fetch_one(&self.pool)
                    .await?;
            Ok(count.max(0) as u32)
        }

        async fn top_by_points(&self, limit: usize) -> Result<Vec<UserStats>, StorageError> {
            let rows = sqlx::query(&format!(
                "SELECT {} FROM user_stats ORDER BY total_points DESC, rowid ASC LIMIT ?",
                STATS_COLUMNS
            ))
            .bind(limit as i64)
            .fetch_all(&self.pool)
            .await?;
            Ok(rows
                .iter()
                .map(Self::row_to_stats)
                .collect::<Result<Vec<_>, _>>()?)
        }
    }
}

//! # Rebut Core
//!
//! Domain types for the debate service:
//! - [`DebateSession`]: One debate with its append-only [`Round`] history
//! - [`Evidence`] and [`Fallacy`]: Auxiliary data attached to each round
//! - [`UserStats`]: Persistent per-user counters, points and level
//! - [`ACHIEVEMENTS`]: Static achievement catalog with typed unlock predicates
//!
//! Nothing in this crate performs I/O.

pub mod achievement;
pub mod debate;
pub mod error;
pub mod evidence;
pub mod fallacy;
pub mod stats;
pub mod text;

pub use achievement::{
    find_achievement, Achievement, AchievementCounters, AchievementStatus, UnlockedAchievement,
    ACHIEVEMENTS,
};
pub use debate::{
    DebateConclusion, DebateId, DebateMode, DebateSession, DebateStatus, DebateSummary,
    EndReason, Owner, Round, StanceAnalysis, Winner,
};
pub use error::DebateStateError;
pub use evidence::{Evidence, DEFAULT_CREDIBILITY, SNIPPET_MAX_CHARS};
pub use fallacy::{Fallacy, FallacyType, Severity, UnknownVariant};
pub use stats::{level_for, points_for, DebateOutcome, UserStats, POINTS_PER_LEVEL};

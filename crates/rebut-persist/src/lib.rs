//! # Rebut Persistence
//!
//! Storage for everything that outlives a process:
//! - [`StatsStore`]: Per-user counters and achievement unlocks
//! - [`ProfileStore`]: Usernames for registered users
//!
//! Supports:
//! - In-memory (for testing and offline runs)
//! - SQLite (single node, with embedded migrations)
//!
//! Debate sessions themselves are not persisted.

pub mod backend;
pub mod profile_store;
#[cfg(feature = "sqlite")]
pub mod sqlite;
pub mod stats_store;

pub use backend::{MemoryBackend, StorageBackend, StorageError, StorageExt};
pub use profile_store::{ProfileStore, UserProfile};
#[cfg(feature = "sqlite")]
pub use sqlite::{SqliteBackend, SqliteConfig};
#[cfg(feature = "sqlite")]
pub use stats_store::SqliteStatsStore;
pub use stats_store::{MemoryStatsStore, StatsStore};

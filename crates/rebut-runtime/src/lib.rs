//! # Rebut Runtime
//!
//! Tokio-based debate orchestration:
//! - [`RoundPipeline`] drives the start / continue / end state machine
//! - [`SessionStore`] holds live sessions behind per-session locks
//! - [`StatsLedger`] folds concluded debates into persistent user stats

pub mod config;
pub mod error;
pub mod ledger;
pub mod pipeline;
pub mod session_store;

pub use config::{PipelineConfig, SessionStoreConfig};
pub use error::DebateError;
pub use ledger::{LeaderboardEntry, StatsLedger, StatsView};
pub use pipeline::{DebateResponse, RoundPipeline, StartDebate};
pub use session_store::{SessionStore, SharedSession};

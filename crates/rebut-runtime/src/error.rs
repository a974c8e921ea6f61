//! Errors surfaced by the round pipeline and ledger

use rebut_agents::AgentError;
use rebut_core::{DebateId, DebateStateError};
use rebut_persist::StorageError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DebateError {
    #[error("Debate not found: {0}")]
    NotFound(DebateId),

    /// A summary was requested while the debate is still running
    #[error("Debate {0} has not ended yet")]
    NotEnded(DebateId),

    #[error(transparent)]
    State(#[from] DebateStateError),

    /// The counter-argument could not be produced
    #[error("Upstream failure: {0}")]
    Upstream(#[from] AgentError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

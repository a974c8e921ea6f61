//! Errors raised by domain state transitions

use thiserror::Error;
use uuid::Uuid;

/// Invalid transition on a [`crate::DebateSession`]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DebateStateError {
    #[error("Debate {0} has already ended")]
    AlreadyEnded(Uuid),
}

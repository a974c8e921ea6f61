//! Agent errors

use rebut_llm::LlmError;
use thiserror::Error;

/// Failure of an agent without a fallback
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("Text completion failed: {0}")]
    Llm(#[from] LlmError),
    #[error("Text completion returned an empty response")]
    EmptyResponse,
}

use rebut_llm::{LlmError, LlmProvider, LlmRequest};
use std::time::Duration;

/// One completion call bounded by `timeout`; expiry maps to [`LlmError::Timeout`].
pub(crate) async fn complete_text(
    llm: &dyn LlmProvider,
    request: LlmRequest,
    timeout: Duration,
) -> Result<String, LlmError> {
    match tokio::time::timeout(timeout, llm.complete(request)).await {
        Ok(result) => result.map(|r| r.content),
        Err(_) => Err(LlmError::Timeout(timeout.as_millis() as u64)),
    }
}

//! Shared parsing policy for model output
//!
//! Output is trimmed, a surrounding code fence (optionally tagged `json`) is
//! removed, and the remainder is parsed as JSON. When that fails, the widest
//! `{...}` or `[...]` slice is tried before giving up.

use serde::de::DeserializeOwned;

/// Remove a leading code fence and everything from the closing fence on.
pub fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    match rest.find("```") {
        Some(end) => rest[..end].trim(),
        None => rest.trim(),
    }
}

/// Parse model output as JSON
pub fn parse_json<T: DeserializeOwned>(text: &str) -> Result<T, serde_json::Error> {
    let content = strip_code_fence(text);
    match serde_json::from_str(content) {
        Ok(value) => Ok(value),
        Err(e) => embedded_json(content).map_or(Err(e), |json| serde_json::from_str(json)),
    }
}

fn embedded_json(content: &str) -> Option<&str> {
    let start = content.find(['{', '['])?;
    let close = if content[start..].starts_with('{') { '}' } else { ']' };
    let end = content.rfind(close)?;
    (end > start).then(|| &content[start..=end])
}

//! Settings shared by every agent

use std::env;
use std::time::Duration;

/// Agent configuration
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// Sampling temperature for completion calls
    pub temperature: f32,
    /// Completion budget per call
    pub max_tokens: u32,
    /// Upper bound on any single completion or search call
    pub timeout: Duration,
    /// Rounds of history the argument generator sees
    pub history_window: usize,
    /// Evidence items kept per search
    pub evidence_limit: usize,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            max_tokens: 2048,
            timeout: Duration::from_secs(30),
            history_window: 3,
            evidence_limit: 3,
        }
    }
}

impl AgentConfig {
    /// Load from environment
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            temperature: parse_var("REBUT_LLM_TEMPERATURE").unwrap_or(defaults.temperature),
            max_tokens: parse_var("REBUT_LLM_MAX_TOKENS").unwrap_or(defaults.max_tokens),
            timeout: parse_var("REBUT_ADAPTER_TIMEOUT_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.timeout),
            history_window: parse_var("REBUT_HISTORY_WINDOW").unwrap_or(defaults.history_window),
            evidence_limit: parse_var("REBUT_EVIDENCE_SOURCES_LIMIT")
                .unwrap_or(defaults.evidence_limit),
        }
    }

    /// Same settings with a different timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

fn parse_var<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

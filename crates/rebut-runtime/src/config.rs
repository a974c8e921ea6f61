//! Runtime configuration

use rebut_agents::AgentConfig;
use std::env;
use std::time::Duration;

/// Bounds on the in-memory session store
#[derive(Debug, Clone)]
pub struct SessionStoreConfig {
    /// Sessions untouched for this long are evicted
    pub idle_timeout: Duration,
    pub max_sessions: u64,
}

impl Default for SessionStoreConfig {
    fn default() -> Self {
        Self {
            idle_timeout: Duration::from_secs(3600),
            max_sessions: 10_000,
        }
    }
}

impl SessionStoreConfig {
    /// Load from `REBUT_SESSION_IDLE_SECS` and `REBUT_MAX_SESSIONS`
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            idle_timeout: env::var("REBUT_SESSION_IDLE_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.idle_timeout),
            max_sessions: env::var("REBUT_MAX_SESSIONS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.max_sessions),
        }
    }
}

/// Round pipeline configuration
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Used when a start request does not name a round limit
    pub default_max_rounds: u32,
    /// Settings handed to every agent
    pub agents: AgentConfig,
    pub sessions: SessionStoreConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            default_max_rounds: 5,
            agents: AgentConfig::default(),
            sessions: SessionStoreConfig::default(),
        }
    }
}

impl PipelineConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            default_max_rounds: env::var("REBUT_DEFAULT_MAX_ROUNDS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.default_max_rounds),
            agents: AgentConfig::from_env(),
            sessions: SessionStoreConfig::from_env(),
        }
    }
}

//! Provider configuration
//!
//! Reads API keys and model settings from the environment and builds the
//! matching providers. Missing keys fall back to the mock providers so the
//! service stays runnable offline.

use serde::{Deserialize, Serialize};
use std::env;
use std::sync::Arc;

use crate::groq::GroqProvider;
use crate::metered::{MeteredProvider, MeteredSearchProvider};
use crate::metrics::global_metrics;
use crate::mock::{MockProvider, MockSearchProvider};
use crate::provider::{LlmProvider, LlmRequest};
use crate::search::SearchProvider;
use crate::tavily::TavilyProvider;

/// Text completion and search settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Groq API key (env: GROQ_API_KEY)
    pub groq_api_key: Option<String>,
    /// Model name (env: GROQ_MODEL)
    pub groq_model: String,
    /// Endpoint (env: GROQ_BASE_URL)
    pub groq_base_url: String,
    /// Sampling temperature (env: REBUT_LLM_TEMPERATURE)
    pub temperature: f32,
    /// Completion budget (env: REBUT_LLM_MAX_TOKENS)
    pub max_tokens: u32,
    /// Tavily API key (env: TAVILY_API_KEY)
    pub tavily_api_key: Option<String>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            groq_api_key: None,
            groq_model: GroqProvider::DEFAULT_MODEL.to_string(),
            groq_base_url: GroqProvider::DEFAULT_BASE_URL.to_string(),
            temperature: LlmRequest::DEFAULT_TEMPERATURE,
            max_tokens: LlmRequest::DEFAULT_MAX_TOKENS,
            tavily_api_key: None,
        }
    }
}

impl LlmConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            groq_api_key: non_empty_var("GROQ_API_KEY"),
            groq_model: env::var("GROQ_MODEL").unwrap_or(defaults.groq_model),
            groq_base_url: env::var("GROQ_BASE_URL").unwrap_or(defaults.groq_base_url),
            temperature: env::var("REBUT_LLM_TEMPERATURE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.temperature),
            max_tokens: env::var("REBUT_LLM_MAX_TOKENS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.max_tokens),
            tavily_api_key: non_empty_var("TAVILY_API_KEY"),
        }
    }

    /// Build the text completion provider, wrapped for metrics
    pub fn build_llm(&self) -> Arc<dyn LlmProvider> {
        match &self.groq_api_key {
            Some(key) => {
                let provider = GroqProvider::new(key, &self.groq_model)
                    .with_base_url(&self.groq_base_url);
                Arc::new(MeteredProvider::new(provider, global_metrics()))
            }
            None => {
                tracing::warn!("GROQ_API_KEY not set, using mock text completion provider");
                Arc::new(MeteredProvider::new(MockProvider::smart(), global_metrics()))
            }
        }
    }

    /// Build the evidence search provider, wrapped for metrics
    pub fn build_search(&self) -> Arc<dyn SearchProvider> {
        match &self.tavily_api_key {
            Some(key) => Arc::new(MeteredSearchProvider::new(
                TavilyProvider::new(key),
                global_metrics(),
            )),
            None => {
                tracing::warn!("TAVILY_API_KEY not set, using mock evidence search provider");
                Arc::new(MeteredSearchProvider::new(
                    MockSearchProvider::with_sample_hits(),
                    global_metrics(),
                ))
            }
        }
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

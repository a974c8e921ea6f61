//! Evidence search service trait and common types

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from search providers
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),
    #[error("Request failed: {0}")]
    RequestFailed(String),
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
    #[error("Provider not available")]
    NotAvailable,
}

/// How hard the search service should dig
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchDepth {
    Basic,
    #[default]
    Advanced,
}

/// A search query
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchRequest {
    pub query: String,
    pub depth: SearchDepth,
    pub max_results: usize,
}

impl SearchRequest {
    pub fn new(query: impl Into<String>, max_results: usize) -> Self {
        Self {
            query: query.into(),
            depth: SearchDepth::Advanced,
            max_results,
        }
    }
}

/// One raw ranked hit. Every field may be missing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub title: Option<String>,
    pub url: Option<String>,
    pub content: Option<String>,
    pub score: Option<f64>,
}

/// Evidence search service: query in, ranked snippets out
#[async_trait]
pub trait SearchProvider: Send + Sync + std::fmt::Debug {
    fn name(&self) -> &str;

    async fn search(&self, request: SearchRequest) -> Result<Vec<SearchHit>, SearchError>;
}

//! Tavily search provider

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::search::{SearchDepth, SearchError, SearchHit, SearchProvider, SearchRequest};

#[derive(Debug, Serialize)]
struct TavilyRequest<'a> {
    api_key: &'a str,
    query: &'a str,
    search_depth: SearchDepth,
    max_results: usize,
}

#[derive(Debug, Deserialize)]
struct TavilyResponse {
    #[serde(default)]
    results: Vec<SearchHit>,
}

/// Tavily web search client
#[derive(Debug)]
pub struct TavilyProvider {
    api_key: String,
    client: reqwest::Client,
    base_url: String,
}

impl TavilyProvider {
    pub const DEFAULT_BASE_URL: &'static str = "https://api.tavily.com";

    pub fn new(api_key: &str) -> Self {
        Self {
            api_key: api_key.to_string(),
            client: reqwest::Client::new(),
            base_url: Self::DEFAULT_BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }
}

#[async_trait]
impl SearchProvider for TavilyProvider {
    fn name(&self) -> &str {
        "tavily"
    }

    async fn search(&self, request: SearchRequest) -> Result<Vec<SearchHit>, SearchError> {
        let body = TavilyRequest {
            api_key: &self.api_key,
            query: &request.query,
            search_depth: request.depth,
            max_results: request.max_results,
        };

        let response = self
            .client
            .post(format!("{}/search", self.base_url))
            .json(&body)
            .send()
            .await
            .map_err(|e| SearchError::ConnectionFailed(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(SearchError::RequestFailed(format!(
                "Status: {}, Body: {}",
                status, body
            )));
        }

        let parsed: TavilyResponse = response
            .json()
            .await
            .map_err(|e| SearchError::InvalidResponse(e.to_string()))?;

        Ok(parsed.results)
    }
}

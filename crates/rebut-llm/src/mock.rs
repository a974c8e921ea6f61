//! Mock providers for testing and offline runs

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::provider::{LlmError, LlmProvider, LlmRequest, LlmResponse};
use crate::search::{SearchError, SearchHit, SearchProvider, SearchRequest};

/// A mock completion provider.
///
/// Either cycles through canned responses, or (the `smart` variant) answers
/// based on which debate agent is asking. Every request is recorded.
#[derive(Debug)]
pub struct MockProvider {
    pub name: String,
    /// Canned responses (cycles through them)
    responses: Vec<String>,
    /// `(marker, response)` pairs checked before the built-in smart answers
    rules: Vec<(String, String)>,
    index: AtomicUsize,
    latency_ms: u64,
    failure: Option<String>,
    requests: Mutex<Vec<LlmRequest>>,
}

impl MockProvider {
    /// Create a new mock provider with given responses
    pub fn new(responses: Vec<String>) -> Self {
        Self {
            name: "mock".to_string(),
            responses,
            rules: Vec::new(),
            index: AtomicUsize::new(0),
            latency_ms: 0,
            failure: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Create a mock that always returns the same response
    pub fn constant(response: &str) -> Self {
        Self::new(vec![response.to_string()])
    }

    /// Create a mock that answers each debate agent with plausible output
    pub fn smart() -> Self {
        Self {
            name: "smart-mock".to_string(),
            ..Self::new(vec![])
        }
    }

    /// Create a mock whose every call fails
    pub fn failing(message: &str) -> Self {
        Self {
            failure: Some(message.to_string()),
            ..Self::new(vec![])
        }
    }

    /// Answer with `response` whenever the system prompt or prompt contains
    /// `marker` (case-insensitive). Earlier rules win.
    pub fn with_rule(mut self, marker: &str, response: &str) -> Self {
        self.rules
            .push((marker.to_lowercase(), response.to_string()));
        self
    }

    /// Simulate latency on every call
    pub fn with_latency(mut self, latency_ms: u64) -> Self {
        self.latency_ms = latency_ms;
        self
    }

    /// Number of completed or failed calls so far
    pub fn call_count(&self) -> usize {
        self.requests.lock().map(|r| r.len()).unwrap_or(0)
    }

    /// Copies of every request received
    pub fn requests(&self) -> Vec<LlmRequest> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }

    fn generate_smart_response(&self, request: &LlmRequest) -> String {
        let haystack = format!("{}\n{}", request.system, request.prompt).to_lowercase();

        if let Some((_, response)) = self.rules.iter().find(|(m, _)| haystack.contains(m)) {
            return response.clone();
        }

        let system = request.system.to_lowercase();
        if system.contains("stance") {
            return r#"{"stance": "for", "key_claims": ["The main claim"], "argument_structure": "logical", "strength": 7}"#
                .to_string();
        }
        if system.contains("fallac") {
            return "[]".to_string();
        }
        if system.contains("moderator") {
            return "```json\n{\"should_end\": false, \"user_score\": 55, \"ai_score\": 45, \
                    \"user_strengths\": [\"Clear structure\"], \
                    \"user_weaknesses\": [\"Limited evidence\"], \
                    \"suggestions\": \"Back your next point with a concrete study.\", \
                    \"final_feedback\": \"A well-argued exchange.\"}\n```"
                .to_string();
        }

        "While your point has some merit, the evidence points the other way. \
         Consider the broader consequences before drawing that conclusion."
            .to_string()
    }
}

#[async_trait]
impl LlmProvider for MockProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn is_available(&self) -> bool {
        self.failure.is_none()
    }

    async fn complete(&self, request: LlmRequest) -> Result<LlmResponse, LlmError> {
        let start = Instant::now();

        if self.latency_ms > 0 {
            tokio::time::sleep(Duration::from_millis(self.latency_ms)).await;
        }

        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request.clone());
        }

        if let Some(message) = &self.failure {
            return Err(LlmError::RequestFailed(message.clone()));
        }

        let content = if self.responses.is_empty() {
            self.generate_smart_response(&request)
        } else {
            let idx = self.index.fetch_add(1, Ordering::Relaxed);
            self.responses[idx % self.responses.len()].clone()
        };

        Ok(LlmResponse {
            content,
            model: self.name.clone(),
            tokens_used: Some((request.prompt.len() / 4) as u32 + 100),
            latency_ms: start.elapsed().as_millis() as u64,
        })
    }
}

/// A mock evidence search provider returning fixed hits
#[derive(Debug)]
pub struct MockSearchProvider {
    hits: Vec<SearchHit>,
    failure: Option<String>,
    latency_ms: u64,
    requests: Mutex<Vec<SearchRequest>>,
}

impl MockSearchProvider {
    pub fn new(hits: Vec<SearchHit>) -> Self {
        Self {
            hits,
            failure: None,
            latency_ms: 0,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Three plausible research hits
    pub fn with_sample_hits() -> Self {
        let hits = (1..=3)
            .map(|i| SearchHit {
                title: Some(format!("Research Study {}", i)),
                url: Some(format!("https://research.example.org/study-{}", i)),
                content: Some(format!(
                    "Study {} found measurable effects across a large sample of participants.",
                    i
                )),
                score: Some(0.9 - 0.1 * i as f64),
            })
            .collect();
        Self::new(hits)
    }

    /// Every search fails
    pub fn failing(message: &str) -> Self {
        Self {
            failure: Some(message.to_string()),
            ..Self::new(vec![])
        }
    }

    pub fn with_latency(mut self, latency_ms: u64) -> Self {
        self.latency_ms = latency_ms;
        self
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().map(|r| r.len()).unwrap_or(0)
    }

    pub fn requests(&self) -> Vec<SearchRequest> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl SearchProvider for MockSearchProvider {
    fn name(&self) -> &str {
        "mock-search"
    }

    async fn search(&self, request: SearchRequest) -> Result<Vec<SearchHit>, SearchError> {
        if self.latency_ms > 0 {
            tokio::time::sleep(Duration::from_millis(self.latency_ms)).await;
        }

        let max_results = request.max_results;
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request);
        }

        if let Some(message) = &self.failure {
            return Err(SearchError::ConnectionFailed(message.clone()));
        }

        Ok(self.hits.iter().take(max_results).cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_provider() {
        let mock = MockProvider::constant("Hello, world!");
        let response = mock.ask("test").await.unwrap();
        assert_eq!(response, "Hello, world!");
        assert_eq!(mock.call_count(), 1);
    }

    #[tokio::test]
    async fn test_smart_mock_routes_by_role() {
        let mock = MockProvider::smart();
        let stance = mock
            .complete(LlmRequest::with_role("You are a stance analyzer.", "..."))
            .await
            .unwrap();
        assert!(stance.content.contains("\"stance\""));

        let moderator = mock
            .complete(LlmRequest::with_role("You are a debate moderator.", "..."))
            .await
            .unwrap();
        assert!(moderator.content.contains("should_end"));
    }

    #[tokio::test]
    async fn test_rules_take_precedence() {
        let mock = MockProvider::smart().with_rule("moderator", "not json");
        let response = mock
            .complete(LlmRequest::with_role("You are a debate moderator.", "..."))
            .await
            .unwrap();
        assert_eq!(response.content, "not json");
    }

    #[tokio::test]
    async fn test_failing_mock() {
        let mock = MockProvider::failing("boom");
        assert!(mock.ask("x").await.is_err());
        assert!(!mock.is_available().await);
    }

    #[tokio::test]
    async fn test_search_mock_respects_max_results() {
        let search = MockSearchProvider::with_sample_hits();
        let hits = search.search(SearchRequest::new("q", 2)).await.unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(search.requests()[0].query, "q");
    }
}

//! Provider wrappers that count calls into [`Metrics`]

use async_trait::async_trait;
use std::sync::Arc;

use crate::metrics::Metrics;
use crate::provider::{LlmError, LlmProvider, LlmRequest, LlmResponse};
use crate::search::{SearchError, SearchHit, SearchProvider, SearchRequest};

/// Counts completion calls, errors and tokens
#[derive(Debug)]
pub struct MeteredProvider<P: LlmProvider> {
    inner: P,
    metrics: Arc<Metrics>,
}

impl<P: LlmProvider> MeteredProvider<P> {
    pub fn new(inner: P, metrics: Arc<Metrics>) -> Self {
        Self { inner, metrics }
    }
}

#[async_trait]
impl<P: LlmProvider> LlmProvider for MeteredProvider<P> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn is_available(&self) -> bool {
        self.inner.is_available().await
    }

    async fn complete(&self, request: LlmRequest) -> Result<LlmResponse, LlmError> {
        let result = self.inner.complete(request).await;
        match &result {
            Ok(response) => self
                .metrics
                .record_llm_call(response.tokens_used.unwrap_or(0) as u64, false),
            Err(_) => self.metrics.record_llm_call(0, true),
        }
        result
    }
}

/// Counts evidence searches and their failures
#[derive(Debug)]
pub struct MeteredSearchProvider<S: SearchProvider> {
    inner: S,
    metrics: Arc<Metrics>,
}

impl<S: SearchProvider> MeteredSearchProvider<S> {
    pub fn new(inner: S, metrics: Arc<Metrics>) -> Self {
        Self { inner, metrics }
    }
}

#[async_trait]
impl<S: SearchProvider> SearchProvider for MeteredSearchProvider<S> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn search(&self, request: SearchRequest) -> Result<Vec<SearchHit>, SearchError> {
        let result = self.inner.search(request).await;
        self.metrics.record_search(result.is_err());
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockProvider, MockSearchProvider};

    #[tokio::test]
    async fn test_counts_calls_and_errors() {
        let metrics = Arc::new(Metrics::new());
        let ok = MeteredProvider::new(MockProvider::constant("hi"), metrics.clone());
        let bad = MeteredProvider::new(MockProvider::failing("down"), metrics.clone());

        ok.ask("a").await.unwrap();
        assert!(bad.ask("b").await.is_err());

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.llm_calls, 2);
        assert_eq!(snapshot.llm_errors, 1);
        assert!(snapshot.tokens_used >= 100);
    }

    #[tokio::test]
    async fn test_counts_searches() {
        let metrics = Arc::new(Metrics::new());
        let search = MeteredSearchProvider::new(MockSearchProvider::failing("down"), metrics.clone());
        assert!(search.search(SearchRequest::new("q", 3)).await.is_err());
        assert_eq!(metrics.snapshot().search_errors, 1);
    }
}

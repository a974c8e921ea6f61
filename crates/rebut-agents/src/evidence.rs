//! Evidence retrieval for the AI's counter-position

use rebut_core::Evidence;
use rebut_llm::{Metrics, SearchHit, SearchProvider, SearchRequest};
use std::sync::Arc;

use crate::config::AgentConfig;

const QUERY_KEYWORDS: &str = "evidence research facts";
const UNKNOWN_SOURCE: &str = "Unknown Source";

/// Turns a topic and counter-stance into at most `evidence_limit` items
#[derive(Debug, Clone)]
pub struct EvidenceRetriever {
    search: Arc<dyn SearchProvider>,
    config: AgentConfig,
    metrics: Arc<Metrics>,
}

impl EvidenceRetriever {
    pub fn new(search: Arc<dyn SearchProvider>, config: AgentConfig, metrics: Arc<Metrics>) -> Self {
        Self {
            search,
            config,
            metrics,
        }
    }

    /// Build the search query
    pub fn query(topic: &str, counter_stance: &str) -> String {
        format!("{} {} {}", topic, counter_stance, QUERY_KEYWORDS)
    }

    /// Retrieve evidence. Never fails; any search failure yields an empty list.
    pub async fn retrieve(&self, topic: &str, counter_stance: &str) -> Vec<Evidence> {
        let limit = self.config.evidence_limit;
        let request = SearchRequest::new(Self::query(topic, counter_stance), limit);

        let hits = match tokio::time::timeout(self.config.timeout, self.search.search(request)).await
        {
            Ok(Ok(hits)) => hits,
            Ok(Err(e)) => {
                tracing::warn!(adapter = "evidence", error = %e, "Evidence search failed, continuing without evidence");
                return self.fallback();
            }
            Err(_) => {
                tracing::warn!(
                    adapter = "evidence",
                    timeout_ms = self.config.timeout.as_millis() as u64,
                    "Evidence search timed out, continuing without evidence"
                );
                return self.fallback();
            }
        };

        hits.into_iter().take(limit).map(Self::to_evidence).collect()
    }

    fn to_evidence(hit: SearchHit) -> Evidence {
        Evidence::new(
            hit.title.unwrap_or_else(|| UNKNOWN_SOURCE.to_string()),
            hit.url.unwrap_or_default(),
            hit.content.as_deref().unwrap_or_default(),
            hit.score,
        )
    }

    fn fallback(&self) -> Vec<Evidence> {
        self.metrics.record_fallback();
        metrics::counter!("rebut_adapter_fallbacks_total", "adapter" => "evidence").increment(1);
        Vec::new()
    }
}

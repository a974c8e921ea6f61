//! Process-wide counters exported in Prometheus text format

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Global metrics collector
#[derive(Debug, Default)]
pub struct Metrics {
    /// Total completion calls
    pub llm_calls: AtomicU64,
    /// Failed completion calls
    pub llm_errors: AtomicU64,
    /// Total tokens used
    pub tokens_used: AtomicU64,
    /// Total evidence searches
    pub search_calls: AtomicU64,
    /// Failed evidence searches
    pub search_errors: AtomicU64,
    /// Adapter results replaced by their fallback
    pub adapter_fallbacks: AtomicU64,
    pub debates_started: AtomicU64,
    pub debates_ended: AtomicU64,
    pub rounds_played: AtomicU64,
    pub concessions: AtomicU64,
    /// Stats/achievement updates that failed to persist
    pub ledger_failures: AtomicU64,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a completion call
    pub fn record_llm_call(&self, tokens: u64, error: bool) {
        self.llm_calls.fetch_add(1, Ordering::Relaxed);
        self.tokens_used.fetch_add(tokens, Ordering::Relaxed);
        if error {
            self.llm_errors.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Record an evidence search
    pub fn record_search(&self, error: bool) {
        self.search_calls.fetch_add(1, Ordering::Relaxed);
        if error {
            self.search_errors.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_fallback(&self) {
        self.adapter_fallbacks.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_debate_started(&self) {
        self.debates_started.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_debate_ended(&self, conceded: bool) {
        self.debates_ended.fetch_add(1, Ordering::Relaxed);
        if conceded {
            self.concessions.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_round(&self) {
        self.rounds_played.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_ledger_failure(&self) {
        self.ledger_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Get snapshot of all metrics
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            llm_calls: self.llm_calls.load(Ordering::Relaxed),
            llm_errors: self.llm_errors.load(Ordering::Relaxed),
            tokens_used: self.tokens_used.load(Ordering::Relaxed),
            search_calls: self.search_calls.load(Ordering::Relaxed),
            search_errors: self.search_errors.load(Ordering::Relaxed),
            adapter_fallbacks: self.adapter_fallbacks.load(Ordering::Relaxed),
            debates_started: self.debates_started.load(Ordering::Relaxed),
            debates_ended: self.debates_ended.load(Ordering::Relaxed),
            rounds_played: self.rounds_played.load(Ordering::Relaxed),
            concessions: self.concessions.load(Ordering::Relaxed),
            ledger_failures: self.ledger_failures.load(Ordering::Relaxed),
        }
    }

    /// Get completion error rate
    pub fn llm_error_rate(&self) -> f64 {
        let total = self.llm_calls.load(Ordering::Relaxed);
        let errors = self.llm_errors.load(Ordering::Relaxed);
        if total == 0 {
            0.0
        } else {
            errors as f64 / total as f64
        }
    }
}

/// Snapshot of metrics at a point in time
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub llm_calls: u64,
    pub llm_errors: u64,
    pub tokens_used: u64,
    pub search_calls: u64,
    pub search_errors: u64,
    pub adapter_fallbacks: u64,
    pub debates_started: u64,
    pub debates_ended: u64,
    pub rounds_played: u64,
    pub concessions: u64,
    pub ledger_failures: u64,
}

impl MetricsSnapshot {
    /// Export metrics in Prometheus text format
    pub fn to_prometheus(&self) -> String {
        let counters = [
            ("rebut_llm_calls_total", "Total text completion calls", self.llm_calls),
            ("rebut_llm_errors_total", "Failed text completion calls", self.llm_errors),
            ("rebut_tokens_used_total", "Tokens consumed by completion calls", self.tokens_used),
            ("rebut_search_calls_total", "Total evidence searches", self.search_calls),
            ("rebut_search_errors_total", "Failed evidence searches", self.search_errors),
            ("rebut_adapter_fallbacks_total", "Adapter outputs replaced by fallbacks", self.adapter_fallbacks),
            ("rebut_debates_started_total", "Debates started", self.debates_started),
            ("rebut_debates_ended_total", "Debates concluded", self.debates_ended),
            ("rebut_rounds_total", "Rounds appended", self.rounds_played),
            ("rebut_concessions_total", "Debates ended by concession", self.concessions),
            ("rebut_ledger_failures_total", "Stats updates that failed to persist", self.ledger_failures),
        ];

        let mut output = String::new();
        for (name, help, value) in counters {
            output.push_str(&format!("# HELP {} {}\n", name, help));
            output.push_str(&format!("# TYPE {} counter\n", name));
            output.push_str(&format!("{} {}\n", name, value));
        }

        let error_rate = if self.llm_calls > 0 {
            self.llm_errors as f64 / self.llm_calls as f64
        } else {
            0.0
        };
        output.push_str("# HELP rebut_llm_error_rate Current completion error rate\n");
        output.push_str("# TYPE rebut_llm_error_rate gauge\n");
        output.push_str(&format!("rebut_llm_error_rate {:.4}\n", error_rate));

        output
    }
}

static GLOBAL_METRICS: std::sync::OnceLock<Arc<Metrics>> = std::sync::OnceLock::new();

/// Get or initialize global metrics
pub fn global_metrics() -> Arc<Metrics> {
    GLOBAL_METRICS
        .get_or_init(|| Arc::new(Metrics::new()))
        .clone()
}

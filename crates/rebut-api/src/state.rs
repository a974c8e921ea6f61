//! Application state
//!
//! Centralizes access to the round pipeline, identity and monitoring.

use rebut_llm::Metrics;
use rebut_persist::{ProfileStore, StorageBackend};
use rebut_runtime::{RoundPipeline, StatsLedger};
use std::sync::Arc;

use crate::auth::JwtAuth;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pipeline: RoundPipeline,
    jwt_auth: Option<JwtAuth>,
    metrics: Arc<Metrics>,
    db: Arc<dyn StorageBackend>,
}

impl AppState {
    /// `jwt_auth: None` makes every caller a guest
    pub fn new(
        pipeline: RoundPipeline,
        jwt_auth: Option<JwtAuth>,
        metrics: Arc<Metrics>,
        db: Arc<dyn StorageBackend>,
    ) -> Self {
        Self {
            pipeline,
            jwt_auth,
            metrics,
            db,
        }
    }

    pub fn pipeline(&self) -> &RoundPipeline {
        &self.pipeline
    }

    pub fn ledger(&self) -> &StatsLedger {
        self.pipeline.ledger()
    }

    pub fn profiles(&self) -> &ProfileStore<dyn StorageBackend> {
        self.pipeline.ledger().profiles()
    }

    pub fn jwt_auth(&self) -> Option<&JwtAuth> {
        self.jwt_auth.as_ref()
    }

    /// Get metrics collector (cloned Arc for sharing)
    pub fn metrics(&self) -> Arc<Metrics> {
        self.metrics.clone()
    }

    /// Get database backend (cloned Arc for sharing)
    pub fn db(&self) -> Arc<dyn StorageBackend> {
        self.db.clone()
    }
}

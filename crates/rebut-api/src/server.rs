//! Rebut API server with graceful shutdown

use axum::{middleware, Router};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tower_http::compression::CompressionLayer;

use rebut_agents::DebateAgents;
use rebut_llm::{global_metrics, LlmConfig, Metrics};
use rebut_persist::{ProfileStore, SqliteBackend, SqliteStatsStore, StorageBackend};
use rebut_runtime::{PipelineConfig, RoundPipeline, StatsLedger};

use crate::auth::JwtAuth;
use crate::error::ApiError;
use crate::middleware::{
    body_limit_layer, cors_layer, request_id_middleware, timeout_layer, tracing_middleware,
};
use crate::routes::api_router;
use crate::state::AppState;

const DEFAULT_PORT: u16 = 8000;
const DEFAULT_DATABASE_URL: &str = "sqlite:rebut.db?mode=rwc";

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Server address
    pub addr: SocketAddr,
    /// Request timeout
    pub timeout: Duration,
    /// Max request body size (bytes)
    pub max_body_size: usize,
    /// Enable compression
    pub compression: bool,
    /// Allowed CORS origins
    pub cors_origins: Vec<String>,
    pub database_url: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([0, 0, 0, 0], DEFAULT_PORT)),
            timeout: Duration::from_secs(30),
            max_body_size: 1024 * 1024, // 1MB
            compression: true,
            cors_origins: Vec::new(),
            database_url: DEFAULT_DATABASE_URL.to_string(),
        }
    }
}

impl ServerConfig {
    /// Create from environment variables
    pub fn from_env() -> Self {
        let port: u16 = std::env::var("REBUT_PORT")
            .or_else(|_| std::env::var("PORT"))
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(DEFAULT_PORT);

        let timeout_secs: u64 = std::env::var("REBUT_TIMEOUT_SECS")
            .ok()
            .and_then(|t| t.parse().ok())
            .unwrap_or(30);

        let cors_origins = std::env::var("REBUT_CORS_ORIGINS")
            .map(|v| {
                v.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default();

        Self {
            addr: SocketAddr::from(([0, 0, 0, 0], port)),
            timeout: Duration::from_secs(timeout_secs),
            cors_origins,
            database_url: std::env::var("DATABASE_URL")
                .unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string()),
            ..Default::default()
        }
    }
}

/// Rebut API server
pub struct DebateServer {
    config: ServerConfig,
    app_state: AppState,
}

impl DebateServer {
    /// Connect storage, build providers and agents, and assemble the state
    pub async fn new(config: ServerConfig) -> Result<Self, ApiError> {
        let metrics = global_metrics();

        let db = SqliteBackend::new(&config.database_url)
            .await
            .map_err(|e| ApiError::Internal(format!("DB init failed: {}", e)))?;
        let stats = SqliteStatsStore::new(db.pool().clone());
        let db: Arc<dyn StorageBackend> = Arc::new(db);

        let llm_config = LlmConfig::from_env();
        let pipeline_config = PipelineConfig::from_env();
        let agents = DebateAgents::new(
            llm_config.build_llm(),
            llm_config.build_search(),
            pipeline_config.agents.clone(),
            metrics.clone(),
        );
        let ledger = StatsLedger::new(Arc::new(stats), ProfileStore::new(db.clone()));
        let pipeline = RoundPipeline::new(agents, ledger, metrics.clone(), pipeline_config);

        let jwt_auth = match JwtAuth::from_env() {
            Ok(auth) => Some(auth),
            Err(e) => {
                tracing::warn!(error = %e, "Identity disabled, every caller debates as guest");
                None
            }
        };

        let app_state = AppState::new(pipeline, jwt_auth, metrics, db);
        Ok(Self::with_state(config, app_state))
    }

    /// Server over prebuilt state
    pub fn with_state(config: ServerConfig, app_state: AppState) -> Self {
        Self { config, app_state }
    }

    /// Get the configured router
    pub fn router(&self) -> Router {
        let mut app = api_router(self.app_state.clone());

        if self.config.compression {
            app = app.layer(CompressionLayer::new());
        }

        // Bottom layer runs first
        app.layer(body_limit_layer(self.config.max_body_size))
            .layer(timeout_layer(self.config.timeout))
            .layer(cors_layer(&self.config.cors_origins))
            .layer(middleware::from_fn(tracing_middleware))
            .layer(middleware::from_fn(request_id_middleware))
    }

    /// Run the server until Ctrl+C or SIGTERM
    pub async fn run(self) -> Result<(), ApiError> {
        let app = self.router();
        let addr = self.config.addr;

        let listener = tokio::net::TcpListener::bind(addr).await?;
        tracing::info!("Rebut API listening on http://{}", addr);

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| ApiError::Internal(format!("Server error: {}", e)))?;

        tracing::info!("Server shutdown complete");
        Ok(())
    }

    /// Get server metrics
    pub fn metrics(&self) -> Arc<Metrics> {
        self.app_state.metrics()
    }
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, starting graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}

/// Initialize tracing subscriber
pub fn init_tracing() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new("info,rebut_api=debug,rebut_runtime=debug,tower_http=debug")
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();
}

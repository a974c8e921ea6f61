//! API routes for Rebut endpoints

use axum::{
    extract::{Extension, Path, Query, State},
    http::header,
    middleware::from_fn_with_state,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use rebut_core::{DebateId, DebateMode, DebateSession, DebateSummary, Owner};
use rebut_runtime::{DebateResponse, LeaderboardEntry, StartDebate, StatsView};
use serde::{Deserialize, Serialize};
use utoipa::OpenApi;

use crate::error::{ApiError, ApiResult};
use crate::middleware::identity_middleware;
use crate::sanitize::{sanitize_argument, sanitize_stance, sanitize_topic, validate_max_rounds};
use crate::state::AppState;

const DEFAULT_LEADERBOARD_LIMIT: usize = 10;
const MAX_LEADERBOARD_LIMIT: usize = 100;

/// Service root payload
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct RootResponse {
    pub message: String,
    pub docs: String,
    pub health: String,
}

#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 200, description = "Service root", body = RootResponse)
    )
)]
pub async fn root() -> Json<RootResponse> {
    Json(RootResponse {
        message: "Welcome to Rebut".to_string(),
        docs: "/api-docs/openapi.json".to_string(),
        health: "/health".to_string(),
    })
}

/// Health check response
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
}

/// Liveness check
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is alive", body = HealthResponse)
    )
)]
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        service: "rebut".to_string(),
    })
}

/// Health with component status
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct DetailedHealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub database: ComponentStatus,
    pub active_debates: u64,
}

/// Individual component status
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ComponentStatus {
    pub status: String,
    pub latency_ms: u64,
}

/// Readiness check including database connectivity
#[utoipa::path(
    get,
    path = "/health/detailed",
    responses(
        (status = 200, description = "Component status", body = DetailedHealthResponse)
    )
)]
pub async fn health_detailed(State(state): State<AppState>) -> Json<DetailedHealthResponse> {
    let start = std::time::Instant::now();
    let db_healthy = state.db().is_healthy().await;
    let latency_ms = start.elapsed().as_millis() as u64;

    Json(DetailedHealthResponse {
        status: if db_healthy { "healthy" } else { "degraded" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
        database: ComponentStatus {
            status: if db_healthy { "healthy" } else { "unhealthy" }.to_string(),
            latency_ms,
        },
        active_debates: state.pipeline().sessions().active_count(),
    })
}

/// Debate opening request
#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct StartDebateRequest {
    pub topic: String,
    pub user_stance: String,
    #[serde(default)]
    pub mode: DebateMode,
    /// 3 to 15; the server default applies when omitted
    pub max_rounds: Option<u32>,
}

/// Open a debate and play the first round
#[utoipa::path(
    post,
    path = "/start-debate",
    request_body = StartDebateRequest,
    responses(
        (status = 200, description = "Debate started", body = DebateResponse),
        (status = 422, description = "Invalid input"),
        (status = 503, description = "Argument generation unavailable")
    ),
    security(
        (),
        ("jwt" = [])
    )
)]
pub async fn start_debate(
    Extension(owner): Extension<Owner>,
    State(state): State<AppState>,
    Json(req): Json<StartDebateRequest>,
) -> ApiResult<Json<DebateResponse>> {
    let topic = sanitize_topic(&req.topic)?;
    let user_stance = sanitize_stance(&req.user_stance)?;
    let max_rounds = req.max_rounds.map(validate_max_rounds).transpose()?;

    let response = state
        .pipeline()
        .start(StartDebate {
            topic,
            user_stance,
            mode: req.mode,
            max_rounds,
            owner,
        })
        .await?;

    Ok(Json(response))
}

/// Next submission in a debate
#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct ContinueDebateRequest {
    pub debate_id: String,
    pub user_argument: String,
}

/// Play the next round
#[utoipa::path(
    post,
    path = "/continue-debate",
    request_body = ContinueDebateRequest,
    responses(
        (status = 200, description = "Round played or debate concluded", body = DebateResponse),
        (status = 404, description = "Debate not found"),
        (status = 422, description = "Invalid input"),
        (status = 503, description = "Argument generation unavailable")
    )
)]
pub async fn continue_debate(
    State(state): State<AppState>,
    Json(req): Json<ContinueDebateRequest>,
) -> ApiResult<Json<DebateResponse>> {
    let debate_id = parse_debate_id(&req.debate_id)?;
    let user_argument = sanitize_argument(&req.user_argument)?;

    let response = state
        .pipeline()
        .continue_debate(debate_id, &user_argument)
        .await?;

    Ok(Json(response))
}

/// Stored session
#[utoipa::path(
    get,
    path = "/debate/{id}",
    params(
        ("id" = String, Path, description = "Debate ID")
    ),
    responses(
        (status = 200, description = "Stored session", body = DebateSession),
        (status = 404, description = "Debate not found")
    )
)]
pub async fn get_debate(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<DebateSession>> {
    let debate_id = parse_debate_id(&id)?;
    Ok(Json(state.pipeline().session(debate_id).await?))
}

/// Recap of an ended debate
#[utoipa::path(
    get,
    path = "/debate/{id}/summary",
    params(
        ("id" = String, Path, description = "Debate ID")
    ),
    responses(
        (status = 200, description = "Debate summary", body = DebateSummary),
        (status = 404, description = "Debate not found"),
        (status = 409, description = "Debate still in progress")
    )
)]
pub async fn get_debate_summary(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<DebateSummary>> {
    let debate_id = parse_debate_id(&id)?;
    Ok(Json(state.pipeline().summary(debate_id).await?))
}

/// Malformed ids cannot name a stored debate
fn parse_debate_id(raw: &str) -> ApiResult<DebateId> {
    DebateId::parse_str(raw.trim()).map_err(|_| ApiError::NotFound("Debate not found".to_string()))
}

/// User counters and achievements
#[utoipa::path(
    get,
    path = "/stats/{user_id}",
    params(
        ("user_id" = String, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "User stats", body = StatsView)
    )
)]
pub async fn get_stats(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> ApiResult<Json<StatsView>> {
    let user_id = user_id.trim();
    if user_id.is_empty() {
        return Err(ApiError::Validation("user_id must not be empty".to_string()));
    }
    Ok(Json(state.ledger().stats_view(user_id).await?))
}

#[derive(Debug, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LeaderboardQuery {
    /// Number of entries, 1 to 100 (default 10)
    pub limit: Option<usize>,
}

/// Top users by points
#[utoipa::path(
    get,
    path = "/leaderboard",
    params(LeaderboardQuery),
    responses(
        (status = 200, description = "Leaderboard", body = [LeaderboardEntry])
    )
)]
pub async fn get_leaderboard(
    State(state): State<AppState>,
    Query(query): Query<LeaderboardQuery>,
) -> ApiResult<Json<Vec<LeaderboardEntry>>> {
    let limit = query
        .limit
        .unwrap_or(DEFAULT_LEADERBOARD_LIMIT)
        .clamp(1, MAX_LEADERBOARD_LIMIT);
    Ok(Json(state.ledger().leaderboard(limit).await?))
}

/// Prometheus metrics handler
#[utoipa::path(
    get,
    path = "/metrics",
    responses(
        (status = 200, description = "Prometheus formatted metrics", body = String)
    )
)]
pub async fn get_prometheus_metrics(State(state): State<AppState>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics().snapshot().to_prometheus(),
    )
}

/// OpenAPI document
pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

#[derive(OpenApi)]
#[openapi(
    info(title = "Rebut", description = "Debate an AI opponent"),
    paths(
        root,
        health,
        health_detailed,
        start_debate,
        continue_debate,
        get_debate,
        get_debate_summary,
        get_stats,
        get_leaderboard,
        get_prometheus_metrics,
    ),
    components(
        schemas(
            RootResponse, HealthResponse, DetailedHealthResponse, ComponentStatus,
            StartDebateRequest, ContinueDebateRequest, DebateResponse,
            DebateSession, DebateSummary,
            StatsView, LeaderboardEntry,
        )
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "jwt",
                utoipa::openapi::security::SecurityScheme::Http(
                    utoipa::openapi::security::HttpBuilder::new()
                        .scheme(utoipa::openapi::security::HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            )
        }
    }
}

/// Build the API router
pub fn api_router(state: AppState) -> Router {
    Router::new()
        // Documentation and health
        .route("/", get(root))
        .route("/api-docs/openapi.json", get(openapi_json))
        .route("/health", get(health))
        .route("/health/detailed", get(health_detailed))
        // Debates
        .route("/start-debate", post(start_debate))
        .route("/continue-debate", post(continue_debate))
        .route("/debate/{id}", get(get_debate))
        .route("/debate/{id}/summary", get(get_debate_summary))
        // Stats
        .route("/stats/{user_id}", get(get_stats))
        .route("/leaderboard", get(get_leaderboard))
        .route("/metrics", get(get_prometheus_metrics))
        .layer(from_fn_with_state(state.clone(), identity_middleware))
        .with_state(state)
}

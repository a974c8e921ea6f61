//! Tower middleware for the Rebut API

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, HeaderValue},
    middleware::Next,
    response::Response,
};
use rebut_core::Owner;
use std::time::Instant;

use crate::auth::JwtAuth;
use crate::state::AppState;

/// Resolve the caller's identity and expose it to handlers as an [`Owner`].
///
/// Missing or invalid tokens are not rejected; the caller becomes a guest.
pub async fn identity_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let owner = resolve_owner(&state, request.headers()).await;
    request.extensions_mut().insert(owner);
    next.run(request).await
}

async fn resolve_owner(state: &AppState, headers: &HeaderMap) -> Owner {
    let Some(value) = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
    else {
        return Owner::Guest;
    };
    let Some(auth) = state.jwt_auth() else {
        tracing::debug!("Bearer token ignored, identity is not configured");
        return Owner::Guest;
    };

    let claims = match JwtAuth::extract_from_header(value).and_then(|token| auth.decode(token)) {
        Ok(claims) => claims,
        Err(e) => {
            tracing::warn!(error = %e, "Token rejected, continuing as guest");
            return Owner::Guest;
        }
    };

    if let Err(e) = state
        .profiles()
        .upsert(&claims.sub, claims.username.as_deref())
        .await
    {
        tracing::warn!(user_id = %claims.sub, error = %e, "Failed to update profile");
    }

    claims.owner()
}

/// Request tracing middleware
pub async fn tracing_middleware(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let request_id = request
        .extensions()
        .get::<RequestId>()
        .map(|id| id.0.clone())
        .unwrap_or_else(|| "unknown".to_string());

    let span = tracing::info_span!(
        "http_request",
        method = %method,
        path = %path,
        request_id = %request_id,
    );

    let response = {
        let _enter = span.enter();
        next.run(request).await
    };

    tracing::info!(
        method = %method,
        path = %path,
        request_id = %request_id,
        status = response.status().as_u16(),
        latency_ms = start.elapsed().as_millis() as u64,
        "Request completed"
    );

    response
}

/// Request ID middleware
pub async fn request_id_middleware(mut request: Request, next: Next) -> Response {
    let request_id = uuid::Uuid::new_v4().to_string();

    request
        .extensions_mut()
        .insert(RequestId(request_id.clone()));

    let mut response = next.run(request).await;

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert("x-request-id", value);
    }

    response
}

/// Request ID wrapper
#[derive(Clone, Debug)]
pub struct RequestId(pub String);

/// CORS for the configured origins; localhost only when none are given
pub fn cors_layer(origins: &[String]) -> tower_http::cors::CorsLayer {
    use tower_http::cors::{AllowOrigin, CorsLayer};

    let parsed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|s| s.trim().parse().ok())
        .collect();

    let allow_origin = if parsed.is_empty() {
        tracing::warn!("REBUT_CORS_ORIGINS not set or invalid, allowing localhost only");
        AllowOrigin::exact(HeaderValue::from_static("http://localhost:3000"))
    } else {
        tracing::info!("CORS configured for {} origin(s)", parsed.len());
        AllowOrigin::list(parsed)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([
            axum::http::Method::GET,
            axum::http::Method::POST,
            axum::http::Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
        .max_age(std::time::Duration::from_secs(3600))
}

/// Timeout layer helper
#[allow(deprecated)]
pub fn timeout_layer(duration: std::time::Duration) -> tower_http::timeout::TimeoutLayer {
    tower_http::timeout::TimeoutLayer::new(duration)
}

/// Request body size limit
pub fn body_limit_layer(limit: usize) -> tower_http::limit::RequestBodyLimitLayer {
    tower_http::limit::RequestBodyLimitLayer::new(limit)
}

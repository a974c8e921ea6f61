//! # Rebut API
//!
//! HTTP surface for the debate service.
//!
//! Features:
//! - Axum router with OpenAPI document
//! - Optional JWT identity (requests without a valid token debate as guests)
//! - Request id, tracing, CORS, timeout and body-limit middleware
//! - Graceful shutdown

pub mod auth;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod sanitize;
pub mod server;
pub mod state;

pub use auth::{Claims, JwtAuth};
pub use error::{ApiError, ApiResult};
pub use server::{DebateServer, ServerConfig};
pub use state::AppState;

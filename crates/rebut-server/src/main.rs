//! Rebut Server - runnable entry point for the debate API
//!
//! Thin wrapper around `rebut-api`. Without `GROQ_API_KEY` / `TAVILY_API_KEY`
//! the server runs against mock providers; without `REBUT_JWT_SECRET` every
//! caller debates as a guest.

use anyhow::{Context, Result};
use rebut_api::{DebateServer, ServerConfig};

#[tokio::main]
async fn main() -> Result<()> {
    rebut_api::server::init_tracing();

    let config = ServerConfig::from_env();
    tracing::info!(
        addr = %config.addr,
        database = %config.database_url,
        "Starting Rebut server"
    );

    let server = DebateServer::new(config)
        .await
        .context("failed to initialize server")?;

    server.run().await.context("server error")?;

    Ok(())
}

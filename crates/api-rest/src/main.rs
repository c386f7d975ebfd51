//! `clinic-api-rest`: the REST router on its own listener.
//!
//! Handy while working on handlers; `clinic-run` at the workspace root serves the same
//! router with graceful shutdown.

use api_rest::{router, AppState};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Main entry point for the clinic REST API server
///
/// # Environment Variables
/// - `CLINIC_REST_ADDR`: Server address (default: "0.0.0.0:3000")
/// - `CLINIC_BACKEND_URL`, `CLINIC_ANON_KEY`: hosted backend
/// - `CLINIC_BACKEND`: `memory` to run without a hosted backend
/// - `CLINIC_PAGE_SIZE`, `CLINIC_SMOKE_PASSWORD`, `API_KEY`: optional
///
/// Fails when the configuration is incomplete, the address cannot be bound or the server
/// stops with an error.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("api_rest=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let addr = std::env::var("CLINIC_REST_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());
    let state = AppState::from_env()?;

    tracing::info!("-- Starting clinic REST API on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, router(state)).await?;

    Ok(())
}

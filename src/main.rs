use api_rest::{router, AppState};
use api_shared::HealthService;
use clinic_core::backend::AnyBackend;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Main entry point for the clinic backend
///
/// Serves the REST API, its OpenAPI document and the Swagger UI on one listener, and
/// stops cleanly on Ctrl-C.
///
/// # Environment Variables
/// - `CLINIC_REST_ADDR`: REST server address (default: "0.0.0.0:3000")
/// - `CLINIC_BACKEND`: `remote` (default) or `memory`
/// - `CLINIC_BACKEND_URL`, `CLINIC_ANON_KEY`: hosted backend project, required for `remote`
/// - `CLINIC_PAGE_SIZE`: default page size for list endpoints
/// - `CLINIC_SMOKE_PASSWORD`: enables `POST /smoke` when set
/// - `API_KEY`: when set, every route except `/health` and the docs requires `x-api-key`
///
/// # Returns
/// * `Ok(())` - If the server starts and shuts down cleanly
/// * `Err(anyhow::Error)` - If configuration, binding or serving fails
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("clinic_run=info".parse()?)
                .add_directive("api_rest=info".parse()?)
                .add_directive("clinic_core=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let rest_addr = std::env::var("CLINIC_REST_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());
    let state = AppState::from_env()?;
    let backend = match state.clinic.backend().as_ref() {
        AnyBackend::Memory(_) => "in-memory".to_string(),
        AnyBackend::Remote(_) => state.clinic.config().backend_url().to_string(),
    };

    tracing::info!("++ {}", HealthService::check_health().message);
    tracing::info!("++ Backend: {}", backend);
    tracing::info!("++ Starting clinic REST on {}", rest_addr);
    if state.api_key.is_none() {
        tracing::warn!("API_KEY not set; the REST API is open");
    }

    let listener = tokio::net::TcpListener::bind(&rest_addr).await?;
    axum::serve(listener, router(state))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("-- Shutting down");
        })
        .await?;

    Ok(())
}

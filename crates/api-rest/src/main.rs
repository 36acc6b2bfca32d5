//! Standalone REST API server binary.
//!
//! ## Purpose
//! Runs the REST API server on its own.
//!
//! ## Intended use
//! This binary is useful for development and debugging when you only want the
//! REST server (with OpenAPI/Swagger UI) and none of the production runner's
//! `.env` loading or signal handling. The workspace's main `pacientes-run`
//! binary is the production entry point.

use api_rest::{AppState, router};
use pacientes_core::{AppConfig, PatientRepository};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Main entry point for the standalone REST API server
///
/// Resolves configuration from the environment, opens the patient store and
/// serves the REST API on the configured port.
///
/// # Environment Variables
/// - `APP_ENV`: Runtime environment (default: "development")
/// - `PORT`: Server port (default: 4000)
/// - `ALLOWED_ORIGINS`: Comma-separated CORS origins (default: "http://localhost:4000")
/// - `DB_FILENAME`: Patient store file (default: "./database.sqlite")
///
/// # Errors
/// Returns an error if:
/// - the logging/tracing configuration cannot be initialised,
/// - the configuration cannot be resolved,
/// - the patient store cannot be opened or its schema prepared, or
/// - the HTTP server fails while running.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("api_rest=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cfg = AppConfig::from_env()?;
    let addr = format!("0.0.0.0:{}", cfg.port());

    tracing::info!("-- Starting pacientes REST API on {}", addr);

    let repository = PatientRepository::connect(cfg.db_filename()).await?;
    repository.ensure_schema().await?;

    let app = router(AppState::new(Arc::new(cfg), repository));

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

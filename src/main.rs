use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api_rest::{AppState, router};
use pacientes_core::{AppConfig, PatientRepository};

/// Main entry point for the pacientes service
///
/// Loads `.env`, resolves configuration, opens the patient store and serves
/// the REST API until the process receives ctrl-c or SIGTERM.
///
/// # Environment Variables
/// - `APP_ENV`: Runtime environment (default: "development")
/// - `PORT`: Server port (default: 4000)
/// - `ALLOWED_ORIGINS`: Comma-separated CORS origins (default: "http://localhost:4000")
/// - `DB_FILENAME`: Patient store file (default: "./database.sqlite")
///
/// # Returns
/// * `Ok(())` - If the server runs and shuts down cleanly
///
/// # Errors
/// Returns an error if:
/// - the logging/tracing configuration cannot be initialised,
/// - the configuration cannot be resolved,
/// - the patient store cannot be opened or its schema prepared, or
/// - the HTTP server fails while running.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("pacientes_core=info".parse()?)
                .add_directive("api_rest=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cfg = AppConfig::from_env()?;
    let addr = format!("0.0.0.0:{}", cfg.port());

    tracing::info!("++ Starting pacientes REST on {}", addr);
    tracing::info!("++ Environment: {}", cfg.env());

    let repository = PatientRepository::connect(cfg.db_filename()).await?;
    repository.ensure_schema().await?;
    tracing::info!("++ Patient store ready at {}", cfg.db_filename().display());

    let app = router(AppState::new(Arc::new(cfg), repository));

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("-- pacientes REST stopped");

    Ok(())
}

/// Resolves when the process is asked to stop (ctrl-c or, on unix, SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            // A signal we can never receive must not count as "received".
            tracing::error!("failed to install ctrl-c handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

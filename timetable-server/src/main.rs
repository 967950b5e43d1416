use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use timetable_server::config::AppConfig;
use timetable_server::load::bootstrap;
use timetable_server::web::{AppState, create_router};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "invalid configuration");
            std::process::exit(2);
        }
    };

    // Fail fast: the server has nothing to answer without a timetable
    info!(archive = %config.archive.display(), "loading timetable");
    let snapshot = match bootstrap(&config).await {
        Ok(snapshot) => snapshot,
        Err(e) => {
            error!(error = %e, "failed to load timetable");
            std::process::exit(1);
        }
    };

    let app = create_router(AppState::new(snapshot));

    let listener = match tokio::net::TcpListener::bind(config.bind).await {
        Ok(listener) => listener,
        Err(e) => {
            error!(addr = %config.bind, error = %e, "failed to bind");
            std::process::exit(1);
        }
    };
    info!(addr = %config.bind, "timetable server listening");

    if let Err(e) = axum::serve(listener, app).await {
        error!(error = %e, "server stopped");
        std::process::exit(1);
    }
}

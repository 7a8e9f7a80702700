use std::error::Error;

use tracing::{error, info};

use crate::infrastructure::bootstrap;
use crate::infrastructure::config::AppConfig;
use crate::infrastructure::logging;
use crate::interfaces::cli::AdminCli;
use crate::interfaces::http::start_server;

/// Loads configuration, starts logging and serves the HTTP API until shutdown.
pub async fn run() -> Result<(), Box<dyn Error>> {
    let config = AppConfig::load()?;
    logging::init(&config.log_filter);

    let state = bootstrap::setup_http(&config).await?;
    let server = start_server(state, &config).map_err(|err| {
        error!(error = %err, host = %config.host, port = config.port, "Failed to bind HTTP server");
        err
    })?;

    server.await?;
    info!("HTTP server stopped");
    Ok(())
}

/// Entry point of the `snippet-admin` tool.
pub async fn run_admin(cli: AdminCli) -> Result<(), Box<dyn Error>> {
    let config = AppConfig::load()?;
    logging::init(&config.log_filter);

    let services = bootstrap::setup_admin(&config).await?;
    let outcome = crate::interfaces::cli::execute(&services, cli.command).await;
    services.repository.close().await;
    outcome?;
    Ok(())
}

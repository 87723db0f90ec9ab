pub mod client;
pub mod commands;
pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod server;
pub mod validation;

use tokio::sync::watch;

use config::AppConfig;
use error::AppError;

/// Open the database under the configured data dir and serve until Ctrl-C.
pub async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Starting Clinic Desk v{}", env!("CARGO_PKG_VERSION"));

    logging::install_crash_hook(&config.data_dir);

    let pool = db::init_db(&config.data_dir)?;
    tracing::info!("Database pool ready (max_size=8)");

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => tracing::info!("Ctrl-C received"),
            Err(e) => tracing::warn!("Failed to listen for Ctrl-C: {}", e),
        }
        let _ = shutdown_tx.send(true);
    });

    server::start_server(config.bind_addr, pool, shutdown_rx).await
}

use chat_broker::{Broker, ShutdownCoordinator};
use chat_server::{ServerError, logger, run_until};

use std::error::Error;

use log::{error, info};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // Load and validate configuration
    let config = chat_config::Config::load()?;
    config.validate()?;

    let log_file_path = config.log_file_path()?;
    if let Some(dir) = log_file_path.as_ref().and_then(|path| path.parent()) {
        std::fs::create_dir_all(dir).map_err(|e| ServerError::LogDir {
            path: dir.display().to_string(),
            source: e,
        })?;
    }

    // Initialize logger (before any other logging)
    logger::initialize(config.logging.level, log_file_path, config.logging.colored)?;

    info!("Starting chat-server v{}", env!("CARGO_PKG_VERSION"));
    config.log_summary();

    let shutdown = ShutdownCoordinator::new();
    let broker = Broker::new(&config.broker, shutdown.clone());

    info!("Broker ready, press Ctrl+C to stop");
    let stop = async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Received SIGINT (Ctrl+C), initiating shutdown"),
            Err(e) => error!("Failed to listen for SIGINT, shutting down: {}", e),
        }
    };

    run_until(&broker, stop).await?;
    info!("Shutdown complete");

    Ok(())
}

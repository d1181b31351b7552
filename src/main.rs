//! Pool block monitor binary.
//!
//! Reads configuration from the environment, starts the block watcher, the chat
//! command listener and (optionally) the metrics endpoint, then runs until Ctrl+C.

use pool_block_monitor::{
	bootstrap::initialize_services,
	models::AppConfig,
	utils::logging::{setup_logging, LogFormat},
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
	let config = match AppConfig::from_env() {
		Ok(config) => config,
		Err(e) => {
			let _ = setup_logging(LogFormat::default());
			tracing::error!("Invalid configuration: {}", e);
			std::process::exit(1);
		}
	};

	setup_logging(config.log_format)?;

	let mut application = initialize_services(&config).await.map_err(|e| {
		tracing::error!("Failed to initialize services: {:#}", e);
		e
	})?;
	application.start()?;

	tracing::info!(
		explorer = %config.explorer.api_base,
		interval_secs = config.watcher.poll_interval.as_secs(),
		blocks_dir = %config.storage.blocks_dir.display(),
		commands = config.commands_enabled,
		"Pool block monitor is running. Press Ctrl+C to stop."
	);

	tokio::signal::ctrl_c().await?;
	tracing::info!("Shutdown requested, finishing the current cycle");
	application.shutdown().await?;

	Ok(())
}

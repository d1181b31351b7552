//! Bootstrap module for initializing services and wiring them together.
//!
//! This module provides functions to:
//! - Build every service from an [`AppConfig`]
//! - Start the watcher, the command listener and the metrics server
//! - Stop them again in order

use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::{
	models::AppConfig,
	repositories::FileSubscriberRepository,
	services::{
		blockwatcher::{BlockWatcherError, BlockWatcherService, FileBlockStorage},
		commands::{CommandListener, CommandService},
		explorer::MempoolClient,
		filter::PoolFilter,
		notification::{NotificationService, TelegramClient, LONG_POLL_TIMEOUT_SECS},
	},
	utils::metrics::{init_metrics, server::serve_metrics},
};

/// Watcher wired to the production collaborators
pub type Watcher =
	BlockWatcherService<MempoolClient, FileBlockStorage, TelegramClient, FileSubscriberRepository>;

/// Command listener wired to the production collaborators
pub type Listener =
	CommandListener<TelegramClient, TelegramClient, FileBlockStorage, FileSubscriberRepository>;

/// Running application
pub struct Application {
	pub watcher: Watcher,
	pub listener: Option<Listener>,
	pub block_storage: Arc<FileBlockStorage>,
	pub subscribers: Arc<FileSubscriberRepository>,
	metrics_address: Option<std::net::SocketAddr>,
	metrics_handle: Option<JoinHandle<()>>,
	shutdown: CancellationToken,
}

/// Builds every service described by `config`
///
/// Creates the storage directory, loads the height index and the subscriber set,
/// and constructs the explorer and Telegram clients. Nothing runs until
/// [`Application::start`] is called.
pub async fn initialize_services(config: &AppConfig) -> Result<Application, anyhow::Error> {
	let shutdown = CancellationToken::new();

	let block_storage = Arc::new(FileBlockStorage::new(config.storage.blocks_dir.clone()).await?);
	let subscribers = Arc::new(
		FileSubscriberRepository::new(config.storage.subscribers_file.clone())
			.await
			.map_err(|e| anyhow::anyhow!("Failed to load subscribers: {}", e))?,
	);

	let explorer = Arc::new(MempoolClient::new(&config.explorer)?);
	let telegram = Arc::new(TelegramClient::new(
		&config.telegram_api_base,
		config.bot_token.clone(),
		config.explorer.request_timeout,
	)?);

	let notification_service = Arc::new(NotificationService::new(
		telegram.clone(),
		config.explorer.clone(),
	));

	let watcher = BlockWatcherService::new(
		explorer,
		block_storage.clone(),
		Arc::new(PoolFilter::new(&config.pool)),
		notification_service,
		subscribers.clone(),
		config.watcher.clone(),
	)
	.with_shutdown(shutdown.child_token());

	let listener = config.commands_enabled.then(|| {
		let commands = Arc::new(CommandService::new(
			block_storage.clone(),
			subscribers.clone(),
			config.explorer.clone(),
			config.pool.label.clone(),
		));
		CommandListener::new(
			telegram.clone(),
			telegram.clone(),
			commands,
			LONG_POLL_TIMEOUT_SECS,
			config.watcher.poll_interval,
		)
		.with_shutdown(shutdown.child_token())
	});

	Ok(Application {
		watcher,
		listener,
		block_storage,
		subscribers,
		metrics_address: config.metrics.enabled.then_some(config.metrics.address),
		metrics_handle: None,
		shutdown,
	})
}

impl Application {
	/// Starts the metrics server (when enabled), the watcher and the listener
	pub fn start(&mut self) -> Result<(), BlockWatcherError> {
		if let Some(address) = self.metrics_address {
			init_metrics();
			let token = self.shutdown.child_token();
			self.metrics_handle = Some(tokio::spawn(async move {
				if let Err(e) = serve_metrics(address, token).await {
					tracing::error!(%address, "Metrics server failed: {}", e);
				}
			}));
		}

		self.watcher.start()?;
		if let Some(listener) = self.listener.as_mut() {
			listener.start();
		}
		Ok(())
	}

	/// Stops every background task and waits for them to finish
	///
	/// A watcher cycle in progress completes before the watcher exits.
	pub async fn shutdown(mut self) -> Result<(), BlockWatcherError> {
		self.shutdown.cancel();

		if let Some(listener) = self.listener.as_mut() {
			listener.stop().await;
		}
		let stopped = self.watcher.stop().await;

		if let Some(handle) = self.metrics_handle.take() {
			if let Err(e) = handle.await {
				tracing::error!("Metrics server task failed: {}", e);
			}
		}

		stopped
	}
}

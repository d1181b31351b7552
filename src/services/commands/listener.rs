//! Telegram long-polling listener.
//!
//! Pulls incoming messages, executes the commands they contain and replies to
//! the originating chat. Every received update is acknowledged, including the
//! ones that carry no command.

use async_trait::async_trait;
use std::{sync::Arc, time::Duration};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::{
	models::TelegramUpdate,
	repositories::SubscriberRepositoryTrait,
	services::{
		blockwatcher::BlockStorage,
		commands::{Command, CommandService},
		notification::{NotificationError, Notifier},
	},
};

/// Source of incoming chat updates
#[async_trait]
pub trait UpdateSource: Send + Sync {
	/// Retrieves updates with an identifier of at least `offset`
	///
	/// # Arguments
	/// * `offset` - First update to return; earlier ones are acknowledged
	/// * `timeout_secs` - Long polling timeout
	async fn get_updates(
		&self,
		offset: Option<i64>,
		timeout_secs: u64,
	) -> Result<Vec<TelegramUpdate>, NotificationError>;
}

/// Fetches one batch of updates and answers the commands in it
///
/// # Returns
/// * `Result<Option<i64>, NotificationError>` - Offset for the next poll
pub async fn process_updates<U, N, S, R>(
	updates: &U,
	replies: &N,
	commands: &CommandService<S, R>,
	offset: Option<i64>,
	timeout_secs: u64,
) -> Result<Option<i64>, NotificationError>
where
	U: UpdateSource + ?Sized,
	N: Notifier + ?Sized,
	S: BlockStorage + ?Sized,
	R: SubscriberRepositoryTrait + ?Sized,
{
	let batch = updates.get_updates(offset, timeout_secs).await?;
	let mut next_offset = offset;

	for update in batch {
		next_offset = Some(next_offset.map_or(update.update_id + 1, |current| {
			current.max(update.update_id + 1)
		}));

		let Some(message) = update.message else {
			continue;
		};
		let Some(command) = message.text.as_deref().and_then(Command::parse) else {
			continue;
		};

		let chat_id = message.chat.id;
		tracing::debug!(chat_id, ?command, "Received command");
		let reply = commands.handle(chat_id, &command).await;
		if let Err(e) = replies.send_message(chat_id, &reply).await {
			tracing::warn!(chat_id, "Failed to send reply: {}", e);
		}
	}

	Ok(next_offset)
}

/// Background task answering chat commands
pub struct CommandListener<U, N, S, R>
where
	S: BlockStorage + ?Sized,
	R: SubscriberRepositoryTrait + ?Sized,
{
	updates: Arc<U>,
	replies: Arc<N>,
	commands: Arc<CommandService<S, R>>,
	poll_timeout_secs: u64,
	retry_delay: Duration,
	shutdown: CancellationToken,
	handle: Option<JoinHandle<()>>,
}

impl<U, N, S, R> CommandListener<U, N, S, R>
where
	U: UpdateSource + 'static,
	N: Notifier + 'static,
	S: BlockStorage + ?Sized + 'static,
	R: SubscriberRepositoryTrait + ?Sized + 'static,
{
	/// Creates a listener
	///
	/// # Arguments
	/// * `updates` - Source of incoming messages
	/// * `replies` - Transport used for replies
	/// * `commands` - Command executor
	/// * `poll_timeout_secs` - Long polling timeout
	/// * `retry_delay` - Pause after a failed poll
	pub fn new(
		updates: Arc<U>,
		replies: Arc<N>,
		commands: Arc<CommandService<S, R>>,
		poll_timeout_secs: u64,
		retry_delay: Duration,
	) -> Self {
		Self {
			updates,
			replies,
			commands,
			poll_timeout_secs,
			retry_delay,
			shutdown: CancellationToken::new(),
			handle: None,
		}
	}

	/// Uses `token` for shutdown instead of a private one
	pub fn with_shutdown(mut self, token: CancellationToken) -> Self {
		self.shutdown = token;
		self
	}

	/// Starts polling in a background task. Calling it twice has no effect.
	pub fn start(&mut self) {
		if self.handle.is_some() {
			return;
		}

		let updates = self.updates.clone();
		let replies = self.replies.clone();
		let commands = self.commands.clone();
		let poll_timeout_secs = self.poll_timeout_secs;
		let retry_delay = self.retry_delay;
		let shutdown = self.shutdown.clone();

		self.handle = Some(tokio::spawn(async move {
			let mut offset = None;
			loop {
				let polled = tokio::select! {
					_ = shutdown.cancelled() => break,
					polled = process_updates(
						updates.as_ref(),
						replies.as_ref(),
						commands.as_ref(),
						offset,
						poll_timeout_secs,
					) => polled,
				};

				match polled {
					Ok(next_offset) => offset = next_offset,
					Err(e) => {
						tracing::warn!("Failed to poll chat updates: {}", e);
						tokio::select! {
							_ = shutdown.cancelled() => break,
							_ = tokio::time::sleep(retry_delay) => {}
						}
					}
				}
			}
			tracing::info!("Command listener stopped");
		}));

		tracing::info!("Started command listener");
	}

	/// Requests shutdown and waits for the background task to finish
	pub async fn stop(&mut self) {
		self.shutdown.cancel();
		if let Some(handle) = self.handle.take() {
			if let Err(e) = handle.await {
				tracing::error!("Command listener task failed: {}", e);
			}
		}
	}
}

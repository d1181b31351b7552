//! Notification service implementation.
//!
//! Delivers new block alerts to every subscriber. Each recipient gets exactly one
//! send attempt; a failure for one recipient is logged and never prevents delivery
//! to the others.

use async_trait::async_trait;
use std::sync::Arc;

mod error;
mod telegram;
mod template;

pub use error::NotificationError;
pub use telegram::{TelegramClient, LONG_POLL_TIMEOUT_SECS};
pub use template::{escape_html, format_cached_block, format_new_block_alert};

use crate::{
	models::{BlockDetail, ExplorerConfig, RecipientId},
	utils::metrics::record_notification,
};

/// Sends a text message to a single recipient
#[async_trait]
pub trait Notifier: Send + Sync {
	/// Sends `text` (Telegram HTML) to `recipient`
	///
	/// # Returns
	/// * `Result<(), NotificationError>` - Ok once the messaging service accepted
	///   the message
	async fn send_message(
		&self,
		recipient: RecipientId,
		text: &str,
	) -> Result<(), NotificationError>;
}

/// Outcome of one fan-out
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FanoutReport {
	/// Recipients that accepted the message
	pub delivered: Vec<RecipientId>,
	/// Recipients whose delivery failed
	pub failed: Vec<RecipientId>,
}

/// Renders block alerts and fans them out to recipients
pub struct NotificationService<N: Notifier> {
	notifier: Arc<N>,
	explorer: ExplorerConfig,
}

impl<N: Notifier> NotificationService<N> {
	/// Creates a service sending through `notifier`, linking blocks on `explorer`
	pub fn new(notifier: Arc<N>, explorer: ExplorerConfig) -> Self {
		Self { notifier, explorer }
	}

	/// Sends the new block alert for `detail` to every recipient
	///
	/// Recipients are tried one after the other. Failures are logged and
	/// reported, never retried.
	pub async fn notify(&self, detail: &BlockDetail, recipients: &[RecipientId]) -> FanoutReport {
		let message = format_new_block_alert(detail, &self.explorer);
		let mut report = FanoutReport::default();

		for &recipient in recipients {
			match self.notifier.send_message(recipient, &message).await {
				Ok(()) => {
					record_notification(true);
					report.delivered.push(recipient);
				}
				Err(e) => {
					record_notification(false);
					tracing::warn!(
						chat_id = recipient,
						block_id = %detail.id,
						"Failed to send block alert: {}",
						e
					);
					report.failed.push(recipient);
				}
			}
		}

		tracing::info!(
			block_id = %detail.id,
			height = detail.height,
			delivered = report.delivered.len(),
			failed = report.failed.len(),
			"Block alert sent"
		);
		report
	}
}

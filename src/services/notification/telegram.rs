//! Telegram Bot API client.
//!
//! Sends HTML messages with `sendMessage` and long-polls incoming messages with
//! `getUpdates`. The bot token is part of every request path, so it is scrubbed
//! from any error text before the error leaves this module.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::{collections::HashMap, time::Duration};

use crate::{
	models::{
		RecipientId, SecretString, SendMessageRequest, TelegramResponse, TelegramUpdate,
	},
	services::{
		commands::UpdateSource,
		notification::{NotificationError, Notifier},
		transport::{HttpTransportClient, TransportError},
	},
};

/// Seconds the server may hold a `getUpdates` request open
pub const LONG_POLL_TIMEOUT_SECS: u64 = 25;

/// Client for the Telegram Bot API
#[derive(Clone, Debug)]
pub struct TelegramClient {
	transport: HttpTransportClient,
	token: SecretString,
	request_timeout: Duration,
}

impl TelegramClient {
	/// Creates a client
	///
	/// # Arguments
	/// * `api_base` - Bot API base URL, e.g. `https://api.telegram.org`
	/// * `token` - Bot token
	/// * `request_timeout` - Timeout of a regular request. Long polls get their
	///   server side timeout on top of it.
	pub fn new(
		api_base: &str,
		token: SecretString,
		request_timeout: Duration,
	) -> Result<Self, anyhow::Error> {
		let transport = HttpTransportClient::new(api_base, request_timeout)?;
		Ok(Self::new_with_transport(transport, token, request_timeout))
	}

	/// Creates a client over an existing transport
	pub fn new_with_transport(
		transport: HttpTransportClient,
		token: SecretString,
		request_timeout: Duration,
	) -> Self {
		Self {
			transport,
			token,
			request_timeout,
		}
	}

	/// Total time allowed for a `getUpdates` call held open for `timeout_secs`
	pub fn long_poll_timeout(&self, timeout_secs: u64) -> Duration {
		self.request_timeout + Duration::from_secs(timeout_secs)
	}

	/// Retrieves pending updates
	///
	/// # Arguments
	/// * `offset` - Identifier of the first update to return; earlier updates are
	///   acknowledged by the server
	/// * `timeout_secs` - Long polling timeout, 0 for a short poll
	pub async fn get_updates(
		&self,
		offset: Option<i64>,
		timeout_secs: u64,
	) -> Result<Vec<TelegramUpdate>, NotificationError> {
		let mut method = format!("getUpdates?timeout={}", timeout_secs);
		if let Some(offset) = offset {
			method.push_str(&format!("&offset={}", offset));
		}

		let response: TelegramResponse<Vec<TelegramUpdate>> = self
			.transport
			.get_json_with_timeout(
				&self.method_path(&method),
				self.long_poll_timeout(timeout_secs),
			)
			.await
			.map_err(|e| self.map_transport_error(e, None))?;

		Ok(self.unwrap_response(response, None)?.unwrap_or_default())
	}

	fn method_path(&self, method: &str) -> String {
		format!("/bot{}/{}", self.token.as_str(), method)
	}

	fn redact(&self, text: &str) -> String {
		if self.token.is_empty() {
			return text.to_string();
		}
		text.replace(self.token.as_str(), "REDACTED")
	}

	fn map_transport_error(
		&self,
		error: TransportError,
		recipient: Option<RecipientId>,
	) -> NotificationError {
		let metadata = recipient.map(|id| HashMap::from([("chat_id".to_string(), id.to_string())]));

		match &error {
			TransportError::Http {
				status_code, body, ..
			} => {
				let description = serde_json::from_str::<TelegramResponse<serde_json::Value>>(body)
					.ok()
					.and_then(|response| response.description)
					.unwrap_or_else(|| format!("HTTP status {}", status_code));
				NotificationError::rejected(self.redact(&description), None, metadata)
			}
			TransportError::Network(_) => {
				NotificationError::network_error(self.redact(&error.to_string()), None, metadata)
			}
			TransportError::ResponseParse(_) => {
				NotificationError::response_parse(self.redact(&error.to_string()), None, metadata)
			}
		}
	}

	fn unwrap_response<T: DeserializeOwned>(
		&self,
		response: TelegramResponse<T>,
		recipient: Option<RecipientId>,
	) -> Result<Option<T>, NotificationError> {
		if response.ok {
			return Ok(response.result);
		}
		let metadata = recipient.map(|id| HashMap::from([("chat_id".to_string(), id.to_string())]));
		let description = response
			.description
			.unwrap_or_else(|| "request was not accepted".to_string());
		Err(NotificationError::rejected(self.redact(&description), None, metadata))
	}
}

#[async_trait]
impl Notifier for TelegramClient {
	async fn send_message(
		&self,
		recipient: RecipientId,
		text: &str,
	) -> Result<(), NotificationError> {
		let request = SendMessageRequest {
			chat_id: recipient,
			text,
			parse_mode: "HTML",
			disable_web_page_preview: true,
		};

		let response: TelegramResponse<serde_json::Value> = self
			.transport
			.post_json(&self.method_path("sendMessage"), &request)
			.await
			.map_err(|e| self.map_transport_error(e, Some(recipient)))?;

		self.unwrap_response(response, Some(recipient))?;
		Ok(())
	}
}

#[async_trait]
impl UpdateSource for TelegramClient {
	async fn get_updates(
		&self,
		offset: Option<i64>,
		timeout_secs: u64,
	) -> Result<Vec<TelegramUpdate>, NotificationError> {
		TelegramClient::get_updates(self, offset, timeout_secs).await
	}
}

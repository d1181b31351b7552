//! Telegram Bot API payloads.
//!
//! Only the fields used by the command listener are modelled:
//! <https://core.telegram.org/bots/api#getting-updates>

use serde::{Deserialize, Serialize};

use crate::models::RecipientId;

/// Envelope of every Bot API response
#[derive(Debug, Clone, Deserialize)]
pub struct TelegramResponse<T> {
	pub ok: bool,
	pub result: Option<T>,
	#[serde(default)]
	pub description: Option<String>,
	#[serde(default)]
	pub error_code: Option<i64>,
}

/// Incoming update from `getUpdates`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelegramUpdate {
	pub update_id: i64,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub message: Option<TelegramMessage>,
}

/// Message carried by an update
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelegramMessage {
	pub message_id: i64,
	pub chat: TelegramChat,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub text: Option<String>,
}

/// Chat a message was posted in
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelegramChat {
	pub id: RecipientId,
}

/// Body of `sendMessage`
#[derive(Debug, Clone, Serialize)]
pub struct SendMessageRequest<'a> {
	pub chat_id: RecipientId,
	pub text: &'a str,
	pub parse_mode: &'static str,
	pub disable_web_page_preview: bool,
}

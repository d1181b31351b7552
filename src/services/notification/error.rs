//! Notification error types.

use crate::utils::logging::error::{ErrorContext, TraceableError};
use std::collections::HashMap;
use thiserror::Error;

/// Failures while delivering a message to one recipient
#[derive(Debug, Error)]
pub enum NotificationError {
	/// The message could not reach the messaging service
	#[error("Network error: {0}")]
	NetworkError(Box<ErrorContext>),

	/// The messaging service refused the message (blocked bot, unknown chat, ...)
	#[error("Delivery rejected: {0}")]
	Rejected(Box<ErrorContext>),

	/// The messaging service answered with an unexpected document
	#[error("Failed to parse response: {0}")]
	ResponseParse(Box<ErrorContext>),
}

impl NotificationError {
	pub fn network_error(
		msg: impl Into<String>,
		source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
		metadata: Option<HashMap<String, String>>,
	) -> Self {
		Self::NetworkError(Box::new(ErrorContext::new(msg, source, metadata)))
	}

	pub fn rejected(
		msg: impl Into<String>,
		source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
		metadata: Option<HashMap<String, String>>,
	) -> Self {
		Self::Rejected(Box::new(ErrorContext::new(msg, source, metadata)))
	}

	pub fn response_parse(
		msg: impl Into<String>,
		source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
		metadata: Option<HashMap<String, String>>,
	) -> Self {
		Self::ResponseParse(Box::new(ErrorContext::new(msg, source, metadata)))
	}
}

impl TraceableError for NotificationError {
	fn trace_id(&self) -> String {
		match self {
			Self::NetworkError(ctx) => ctx.trace_id.clone(),
			Self::Rejected(ctx) => ctx.trace_id.clone(),
			Self::ResponseParse(ctx) => ctx.trace_id.clone(),
		}
	}
}

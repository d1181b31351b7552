//! Transport error types.

use crate::utils::logging::error::{ErrorContext, TraceableError};
use std::collections::HashMap;
use thiserror::Error;

/// Failures of a single HTTP exchange
#[derive(Debug, Error)]
pub enum TransportError {
	/// The server answered with a non-success status
	#[error("HTTP error: status {status_code} for URL {url}")]
	Http {
		status_code: u16,
		url: String,
		body: String,
		context: Box<ErrorContext>,
	},

	/// The request could not be sent or the response could not be read
	/// (connection failures and timeouts)
	#[error("Network error: {0}")]
	Network(Box<ErrorContext>),

	/// The response body is not the expected JSON document
	#[error("Failed to parse response: {0}")]
	ResponseParse(Box<ErrorContext>),
}

impl TransportError {
	/// Creates an HTTP status error
	pub fn http(
		status_code: u16,
		url: impl Into<String>,
		body: impl Into<String>,
		metadata: Option<HashMap<String, String>>,
	) -> Self {
		let url = url.into();
		let message = format!("HTTP error: status {} for URL {}", status_code, url);
		Self::Http {
			status_code,
			url,
			body: body.into(),
			context: Box::new(ErrorContext::new(message, None, metadata)),
		}
	}

	/// Creates a network error
	pub fn network(
		message: impl Into<String>,
		source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
		metadata: Option<HashMap<String, String>>,
	) -> Self {
		Self::Network(Box::new(ErrorContext::new(message, source, metadata)))
	}

	/// Creates a response parse error
	pub fn response_parse(
		message: impl Into<String>,
		source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
		metadata: Option<HashMap<String, String>>,
	) -> Self {
		Self::ResponseParse(Box::new(ErrorContext::new(message, source, metadata)))
	}

	/// HTTP status code, for status errors
	pub fn status_code(&self) -> Option<u16> {
		match self {
			Self::Http { status_code, .. } => Some(*status_code),
			_ => None,
		}
	}

	/// Checks if the server answered 404
	pub fn is_not_found(&self) -> bool {
		self.status_code() == Some(404)
	}
}

impl TraceableError for TransportError {
	fn trace_id(&self) -> String {
		match self {
			Self::Http { context, .. } => context.trace_id.clone(),
			Self::Network(context) => context.trace_id.clone(),
			Self::ResponseParse(context) => context.trace_id.clone(),
		}
	}
}

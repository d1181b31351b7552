//! Explorer client error types.

use crate::{
	services::transport::TransportError,
	utils::logging::error::{ErrorContext, TraceableError},
};
use std::collections::HashMap;
use thiserror::Error;

/// Errors returned by a [`BlockSource`](super::BlockSource)
#[derive(Debug, Error)]
pub enum ExplorerError {
	/// Network failure, timeout or non-success status. Transient.
	#[error("Explorer request failed: {0}")]
	Transport(Box<ErrorContext>),

	/// The explorer does not know the requested block
	#[error("Block not found: {block_id}")]
	NotFound {
		block_id: String,
		context: Box<ErrorContext>,
	},

	/// The explorer answered with an unexpected document
	#[error("Failed to parse explorer response: {0}")]
	ResponseParse(Box<ErrorContext>),
}

impl ExplorerError {
	/// Creates a transport error
	pub fn transport(
		message: impl Into<String>,
		source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
		metadata: Option<HashMap<String, String>>,
	) -> Self {
		Self::Transport(Box::new(ErrorContext::new(message, source, metadata)))
	}

	/// Creates a not found error
	pub fn not_found(
		block_id: impl Into<String>,
		source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
		metadata: Option<HashMap<String, String>>,
	) -> Self {
		let block_id = block_id.into();
		let message = format!("Block not found: {}", &block_id);
		Self::NotFound {
			block_id,
			context: Box::new(ErrorContext::new(message, source, metadata)),
		}
	}

	/// Creates a response parse error
	pub fn response_parse(
		message: impl Into<String>,
		source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
		metadata: Option<HashMap<String, String>>,
	) -> Self {
		Self::ResponseParse(Box::new(ErrorContext::new(message, source, metadata)))
	}

	/// Maps a transport failure, keeping parse failures distinct
	pub fn from_transport(error: TransportError, operation: &str) -> Self {
		let message = format!("{} failed: {}", operation, error);
		match error {
			TransportError::ResponseParse(_) => {
				Self::response_parse(message, Some(Box::new(error)), None)
			}
			_ => Self::transport(message, Some(Box::new(error)), None),
		}
	}

	/// Checks if this is a not found error
	pub fn is_not_found(&self) -> bool {
		matches!(self, Self::NotFound { .. })
	}

	/// Short label used for metrics
	pub fn kind(&self) -> &'static str {
		match self {
			Self::Transport(_) => "transport",
			Self::NotFound { .. } => "not_found",
			Self::ResponseParse(_) => "parse",
		}
	}
}

impl TraceableError for ExplorerError {
	fn trace_id(&self) -> String {
		match self {
			Self::Transport(context) => context.trace_id.clone(),
			Self::NotFound { context, .. } => context.trace_id.clone(),
			Self::ResponseParse(context) => context.trace_id.clone(),
		}
	}
}

//! Error context shared by every error type in the crate.
//!
//! Each error carries an [`ErrorContext`] with a human readable message, an optional
//! source error, optional key/value metadata, a timestamp and a trace id that ties
//! the log line emitted at creation time to the error surfaced later.

use chrono::Utc;
use std::{collections::HashMap, fmt};
use uuid::Uuid;

/// Context attached to an error
#[derive(Debug)]
pub struct ErrorContext {
	/// Human readable description of the failure
	pub message: String,
	/// Underlying error, if any
	pub source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
	/// Additional key/value information (recipient, block id, url, ...)
	pub metadata: Option<HashMap<String, String>>,
	/// RFC 3339 timestamp of when the error was created
	pub timestamp: String,
	/// Unique id used to correlate log lines with the error
	pub trace_id: String,
}

impl ErrorContext {
	/// Creates a new error context without logging it
	pub fn new(
		message: impl Into<String>,
		source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
		metadata: Option<HashMap<String, String>>,
	) -> Self {
		Self {
			message: message.into(),
			source,
			metadata,
			timestamp: Utc::now().to_rfc3339(),
			trace_id: Uuid::new_v4().to_string(),
		}
	}

	/// Creates a new error context and emits it as an `error` event
	pub fn new_with_log(
		message: impl Into<String>,
		source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
		metadata: Option<HashMap<String, String>>,
	) -> Self {
		let context = Self::new(message, source, metadata);
		context.log_error();
		context
	}

	/// Adds a single metadata entry
	pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
		self.metadata
			.get_or_insert_with(HashMap::new)
			.insert(key.into(), value.into());
		self
	}

	/// Formats the message followed by the metadata, sorted by key
	pub fn format_with_metadata(&self) -> String {
		let mut result = self.message.clone();
		if let Some(metadata) = &self.metadata {
			let mut entries: Vec<_> = metadata.iter().collect();
			entries.sort_by(|a, b| a.0.cmp(b.0));
			for (key, value) in entries {
				result.push_str(&format!(" [{}={}]", key, value));
			}
		}
		result
	}

	fn log_error(&self) {
		match &self.source {
			Some(source) => tracing::error!(
				trace_id = %self.trace_id,
				timestamp = %self.timestamp,
				error.source = %source,
				"{}",
				self.format_with_metadata()
			),
			None => tracing::error!(
				trace_id = %self.trace_id,
				timestamp = %self.timestamp,
				"{}",
				self.format_with_metadata()
			),
		}
	}
}

impl fmt::Display for ErrorContext {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.format_with_metadata())
	}
}

/// Errors that expose the trace id of their context
pub trait TraceableError: std::error::Error + Send + Sync {
	fn trace_id(&self) -> String;
}

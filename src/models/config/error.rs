//! Configuration error types.

use crate::utils::logging::error::{ErrorContext, TraceableError};
use std::collections::HashMap;
use thiserror::Error;

/// Errors raised while building the application configuration
#[derive(Debug, Error)]
pub enum ConfigError {
	/// A required variable is not set
	#[error("Missing configuration: {0}")]
	MissingValue(Box<ErrorContext>),

	/// A variable is set but cannot be used
	#[error("Invalid configuration: {0}")]
	InvalidValue(Box<ErrorContext>),
}

impl ConfigError {
	/// Creates a missing value error for the given variable
	pub fn missing_value(
		name: &str,
		metadata: Option<HashMap<String, String>>,
	) -> Self {
		Self::MissingValue(Box::new(ErrorContext::new_with_log(
			format!("environment variable {} is required", name),
			None,
			metadata,
		)))
	}

	/// Creates an invalid value error
	pub fn invalid_value(
		message: impl Into<String>,
		source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
		metadata: Option<HashMap<String, String>>,
	) -> Self {
		Self::InvalidValue(Box::new(ErrorContext::new_with_log(
			message, source, metadata,
		)))
	}
}

impl TraceableError for ConfigError {
	fn trace_id(&self) -> String {
		match self {
			Self::MissingValue(context) => context.trace_id.clone(),
			Self::InvalidValue(context) => context.trace_id.clone(),
		}
	}
}

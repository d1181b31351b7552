//! Repository error types.

use crate::utils::logging::error::{ErrorContext, TraceableError};
use std::collections::HashMap;
use thiserror::Error;

/// Errors raised while loading or persisting repository state
#[derive(Debug, Error)]
pub enum RepositoryError {
	/// Input rejected before touching storage
	#[error("Validation error: {0}")]
	ValidationError(Box<ErrorContext>),

	/// Stored state could not be read
	#[error("Load error: {0}")]
	LoadError(Box<ErrorContext>),

	/// State could not be written back
	#[error("Save error: {0}")]
	SaveError(Box<ErrorContext>),
}

impl RepositoryError {
	pub fn validation_error(
		msg: impl Into<String>,
		source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
		metadata: Option<HashMap<String, String>>,
	) -> Self {
		Self::ValidationError(Box::new(ErrorContext::new_with_log(msg, source, metadata)))
	}

	pub fn load_error(
		msg: impl Into<String>,
		source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
		metadata: Option<HashMap<String, String>>,
	) -> Self {
		Self::LoadError(Box::new(ErrorContext::new_with_log(msg, source, metadata)))
	}

	pub fn save_error(
		msg: impl Into<String>,
		source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
		metadata: Option<HashMap<String, String>>,
	) -> Self {
		Self::SaveError(Box::new(ErrorContext::new_with_log(msg, source, metadata)))
	}
}

impl TraceableError for RepositoryError {
	fn trace_id(&self) -> String {
		match self {
			Self::ValidationError(ctx) => ctx.trace_id.clone(),
			Self::LoadError(ctx) => ctx.trace_id.clone(),
			Self::SaveError(ctx) => ctx.trace_id.clone(),
		}
	}
}

//! Block watcher error types and handling.
//!
//! Provides a comprehensive error handling system for block watching operations,
//! including listing, storage and processing failures.

use crate::utils::logging::error::{ErrorContext, TraceableError};
use std::collections::HashMap;
use thiserror::Error;

/// Represents possible errors that can occur during block watching operations
#[derive(Debug, Error)]
pub enum BlockWatcherError {
	/// The explorer's recent block list could not be retrieved
	#[error("Listing error: {0}")]
	ListingError(Box<ErrorContext>),

	/// Errors related to storage operations
	#[error("Storage error: {0}")]
	StorageError(Box<ErrorContext>),

	/// Errors related to the background task lifecycle
	#[error("Task error: {0}")]
	TaskError(Box<ErrorContext>),

	/// Other errors that don't fit into the categories above
	#[error(transparent)]
	Other(#[from] anyhow::Error),
}

impl BlockWatcherError {
	/// Creates a listing error and logs it
	pub fn listing_error(
		msg: impl Into<String>,
		source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
		metadata: Option<HashMap<String, String>>,
	) -> Self {
		Self::ListingError(Box::new(ErrorContext::new_with_log(msg, source, metadata)))
	}

	/// Creates a storage error and logs it
	pub fn storage_error(
		msg: impl Into<String>,
		source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
		metadata: Option<HashMap<String, String>>,
	) -> Self {
		Self::StorageError(Box::new(ErrorContext::new_with_log(msg, source, metadata)))
	}

	/// Creates a task error and logs it
	pub fn task_error(
		msg: impl Into<String>,
		source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
		metadata: Option<HashMap<String, String>>,
	) -> Self {
		Self::TaskError(Box::new(ErrorContext::new_with_log(msg, source, metadata)))
	}
}

impl TraceableError for BlockWatcherError {
	fn trace_id(&self) -> String {
		match self {
			Self::ListingError(ctx) => ctx.trace_id.clone(),
			Self::StorageError(ctx) => ctx.trace_id.clone(),
			Self::TaskError(ctx) => ctx.trace_id.clone(),
			Self::Other(_) => uuid::Uuid::new_v4().to_string(),
		}
	}
}

//! Logging setup.
//!
//! Installs a global `tracing` subscriber. Verbosity comes from `RUST_LOG`
//! (defaults to `info`) and the output format from [`LogFormat`].

pub mod error;

use std::str::FromStr;
use tracing_subscriber::EnvFilter;

/// Output format of the log subscriber
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
	/// Single line per event
	#[default]
	Compact,
	/// Multi-line, human friendly output
	Pretty,
	/// One JSON object per event
	Json,
}

impl FromStr for LogFormat {
	type Err = String;

	fn from_str(value: &str) -> Result<Self, Self::Err> {
		match value.trim().to_ascii_lowercase().as_str() {
			"compact" => Ok(LogFormat::Compact),
			"pretty" => Ok(LogFormat::Pretty),
			"json" => Ok(LogFormat::Json),
			other => Err(format!("unknown log format '{}'", other)),
		}
	}
}

/// Installs the global subscriber
///
/// # Errors
/// Fails if a global subscriber has already been installed.
pub fn setup_logging(format: LogFormat) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
	let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
	let builder = tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_target(true);

	match format {
		LogFormat::Compact => builder.compact().try_init(),
		LogFormat::Pretty => builder.pretty().try_init(),
		LogFormat::Json => builder.json().try_init(),
	}
}

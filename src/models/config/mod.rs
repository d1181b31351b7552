//! Application configuration.
//!
//! Configuration is read from environment variables. [`AppConfig::from_lookup`]
//! accepts any key/value lookup so the parsing rules can be exercised without
//! touching the process environment.

mod error;

pub use error::ConfigError;

use reqwest::Url;
use std::{collections::HashMap, net::SocketAddr, path::PathBuf, str::FromStr, time::Duration};

use crate::{models::SecretString, utils::logging::LogFormat};

/// Default explorer base URL
pub const DEFAULT_API_BASE: &str = "https://mempool.space";
/// Default Telegram Bot API base URL
pub const DEFAULT_TELEGRAM_API_BASE: &str = "https://api.telegram.org";
/// ckpool (Solo CK) id in the mempool.space pool database
pub const DEFAULT_POOL_ID: u64 = 49;
/// Display name of the default tracked pool
pub const DEFAULT_POOL_LABEL: &str = "ckpool (Solo CK)";
/// Name fragments identifying ckpool blocks
pub const DEFAULT_POOL_NAME_FRAGMENTS: &[&str] = &["ckpool", "solo ck", "solock"];
/// Slug fragments identifying ckpool blocks
pub const DEFAULT_POOL_SLUG_FRAGMENTS: &[&str] = &["solock"];

/// Explorer endpoints and request settings
#[derive(Debug, Clone, PartialEq)]
pub struct ExplorerConfig {
	/// API base URL without trailing slash
	pub api_base: String,
	/// Web UI base URL used for "view block" links, without trailing slash
	pub web_base: String,
	/// Display name of the explorer used in links
	pub name: String,
	/// Timeout applied to every request
	pub request_timeout: Duration,
}

impl Default for ExplorerConfig {
	fn default() -> Self {
		Self {
			api_base: DEFAULT_API_BASE.to_string(),
			web_base: DEFAULT_API_BASE.to_string(),
			name: "mempool.space".to_string(),
			request_timeout: Duration::from_secs(15),
		}
	}
}

/// Watcher loop settings
#[derive(Debug, Clone, PartialEq)]
pub struct WatcherConfig {
	/// Delay between the end of one cycle and the start of the next
	pub poll_interval: Duration,
	/// Maximum number of block detail requests in flight
	pub max_parallel_fetches: usize,
}

impl Default for WatcherConfig {
	fn default() -> Self {
		Self {
			poll_interval: Duration::from_secs(60),
			max_parallel_fetches: 5,
		}
	}
}

/// Signals used to attribute a block to the tracked pool
#[derive(Debug, Clone, PartialEq)]
pub struct PoolFilterConfig {
	/// Display name of the tracked pool used in chat replies
	pub label: String,
	/// Exact pool id, if any
	pub target_id: Option<u64>,
	/// Case-insensitive fragments matched against the pool name
	pub name_fragments: Vec<String>,
	/// Case-insensitive fragments matched against the pool slug
	pub slug_fragments: Vec<String>,
}

impl Default for PoolFilterConfig {
	fn default() -> Self {
		Self {
			label: DEFAULT_POOL_LABEL.to_string(),
			target_id: Some(DEFAULT_POOL_ID),
			name_fragments: DEFAULT_POOL_NAME_FRAGMENTS
				.iter()
				.map(|s| s.to_string())
				.collect(),
			slug_fragments: DEFAULT_POOL_SLUG_FRAGMENTS
				.iter()
				.map(|s| s.to_string())
				.collect(),
		}
	}
}

/// Locations of the durable files
#[derive(Debug, Clone, PartialEq)]
pub struct StorageConfig {
	/// JSON file holding the subscriber set
	pub subscribers_file: PathBuf,
	/// Directory holding `index.json` and one `<hash>.json` per cached block
	pub blocks_dir: PathBuf,
}

impl Default for StorageConfig {
	fn default() -> Self {
		Self {
			subscribers_file: PathBuf::from("ckpool_bot_state.json"),
			blocks_dir: PathBuf::from("blocks"),
		}
	}
}

/// Metrics endpoint settings
#[derive(Debug, Clone, PartialEq)]
pub struct MetricsConfig {
	pub enabled: bool,
	pub address: SocketAddr,
}

impl Default for MetricsConfig {
	fn default() -> Self {
		Self {
			enabled: false,
			address: SocketAddr::from(([127, 0, 0, 1], 8081)),
		}
	}
}

/// Complete application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
	/// Telegram bot token
	pub bot_token: SecretString,
	/// Telegram Bot API base URL without trailing slash
	pub telegram_api_base: String,
	/// Whether the chat command listener runs
	pub commands_enabled: bool,
	pub explorer: ExplorerConfig,
	pub watcher: WatcherConfig,
	pub pool: PoolFilterConfig,
	pub storage: StorageConfig,
	pub metrics: MetricsConfig,
	pub log_format: LogFormat,
}

impl AppConfig {
	/// Reads the configuration from the process environment
	pub fn from_env() -> Result<Self, ConfigError> {
		Self::from_lookup(|key| std::env::var(key).ok())
	}

	/// Reads the configuration through `lookup`.
	///
	/// Unset and blank variables fall back to their defaults; only `BOT_TOKEN`
	/// is required.
	pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
	where
		F: Fn(&str) -> Option<String>,
	{
		let get = |key: &str| {
			lookup(key)
				.map(|value| value.trim().to_string())
				.filter(|value| !value.is_empty())
		};

		let bot_token = get("BOT_TOKEN")
			.map(SecretString::new)
			.ok_or_else(|| ConfigError::missing_value("BOT_TOKEN", None))?;

		let api_base = parse_base_url("MEMPOOL_API_BASE", get("MEMPOOL_API_BASE"), DEFAULT_API_BASE)?;
		let web_base = parse_base_url("MEMPOOL_WEB_BASE", get("MEMPOOL_WEB_BASE"), &api_base)?;
		let telegram_api_base = parse_base_url(
			"TELEGRAM_API_BASE",
			get("TELEGRAM_API_BASE"),
			DEFAULT_TELEGRAM_API_BASE,
		)?;

		let explorer = ExplorerConfig {
			api_base,
			web_base,
			name: get("EXPLORER_NAME").unwrap_or_else(|| ExplorerConfig::default().name),
			request_timeout: Duration::from_secs(parse_positive(
				"REQUEST_TIMEOUT",
				get("REQUEST_TIMEOUT"),
				15,
			)?),
		};

		let watcher = WatcherConfig {
			poll_interval: Duration::from_secs(parse_positive(
				"CHECK_INTERVAL",
				get("CHECK_INTERVAL"),
				60,
			)?),
			max_parallel_fetches: parse_positive(
				"MAX_PARALLEL_FETCH",
				get("MAX_PARALLEL_FETCH"),
				5,
			)?,
		};

		let defaults = PoolFilterConfig::default();
		let pool = PoolFilterConfig {
			label: get("POOL_LABEL").unwrap_or(defaults.label.clone()),
			target_id: match lookup("POOL_ID").map(|value| value.trim().to_string()) {
				None => defaults.target_id,
				Some(value) if value.is_empty() => None,
				Some(value) => Some(parse_value("POOL_ID", &value)?),
			},
			name_fragments: get("POOL_NAME_FRAGMENTS")
				.map(|value| split_fragments(&value))
				.unwrap_or(defaults.name_fragments),
			slug_fragments: get("POOL_SLUG_FRAGMENTS")
				.map(|value| split_fragments(&value))
				.unwrap_or(defaults.slug_fragments),
		};

		let storage_defaults = StorageConfig::default();
		let storage = StorageConfig {
			subscribers_file: get("DATA_FILE")
				.map(PathBuf::from)
				.unwrap_or(storage_defaults.subscribers_file),
			blocks_dir: get("BLOCKS_DIR")
				.map(PathBuf::from)
				.unwrap_or(storage_defaults.blocks_dir),
		};

		let metrics_defaults = MetricsConfig::default();
		let metrics = MetricsConfig {
			enabled: parse_bool("METRICS_ENABLED", get("METRICS_ENABLED"), metrics_defaults.enabled)?,
			address: match get("METRICS_ADDRESS") {
				Some(value) => parse_value("METRICS_ADDRESS", &value)?,
				None => metrics_defaults.address,
			},
		};

		let log_format = match get("LOG_FORMAT") {
			Some(value) => value.parse::<LogFormat>().map_err(|e| {
				ConfigError::invalid_value(
					format!("LOG_FORMAT is invalid: {}", e),
					None,
					Some(HashMap::from([("value".to_string(), value.clone())])),
				)
			})?,
			None => LogFormat::default(),
		};

		Ok(Self {
			bot_token,
			telegram_api_base,
			commands_enabled: parse_bool("COMMANDS_ENABLED", get("COMMANDS_ENABLED"), true)?,
			explorer,
			watcher,
			pool,
			storage,
			metrics,
			log_format,
		})
	}
}

fn parse_value<T>(name: &str, value: &str) -> Result<T, ConfigError>
where
	T: FromStr,
	T::Err: std::error::Error + Send + Sync + 'static,
{
	value.parse::<T>().map_err(|e| {
		ConfigError::invalid_value(
			format!("{} has an invalid value", name),
			Some(Box::new(e)),
			Some(HashMap::from([("value".to_string(), value.to_string())])),
		)
	})
}

fn parse_positive<T>(name: &str, value: Option<String>, default: T) -> Result<T, ConfigError>
where
	T: FromStr + PartialOrd + Default,
	T::Err: std::error::Error + Send + Sync + 'static,
{
	let Some(value) = value else {
		return Ok(default);
	};
	let parsed: T = parse_value(name, &value)?;
	if parsed <= T::default() {
		return Err(ConfigError::invalid_value(
			format!("{} must be greater than 0", name),
			None,
			Some(HashMap::from([("value".to_string(), value)])),
		));
	}
	Ok(parsed)
}

fn parse_bool(name: &str, value: Option<String>, default: bool) -> Result<bool, ConfigError> {
	match value.map(|v| v.to_ascii_lowercase()).as_deref() {
		None => Ok(default),
		Some("1" | "true" | "yes" | "on") => Ok(true),
		Some("0" | "false" | "no" | "off") => Ok(false),
		Some(other) => Err(ConfigError::invalid_value(
			format!("{} must be a boolean", name),
			None,
			Some(HashMap::from([("value".to_string(), other.to_string())])),
		)),
	}
}

fn parse_base_url(name: &str, value: Option<String>, default: &str) -> Result<String, ConfigError> {
	let value = value.unwrap_or_else(|| default.to_string());
	let url = Url::parse(&value).map_err(|e| {
		ConfigError::invalid_value(
			format!("{} is not a valid URL", name),
			Some(Box::new(e)),
			Some(HashMap::from([("value".to_string(), value.clone())])),
		)
	})?;
	if !matches!(url.scheme(), "http" | "https") {
		return Err(ConfigError::invalid_value(
			format!("{} must use http or https", name),
			None,
			Some(HashMap::from([("value".to_string(), value.clone())])),
		));
	}
	Ok(value.trim_end_matches('/').to_string())
}

fn split_fragments(value: &str) -> Vec<String> {
	value
		.split(',')
		.map(|fragment| fragment.trim().to_lowercase())
		.filter(|fragment| !fragment.is_empty())
		.collect()
}

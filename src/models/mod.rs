//! Domain models and data structures for pool block monitoring.
//!
//! - `block`: Explorer block records and block queries
//! - `config`: Configuration loading and validation
//! - `security`: Secret values
//! - `telegram`: Telegram Bot API payloads

mod block;
mod config;
mod security;
mod telegram;

pub use block::{
	is_valid_block_id, BlockDetail, BlockExtras, BlockQuery, BlockSummary, PoolDescriptor,
};
pub use config::{
	AppConfig, ConfigError, ExplorerConfig, MetricsConfig, PoolFilterConfig, StorageConfig,
	WatcherConfig, DEFAULT_API_BASE, DEFAULT_POOL_ID, DEFAULT_TELEGRAM_API_BASE,
};
pub use security::SecretString;
pub use telegram::{
	SendMessageRequest, TelegramChat, TelegramMessage, TelegramResponse, TelegramUpdate,
};

/// Identifier of a notification recipient (a Telegram chat id)
pub type RecipientId = i64;

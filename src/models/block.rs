//! Block data structures.
//!
//! Note: These structures follow the mempool.space REST API:
//! <https://mempool.space/docs/api/rest#get-blocks> and
//! <https://mempool.space/docs/api/rest#get-block>

use chrono::DateTime;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Entry of the explorer's recent blocks list.
///
/// Only the fields needed to diff against the height index are kept; everything
/// else in the list response is ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockSummary {
	/// Block hash
	pub id: String,
	/// Block height
	pub height: u64,
}

/// Mining pool attribution embedded in a block detail response.
///
/// Every field is optional because the explorer's pool attribution has changed
/// shape across API versions.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PoolDescriptor {
	/// Numeric pool id in the explorer's pool database
	#[serde(
		default,
		deserialize_with = "deserialize_lenient_u64",
		skip_serializing_if = "Option::is_none"
	)]
	pub id: Option<u64>,
	/// Display name, e.g. "Solo CK"
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub name: Option<String>,
	/// URL slug, e.g. "solock"
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub slug: Option<String>,
	/// Fields not interpreted by this crate
	#[serde(flatten)]
	pub other: Map<String, Value>,
}

impl PoolDescriptor {
	/// A descriptor without any field carries no attribution at all
	pub fn is_empty(&self) -> bool {
		self.id.is_none() && self.name.is_none() && self.slug.is_none() && self.other.is_empty()
	}
}

/// Auxiliary `extras` object of a block detail response
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BlockExtras {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub pool: Option<PoolDescriptor>,
	#[serde(flatten)]
	pub other: Map<String, Value>,
}

/// Full block record as returned by the explorer's block detail endpoint.
///
/// Fields the crate does not interpret are kept in `other` so the cached copy
/// is a faithful copy of the explorer response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockDetail {
	/// Block hash
	pub id: String,
	/// Block height
	pub height: u64,
	/// Block time (Unix timestamp in seconds, UTC)
	pub timestamp: i64,
	/// Number of transactions, when reported
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub tx_count: Option<u64>,
	/// Pool attribution at the top level (newer API versions)
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub pool: Option<PoolDescriptor>,
	/// Auxiliary data, which may carry the pool attribution (older API versions)
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub extras: Option<BlockExtras>,
	#[serde(flatten)]
	pub other: Map<String, Value>,
}

impl BlockDetail {
	/// Returns the embedded pool descriptor.
	///
	/// The top level `pool` wins when it is non-empty, otherwise `extras.pool` is used.
	pub fn pool_descriptor(&self) -> Option<&PoolDescriptor> {
		let top_level = self.pool.as_ref().filter(|pool| !pool.is_empty());
		top_level.or_else(|| {
			self.extras
				.as_ref()
				.and_then(|extras| extras.pool.as_ref())
				.filter(|pool| !pool.is_empty())
		})
	}

	/// Returns the pool name, if any non-empty name is attached
	pub fn pool_name(&self) -> Option<&str> {
		self.pool_descriptor()
			.and_then(|pool| pool.name.as_deref())
			.filter(|name| !name.is_empty())
	}

	/// Block time formatted as `YYYY-MM-DD HH:MM UTC`
	pub fn formatted_time(&self) -> String {
		match DateTime::from_timestamp(self.timestamp, 0) {
			Some(time) => time.format("%Y-%m-%d %H:%M UTC").to_string(),
			None => self.timestamp.to_string(),
		}
	}

	/// Transaction count, or `?` when the explorer did not report one
	///
	/// Every block holds at least its coinbase transaction, so a count of zero is
	/// shown as unreported too.
	pub fn tx_count_display(&self) -> String {
		self.tx_count
			.filter(|count| *count > 0)
			.map(|count| count.to_string())
			.unwrap_or_else(|| "?".to_string())
	}
}

/// Longest identifier accepted as a block hash
const MAX_BLOCK_ID_LEN: usize = 128;

/// Checks that `id` looks like a block hash.
///
/// Identifiers end up in URL paths and file names, so only ASCII alphanumerics
/// are accepted, and `index` is reserved for the height index file.
pub fn is_valid_block_id(id: &str) -> bool {
	!id.is_empty()
		&& id.len() <= MAX_BLOCK_ID_LEN
		&& id.bytes().all(|b| b.is_ascii_alphanumeric())
		&& !id.eq_ignore_ascii_case("index")
}

/// Selects a cached block by height, by hash, or the highest cached height
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockQuery {
	/// Block with the highest height in the index
	Latest,
	/// Block indexed at the given height
	Height(u64),
	/// Block with the given hash (lower-cased)
	Id(String),
}

impl BlockQuery {
	/// Interprets a user supplied argument.
	///
	/// No argument selects the latest block, an all-digit argument a height, and
	/// anything else a block hash.
	pub fn parse(argument: Option<&str>) -> Self {
		match argument.map(str::trim).filter(|arg| !arg.is_empty()) {
			None => BlockQuery::Latest,
			Some(arg) if arg.bytes().all(|b| b.is_ascii_digit()) => match arg.parse::<u64>() {
				Ok(height) => BlockQuery::Height(height),
				Err(_) => BlockQuery::Id(arg.to_string()),
			},
			Some(arg) => BlockQuery::Id(arg.to_lowercase()),
		}
	}
}

/// Accepts a number, a numeric string or null
fn deserialize_lenient_u64<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
	D: Deserializer<'de>,
{
	let value = Option::<Value>::deserialize(deserializer)?;
	Ok(match value {
		Some(Value::Number(number)) => number.as_u64(),
		Some(Value::String(text)) => text.trim().parse().ok(),
		_ => None,
	})
}

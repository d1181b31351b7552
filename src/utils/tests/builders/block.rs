//! Test helper utilities for block records
//!
//! - `BlockDetailBuilder`: Builder for creating test BlockDetail instances

use serde_json::Map;

use crate::models::{BlockDetail, BlockExtras, BlockSummary, PoolDescriptor};

/// A builder for creating test block details with default values.
#[derive(Debug, Default)]
pub struct BlockDetailBuilder {
	id: Option<String>,
	height: Option<u64>,
	timestamp: Option<i64>,
	tx_count: Option<u64>,
	pool: Option<PoolDescriptor>,
	extras_pool: Option<PoolDescriptor>,
}

impl BlockDetailBuilder {
	/// Creates a new BlockDetailBuilder instance.
	pub fn new() -> Self {
		Self::default()
	}

	/// Sets the block hash.
	pub fn id(mut self, id: &str) -> Self {
		self.id = Some(id.to_string());
		self
	}

	/// Sets the block height.
	pub fn height(mut self, height: u64) -> Self {
		self.height = Some(height);
		self
	}

	/// Sets the block time.
	pub fn timestamp(mut self, timestamp: i64) -> Self {
		self.timestamp = Some(timestamp);
		self
	}

	/// Sets the transaction count.
	pub fn tx_count(mut self, tx_count: u64) -> Self {
		self.tx_count = Some(tx_count);
		self
	}

	/// Attaches a top level pool descriptor.
	pub fn pool(mut self, id: Option<u64>, name: Option<&str>, slug: Option<&str>) -> Self {
		self.pool = Some(descriptor(id, name, slug));
		self
	}

	/// Attaches a pool descriptor under `extras`.
	pub fn extras_pool(mut self, id: Option<u64>, name: Option<&str>, slug: Option<&str>) -> Self {
		self.extras_pool = Some(descriptor(id, name, slug));
		self
	}

	/// Shorthand for a block mined by ckpool.
	pub fn ckpool(self) -> Self {
		self.extras_pool(Some(49), Some("Solo CK"), Some("solock"))
	}

	/// Builds the BlockDetail instance.
	pub fn build(self) -> BlockDetail {
		BlockDetail {
			id: self.id.unwrap_or_else(|| "abc".to_string()),
			height: self.height.unwrap_or(800000),
			timestamp: self.timestamp.unwrap_or(1690168629),
			tx_count: self.tx_count,
			pool: self.pool,
			extras: self.extras_pool.map(|pool| BlockExtras {
				pool: Some(pool),
				other: Map::new(),
			}),
			other: Map::new(),
		}
	}

	/// Builds the matching list entry.
	pub fn build_summary(self) -> BlockSummary {
		let detail = self.build();
		BlockSummary {
			id: detail.id,
			height: detail.height,
		}
	}
}

fn descriptor(id: Option<u64>, name: Option<&str>, slug: Option<&str>) -> PoolDescriptor {
	PoolDescriptor {
		id,
		name: name.map(str::to_string),
		slug: slug.map(str::to_string),
		other: Map::new(),
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_default_block() {
		let block = BlockDetailBuilder::new().build();

		assert_eq!(block.id, "abc");
		assert_eq!(block.height, 800000);
		assert!(block.pool_descriptor().is_none());
	}

	#[test]
	fn test_ckpool_block() {
		let block = BlockDetailBuilder::new().id("def").height(5).ckpool().build();

		assert_eq!(block.id, "def");
		assert_eq!(block.pool_descriptor().unwrap().id, Some(49));
	}
}

//! Pool attribution filter.
//!
//! Decides whether a block was mined by the tracked pool from the pool
//! descriptor the explorer embeds in the block record.

use crate::models::{BlockDetail, PoolFilterConfig};

/// Matches blocks against the tracked pool's id, name and slug
#[derive(Debug, Clone, PartialEq)]
pub struct PoolFilter {
	target_id: Option<u64>,
	name_fragments: Vec<String>,
	slug_fragments: Vec<String>,
}

impl PoolFilter {
	/// Creates a filter from configuration
	pub fn new(config: &PoolFilterConfig) -> Self {
		let normalize = |fragments: &[String]| {
			fragments
				.iter()
				.map(|fragment| fragment.trim().to_lowercase())
				.filter(|fragment| !fragment.is_empty())
				.collect::<Vec<_>>()
		};

		Self {
			target_id: config.target_id,
			name_fragments: normalize(&config.name_fragments),
			slug_fragments: normalize(&config.slug_fragments),
		}
	}

	/// Checks whether `block` was mined by the tracked pool
	///
	/// # Arguments
	/// * `block` - Block record to classify
	///
	/// # Returns
	/// * `bool` - `false` when the block carries no pool descriptor
	pub fn matches(&self, block: &BlockDetail) -> bool {
		let Some(pool) = block.pool_descriptor() else {
			return false;
		};

		if self.target_id.is_some() && pool.id == self.target_id {
			return true;
		}

		let contains_any = |value: &Option<String>, fragments: &[String]| {
			value.as_deref().is_some_and(|value| {
				let value = value.to_lowercase();
				fragments.iter().any(|fragment| value.contains(fragment.as_str()))
			})
		};

		contains_any(&pool.name, &self.name_fragments)
			|| contains_any(&pool.slug, &self.slug_fragments)
	}
}

impl Default for PoolFilter {
	fn default() -> Self {
		Self::new(&PoolFilterConfig::default())
	}
}

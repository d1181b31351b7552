//! Block explorer client interface.
//!
//! The watcher only needs two operations from an explorer: the list of recently
//! mined blocks and the full record of a single block. Implementations hold no
//! state and never retry.

use async_trait::async_trait;

use crate::{
	models::{BlockDetail, BlockSummary},
	services::explorer::ExplorerError,
};

/// Read access to a block explorer
#[async_trait]
pub trait BlockSource: Send + Sync {
	/// Retrieves the explorer's list of recently mined blocks
	///
	/// # Returns
	/// * `Result<Vec<BlockSummary>, ExplorerError>` - Recent blocks in no particular order
	async fn list_recent(&self) -> Result<Vec<BlockSummary>, ExplorerError>;

	/// Retrieves the full record of one block
	///
	/// # Arguments
	/// * `block_id` - Block hash
	///
	/// # Returns
	/// * `Result<BlockDetail, ExplorerError>` - The block, or `NotFound` when the
	///   explorer does not know the identifier
	async fn fetch_detail(&self, block_id: &str) -> Result<BlockDetail, ExplorerError>;
}

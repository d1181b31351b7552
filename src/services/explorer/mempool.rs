//! mempool.space REST client.

use async_trait::async_trait;
use std::collections::HashMap;
use tracing::instrument;

use crate::{
	models::{is_valid_block_id, BlockDetail, BlockSummary, ExplorerConfig},
	services::{
		explorer::{BlockSource, ExplorerError},
		transport::HttpTransportClient,
	},
};

/// Client for a mempool.space compatible explorer
#[derive(Clone, Debug)]
pub struct MempoolClient {
	transport: HttpTransportClient,
}

impl MempoolClient {
	/// Creates a client for the explorer described by `config`
	pub fn new(config: &ExplorerConfig) -> Result<Self, anyhow::Error> {
		let transport = HttpTransportClient::new(&config.api_base, config.request_timeout)?;
		Ok(Self::new_with_transport(transport))
	}

	/// Creates a client over an existing transport
	pub fn new_with_transport(transport: HttpTransportClient) -> Self {
		Self { transport }
	}
}

#[async_trait]
impl BlockSource for MempoolClient {
	#[instrument(skip(self))]
	async fn list_recent(&self) -> Result<Vec<BlockSummary>, ExplorerError> {
		self.transport
			.get_json::<Vec<BlockSummary>>("/api/blocks")
			.await
			.map_err(|e| ExplorerError::from_transport(e, "List recent blocks"))
	}

	#[instrument(skip(self))]
	async fn fetch_detail(&self, block_id: &str) -> Result<BlockDetail, ExplorerError> {
		let metadata = || Some(HashMap::from([("block_id".to_string(), block_id.to_string())]));

		// Identifiers outside the hash alphabet cannot name a block
		if !is_valid_block_id(block_id) {
			return Err(ExplorerError::not_found(block_id, None, metadata()));
		}

		let path = format!("/api/v1/block/{}", block_id);
		match self.transport.get_json::<BlockDetail>(&path).await {
			Ok(detail) => Ok(detail),
			Err(e) if e.is_not_found() => {
				Err(ExplorerError::not_found(block_id, Some(Box::new(e)), metadata()))
			}
			Err(e) => Err(ExplorerError::from_transport(e, "Fetch block detail")),
		}
	}
}

//! Mock implementations of the service seams.

use async_trait::async_trait;
use mockall::mock;
use pool_block_monitor::{
	models::{BlockDetail, BlockSummary, RecipientId},
	services::{
		explorer::{BlockSource, ExplorerError},
		notification::{NotificationError, Notifier},
	},
};

mock! {
	pub ExplorerSource {}

	#[async_trait]
	impl BlockSource for ExplorerSource {
		async fn list_recent(&self) -> Result<Vec<BlockSummary>, ExplorerError>;
		async fn fetch_detail(&self, block_id: &str) -> Result<BlockDetail, ExplorerError>;
	}
}

mock! {
	pub MessageNotifier {}

	#[async_trait]
	impl Notifier for MessageNotifier {
		async fn send_message(
			&self,
			recipient: RecipientId,
			text: &str,
		) -> Result<(), NotificationError>;
	}
}

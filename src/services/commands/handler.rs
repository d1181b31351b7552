//! Chat command handling.
//!
//! Turns parsed commands into subscriber changes and cache lookups and renders
//! the reply text.

use std::sync::Arc;

use crate::{
	models::{BlockDetail, BlockQuery, ExplorerConfig, RecipientId},
	repositories::{RepositoryError, SubscriberRepositoryTrait},
	services::{
		blockwatcher::BlockStorage,
		commands::Command,
		notification::{escape_html, format_cached_block},
	},
};

const ALREADY_SUBSCRIBED: &str = "You are already subscribed 🚀";
const SUBSCRIBED: &str = "✅ Subscription activated, you will receive notifications!";
const NOT_SUBSCRIBED: &str = "You are not subscribed 🙃";
const UNSUBSCRIBED: &str = "❌ Subscription cancelled.";
const NO_CACHED_BLOCKS: &str = "No cached blocks yet, sorry…";
const UNKNOWN_HEIGHT: &str = "No cached info about that block height, sorry…";
const UNKNOWN_BLOCK: &str = "No cached info about that block, sorry…";
const CORRUPTED_BLOCK: &str = "Cached file is corrupted, sorry…";
const INTERNAL_ERROR: &str = "Something went wrong, please try again later.";

/// Result of a cache lookup
#[derive(Debug, Clone, PartialEq)]
pub enum BlockLookup {
	Found(BlockDetail),
	/// The height index is empty
	NoCachedBlocks,
	/// No block is indexed at the requested height
	UnknownHeight(u64),
	/// No record is cached for the requested hash
	UnknownBlock(String),
	/// A record exists but cannot be read
	Corrupted(String),
}

/// Executes chat commands against the subscriber set and the block cache
pub struct CommandService<S, R>
where
	S: BlockStorage + ?Sized,
	R: SubscriberRepositoryTrait + ?Sized,
{
	block_storage: Arc<S>,
	subscribers: Arc<R>,
	explorer: ExplorerConfig,
	pool_label: String,
}

impl<S, R> CommandService<S, R>
where
	S: BlockStorage + ?Sized,
	R: SubscriberRepositoryTrait + ?Sized,
{
	pub fn new(
		block_storage: Arc<S>,
		subscribers: Arc<R>,
		explorer: ExplorerConfig,
		pool_label: impl Into<String>,
	) -> Self {
		Self {
			block_storage,
			subscribers,
			explorer,
			pool_label: pool_label.into(),
		}
	}

	/// Adds `recipient` to the subscriber set
	///
	/// # Returns
	/// * `Result<bool, RepositoryError>` - `false` if it was already subscribed
	pub async fn subscribe(&self, recipient: RecipientId) -> Result<bool, RepositoryError> {
		let added = self.subscribers.add(recipient).await?;
		if added {
			tracing::info!(chat_id = recipient, "Recipient subscribed");
		}
		Ok(added)
	}

	/// Removes `recipient` from the subscriber set
	///
	/// # Returns
	/// * `Result<bool, RepositoryError>` - `false` if it was not subscribed
	pub async fn unsubscribe(&self, recipient: RecipientId) -> Result<bool, RepositoryError> {
		let removed = self.subscribers.remove(recipient).await?;
		if removed {
			tracing::info!(chat_id = recipient, "Recipient unsubscribed");
		}
		Ok(removed)
	}

	/// Looks a block up in the cache
	///
	/// `Latest` resolves to the highest indexed height, not the most recently
	/// fetched block.
	pub async fn query_block(&self, query: &BlockQuery) -> Result<BlockLookup, anyhow::Error> {
		let block_id = match query {
			BlockQuery::Latest => match self.block_storage.latest_height_entry().await? {
				Some((_, block_id)) => block_id,
				None => return Ok(BlockLookup::NoCachedBlocks),
			},
			BlockQuery::Height(height) => match self.block_storage.get_block_id_at(*height).await? {
				Some(block_id) => block_id,
				None => return Ok(BlockLookup::UnknownHeight(*height)),
			},
			BlockQuery::Id(block_id) => block_id.clone(),
		};

		if let Some(detail) = self.block_storage.get_block_detail(&block_id).await? {
			return Ok(BlockLookup::Found(detail));
		}

		if self.block_storage.has_block(&block_id).await? {
			Ok(BlockLookup::Corrupted(block_id))
		} else {
			Ok(BlockLookup::UnknownBlock(block_id))
		}
	}

	/// Executes `command` on behalf of `recipient` and renders the reply
	pub async fn handle(&self, recipient: RecipientId, command: &Command) -> String {
		match command {
			Command::Start | Command::Help => self.help_text(),
			Command::Subscribe => match self.subscribe(recipient).await {
				Ok(true) => SUBSCRIBED.to_string(),
				Ok(false) => ALREADY_SUBSCRIBED.to_string(),
				Err(e) => {
					tracing::warn!(chat_id = recipient, "Failed to subscribe: {}", e);
					INTERNAL_ERROR.to_string()
				}
			},
			Command::Unsubscribe => match self.unsubscribe(recipient).await {
				Ok(true) => UNSUBSCRIBED.to_string(),
				Ok(false) => NOT_SUBSCRIBED.to_string(),
				Err(e) => {
					tracing::warn!(chat_id = recipient, "Failed to unsubscribe: {}", e);
					INTERNAL_ERROR.to_string()
				}
			},
			Command::Block(argument) => {
				let query = BlockQuery::parse(argument.as_deref());
				match self.query_block(&query).await {
					Ok(lookup) => self.render_lookup(&lookup),
					Err(e) => {
						tracing::warn!(chat_id = recipient, ?query, "Block lookup failed: {:#}", e);
						INTERNAL_ERROR.to_string()
					}
				}
			}
		}
	}

	fn render_lookup(&self, lookup: &BlockLookup) -> String {
		match lookup {
			BlockLookup::Found(detail) => format_cached_block(detail, &self.explorer),
			BlockLookup::NoCachedBlocks => NO_CACHED_BLOCKS.to_string(),
			BlockLookup::UnknownHeight(_) => UNKNOWN_HEIGHT.to_string(),
			BlockLookup::UnknownBlock(_) => UNKNOWN_BLOCK.to_string(),
			BlockLookup::Corrupted(_) => CORRUPTED_BLOCK.to_string(),
		}
	}

	fn help_text(&self) -> String {
		format!(
			"Hi! I track <b>{} blocks</b> and will notify you whenever a new one is mined.\n\
			 Commands:\n\
			 • /subscribe – start receiving alerts\n\
			 • /unsubscribe – stop receiving alerts\n\
			 • /block &lt;height|hash&gt; – show cached info about a block\n\
			 • /block – show the last cached block info",
			escape_html(&self.pool_label)
		)
	}
}

//! Block storage implementations for the block watcher service.
//!
//! This module provides storage interfaces and implementations for persisting
//! block records and the height index. Currently supports:
//! - File-based storage with JSON serialization
//! - Write-once block records, one file per block hash
//! - A height to hash index persisted after every change
//!
//! Unreadable files are treated as missing: a corrupted index loads as empty and a
//! corrupted block file reads as absent, both with a warning.

use async_trait::async_trait;
use std::{
	collections::{BTreeMap, HashSet},
	io::ErrorKind,
	path::{Path, PathBuf},
	sync::Arc,
};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
	models::{is_valid_block_id, BlockDetail},
	utils::metrics::INDEXED_HEIGHTS,
};

/// File name of the height index inside the storage directory
const INDEX_FILE_NAME: &str = "index.json";

/// Interface for block storage implementations
///
/// Defines the required functionality for caching block records and tracking
/// which block hash was observed at each height.
#[async_trait]
pub trait BlockStorage: Send + Sync {
	/// Retrieves a snapshot of the height index
	///
	/// # Returns
	/// * `Result<BTreeMap<u64, String>, anyhow::Error>` - Height to block hash
	async fn get_height_index(&self) -> Result<BTreeMap<u64, String>, anyhow::Error>;

	/// Retrieves every block hash present in the height index
	async fn known_block_ids(&self) -> Result<HashSet<String>, anyhow::Error>;

	/// Records `block_id` at `height`, replacing any previous entry
	///
	/// # Arguments
	/// * `height` - Block height
	/// * `block_id` - Block hash
	///
	/// # Returns
	/// * `Result<(), anyhow::Error>` - Success once the index is persisted
	async fn put_height_entry(&self, height: u64, block_id: &str) -> Result<(), anyhow::Error>;

	/// Checks whether a record is cached for `block_id`
	async fn has_block(&self, block_id: &str) -> Result<bool, anyhow::Error>;

	/// Caches `detail` unless a readable record for the same hash already exists
	///
	/// # Arguments
	/// * `detail` - Block record to cache
	///
	/// # Returns
	/// * `Result<bool, anyhow::Error>` - `true` if this call created the record,
	///   `false` if it was already cached
	async fn put_block_detail(&self, detail: &BlockDetail) -> Result<bool, anyhow::Error>;

	/// Retrieves the cached record for `block_id`
	///
	/// # Returns
	/// * `Result<Option<BlockDetail>, anyhow::Error>` - None if absent or unreadable
	async fn get_block_detail(&self, block_id: &str)
		-> Result<Option<BlockDetail>, anyhow::Error>;

	/// Retrieves the block hash indexed at `height`
	async fn get_block_id_at(&self, height: u64) -> Result<Option<String>, anyhow::Error>;

	/// Retrieves the index entry with the highest height
	async fn latest_height_entry(&self) -> Result<Option<(u64, String)>, anyhow::Error>;
}

/// File-based implementation of block storage
///
/// Stores `index.json` and one `<hash>.json` file per block within a configured
/// directory. The index is kept in memory and written back after every change.
/// Clones share the same in-memory index.
#[derive(Clone, Debug)]
pub struct FileBlockStorage {
	/// Base path for all storage files
	storage_path: PathBuf,
	/// Height to block hash
	index: Arc<RwLock<BTreeMap<u64, String>>>,
}

impl FileBlockStorage {
	/// Creates a storage rooted at `storage_path`
	///
	/// Creates the directory if needed and loads the existing height index.
	pub async fn new(storage_path: PathBuf) -> Result<Self, anyhow::Error> {
		tokio::fs::create_dir_all(&storage_path)
			.await
			.map_err(|e| anyhow::anyhow!("Failed to create block storage directory: {}", e))?;

		let index = load_index(&storage_path.join(INDEX_FILE_NAME)).await?;
		INDEXED_HEIGHTS.set(index.len() as f64);
		tracing::debug!(
			path = %storage_path.display(),
			heights = index.len(),
			"Loaded height index"
		);

		Ok(Self {
			storage_path,
			index: Arc::new(RwLock::new(index)),
		})
	}

	/// Directory holding the storage files
	pub fn storage_path(&self) -> &Path {
		&self.storage_path
	}

	fn index_path(&self) -> PathBuf {
		self.storage_path.join(INDEX_FILE_NAME)
	}

	fn block_path(&self, block_id: &str) -> PathBuf {
		self.storage_path.join(format!("{}.json", block_id))
	}

	/// Writes the index next to its final location, then renames it into place
	async fn save_index(&self, index: &BTreeMap<u64, String>) -> Result<(), anyhow::Error> {
		let json = serde_json::to_vec_pretty(index)
			.map_err(|e| anyhow::anyhow!("Failed to serialize height index: {}", e))?;

		let final_path = self.index_path();
		let temp_path = final_path.with_extension("json.tmp");
		tokio::fs::write(&temp_path, json)
			.await
			.map_err(|e| anyhow::anyhow!("Failed to save height index: {}", e))?;
		tokio::fs::rename(&temp_path, &final_path)
			.await
			.map_err(|e| anyhow::anyhow!("Failed to save height index: {}", e))?;
		Ok(())
	}

	/// Links a fully written temporary file to `<hash>.json`
	///
	/// # Returns
	/// * `Result<bool, anyhow::Error>` - `false` if a readable record already exists
	async fn publish_block_file(
		&self,
		temp_path: &Path,
		block_id: &str,
	) -> Result<bool, anyhow::Error> {
		let path = self.block_path(block_id);
		match tokio::fs::hard_link(temp_path, &path).await {
			Ok(()) => Ok(true),
			Err(e) if e.kind() == ErrorKind::AlreadyExists => {
				if read_block_file(&path).await?.is_some() {
					return Ok(false);
				}
				tracing::warn!(block_id = %block_id, "Replacing unreadable block file");
				tokio::fs::rename(temp_path, &path)
					.await
					.map_err(|e| anyhow::anyhow!("Failed to replace block file: {}", e))?;
				Ok(true)
			}
			Err(e) => Err(anyhow::anyhow!("Failed to create block file: {}", e)),
		}
	}
}

#[async_trait]
impl BlockStorage for FileBlockStorage {
	async fn get_height_index(&self) -> Result<BTreeMap<u64, String>, anyhow::Error> {
		Ok(self.index.read().await.clone())
	}

	async fn known_block_ids(&self) -> Result<HashSet<String>, anyhow::Error> {
		Ok(self.index.read().await.values().cloned().collect())
	}

	/// Updates the in-memory index and persists it
	///
	/// # Note
	/// The write lock is held while the file is written so concurrent updates are
	/// persisted in order.
	async fn put_height_entry(&self, height: u64, block_id: &str) -> Result<(), anyhow::Error> {
		let mut index = self.index.write().await;
		if let Some(previous) = index.insert(height, block_id.to_string()) {
			if previous != block_id {
				tracing::info!(
					height,
					previous = %previous,
					block_id = %block_id,
					"Replacing block hash indexed at height"
				);
			}
		}
		INDEXED_HEIGHTS.set(index.len() as f64);
		self.save_index(&index).await
	}

	async fn has_block(&self, block_id: &str) -> Result<bool, anyhow::Error> {
		if !is_valid_block_id(block_id) {
			return Ok(false);
		}
		tokio::fs::try_exists(self.block_path(block_id))
			.await
			.map_err(|e| anyhow::anyhow!("Failed to check cached block: {}", e))
	}

	/// Publishes `<hash>.json` without overwriting a readable record
	///
	/// # Note
	/// The record is written to a private temporary file first and then hard linked
	/// into place, so a reader never sees a partial file and of two concurrent
	/// writers of the same hash only one creates the record. An existing file that
	/// cannot be parsed is replaced.
	async fn put_block_detail(&self, detail: &BlockDetail) -> Result<bool, anyhow::Error> {
		if !is_valid_block_id(&detail.id) {
			return Err(anyhow::anyhow!("Invalid block hash: {:?}", detail.id));
		}

		let json = serde_json::to_vec_pretty(detail)
			.map_err(|e| anyhow::anyhow!("Failed to serialize block: {}", e))?;

		let temp_path = self
			.storage_path
			.join(format!("{}.{}.tmp", detail.id, Uuid::new_v4().simple()));
		let published = match tokio::fs::write(&temp_path, &json).await {
			Ok(()) => self.publish_block_file(&temp_path, &detail.id).await,
			Err(e) => Err(anyhow::anyhow!("Failed to save block: {}", e)),
		};

		match tokio::fs::remove_file(&temp_path).await {
			Ok(()) => {}
			Err(e) if e.kind() == ErrorKind::NotFound => {}
			Err(e) => tracing::warn!(
				path = %temp_path.display(),
				"Failed to remove temporary block file: {}",
				e
			),
		}

		published
	}

	async fn get_block_detail(
		&self,
		block_id: &str,
	) -> Result<Option<BlockDetail>, anyhow::Error> {
		if !is_valid_block_id(block_id) {
			return Ok(None);
		}
		read_block_file(&self.block_path(block_id)).await
	}

	async fn get_block_id_at(&self, height: u64) -> Result<Option<String>, anyhow::Error> {
		Ok(self.index.read().await.get(&height).cloned())
	}

	async fn latest_height_entry(&self) -> Result<Option<(u64, String)>, anyhow::Error> {
		Ok(self
			.index
			.read()
			.await
			.last_key_value()
			.map(|(height, block_id)| (*height, block_id.clone())))
	}
}

/// Reads the height index, treating a missing or corrupted file as empty
async fn load_index(path: &Path) -> Result<BTreeMap<u64, String>, anyhow::Error> {
	let content = match tokio::fs::read(path).await {
		Ok(content) => content,
		Err(e) if e.kind() == ErrorKind::NotFound => return Ok(BTreeMap::new()),
		Err(e) => return Err(anyhow::anyhow!("Failed to read height index: {}", e)),
	};

	if content.iter().all(u8::is_ascii_whitespace) {
		return Ok(BTreeMap::new());
	}

	let raw: BTreeMap<String, String> = match serde_json::from_slice(&content) {
		Ok(raw) => raw,
		Err(e) => {
			tracing::warn!(
				path = %path.display(),
				"Height index is corrupted, starting with an empty index: {}",
				e
			);
			return Ok(BTreeMap::new());
		}
	};

	let mut index = BTreeMap::new();
	for (height, block_id) in raw {
		match height.trim().parse::<u64>() {
			Ok(height) => {
				index.insert(height, block_id);
			}
			Err(_) => {
				tracing::warn!(height = %height, "Skipping index entry with invalid height");
			}
		}
	}
	Ok(index)
}

/// Reads a cached block record, treating an unreadable file as absent
async fn read_block_file(path: &Path) -> Result<Option<BlockDetail>, anyhow::Error> {
	let content = match tokio::fs::read(path).await {
		Ok(content) => content,
		Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
		Err(e) => return Err(anyhow::anyhow!("Failed to read block file: {}", e)),
	};

	match serde_json::from_slice::<BlockDetail>(&content) {
		Ok(detail) => Ok(Some(detail)),
		Err(e) => {
			tracing::warn!(
				path = %path.display(),
				"Ignoring unreadable block file: {}",
				e
			);
			Ok(None)
		}
	}
}

//! Subscriber repository implementation.
//!
//! Keeps the set of recipients that receive new block alerts. The set is held in
//! memory and written to a JSON file of the form `{"chats": [id, ...]}` after every
//! change. A missing or unreadable file loads as an empty set.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::{
	collections::{BTreeSet, HashMap},
	io::ErrorKind,
	path::{Path, PathBuf},
	sync::Arc,
};
use tokio::sync::RwLock;

use crate::{models::RecipientId, repositories::error::RepositoryError, utils::metrics::SUBSCRIBERS};

/// On-disk layout of the subscriber file
#[derive(Debug, Default, Serialize, Deserialize)]
struct SubscriberFile {
	#[serde(default)]
	chats: Vec<RecipientId>,
}

/// Interface for subscriber storage
#[async_trait]
pub trait SubscriberRepositoryTrait: Send + Sync {
	/// Adds `recipient` to the set
	///
	/// # Returns
	/// * `Result<bool, RepositoryError>` - `false` if it was already subscribed
	async fn add(&self, recipient: RecipientId) -> Result<bool, RepositoryError>;

	/// Removes `recipient` from the set
	///
	/// # Returns
	/// * `Result<bool, RepositoryError>` - `false` if it was not subscribed
	async fn remove(&self, recipient: RecipientId) -> Result<bool, RepositoryError>;

	/// Checks whether `recipient` is subscribed
	async fn contains(&self, recipient: RecipientId) -> bool;

	/// Snapshot of every subscribed recipient, in ascending order
	async fn get_all(&self) -> Vec<RecipientId>;
}

/// File-backed subscriber set
#[derive(Clone, Debug)]
pub struct FileSubscriberRepository {
	path: PathBuf,
	subscribers: Arc<RwLock<BTreeSet<RecipientId>>>,
}

impl FileSubscriberRepository {
	/// Loads the subscriber set from `path`
	pub async fn new(path: PathBuf) -> Result<Self, RepositoryError> {
		let subscribers = Self::load(&path).await?;
		SUBSCRIBERS.set(subscribers.len() as f64);
		tracing::debug!(
			path = %path.display(),
			subscribers = subscribers.len(),
			"Loaded subscribers"
		);
		Ok(Self {
			path,
			subscribers: Arc::new(RwLock::new(subscribers)),
		})
	}

	/// Path of the backing file
	pub fn path(&self) -> &Path {
		&self.path
	}

	async fn load(path: &Path) -> Result<BTreeSet<RecipientId>, RepositoryError> {
		let metadata = || Some(HashMap::from([("path".to_string(), path.display().to_string())]));

		let content = match tokio::fs::read(path).await {
			Ok(content) => content,
			Err(e) if e.kind() == ErrorKind::NotFound => return Ok(BTreeSet::new()),
			Err(e) => {
				return Err(RepositoryError::load_error(
					"Failed to read subscriber file",
					Some(Box::new(e)),
					metadata(),
				))
			}
		};

		if content.iter().all(u8::is_ascii_whitespace) {
			return Ok(BTreeSet::new());
		}

		match serde_json::from_slice::<SubscriberFile>(&content) {
			Ok(file) => Ok(file.chats.into_iter().collect()),
			Err(e) => {
				tracing::warn!(
					path = %path.display(),
					"Subscriber file is corrupted, starting with no subscribers: {}",
					e
				);
				Ok(BTreeSet::new())
			}
		}
	}

	async fn save(&self, subscribers: &BTreeSet<RecipientId>) -> Result<(), RepositoryError> {
		let metadata = || {
			Some(HashMap::from([(
				"path".to_string(),
				self.path.display().to_string(),
			)]))
		};

		let file = SubscriberFile {
			chats: subscribers.iter().copied().collect(),
		};
		let json = serde_json::to_vec_pretty(&file).map_err(|e| {
			RepositoryError::save_error(
				"Failed to serialize subscribers",
				Some(Box::new(e)),
				metadata(),
			)
		})?;

		if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
			tokio::fs::create_dir_all(parent).await.map_err(|e| {
				RepositoryError::save_error(
					"Failed to create subscriber directory",
					Some(Box::new(e)),
					metadata(),
				)
			})?;
		}

		// Written beside the target, then renamed into place
		let mut temp_name = self.path.file_name().unwrap_or_default().to_os_string();
		temp_name.push(".tmp");
		let temp_path = self.path.with_file_name(temp_name);
		tokio::fs::write(&temp_path, json).await.map_err(|e| {
			RepositoryError::save_error("Failed to save subscribers", Some(Box::new(e)), metadata())
		})?;
		tokio::fs::rename(&temp_path, &self.path).await.map_err(|e| {
			RepositoryError::save_error("Failed to save subscribers", Some(Box::new(e)), metadata())
		})?;

		SUBSCRIBERS.set(subscribers.len() as f64);
		Ok(())
	}
}

#[async_trait]
impl SubscriberRepositoryTrait for FileSubscriberRepository {
	async fn add(&self, recipient: RecipientId) -> Result<bool, RepositoryError> {
		let mut subscribers = self.subscribers.write().await;
		if !subscribers.insert(recipient) {
			return Ok(false);
		}
		if let Err(e) = self.save(&subscribers).await {
			subscribers.remove(&recipient);
			return Err(e);
		}
		Ok(true)
	}

	async fn remove(&self, recipient: RecipientId) -> Result<bool, RepositoryError> {
		let mut subscribers = self.subscribers.write().await;
		if !subscribers.remove(&recipient) {
			return Ok(false);
		}
		if let Err(e) = self.save(&subscribers).await {
			subscribers.insert(recipient);
			return Err(e);
		}
		Ok(true)
	}

	async fn contains(&self, recipient: RecipientId) -> bool {
		self.subscribers.read().await.contains(&recipient)
	}

	async fn get_all(&self) -> Vec<RecipientId> {
		self.subscribers.read().await.iter().copied().collect()
	}
}

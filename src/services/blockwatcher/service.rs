//! Block watcher service implementation.
//!
//! Polls the explorer on a fixed interval, fetches every block not yet in the
//! height index, caches it, and alerts subscribers when the tracked pool mined it.
//! Cycles never overlap: the next one starts a full interval after the previous
//! one finished.

use futures::{
	stream::{self, FusedStream},
	FutureExt, Stream, StreamExt,
};
use std::{
	collections::{HashMap, HashSet, VecDeque},
	future::Future,
	panic::AssertUnwindSafe,
	pin::pin,
	sync::Arc,
	time::Instant,
};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::instrument;

use crate::{
	models::{BlockDetail, WatcherConfig},
	repositories::SubscriberRepositoryTrait,
	services::{
		blockwatcher::{error::BlockWatcherError, storage::BlockStorage},
		explorer::{BlockSource, ExplorerError},
		filter::PoolFilter,
		notification::{NotificationService, Notifier},
	},
	utils::metrics::{
		record_fetch_error, record_watcher_cycle, BLOCKS_CACHED_TOTAL, BLOCKS_DISCOVERED_TOTAL,
		POOL_BLOCKS_DETECTED_TOTAL,
	},
};

/// Summary of one polling cycle
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
	/// Entries in the explorer's recent block list
	pub listed: usize,
	/// Identifiers not yet in the height index
	pub new_blocks: usize,
	/// Details fetched successfully
	pub fetched: usize,
	/// Details that could not be fetched; retried next cycle
	pub fetch_failures: usize,
	/// Details that could not be written to the cache; retried next cycle
	pub store_failures: usize,
	/// Details written to the cache by this cycle
	pub cached: usize,
	/// Newly cached blocks attributed to the tracked pool
	pub pool_blocks: usize,
	/// Successful deliveries across all alerts of this cycle
	pub notified: usize,
}

/// Processes the explorer's recent blocks once
///
/// # Arguments
/// * `source` - Explorer client
/// * `block_storage` - Block cache and height index
/// * `pool_filter` - Classifier deciding which blocks trigger an alert
/// * `notification_service` - Fan-out used for alerts
/// * `subscribers` - Recipients of alerts
/// * `max_parallel_fetches` - Maximum number of detail requests in flight
///
/// # Returns
/// * `Result<CycleReport, BlockWatcherError>` - Cycle summary, or an error when the
///   recent block list or the height index could not be read
#[instrument(skip_all)]
pub async fn process_new_blocks<C, S, N, R>(
	source: &C,
	block_storage: &S,
	pool_filter: &PoolFilter,
	notification_service: &NotificationService<N>,
	subscribers: &R,
	max_parallel_fetches: usize,
) -> Result<CycleReport, BlockWatcherError>
where
	C: BlockSource + ?Sized,
	S: BlockStorage + ?Sized,
	N: Notifier,
	R: SubscriberRepositoryTrait + ?Sized,
{
	let mut report = CycleReport::default();

	let listing = source.list_recent().await.map_err(|e| {
		BlockWatcherError::listing_error(
			"Failed to list recent blocks",
			Some(Box::new(e)),
			None,
		)
	})?;
	report.listed = listing.len();

	let known = block_storage.known_block_ids().await.map_err(|e| {
		BlockWatcherError::storage_error("Failed to read height index", Some(e.into()), None)
	})?;

	let mut seen = HashSet::new();
	let new_ids: Vec<String> = listing
		.into_iter()
		.map(|summary| summary.id)
		.filter(|id| !known.contains(id) && seen.insert(id.clone()))
		.collect();
	report.new_blocks = new_ids.len();

	if new_ids.is_empty() {
		tracing::debug!(listed = report.listed, "No new blocks");
		return Ok(report);
	}

	BLOCKS_DISCOVERED_TOTAL.inc_by(new_ids.len() as f64);
	tracing::info!(count = new_ids.len(), "Discovered new blocks");

	let mut fetches = stream::iter(new_ids)
		.map(|block_id| async move {
			let result = source.fetch_detail(&block_id).await;
			(block_id, result)
		})
		.buffer_unordered(max_parallel_fetches.max(1));
	// Fetches that completed while an earlier block was being reconciled
	let mut completed: VecDeque<(String, Result<BlockDetail, ExplorerError>)> = VecDeque::new();

	loop {
		let (block_id, result) = match completed.pop_front() {
			Some(fetched) => fetched,
			None => match fetches.next().await {
				Some(fetched) => fetched,
				None => break,
			},
		};

		let detail = match result {
			Ok(detail) if detail.id == block_id => detail,
			Ok(detail) => {
				record_fetch_error("parse");
				report.fetch_failures += 1;
				tracing::warn!(
					block_id = %block_id,
					returned_id = %detail.id,
					"Explorer returned a different block, skipping"
				);
				continue;
			}
			Err(e) => {
				record_fetch_error(e.kind());
				report.fetch_failures += 1;
				log_fetch_failure(&block_id, &e);
				continue;
			}
		};
		report.fetched += 1;

		let reconcile = reconcile_block(
			&detail,
			block_storage,
			pool_filter,
			notification_service,
			subscribers,
			&mut report,
		);
		drive_fetches_until(reconcile, &mut fetches, &mut completed).await;
	}

	Ok(report)
}

/// Caches, indexes, classifies and announces one fetched block
async fn reconcile_block<S, N, R>(
	detail: &BlockDetail,
	block_storage: &S,
	pool_filter: &PoolFilter,
	notification_service: &NotificationService<N>,
	subscribers: &R,
	report: &mut CycleReport,
) where
	S: BlockStorage + ?Sized,
	N: Notifier,
	R: SubscriberRepositoryTrait + ?Sized,
{
	let created = match block_storage.put_block_detail(detail).await {
		Ok(created) => created,
		Err(e) => {
			report.store_failures += 1;
			tracing::warn!(block_id = %detail.id, "Failed to cache block: {:#}", e);
			return;
		}
	};

	if created {
		report.cached += 1;
		BLOCKS_CACHED_TOTAL.inc();
	}

	if let Err(e) = block_storage.put_height_entry(detail.height, &detail.id).await {
		tracing::warn!(
			block_id = %detail.id,
			height = detail.height,
			"Failed to update height index: {:#}",
			e
		);
	}

	// Already cached means an earlier attempt got this far
	if !created {
		tracing::debug!(block_id = %detail.id, "Block already cached, not announcing");
		return;
	}

	if !pool_filter.matches(detail) {
		tracing::debug!(
			block_id = %detail.id,
			height = detail.height,
			pool = detail.pool_name().unwrap_or("unknown"),
			"Block not mined by tracked pool"
		);
		return;
	}

	report.pool_blocks += 1;
	POOL_BLOCKS_DETECTED_TOTAL.inc();
	tracing::info!(
		block_id = %detail.id,
		height = detail.height,
		pool = detail.pool_name().unwrap_or("unknown"),
		"Tracked pool mined a block"
	);

	let recipients = subscribers.get_all().await;
	let fanout = notification_service.notify(detail, &recipients).await;
	report.notified += fanout.delivered.len();
}

/// Awaits `task` while the fetch stream keeps making progress
///
/// Results that complete in the meantime are queued in `completed`.
async fn drive_fetches_until<F, S>(
	task: F,
	fetches: &mut S,
	completed: &mut VecDeque<S::Item>,
) where
	F: Future<Output = ()>,
	S: Stream + FusedStream + Unpin,
{
	let mut task = pin!(task);
	loop {
		tokio::select! {
			_ = &mut task => return,
			Some(fetched) = fetches.next(), if !fetches.is_terminated() => {
				completed.push_back(fetched);
			}
		}
	}
}

fn log_fetch_failure(block_id: &str, error: &ExplorerError) {
	if error.is_not_found() {
		tracing::warn!(block_id = %block_id, "Block unknown to explorer: {}", error);
	} else {
		tracing::warn!(block_id = %block_id, "Failed to fetch block: {}", error);
	}
}

/// Background service running [`process_new_blocks`] on a fixed interval
///
/// # Type Parameters
/// * `C` - Explorer client
/// * `S` - Storage implementation for blocks
/// * `N` - Notifier used for alerts
/// * `R` - Subscriber repository
pub struct BlockWatcherService<C, S, N, R>
where
	N: Notifier,
{
	pub source: Arc<C>,
	pub block_storage: Arc<S>,
	pub pool_filter: Arc<PoolFilter>,
	pub notification_service: Arc<NotificationService<N>>,
	pub subscribers: Arc<R>,
	pub config: WatcherConfig,
	shutdown: CancellationToken,
	handle: Option<JoinHandle<()>>,
}

impl<C, S, N, R> BlockWatcherService<C, S, N, R>
where
	C: BlockSource + 'static,
	S: BlockStorage + 'static,
	N: Notifier + 'static,
	R: SubscriberRepositoryTrait + 'static,
{
	/// Creates a new block watcher service
	///
	/// # Arguments
	/// * `source` - Explorer client
	/// * `block_storage` - Block cache and height index
	/// * `pool_filter` - Classifier deciding which blocks trigger an alert
	/// * `notification_service` - Fan-out used for alerts
	/// * `subscribers` - Recipients of alerts
	/// * `config` - Poll interval and fetch concurrency
	pub fn new(
		source: Arc<C>,
		block_storage: Arc<S>,
		pool_filter: Arc<PoolFilter>,
		notification_service: Arc<NotificationService<N>>,
		subscribers: Arc<R>,
		config: WatcherConfig,
	) -> Self {
		Self {
			source,
			block_storage,
			pool_filter,
			notification_service,
			subscribers,
			config,
			shutdown: CancellationToken::new(),
			handle: None,
		}
	}

	/// Uses `token` for shutdown instead of a private one
	pub fn with_shutdown(mut self, token: CancellationToken) -> Self {
		self.shutdown = token;
		self
	}

	/// Checks whether the background task is running
	pub fn is_running(&self) -> bool {
		self.handle.as_ref().is_some_and(|handle| !handle.is_finished())
	}

	/// Runs a single cycle in the caller's task
	pub async fn run_once(&self) -> Result<CycleReport, BlockWatcherError> {
		process_new_blocks(
			self.source.as_ref(),
			self.block_storage.as_ref(),
			self.pool_filter.as_ref(),
			self.notification_service.as_ref(),
			self.subscribers.as_ref(),
			self.config.max_parallel_fetches,
		)
		.await
	}

	/// Starts the background task
	///
	/// The first cycle runs immediately. Shutdown is observed between cycles only,
	/// so a cycle in progress always completes.
	pub fn start(&mut self) -> Result<(), BlockWatcherError> {
		if self.handle.is_some() {
			return Err(BlockWatcherError::task_error(
				"Block watcher already started",
				None,
				None,
			));
		}

		let source = self.source.clone();
		let block_storage = self.block_storage.clone();
		let pool_filter = self.pool_filter.clone();
		let notification_service = self.notification_service.clone();
		let subscribers = self.subscribers.clone();
		let config = self.config.clone();
		let shutdown = self.shutdown.clone();

		self.handle = Some(tokio::spawn(async move {
			loop {
				let started = Instant::now();
				let cycle = AssertUnwindSafe(process_new_blocks(
					source.as_ref(),
					block_storage.as_ref(),
					pool_filter.as_ref(),
					notification_service.as_ref(),
					subscribers.as_ref(),
					config.max_parallel_fetches,
				))
				.catch_unwind()
				.await;
				let elapsed = started.elapsed().as_secs_f64();

				match cycle {
					Ok(Ok(report)) => {
						record_watcher_cycle("ok", elapsed);
						if report.new_blocks > 0 {
							tracing::info!(
								listed = report.listed,
								new_blocks = report.new_blocks,
								fetched = report.fetched,
								fetch_failures = report.fetch_failures,
								cached = report.cached,
								pool_blocks = report.pool_blocks,
								notified = report.notified,
								"Watcher cycle completed"
							);
						}
					}
					// Logged when the error was created
					Ok(Err(_)) => record_watcher_cycle("error", elapsed),
					Err(_) => {
						record_watcher_cycle("panic", elapsed);
						tracing::error!("Watcher cycle panicked, continuing with the next cycle");
					}
				}

				tokio::select! {
					_ = shutdown.cancelled() => break,
					_ = tokio::time::sleep(config.poll_interval) => {}
				}
			}
			tracing::info!("Block watcher stopped");
		}));

		tracing::info!(
			interval_secs = self.config.poll_interval.as_secs(),
			max_parallel_fetches = self.config.max_parallel_fetches,
			"Started block watcher"
		);
		Ok(())
	}

	/// Requests shutdown and waits for the background task to finish
	pub async fn stop(&mut self) -> Result<(), BlockWatcherError> {
		self.shutdown.cancel();
		if let Some(handle) = self.handle.take() {
			handle.await.map_err(|e| {
				BlockWatcherError::task_error(
					"Block watcher task failed",
					Some(Box::new(e)),
					Some(HashMap::from([(
						"interval_secs".to_string(),
						self.config.poll_interval.as_secs().to_string(),
					)])),
				)
			})?;
		}
		Ok(())
	}
}

use crate::integration::mocks::{MockExplorerSource, MockMessageNotifier};
use mockall::Sequence;
use pool_block_monitor::{
	models::{BlockDetail, BlockSummary, ExplorerConfig, WatcherConfig},
	repositories::{FileSubscriberRepository, SubscriberRepositoryTrait},
	services::{
		blockwatcher::{process_new_blocks, BlockStorage, BlockWatcherService, FileBlockStorage},
		explorer::ExplorerError,
		filter::PoolFilter,
		notification::{NotificationError, NotificationService},
	},
	utils::tests::BlockDetailBuilder,
};
use std::{
	sync::{Arc, Mutex},
	time::Duration,
};
use tempfile::TempDir;

struct Stores {
	_temp_dir: TempDir,
	blocks_dir: std::path::PathBuf,
	storage: FileBlockStorage,
	subscribers: FileSubscriberRepository,
}

async fn stores(recipients: &[i64]) -> Stores {
	let temp_dir = tempfile::tempdir().unwrap();
	let blocks_dir = temp_dir.path().join("blocks");
	let storage = FileBlockStorage::new(blocks_dir.clone()).await.unwrap();
	let subscribers = FileSubscriberRepository::new(temp_dir.path().join("state.json"))
		.await
		.unwrap();
	for recipient in recipients {
		subscribers.add(*recipient).await.unwrap();
	}
	Stores {
		_temp_dir: temp_dir,
		blocks_dir,
		storage,
		subscribers,
	}
}

fn summary(detail: &BlockDetail) -> BlockSummary {
	BlockSummary {
		id: detail.id.clone(),
		height: detail.height,
	}
}

fn ckpool_block() -> BlockDetail {
	BlockDetailBuilder::new()
		.id("abc")
		.height(800000)
		.pool(Some(49), Some("ckpool"), None)
		.build()
}

#[tokio::test]
async fn test_pool_block_end_to_end() {
	let stores = stores(&[1, 2]).await;
	let block = ckpool_block();

	let mut source = MockExplorerSource::new();
	let listing = vec![summary(&block)];
	source
		.expect_list_recent()
		.times(1)
		.returning(move || Ok(listing.clone()));
	let detail = block.clone();
	source
		.expect_fetch_detail()
		.withf(|block_id| block_id.eq_ignore_ascii_case("abc"))
		.times(1)
		.returning(move |_| Ok(detail.clone()));

	let sent = Arc::new(Mutex::new(Vec::new()));
	let mut notifier = MockMessageNotifier::new();
	let sent_clone = sent.clone();
	notifier
		.expect_send_message()
		.times(2)
		.returning(move |recipient, text| {
			sent_clone.lock().unwrap().push((recipient, text.to_string()));
			Ok(())
		});
	let notification_service =
		NotificationService::new(Arc::new(notifier), ExplorerConfig::default());

	let report = process_new_blocks(
		&source,
		&stores.storage,
		&PoolFilter::default(),
		&notification_service,
		&stores.subscribers,
		5,
	)
	.await
	.unwrap();

	assert_eq!(report.cached, 1);
	assert_eq!(report.pool_blocks, 1);
	assert_eq!(report.notified, 2);

	assert!(stores.blocks_dir.join("abc.json").exists());
	let index: serde_json::Value = serde_json::from_str(
		&std::fs::read_to_string(stores.blocks_dir.join("index.json")).unwrap(),
	)
	.unwrap();
	assert_eq!(index["800000"], "abc");

	let sent = sent.lock().unwrap();
	let mut recipients: Vec<i64> = sent.iter().map(|(recipient, _)| *recipient).collect();
	recipients.sort();
	assert_eq!(recipients, vec![1, 2]);
	assert!(sent
		.iter()
		.all(|(_, text)| text.contains("800000") && text.contains("ckpool")));
}

#[tokio::test]
async fn test_second_cycle_does_not_refetch_or_renotify() {
	let stores = stores(&[1]).await;
	let block = ckpool_block();

	let mut source = MockExplorerSource::new();
	let listing = vec![summary(&block)];
	source
		.expect_list_recent()
		.times(2)
		.returning(move || Ok(listing.clone()));
	let detail = block.clone();
	source
		.expect_fetch_detail()
		.times(1)
		.returning(move |_| Ok(detail.clone()));

	let mut notifier = MockMessageNotifier::new();
	notifier.expect_send_message().times(1).returning(|_, _| Ok(()));
	let notification_service =
		NotificationService::new(Arc::new(notifier), ExplorerConfig::default());
	let filter = PoolFilter::default();

	for _ in 0..2 {
		process_new_blocks(
			&source,
			&stores.storage,
			&filter,
			&notification_service,
			&stores.subscribers,
			5,
		)
		.await
		.unwrap();
	}
}

#[tokio::test]
async fn test_restart_keeps_known_blocks() {
	let stores = stores(&[]).await;
	let block = ckpool_block();
	stores.storage.put_block_detail(&block).await.unwrap();
	stores
		.storage
		.put_height_entry(block.height, &block.id)
		.await
		.unwrap();

	let reloaded = FileBlockStorage::new(stores.blocks_dir.clone())
		.await
		.unwrap();

	let mut source = MockExplorerSource::new();
	let listing = vec![summary(&block)];
	source
		.expect_list_recent()
		.returning(move || Ok(listing.clone()));
	source.expect_fetch_detail().never();

	let mut notifier = MockMessageNotifier::new();
	notifier.expect_send_message().never();

	let report = process_new_blocks(
		&source,
		&reloaded,
		&PoolFilter::default(),
		&NotificationService::new(Arc::new(notifier), ExplorerConfig::default()),
		&stores.subscribers,
		5,
	)
	.await
	.unwrap();

	assert_eq!(report.new_blocks, 0);
}

#[tokio::test]
async fn test_one_failing_fetch_among_many() {
	let stores = stores(&[]).await;
	let blocks: Vec<BlockDetail> = ["aaa", "bbb", "ccc", "ddd", "eee"]
		.iter()
		.enumerate()
		.map(|(i, id)| BlockDetailBuilder::new().id(id).height(i as u64).build())
		.collect();

	let mut source = MockExplorerSource::new();
	let listing: Vec<BlockSummary> = blocks.iter().map(summary).collect();
	source
		.expect_list_recent()
		.returning(move || Ok(listing.clone()));
	let details = blocks.clone();
	source
		.expect_fetch_detail()
		.times(5)
		.returning(move |block_id| {
			if block_id == "ccc" {
				return Err(ExplorerError::transport("timed out", None, None));
			}
			Ok(details
				.iter()
				.find(|detail| detail.id == block_id)
				.cloned()
				.unwrap())
		});

	let mut notifier = MockMessageNotifier::new();
	notifier.expect_send_message().never();

	let report = process_new_blocks(
		&source,
		&stores.storage,
		&PoolFilter::default(),
		&NotificationService::new(Arc::new(notifier), ExplorerConfig::default()),
		&stores.subscribers,
		2,
	)
	.await
	.unwrap();

	assert_eq!(report.fetched, 4);
	assert_eq!(report.fetch_failures, 1);
	let known = stores.storage.known_block_ids().await.unwrap();
	assert_eq!(known.len(), 4);
	assert!(!known.contains("ccc"));
	assert!(!stores.storage.has_block("ccc").await.unwrap());
}

#[tokio::test]
async fn test_fanout_failure_is_isolated() {
	let stores = stores(&[1, 2, 3]).await;
	let block = ckpool_block();

	let mut source = MockExplorerSource::new();
	let listing = vec![summary(&block)];
	source
		.expect_list_recent()
		.returning(move || Ok(listing.clone()));
	let detail = block.clone();
	source
		.expect_fetch_detail()
		.returning(move |_| Ok(detail.clone()));

	let mut notifier = MockMessageNotifier::new();
	let mut sequence = Sequence::new();
	for recipient in [1i64, 2, 3] {
		notifier
			.expect_send_message()
			.withf(move |to, _| *to == recipient)
			.times(1)
			.in_sequence(&mut sequence)
			.returning(move |_, _| {
				if recipient == 2 {
					Err(NotificationError::rejected("chat not found", None, None))
				} else {
					Ok(())
				}
			});
	}

	let report = process_new_blocks(
		&source,
		&stores.storage,
		&PoolFilter::default(),
		&NotificationService::new(Arc::new(notifier), ExplorerConfig::default()),
		&stores.subscribers,
		5,
	)
	.await
	.unwrap();

	assert_eq!(report.notified, 2);
}

#[tokio::test]
async fn test_listing_failure_ends_cycle_without_fetches() {
	let stores = stores(&[1]).await;

	let mut source = MockExplorerSource::new();
	source
		.expect_list_recent()
		.times(1)
		.returning(|| Err(ExplorerError::transport("connection refused", None, None)));
	source.expect_fetch_detail().never();

	let mut notifier = MockMessageNotifier::new();
	notifier.expect_send_message().never();

	let result = process_new_blocks(
		&source,
		&stores.storage,
		&PoolFilter::default(),
		&NotificationService::new(Arc::new(notifier), ExplorerConfig::default()),
		&stores.subscribers,
		5,
	)
	.await;

	assert!(result.is_err());
}

#[tokio::test]
async fn test_service_keeps_polling_after_errors() {
	let stores = stores(&[]).await;

	let mut source = MockExplorerSource::new();
	source
		.expect_list_recent()
		.returning(|| Err(ExplorerError::transport("connection refused", None, None)));

	let mut service = BlockWatcherService::new(
		Arc::new(source),
		Arc::new(stores.storage.clone()),
		Arc::new(PoolFilter::default()),
		Arc::new(NotificationService::new(
			Arc::new(MockMessageNotifier::new()),
			ExplorerConfig::default(),
		)),
		Arc::new(stores.subscribers.clone()),
		WatcherConfig {
			poll_interval: Duration::from_millis(10),
			max_parallel_fetches: 1,
		},
	);

	service.start().unwrap();
	tokio::time::sleep(Duration::from_millis(80)).await;
	assert!(service.is_running());
	service.stop().await.unwrap();
	assert!(!service.is_running());
}

//! Property-based tests for the block cache and height index.

use pool_block_monitor::{
	services::blockwatcher::{BlockStorage, FileBlockStorage},
	utils::tests::BlockDetailBuilder,
};
use proptest::{prelude::*, test_runner::Config};
use std::collections::BTreeMap;

fn arb_block_id() -> impl Strategy<Value = String> {
	"[a-f0-9]{1,16}"
}

// Small height range so that overwrites happen often
fn arb_entries() -> impl Strategy<Value = Vec<(u64, String)>> {
	prop::collection::vec((0u64..32, arb_block_id()), 0..24)
}

fn runtime() -> tokio::runtime::Runtime {
	tokio::runtime::Builder::new_current_thread()
		.enable_all()
		.build()
		.unwrap()
}

proptest! {
	#![proptest_config(Config {
		failure_persistence: None,
		cases: 64,
		..Config::default()
	})]

	#[test]
	fn prop_height_index_behaves_like_a_map(entries in arb_entries()) {
		let temp_dir = tempfile::tempdir().unwrap();
		let mut model = BTreeMap::new();

		let (live, reloaded) = runtime().block_on(async {
			let storage = FileBlockStorage::new(temp_dir.path().to_path_buf()).await.unwrap();
			for (height, block_id) in &entries {
				storage.put_height_entry(*height, block_id).await.unwrap();
				model.insert(*height, block_id.clone());
			}
			let live = storage.get_height_index().await.unwrap();

			let reopened = FileBlockStorage::new(temp_dir.path().to_path_buf()).await.unwrap();
			let reloaded = reopened.get_height_index().await.unwrap();
			(live, reloaded)
		});

		prop_assert_eq!(&live, &model);
		prop_assert_eq!(&reloaded, &model);
	}

	#[test]
	fn prop_latest_entry_is_highest_height(entries in arb_entries()) {
		let temp_dir = tempfile::tempdir().unwrap();

		let (latest, index) = runtime().block_on(async {
			let storage = FileBlockStorage::new(temp_dir.path().to_path_buf()).await.unwrap();
			for (height, block_id) in &entries {
				storage.put_height_entry(*height, block_id).await.unwrap();
			}
			(
				storage.latest_height_entry().await.unwrap(),
				storage.get_height_index().await.unwrap(),
			)
		});

		let expected = index
			.iter()
			.next_back()
			.map(|(height, block_id)| (*height, block_id.clone()));
		prop_assert_eq!(latest, expected);
	}

	#[test]
	fn prop_block_record_is_written_once(
		block_id in arb_block_id(),
		first_height in any::<u64>(),
		second_height in any::<u64>(),
	) {
		let temp_dir = tempfile::tempdir().unwrap();
		let first = BlockDetailBuilder::new().id(&block_id).height(first_height).build();
		let second = BlockDetailBuilder::new().id(&block_id).height(second_height).build();

		let (created_first, created_second, stored) = runtime().block_on(async {
			let storage = FileBlockStorage::new(temp_dir.path().to_path_buf()).await.unwrap();
			let created_first = storage.put_block_detail(&first).await.unwrap();
			let created_second = storage.put_block_detail(&second).await.unwrap();
			let stored = storage.get_block_detail(&block_id).await.unwrap();
			(created_first, created_second, stored)
		});

		prop_assert!(created_first);
		prop_assert!(!created_second);
		prop_assert_eq!(stored, Some(first));
	}
}

use mockito::{Matcher, Server};
use pool_block_monitor::{
	models::{ExplorerConfig, SecretString},
	repositories::{FileSubscriberRepository, SubscriberRepositoryTrait},
	services::{
		blockwatcher::{BlockStorage, FileBlockStorage},
		commands::{process_updates, CommandService},
		notification::TelegramClient,
	},
	utils::tests::BlockDetailBuilder,
};
use serde_json::json;
use std::{sync::Arc, time::Duration};

struct Fixture {
	_temp_dir: tempfile::TempDir,
	storage: Arc<FileBlockStorage>,
	subscribers: Arc<FileSubscriberRepository>,
	commands: CommandService<FileBlockStorage, FileSubscriberRepository>,
}

async fn fixture() -> Fixture {
	let temp_dir = tempfile::tempdir().unwrap();
	let storage = Arc::new(
		FileBlockStorage::new(temp_dir.path().join("blocks"))
			.await
			.unwrap(),
	);
	let subscribers = Arc::new(
		FileSubscriberRepository::new(temp_dir.path().join("state.json"))
			.await
			.unwrap(),
	);
	let commands = CommandService::new(
		storage.clone(),
		subscribers.clone(),
		ExplorerConfig::default(),
		"ckpool (Solo CK)",
	);
	Fixture {
		_temp_dir: temp_dir,
		storage,
		subscribers,
		commands,
	}
}

fn telegram_for(url: &str) -> TelegramClient {
	TelegramClient::new(url, SecretString::new("42:token"), Duration::from_secs(5)).unwrap()
}

fn message(update_id: i64, chat_id: i64, text: &str) -> serde_json::Value {
	json!({
		"update_id": update_id,
		"message": { "message_id": update_id, "chat": { "id": chat_id }, "text": text }
	})
}

#[tokio::test]
async fn test_subscribe_over_bot_api() {
	let fixture = fixture().await;
	let mut server = Server::new_async().await;
	let updates = server
		.mock("GET", "/bot42:token/getUpdates")
		.match_query(Matcher::UrlEncoded("timeout".into(), "0".into()))
		.with_status(200)
		.with_body(
			json!({
				"ok": true,
				"result": [
					message(100, 5, "/subscribe@ckpool_bot"),
					{ "update_id": 101 },
					message(102, 6, "hello there"),
				]
			})
			.to_string(),
		)
		.create_async()
		.await;
	let reply = server
		.mock("POST", "/bot42:token/sendMessage")
		.match_body(Matcher::AllOf(vec![
			Matcher::PartialJson(json!({ "chat_id": 5, "parse_mode": "HTML" })),
			Matcher::Regex("Subscription activated".to_string()),
		]))
		.with_status(200)
		.with_body(r#"{"ok":true,"result":{}}"#)
		.expect(1)
		.create_async()
		.await;

	let telegram = telegram_for(&server.url());
	let next_offset = process_updates(&telegram, &telegram, &fixture.commands, None, 0)
		.await
		.unwrap();

	assert_eq!(next_offset, Some(103));
	assert!(fixture.subscribers.contains(5).await);
	assert!(!fixture.subscribers.contains(6).await);
	updates.assert_async().await;
	reply.assert_async().await;
}

#[tokio::test]
async fn test_block_query_over_bot_api() {
	let fixture = fixture().await;
	let detail = BlockDetailBuilder::new().id("abc").height(800000).ckpool().build();
	fixture.storage.put_block_detail(&detail).await.unwrap();
	fixture.storage.put_height_entry(800000, "abc").await.unwrap();

	let mut server = Server::new_async().await;
	let updates = server
		.mock("GET", "/bot42:token/getUpdates")
		.match_query(Matcher::AllOf(vec![
			Matcher::UrlEncoded("timeout".into(), "0".into()),
			Matcher::UrlEncoded("offset".into(), "7".into()),
		]))
		.with_status(200)
		.with_body(json!({ "ok": true, "result": [message(7, 9, "/block 800000")] }).to_string())
		.create_async()
		.await;
	let reply = server
		.mock("POST", "/bot42:token/sendMessage")
		.match_body(Matcher::AllOf(vec![
			Matcher::PartialJson(json!({ "chat_id": 9 })),
			Matcher::Regex("Cached block info".to_string()),
			Matcher::Regex("Solo CK".to_string()),
		]))
		.with_status(200)
		.with_body(r#"{"ok":true,"result":{}}"#)
		.expect(1)
		.create_async()
		.await;

	let telegram = telegram_for(&server.url());
	let next_offset = process_updates(&telegram, &telegram, &fixture.commands, Some(7), 0)
		.await
		.unwrap();

	assert_eq!(next_offset, Some(8));
	updates.assert_async().await;
	reply.assert_async().await;
}

#[tokio::test]
async fn test_failed_reply_still_acknowledges_update() {
	let fixture = fixture().await;
	let mut server = Server::new_async().await;
	let _updates = server
		.mock("GET", "/bot42:token/getUpdates")
		.match_query(Matcher::Any)
		.with_status(200)
		.with_body(json!({ "ok": true, "result": [message(30, 4, "/help")] }).to_string())
		.create_async()
		.await;
	let reply = server
		.mock("POST", "/bot42:token/sendMessage")
		.with_status(400)
		.with_body(r#"{"ok":false,"description":"Bad Request: chat not found"}"#)
		.expect(1)
		.create_async()
		.await;

	let telegram = telegram_for(&server.url());
	let next_offset = process_updates(&telegram, &telegram, &fixture.commands, None, 0)
		.await
		.unwrap();

	assert_eq!(next_offset, Some(31));
	reply.assert_async().await;
}

#[tokio::test]
async fn test_poll_failure_keeps_offset_unchanged() {
	let fixture = fixture().await;
	let mut server = Server::new_async().await;
	let _updates = server
		.mock("GET", "/bot42:token/getUpdates")
		.match_query(Matcher::Any)
		.with_status(502)
		.create_async()
		.await;

	let telegram = telegram_for(&server.url());
	let result = process_updates(&telegram, &telegram, &fixture.commands, Some(12), 0).await;

	assert!(result.is_err());
	assert!(fixture.subscribers.get_all().await.is_empty());
}

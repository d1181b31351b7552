use mockito::{Matcher, Server};
use pool_block_monitor::{
	models::{ExplorerConfig, SecretString},
	services::notification::{NotificationService, TelegramClient},
	utils::tests::BlockDetailBuilder,
};
use serde_json::json;
use std::{sync::Arc, time::Duration};

fn telegram_for(url: &str) -> TelegramClient {
	TelegramClient::new(url, SecretString::new("42:token"), Duration::from_secs(5)).unwrap()
}

#[tokio::test]
async fn test_alert_fanout_survives_blocked_chat() {
	let mut server = Server::new_async().await;
	let delivered = server
		.mock("POST", "/bot42:token/sendMessage")
		.match_body(Matcher::AnyOf(vec![
			Matcher::PartialJson(json!({ "chat_id": 1 })),
			Matcher::PartialJson(json!({ "chat_id": 3 })),
		]))
		.with_status(200)
		.with_body(r#"{"ok":true,"result":{"message_id":9}}"#)
		.expect(2)
		.create_async()
		.await;
	let blocked = server
		.mock("POST", "/bot42:token/sendMessage")
		.match_body(Matcher::PartialJson(json!({ "chat_id": 2 })))
		.with_status(403)
		.with_body(
			r#"{"ok":false,"error_code":403,"description":"Forbidden: bot was blocked by the user"}"#,
		)
		.expect(1)
		.create_async()
		.await;

	let service = NotificationService::new(
		Arc::new(telegram_for(&server.url())),
		ExplorerConfig::default(),
	);
	let detail = BlockDetailBuilder::new().id("abc").height(800000).ckpool().build();

	let report = service.notify(&detail, &[1, 2, 3]).await;

	assert_eq!(report.delivered, vec![1, 3]);
	assert_eq!(report.failed, vec![2]);
	delivered.assert_async().await;
	blocked.assert_async().await;
}

#[tokio::test]
async fn test_alert_body_is_html_with_block_link() {
	let mut server = Server::new_async().await;
	let mock = server
		.mock("POST", "/bot42:token/sendMessage")
		.match_body(Matcher::AllOf(vec![
			Matcher::PartialJson(json!({ "chat_id": 7, "parse_mode": "HTML" })),
			Matcher::Regex("New Solo CK block".to_string()),
			Matcher::Regex("https://mempool.space/block/abc".to_string()),
		]))
		.with_status(200)
		.with_body(r#"{"ok":true,"result":{}}"#)
		.create_async()
		.await;

	let service = NotificationService::new(
		Arc::new(telegram_for(&server.url())),
		ExplorerConfig::default(),
	);
	let detail = BlockDetailBuilder::new().id("abc").ckpool().build();

	let report = service.notify(&detail, &[7]).await;

	assert_eq!(report.delivered, vec![7]);
	assert!(report.failed.is_empty());
	mock.assert_async().await;
}

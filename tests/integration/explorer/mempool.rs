use mockito::Server;
use pool_block_monitor::{
	models::ExplorerConfig,
	services::explorer::{BlockSource, MempoolClient},
};
use std::time::Duration;

fn client_for(url: &str) -> MempoolClient {
	MempoolClient::new(&ExplorerConfig {
		api_base: url.to_string(),
		request_timeout: Duration::from_secs(5),
		..Default::default()
	})
	.unwrap()
}

#[tokio::test]
async fn test_listing_then_detail_with_extras_pool() {
	let mut server = Server::new_async().await;
	let list_mock = server
		.mock("GET", "/api/blocks")
		.with_status(200)
		.with_header("content-type", "application/json")
		.with_body(r#"[{"id":"abc","height":800000,"timestamp":1690168629}]"#)
		.create_async()
		.await;
	let detail_mock = server
		.mock("GET", "/api/v1/block/abc")
		.with_status(200)
		.with_header("content-type", "application/json")
		.with_body(
			r#"{
				"id": "abc",
				"height": 800000,
				"timestamp": 1690168629,
				"tx_count": 3721,
				"extras": {
					"reward": 639969075,
					"pool": { "id": 49, "name": "Solo CK", "slug": "solock" }
				}
			}"#,
		)
		.create_async()
		.await;

	let client = client_for(&server.url());
	let listing = client.list_recent().await.unwrap();
	assert_eq!(listing.len(), 1);

	let detail = client.fetch_detail(&listing[0].id).await.unwrap();
	assert_eq!(detail.height, 800000);
	assert_eq!(detail.pool_descriptor().unwrap().id, Some(49));
	assert_eq!(detail.pool_name(), Some("Solo CK"));
	assert!(detail.extras.unwrap().other.contains_key("reward"));

	list_mock.assert_async().await;
	detail_mock.assert_async().await;
}

#[tokio::test]
async fn test_unknown_block_is_not_found() {
	let mut server = Server::new_async().await;
	let mock = server
		.mock("GET", "/api/v1/block/deadbeef")
		.with_status(404)
		.with_body("Block not found")
		.create_async()
		.await;

	let error = client_for(&server.url())
		.fetch_detail("deadbeef")
		.await
		.unwrap_err();

	assert!(error.is_not_found());
	assert_eq!(error.kind(), "not_found");
	mock.assert_async().await;
}

#[tokio::test]
async fn test_malformed_listing_is_parse_error() {
	let mut server = Server::new_async().await;
	let mock = server
		.mock("GET", "/api/blocks")
		.with_status(200)
		.with_body(r#"{"unexpected": true}"#)
		.create_async()
		.await;

	let error = client_for(&server.url()).list_recent().await.unwrap_err();

	assert_eq!(error.kind(), "parse");
	mock.assert_async().await;
}

#[tokio::test]
async fn test_unreachable_explorer_is_transport_error() {
	let error = client_for("http://127.0.0.1:1")
		.list_recent()
		.await
		.unwrap_err();

	assert_eq!(error.kind(), "transport");
}

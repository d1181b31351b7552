//! HTTP transport shared by the explorer and Telegram clients.
//!
//! Wraps a [`ClientWithMiddleware`] bound to a base URL. Requests are not retried
//! here: callers decide whether a failure is worth another attempt.

use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use serde::{de::DeserializeOwned, Serialize};
use std::{collections::HashMap, time::Duration};

use crate::services::transport::TransportError;

/// Maximum number of response body characters kept in an HTTP error
const MAX_ERROR_BODY_CHARS: usize = 512;

/// JSON over HTTP client bound to a base URL
#[derive(Clone, Debug)]
pub struct HttpTransportClient {
	client: ClientWithMiddleware,
	base_url: String,
}

impl HttpTransportClient {
	/// Creates a transport with a per-request `timeout`
	///
	/// # Arguments
	/// * `base_url` - Base URL prepended to every path, without trailing slash
	/// * `timeout` - Total time allowed for each request
	pub fn new(base_url: &str, timeout: Duration) -> Result<Self, anyhow::Error> {
		let client = reqwest::Client::builder()
			.timeout(timeout)
			.connect_timeout(timeout)
			.user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
			.build()
			.map_err(|e| anyhow::anyhow!("Failed to create HTTP client: {}", e))?;
		Ok(Self::with_client(base_url, ClientBuilder::new(client).build()))
	}

	/// Creates a transport from an existing client
	pub fn with_client(base_url: &str, client: ClientWithMiddleware) -> Self {
		Self {
			client,
			base_url: base_url.trim_end_matches('/').to_string(),
		}
	}

	/// Base URL of this transport
	pub fn base_url(&self) -> &str {
		&self.base_url
	}

	/// Sends `GET {base}{path}` and decodes the JSON response
	pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, TransportError> {
		let url = self.url_for(path);
		let request = self.client.get(&url);
		self.execute(request, &url).await
	}

	/// Sends `GET {base}{path}` allowing it `timeout` instead of the client default
	pub async fn get_json_with_timeout<T: DeserializeOwned>(
		&self,
		path: &str,
		timeout: Duration,
	) -> Result<T, TransportError> {
		let url = self.url_for(path);
		let request = self.client.get(&url).timeout(timeout);
		self.execute(request, &url).await
	}

	/// Sends `POST {base}{path}` with a JSON body and decodes the JSON response
	pub async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, TransportError>
	where
		B: Serialize + ?Sized,
		T: DeserializeOwned,
	{
		let url = self.url_for(path);
		let request = self.client.post(&url).json(body);
		self.execute(request, &url).await
	}

	fn url_for(&self, path: &str) -> String {
		format!("{}{}", self.base_url, path)
	}

	async fn execute<T: DeserializeOwned>(
		&self,
		request: reqwest_middleware::RequestBuilder,
		url: &str,
	) -> Result<T, TransportError> {
		let metadata = || Some(HashMap::from([("url".to_string(), url.to_string())]));

		let response = request.send().await.map_err(|e| {
			TransportError::network(
				format!("Failed to send request: {}", e),
				Some(Box::new(e)),
				metadata(),
			)
		})?;

		let status = response.status();
		if !status.is_success() {
			let body = response.text().await.unwrap_or_default();
			let body: String = body.chars().take(MAX_ERROR_BODY_CHARS).collect();
			return Err(TransportError::http(status.as_u16(), url, body, None));
		}

		let bytes = response.bytes().await.map_err(|e| {
			TransportError::network(
				format!("Failed to read response body: {}", e),
				Some(Box::new(e)),
				metadata(),
			)
		})?;

		serde_json::from_slice(&bytes).map_err(|e| {
			TransportError::response_parse(
				format!("Invalid JSON response: {}", e),
				Some(Box::new(e)),
				metadata(),
			)
		})
	}
}

//! Metrics HTTP server.
//!
//! Serves the Prometheus text exposition of [`REGISTRY`](super::REGISTRY) at `GET /metrics`.

use axum::{
	http::{header, StatusCode},
	response::IntoResponse,
	routing::get,
	Router,
};
use std::net::SocketAddr;
use tokio_util::sync::CancellationToken;

/// Builds the router exposing `/metrics`
pub fn create_metrics_router() -> Router {
	Router::new().route("/metrics", get(metrics_handler))
}

async fn metrics_handler() -> impl IntoResponse {
	match super::gather_metrics() {
		Ok(buffer) => (
			StatusCode::OK,
			[(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
			buffer,
		)
			.into_response(),
		Err(e) => {
			tracing::error!("Failed to encode metrics: {}", e);
			StatusCode::INTERNAL_SERVER_ERROR.into_response()
		}
	}
}

/// Serves metrics on `address` until `shutdown` is cancelled
pub async fn serve_metrics(
	address: SocketAddr,
	shutdown: CancellationToken,
) -> Result<(), std::io::Error> {
	let listener = tokio::net::TcpListener::bind(address).await?;
	tracing::info!("Metrics server listening on {}", address);
	axum::serve(listener, create_metrics_router())
		.with_graceful_shutdown(async move { shutdown.cancelled().await })
		.await
}

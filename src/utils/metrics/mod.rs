//! Metrics module for the application.
//!
//! - This module contains the global Prometheus registry.
//! - Defines the watcher, storage and notification metrics.

pub mod server;

use lazy_static::lazy_static;
use prometheus::{
	Counter, CounterVec, Encoder, Gauge, Histogram, HistogramOpts, Opts, Registry, TextEncoder,
};

lazy_static! {
	/// Global Prometheus registry.
	///
	/// This registry holds all metrics defined in this module and is used
	/// to gather metrics for exposure via the metrics endpoint.
	pub static ref REGISTRY: Registry = Registry::new();

	/// Counter for completed watcher cycles, labeled by outcome ("ok", "error", "panic").
	pub static ref WATCHER_CYCLES_TOTAL: CounterVec = {
		let counter = CounterVec::new(
			Opts::new("watcher_cycles_total", "Total number of watcher polling cycles"),
			&["outcome"]
		).unwrap();
		REGISTRY.register(Box::new(counter.clone())).unwrap();
		counter
	};

	/// Histogram for the duration of a watcher cycle in seconds.
	pub static ref WATCHER_CYCLE_DURATION_SECONDS: Histogram = {
		let histogram = Histogram::with_opts(
			HistogramOpts::new("watcher_cycle_duration_seconds", "Watcher cycle duration in seconds")
				.buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0]),
		).unwrap();
		REGISTRY.register(Box::new(histogram.clone())).unwrap();
		histogram
	};

	/// Counter for block identifiers seen for the first time.
	pub static ref BLOCKS_DISCOVERED_TOTAL: Counter = {
		let counter = Counter::new("blocks_discovered_total", "Total number of newly discovered blocks").unwrap();
		REGISTRY.register(Box::new(counter.clone())).unwrap();
		counter
	};

	/// Counter for failed block detail fetches, labeled by kind ("transport", "not_found", "parse").
	pub static ref BLOCK_FETCH_ERRORS_TOTAL: CounterVec = {
		let counter = CounterVec::new(
			Opts::new("block_fetch_errors_total", "Total number of failed block detail fetches"),
			&["kind"]
		).unwrap();
		REGISTRY.register(Box::new(counter.clone())).unwrap();
		counter
	};

	/// Counter for block details written to the cache.
	pub static ref BLOCKS_CACHED_TOTAL: Counter = {
		let counter = Counter::new("blocks_cached_total", "Total number of block details written to the cache").unwrap();
		REGISTRY.register(Box::new(counter.clone())).unwrap();
		counter
	};

	/// Counter for blocks attributed to the tracked pool.
	pub static ref POOL_BLOCKS_DETECTED_TOTAL: Counter = {
		let counter = Counter::new("pool_blocks_detected_total", "Total number of blocks mined by the tracked pool").unwrap();
		REGISTRY.register(Box::new(counter.clone())).unwrap();
		counter
	};

	/// Counter for notification attempts, labeled by status ("delivered", "failed").
	pub static ref NOTIFICATIONS_TOTAL: CounterVec = {
		let counter = CounterVec::new(
			Opts::new("notifications_total", "Total number of notification attempts"),
			&["status"]
		).unwrap();
		REGISTRY.register(Box::new(counter.clone())).unwrap();
		counter
	};

	/// Gauge for the number of subscribed recipients.
	pub static ref SUBSCRIBERS: Gauge = {
		let gauge = Gauge::new("subscribers", "Number of subscribed recipients").unwrap();
		REGISTRY.register(Box::new(gauge.clone())).unwrap();
		gauge
	};

	/// Gauge for the number of heights in the height index.
	pub static ref INDEXED_HEIGHTS: Gauge = {
		let gauge = Gauge::new("indexed_heights", "Number of heights in the block height index").unwrap();
		REGISTRY.register(Box::new(gauge.clone())).unwrap();
		gauge
	};
}

/// Gather all metrics and encode into the provided format.
pub fn gather_metrics() -> Result<Vec<u8>, Box<dyn std::error::Error>> {
	let encoder = TextEncoder::new();
	let metric_families = REGISTRY.gather();
	let mut buffer = Vec::new();
	encoder.encode(&metric_families, &mut buffer)?;
	Ok(buffer)
}

/// Records the outcome and duration of a watcher cycle.
///
/// # Arguments
/// * `outcome` - "ok", "error" or "panic"
/// * `duration_secs` - The cycle duration in seconds
pub fn record_watcher_cycle(outcome: &str, duration_secs: f64) {
	WATCHER_CYCLES_TOTAL.with_label_values(&[outcome]).inc();
	WATCHER_CYCLE_DURATION_SECONDS.observe(duration_secs);
}

/// Records a failed block detail fetch.
///
/// # Arguments
/// * `kind` - The failure kind ("transport", "not_found", "parse")
pub fn record_fetch_error(kind: &str) {
	BLOCK_FETCH_ERRORS_TOTAL.with_label_values(&[kind]).inc();
}

/// Records the result of a single notification attempt.
pub fn record_notification(delivered: bool) {
	let status = if delivered { "delivered" } else { "failed" };
	NOTIFICATIONS_TOTAL.with_label_values(&[status]).inc();
}

/// Initializes labeled metrics so they appear in Prometheus output with 0 values.
pub fn init_metrics() {
	for outcome in ["ok", "error", "panic"] {
		WATCHER_CYCLES_TOTAL.with_label_values(&[outcome]).inc_by(0.0);
	}
	for kind in ["transport", "not_found", "parse"] {
		BLOCK_FETCH_ERRORS_TOTAL.with_label_values(&[kind]).inc_by(0.0);
	}
	for status in ["delivered", "failed"] {
		NOTIFICATIONS_TOTAL.with_label_values(&[status]).inc_by(0.0);
	}
}

//! Block explorer access.
//!
//! Provides the [`BlockSource`] interface used by the watcher and its
//! mempool.space implementation.

mod client;
mod error;
mod mempool;

pub use client::BlockSource;
pub use error::ExplorerError;
pub use mempool::MempoolClient;

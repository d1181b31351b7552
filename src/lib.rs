//! Pool block monitor.
//!
//! Watches a mempool.space compatible block explorer for newly mined blocks,
//! caches every block it sees, and alerts subscribed Telegram chats when a block
//! was mined by the tracked pool.
//!
//! # Architecture
//!
//! - `bootstrap`: Wiring of the services from configuration
//! - `models`: Data structures for blocks, configuration and chat payloads
//! - `repositories`: Durable subscriber storage
//! - `services`: Watcher loop, explorer client, classifier, notifications and
//!   chat commands
//! - `utils`: Logging, metrics and test builders

pub mod bootstrap;
pub mod models;
pub mod repositories;
pub mod services;
pub mod utils;

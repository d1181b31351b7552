//! Core services implementing the monitoring functionality.
//!
//! This module contains the main business logic services:
//! - `blockwatcher`: Polls the explorer and caches new blocks
//! - `commands`: Chat command front-end
//! - `explorer`: Block explorer clients
//! - `filter`: Pool attribution of blocks
//! - `notification`: Alert fan-out and the Telegram transport
//! - `transport`: Shared JSON over HTTP client

pub mod blockwatcher;
pub mod commands;
pub mod explorer;
pub mod filter;
pub mod notification;
pub mod transport;

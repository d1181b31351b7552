//! Block watcher service implementation.
//!
//! This module provides functionality to watch the explorer for newly mined blocks.
//! It includes:
//! - The polling loop and its background service
//! - Block storage implementations
//! - Error handling specific to block watching operations

mod error;
mod service;
mod storage;

pub use error::BlockWatcherError;
pub use service::{process_new_blocks, BlockWatcherService, CycleReport};
pub use storage::{BlockStorage, FileBlockStorage};

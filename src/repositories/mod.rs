//! Repository implementations for durable application state.
//!
//! - `SubscriberRepositoryTrait`: Interface for the set of alert recipients
//! - `FileSubscriberRepository`: JSON file backed implementation

mod error;
mod subscriber;

pub use error::RepositoryError;
pub use subscriber::{FileSubscriberRepository, SubscriberRepositoryTrait};

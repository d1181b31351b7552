//! Block classification.

mod pool;

pub use pool::PoolFilter;

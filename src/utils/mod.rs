//! Utility modules for common functionality.
//!
//! - logging: Logging setup and error context
//! - metrics: Prometheus metrics and their HTTP endpoint
//! - tests: Builders shared by unit and integration tests

pub mod logging;
pub mod metrics;
pub mod tests;

//! Test builders for creating test instances of models.

pub mod block;

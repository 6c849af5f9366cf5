//! # Integration Scenarios
//!
//! Cross-crate flows exercised through the public API only.

pub mod cluster;
pub mod concurrency;
pub mod lifecycle;

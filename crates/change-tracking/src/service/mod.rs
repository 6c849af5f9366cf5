//! Service Layer
//!
//! - `ChangeTrackingService`: implements `ChangeTrackingApi`
//! - `ReadTransaction`: the get/merge/rollback read protocol

pub mod tracking_service;
pub mod transaction;

pub use tracking_service::ChangeTrackingService;
pub use transaction::{ReadTransaction, TxnPhase};

//! Ports Layer
//!
//! Defines the interfaces (traits) for:
//! - Driving Ports (inbound) - API for external callers
//! - Driven Ports (outbound) - Catalog and settings persistence

pub mod inbound;
pub mod outbound;

pub use inbound::ChangeTrackingApi;
pub use outbound::{CatalogProvider, TrackingSettingsStore};

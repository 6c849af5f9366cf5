//! Adapters Layer
//!
//! - `InMemoryCatalog`: catalog port for tests and demo mode
//! - `InMemorySettingsStore` / `JsonFileSettingsStore`: settings port
//! - `RegistrationWorker`: periodic bind/consistency sweep
//! - `ClusterCoordinator`: fan-out and all-or-nothing reads across segments

pub mod catalog;
pub mod dispatch;
pub mod settings;
pub mod worker;

pub use catalog::InMemoryCatalog;
pub use dispatch::ClusterCoordinator;
pub use settings::{InMemorySettingsStore, JsonFileSettingsStore};
pub use worker::{RegistrationWorker, SweepReport};

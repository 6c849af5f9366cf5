//! # Shared Types Crate
//!
//! Identifiers and catalog vocabulary used by every change-tracking crate.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: object ids, segment ids and catalog codes are
//!   defined here and nowhere else.
//! - **Sentinel ids**: `INVALID_OID` marks "no object" in fixed-capacity
//!   structures instead of an `Option`, so slot arrays never reallocate.

pub mod catalog;
pub mod entities;
pub mod errors;

pub use catalog::{RelKind, RelStorage};
pub use entities::*;
pub use errors::*;

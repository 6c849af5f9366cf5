//! # Change-Tracking Test Suite
//!
//! Unified test crate containing:
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! ├── fixtures.rs       # Shared segment/cluster builders
//! └── integration/      # Cross-crate scenarios
//!     ├── scenarios.rs  # Register / modify / read / abort flows
//!     ├── concurrency.rs# Writers racing readers
//!     ├── lifecycle.rs  # Region boot, worker recovery, error flag
//!     └── cluster.rs    # Coordinated reads across segments
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p tracking-tests
//! cargo test -p tracking-tests integration::cluster
//! cargo bench -p tracking-tests
//! ```

pub mod fixtures;
pub mod integration;

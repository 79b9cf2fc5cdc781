//! # spanlog Testkit
//!
//! Test utilities for spanlog.
//!
//! This crate provides:
//! - Store fixtures with an attached event recorder
//! - Property-based test generators using proptest
//! - Feed file helpers for CLI and replay tests
//! - Stress testing utilities
//!
//! ## Usage
//!
//! ```rust
//! use spanlog_testkit::prelude::*;
//! use spanlog_core::{IngestEntry, LogUpdateAction};
//!
//! let store = TestStore::new();
//! store.ingest(vec![IngestEntry::new("build-1", "ok\n").manifest("web")]);
//! assert_eq!(store.events.actions(), vec![LogUpdateAction::Append]);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod feed;
pub mod fixtures;
pub mod generators;
pub mod stress;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::feed::*;
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use crate::stress::*;
}

pub use feed::*;
pub use fixtures::*;
pub use generators::*;
pub use stress::*;

//! # spanlog Core
//!
//! Client-side log store for a developer dashboard.
//!
//! The store ingests a continuous stream of log fragments keyed by span
//! (one span per build, running process or resource), merges them into a
//! single globally-ordered timeline, bounds memory by evicting whole old
//! spans, and tells its consumers exactly when their slice of the log
//! changed.
//!
//! This crate provides:
//! - [`LogStore`]: ingestion, eviction, explicit truncation, notification
//! - [`SpanIndex`]: span id to ordered segments, with manifest grouping
//! - View building: filtered segment, line and rendered-text views
//! - [`ListenerRegistry`]: subscriptions with isolated listener failures
//! - Feed decoding for transport batches
//!
//! ## Example
//!
//! ```rust
//! use spanlog_core::{Config, IngestEntry, LogStore, ManifestFilter, RenderOptions};
//!
//! let store = LogStore::with_config(Config::new().byte_ceiling(1 << 20))?;
//! store.ingest(vec![
//!     IngestEntry::new("build-1", "Compiling\n").manifest("web"),
//!     IngestEntry::new("build-2", "Starting\n").manifest("api"),
//! ]);
//!
//! let text = store.render(&ManifestFilter::All, RenderOptions::default());
//! assert_eq!(text, "Compiling\nStarting\n");
//! # Ok::<(), spanlog_core::CoreError>(())
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod error;
pub mod eviction;
pub mod feed;
mod listener;
mod segment;
mod span;
mod stats;
mod store;
mod types;
pub mod view;

pub use config::Config;
pub use error::{CoreError, CoreResult};
pub use eviction::{EvictionPlan, Evictor};
pub use feed::{FeedBatch, FeedSegment};
pub use listener::{
    ListenerRegistry, LogListener, LogUpdateAction, LogUpdateEvent, NotifyReport,
    SubscriptionHandle,
};
pub use segment::{Fields, IngestEntry, Segment};
pub use span::{BindOutcome, RemovedSpan, Span, SpanIndex, SpanSummary};
pub use stats::{StatsSnapshot, StoreStats};
pub use store::{CommitStatus, LogStore};
pub use types::{OrderKey, SpanId};
pub use view::{LogLine, ManifestFilter, RenderOptions, ViewEntry};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

//! Listener registry for committed store mutations.
//!
//! Every committed mutation produces exactly one [`LogUpdateEvent`], which
//! is delivered synchronously to every subscribed listener before the store
//! accepts its next mutation.
//!
//! # Usage
//!
//! ```rust
//! use spanlog_core::{IngestEntry, LogStore, ManifestFilter};
//!
//! let store = LogStore::new();
//! let web = ManifestFilter::only(["web"]);
//!
//! let handle = store.subscribe(move |event: &spanlog_core::LogUpdateEvent| {
//!     if event.touches(&web) && event.requires_rebuild() {
//!         // invalidate cached rendering for "web"
//!     }
//! });
//!
//! store.ingest(vec![IngestEntry::new("build-1", "Compiling\n").manifest("web")]);
//! store.unsubscribe(handle);
//! ```

use crate::types::{OrderKey, SpanId};
use crate::view::ManifestFilter;
use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use std::any::Any;
use std::collections::BTreeSet;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Kind of committed mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogUpdateAction {
    /// Segments were appended; consumers may fetch the delta incrementally.
    Append,
    /// Spans were removed; derived renderings must be rebuilt.
    Truncate,
    /// A span with retained segments changed manifest; filtered renderings
    /// must be rebuilt.
    Rebind,
}

/// Notification describing one committed mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogUpdateEvent {
    /// What kind of mutation committed.
    pub action: LogUpdateAction,
    /// Spans appended to, removed, or rebound by the commit.
    pub affected_spans: BTreeSet<SpanId>,
    /// Manifests those spans belong (or belonged) to.
    pub affected_manifests: BTreeSet<String>,
    /// Highest order key assigned so far.
    pub upper_order_key: OrderKey,
}

impl LogUpdateEvent {
    /// Returns true if the commit may have changed a view built with `filter`.
    ///
    /// Removed spans no longer resolve to a manifest, so this consults the
    /// manifests recorded in the event rather than the store.
    #[must_use]
    pub fn touches(&self, filter: &ManifestFilter) -> bool {
        if !filter.is_valid() {
            return false;
        }
        match filter {
            ManifestFilter::All => true,
            ManifestFilter::Only(names) => !self.affected_manifests.is_disjoint(names),
        }
    }

    /// Returns true if consumers cannot patch their view incrementally.
    #[must_use]
    pub fn requires_rebuild(&self) -> bool {
        !matches!(self.action, LogUpdateAction::Append)
    }
}

/// A consumer of store notifications.
pub trait LogListener: Send {
    /// Called once per committed mutation.
    fn on_update(&mut self, event: &LogUpdateEvent);
}

impl<F> LogListener for F
where
    F: FnMut(&LogUpdateEvent) + Send,
{
    fn on_update(&mut self, event: &LogUpdateEvent) {
        self(event)
    }
}

/// Handle returned by subscribe; pass it to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriptionHandle(u64);

impl SubscriptionHandle {
    /// Returns the raw handle value.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SubscriptionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub:{}", self.0)
    }
}

type SharedListener = Arc<Mutex<Box<dyn LogListener>>>;

/// Outcome of one notification round.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NotifyReport {
    /// Listeners that handled the event.
    pub delivered: usize,
    /// Listeners that panicked and were dropped.
    pub failed: usize,
}

/// Set of listener subscriptions.
///
/// The registry lock is never held while a listener runs, so listeners may
/// subscribe, unsubscribe, or read the store from inside their callback.
pub struct ListenerRegistry {
    listeners: RwLock<Vec<(SubscriptionHandle, SharedListener)>>,
    next_handle: AtomicU64,
}

impl ListenerRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            listeners: RwLock::new(Vec::new()),
            next_handle: AtomicU64::new(1),
        }
    }

    /// Registers a listener for all future commits.
    pub fn subscribe<L>(&self, listener: L) -> SubscriptionHandle
    where
        L: LogListener + 'static,
    {
        let handle = SubscriptionHandle(self.next_handle.fetch_add(1, Ordering::Relaxed));
        let listener: Box<dyn LogListener> = Box::new(listener);
        self.listeners
            .write()
            .push((handle, Arc::new(Mutex::new(listener))));
        handle
    }

    /// Removes a subscription. Returns false if the handle was not registered.
    pub fn unsubscribe(&self, handle: SubscriptionHandle) -> bool {
        let mut listeners = self.listeners.write();
        let before = listeners.len();
        listeners.retain(|(h, _)| *h != handle);
        listeners.len() != before
    }

    /// Returns true if the handle is registered.
    pub fn is_subscribed(&self, handle: SubscriptionHandle) -> bool {
        self.listeners.read().iter().any(|(h, _)| *h == handle)
    }

    /// Number of registered listeners.
    pub fn subscriber_count(&self) -> usize {
        self.listeners.read().len()
    }

    /// Delivers an event to every listener subscribed when the round began.
    ///
    /// A listener removed earlier in the same round is skipped. A listener
    /// that panics is logged and dropped; the round continues.
    pub fn notify(&self, event: &LogUpdateEvent) -> NotifyReport {
        let snapshot: Vec<(SubscriptionHandle, SharedListener)> = self.listeners.read().clone();
        let mut report = NotifyReport::default();

        for (handle, listener) in snapshot {
            if !self.is_subscribed(handle) {
                continue;
            }

            let result = {
                let mut listener = listener.lock();
                panic::catch_unwind(AssertUnwindSafe(|| listener.on_update(event)))
            };

            match result {
                Ok(()) => report.delivered += 1,
                Err(payload) => {
                    tracing::error!(
                        subscription = %handle,
                        action = ?event.action,
                        "listener panicked, dropping it: {}",
                        panic_message(payload.as_ref())
                    );
                    self.unsubscribe(handle);
                    report.failed += 1;
                }
            }
        }

        report
    }
}

impl Default for ListenerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ListenerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerRegistry")
            .field("subscribers", &self.subscriber_count())
            .finish_non_exhaustive()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "non-string panic payload"
    }
}

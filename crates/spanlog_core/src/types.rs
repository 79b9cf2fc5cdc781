//! Core type definitions for spanlog.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

/// Identifier of a span.
///
/// Span ids are assigned externally (one per build, process run or
/// resource) and are unique for the lifetime of the producing process.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SpanId(String);

impl SpanId {
    /// Creates a span id.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true if the id is empty and therefore unusable.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for SpanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SpanId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for SpanId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl Borrow<str> for SpanId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Global ordering key of a segment.
///
/// Order keys are strictly increasing across the whole store and are never
/// reused, even after the segments carrying them have been truncated.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct OrderKey(pub u64);

impl OrderKey {
    /// The key preceding every assigned key.
    pub const ZERO: Self = Self(0);

    /// Creates an order key.
    #[must_use]
    pub const fn new(key: u64) -> Self {
        Self(key)
    }

    /// Returns the raw key value.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }

    /// Returns the next order key.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for OrderKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "key:{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_key_next() {
        let key = OrderKey::new(41);
        assert_eq!(key.next().as_u64(), 42);
        assert!(OrderKey::ZERO < key);
    }

    #[test]
    fn display_formats() {
        assert_eq!(OrderKey::new(7).to_string(), "key:7");
        assert_eq!(SpanId::new("build:1").to_string(), "build:1");
    }

    #[test]
    fn span_id_borrows_as_str() {
        let mut set = std::collections::BTreeSet::new();
        set.insert(SpanId::from("pod-a"));
        assert!(set.contains("pod-a"));
        assert!(SpanId::new("").is_empty());
    }

    #[test]
    fn serde_transparent() {
        let json = serde_json::to_string(&SpanId::new("s1")).unwrap();
        assert_eq!(json, "\"s1\"");
        let key: OrderKey = serde_json::from_str("12").unwrap();
        assert_eq!(key, OrderKey::new(12));
    }
}

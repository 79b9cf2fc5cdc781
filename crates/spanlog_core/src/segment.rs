//! Log segments.
//!
//! A segment is the leaf unit of the store: one chunk of text belonging to
//! one span. Segments are never edited once appended; the only way they
//! leave the store is by removal of their whole span.

use crate::types::{OrderKey, SpanId};
use serde::Serialize;
use std::collections::BTreeMap;

/// Opaque structured annotations carried alongside segment text.
pub type Fields = BTreeMap<String, String>;

/// An immutable fragment of log text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Segment {
    span_id: SpanId,
    order_key: OrderKey,
    text: String,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    fields: Fields,
}

impl Segment {
    /// Creates a segment. Only the store assigns order keys.
    pub(crate) fn new(span_id: SpanId, order_key: OrderKey, text: String, fields: Fields) -> Self {
        Self {
            span_id,
            order_key,
            text,
            fields,
        }
    }

    /// Owning span.
    #[must_use]
    pub fn span_id(&self) -> &SpanId {
        &self.span_id
    }

    /// Global order key.
    #[must_use]
    pub fn order_key(&self) -> OrderKey {
        self.order_key
    }

    /// Segment text, possibly containing embedded newlines.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Structured annotations.
    #[must_use]
    pub fn fields(&self) -> &Fields {
        &self.fields
    }

    /// Size counted against the store's byte ceiling.
    #[must_use]
    pub fn byte_size(&self) -> u64 {
        self.text.len() as u64
    }
}

/// One entry of an ingest batch, before an order key is assigned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestEntry {
    /// Span the text belongs to.
    pub span_id: SpanId,
    /// Manifest binding delivered with the entry, if any.
    pub manifest_name: Option<String>,
    /// Segment text.
    pub text: String,
    /// Structured annotations.
    pub fields: Fields,
}

impl IngestEntry {
    /// Creates an entry with no fields and no manifest binding.
    pub fn new(span_id: impl Into<SpanId>, text: impl Into<String>) -> Self {
        Self {
            span_id: span_id.into(),
            manifest_name: None,
            text: text.into(),
            fields: Fields::new(),
        }
    }

    /// Binds the entry's span to a manifest.
    #[must_use]
    pub fn manifest(mut self, name: impl Into<String>) -> Self {
        self.manifest_name = Some(name.into());
        self
    }

    /// Adds a structured annotation.
    #[must_use]
    pub fn field(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn byte_size_counts_utf8_bytes() {
        let seg = Segment::new(
            SpanId::new("s"),
            OrderKey::new(1),
            "héllo\n".into(),
            Fields::new(),
        );
        assert_eq!(seg.byte_size(), 7);
    }

    #[test]
    fn entry_builder() {
        let entry = IngestEntry::new("build-1", "Compiling\n")
            .manifest("web")
            .field("progressID", "step-1");
        assert_eq!(entry.span_id.as_str(), "build-1");
        assert_eq!(entry.manifest_name.as_deref(), Some("web"));
        assert_eq!(entry.fields.get("progressID").map(String::as_str), Some("step-1"));
    }
}

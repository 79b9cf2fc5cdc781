//! Read-side views over the span index.
//!
//! Views are recomputed from the index on every call; nothing here caches.
//! Segments of concurrently running spans are interleaved by order key, so
//! two resources building at once read in true arrival order rather than
//! grouped by span.

use crate::span::SpanIndex;
use crate::types::{OrderKey, SpanId};
use serde::Serialize;
use std::collections::{BTreeSet, HashMap};

/// Which manifests a consumer cares about.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ManifestFilter {
    /// Every span, bound or not.
    #[default]
    All,
    /// Only spans bound to one of these manifests.
    Only(BTreeSet<String>),
}

impl ManifestFilter {
    /// Builds a filter over an explicit set of manifest names.
    pub fn only<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Only(names.into_iter().map(Into::into).collect())
    }

    /// A filter is malformed if it names an empty manifest.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        match self {
            Self::All => true,
            Self::Only(names) => names.iter().all(|n| !n.is_empty()),
        }
    }

    /// Returns true if a span bound to `manifest` passes the filter.
    #[must_use]
    pub fn matches(&self, manifest: Option<&str>) -> bool {
        match self {
            Self::All => true,
            Self::Only(names) => manifest.is_some_and(|m| names.contains(m)),
        }
    }
}

/// One segment as seen by a view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewEntry {
    /// Segment text.
    pub text: String,
    /// Global order key.
    pub order_key: OrderKey,
    /// Owning span.
    pub span_id: SpanId,
}

/// One logical line assembled from one or more segments of a span.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogLine {
    /// Line text without its terminating newline.
    pub text: String,
    /// Span that produced the line.
    pub span_id: SpanId,
    /// Manifest of that span, if bound.
    pub manifest_name: Option<String>,
    /// Order key of the segment that started the line.
    pub order_key: OrderKey,
    /// Whether a newline has terminated the line.
    pub complete: bool,
}

/// Options for [`render`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderOptions {
    /// Prefix every line with its manifest name.
    pub prefix_manifest: bool,
}

/// Every segment matching the filter, sorted by order key.
pub fn build_view(index: &SpanIndex, filter: &ManifestFilter) -> Vec<ViewEntry> {
    build_view_since(index, filter, OrderKey::ZERO)
}

/// Segments matching the filter with an order key above `after`.
///
/// Consumers pass the last upper order key they rendered to fetch only the
/// delta announced by an append notification.
pub fn build_view_since(
    index: &SpanIndex,
    filter: &ManifestFilter,
    after: OrderKey,
) -> Vec<ViewEntry> {
    if !filter.is_valid() {
        return Vec::new();
    }

    let mut entries: Vec<ViewEntry> = index
        .iter()
        .filter(|(span, _)| filter.matches(span.manifest_name()))
        .flat_map(|(_, segments)| {
            let start = segments.partition_point(|s| s.order_key() <= after);
            segments[start..].iter()
        })
        .map(|s| ViewEntry {
            text: s.text().to_string(),
            order_key: s.order_key(),
            span_id: s.span_id().clone(),
        })
        .collect();
    entries.sort_unstable_by_key(|e| e.order_key);
    entries
}

/// Line view of the segments matching the filter.
///
/// A segment that does not end in a newline leaves its span's line open;
/// the next segment of the same span continues it, even if segments of
/// other spans arrived in between.
pub fn build_lines(index: &SpanIndex, filter: &ManifestFilter) -> Vec<LogLine> {
    let view = build_view(index, filter);
    let mut lines: Vec<LogLine> = Vec::new();
    let mut open: HashMap<SpanId, usize> = HashMap::new();

    for entry in view {
        let manifest = index
            .span(&entry.span_id)
            .and_then(|s| s.manifest_name())
            .map(str::to_string);
        let mut rest = entry.text.as_str();

        while !rest.is_empty() {
            let (piece, terminated) = match rest.find('\n') {
                Some(pos) => {
                    let piece = &rest[..pos];
                    rest = &rest[pos + 1..];
                    (piece, true)
                }
                None => {
                    let piece = rest;
                    rest = "";
                    (piece, false)
                }
            };

            let line = match open.remove(&entry.span_id) {
                Some(idx) => idx,
                None => {
                    lines.push(LogLine {
                        text: String::new(),
                        span_id: entry.span_id.clone(),
                        manifest_name: manifest.clone(),
                        order_key: entry.order_key,
                        complete: false,
                    });
                    lines.len() - 1
                }
            };
            lines[line].text.push_str(piece);

            if terminated {
                lines[line].complete = true;
            } else {
                open.insert(entry.span_id.clone(), line);
            }
        }
    }

    lines
}

/// Renders the filtered line view as one string.
pub fn render(index: &SpanIndex, filter: &ManifestFilter, options: RenderOptions) -> String {
    let lines = build_lines(index, filter);
    let width = if options.prefix_manifest {
        lines
            .iter()
            .filter_map(|l| l.manifest_name.as_deref())
            .map(|m| m.chars().count())
            .max()
            .unwrap_or(0)
    } else {
        0
    };

    let mut out = String::new();
    for (i, line) in lines.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        if options.prefix_manifest {
            let name = line.manifest_name.as_deref().unwrap_or("");
            out.push_str(&format!("{name:<width$} │ "));
        }
        out.push_str(&line.text);
    }
    if lines.last().is_some_and(|l| l.complete) {
        out.push('\n');
    }
    out
}

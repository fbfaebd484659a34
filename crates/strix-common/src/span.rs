//! Span - source location tracking for AST nodes and diagnostics.
//!
//! A Span represents a range of source code by byte offsets. Spans are
//! small (8 bytes) and cheap to copy.

use serde::{Deserialize, Serialize};

/// A span of source code, represented as a byte range.
///
/// Spans use half-open intervals: `[start, end)`.
/// An empty span has `start == end`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    /// Start byte offset (inclusive)
    pub start: u32,
    /// End byte offset (exclusive)
    pub end: u32,
}

impl Span {
    /// Create a new span from start and end offsets.
    #[inline]
    pub const fn new(start: u32, end: u32) -> Self {
        Span { start, end }
    }

    /// Create an empty span at the given position.
    #[inline]
    pub const fn at(pos: u32) -> Self {
        Span {
            start: pos,
            end: pos,
        }
    }

    /// Create a span from start position and length.
    #[inline]
    pub const fn from_len(start: u32, len: u32) -> Self {
        Span {
            start,
            end: start + len,
        }
    }

    /// Create a dummy/invalid span (used for synthetic nodes).
    #[inline]
    pub const fn dummy() -> Self {
        Span {
            start: u32::MAX,
            end: u32::MAX,
        }
    }

    /// Check if this is a dummy/invalid span.
    #[inline]
    pub const fn is_dummy(&self) -> bool {
        self.start == u32::MAX && self.end == u32::MAX
    }

    /// Get the length of this span in bytes.
    #[inline]
    pub const fn len(&self) -> u32 {
        self.end.saturating_sub(self.start)
    }

    /// Check if this span is empty.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Check if this span contains a byte offset.
    #[inline]
    pub const fn contains(&self, offset: u32) -> bool {
        offset >= self.start && offset < self.end
    }

    /// Check if this span contains another span.
    #[inline]
    pub const fn contains_span(&self, other: Span) -> bool {
        other.start >= self.start && other.end <= self.end
    }

    /// Merge two spans to create a span covering both.
    #[inline]
    pub const fn merge(&self, other: Span) -> Span {
        let start = if self.start < other.start {
            self.start
        } else {
            other.start
        };
        let end = if self.end > other.end { self.end } else { other.end };
        Span { start, end }
    }

    /// Extract the slice of text covered by this span.
    #[inline]
    pub fn slice<'a>(&self, text: &'a str) -> &'a str {
        text.get(self.start as usize..self.end as usize).unwrap_or("")
    }
}

impl From<(u32, u32)> for Span {
    fn from((start, end): (u32, u32)) -> Self {
        Span::new(start, end)
    }
}

impl std::fmt::Display for Span {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

/// A trait for types that have a source span.
pub trait Spanned {
    /// Get the source span of this element.
    fn span(&self) -> Span;

    /// Get the start byte offset.
    fn start(&self) -> u32 {
        self.span().start
    }

    /// Get the end byte offset.
    fn end(&self) -> u32 {
        self.span().end
    }
}

impl Spanned for Span {
    fn span(&self) -> Span {
        *self
    }
}

#[cfg(test)]
#[path = "tests/span.rs"]
mod tests;

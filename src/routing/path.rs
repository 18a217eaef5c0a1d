//! Request path segmentation.
//!
//! # Responsibilities
//! - Strip trailing separators
//! - Drop characters outside the URL-safe printable set
//! - Split into ordered, non-empty segments
//!
//! # Design Decisions
//! - Pure function: same input always yields the same segments
//! - Empty segments (`a//b`, leading `/`) are collapsed, never kept positionally
//! - Filtering only removes characters; nothing is escaped or rejected

/// Path separator between segments.
pub const SEPARATOR: char = '/';

/// Ordered, non-empty segments of a request path.
///
/// Segment 0 names the handler, segment 1 the operation, the rest are
/// positional parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestPath {
    segments: Vec<String>,
}

impl RequestPath {
    /// Parse a raw path. `None` yields an empty path.
    pub fn parse(raw: Option<&str>) -> Self {
        let Some(raw) = raw else {
            return Self::default();
        };

        let sanitized: String = raw
            .trim_end_matches(SEPARATOR)
            .chars()
            .filter(|c| is_url_safe(*c))
            .collect();

        let segments = sanitized
            .split(SEPARATOR)
            .filter(|s| !s.is_empty())
            .map(str::to_owned)
            .collect();

        Self { segments }
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn into_segments(self) -> Vec<String> {
        self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

/// Letters, digits and the punctuation allowed in URLs.
fn is_url_safe(c: char) -> bool {
    c.is_ascii_alphanumeric() || "$-_.+!*'(),{}|\\^~[]`<>#%\";/?:@&=".contains(c)
}

//! Byte range handling
//!
//! Single-range `bytes=` requests only; anything else is served in full.

/// Inclusive byte span inside a document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub start: usize,
    pub end: usize,
}

impl ByteRange {
    /// Number of bytes in the span
    pub const fn length(self) -> usize {
        self.end - self.start + 1
    }

    /// Value for the `Content-Range` header
    pub fn content_range(self, total: usize) -> String {
        format!("bytes {}-{}/{total}", self.start, self.end)
    }
}

/// What a `Range` header asks for once checked against the document size
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeOutcome {
    /// No usable Range header, send the whole document
    Full,
    /// Send this span with 206
    Partial(ByteRange),
    /// Syntactically valid but outside the document, answer 416
    Unsatisfiable,
}

/// Resolve a `Range` header value against a document of `total` bytes
///
/// # Examples
/// ```
/// use spa_edge::http::range::{resolve_range, ByteRange, RangeOutcome};
///
/// assert_eq!(
///     resolve_range(Some("bytes=0-99"), 1000),
///     RangeOutcome::Partial(ByteRange { start: 0, end: 99 })
/// );
/// assert_eq!(resolve_range(None, 1000), RangeOutcome::Full);
/// ```
pub fn resolve_range(header: Option<&str>, total: usize) -> RangeOutcome {
    let Some(spec) = header.and_then(|h| h.trim().strip_prefix("bytes=")) else {
        return RangeOutcome::Full;
    };
    if spec.contains(',') {
        return RangeOutcome::Full;
    }
    let Some((first, last)) = spec.split_once('-') else {
        return RangeOutcome::Full;
    };
    let (first, last) = (first.trim(), last.trim());

    if first.is_empty() {
        // "-N": the final N bytes
        return match last.parse::<usize>() {
            Ok(0) => RangeOutcome::Unsatisfiable,
            Ok(_) if total == 0 => RangeOutcome::Unsatisfiable,
            Ok(n) => RangeOutcome::Partial(ByteRange {
                start: total.saturating_sub(n),
                end: total - 1,
            }),
            Err(_) => RangeOutcome::Full,
        };
    }

    let Ok(start) = first.parse::<usize>() else {
        return RangeOutcome::Full;
    };
    if start >= total {
        return RangeOutcome::Unsatisfiable;
    }
    let end = if last.is_empty() {
        total - 1
    } else {
        match last.parse::<usize>() {
            Ok(e) if e < start => return RangeOutcome::Unsatisfiable,
            Ok(e) => e.min(total - 1),
            Err(_) => return RangeOutcome::Full,
        }
    };
    RangeOutcome::Partial(ByteRange { start, end })
}

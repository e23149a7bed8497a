//! HTTP Range request parsing module
//!
//! Single byte-range support (RFC 7233). Multi-range requests are ignored and
//! answered with the full body.

/// Inclusive byte range already clamped to the file size
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub start: u64,
    pub end: u64,
}

impl ByteRange {
    pub const fn len(&self) -> u64 {
        self.end - self.start + 1
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum RangeParseResult {
    Satisfiable(ByteRange),
    /// Answer with 416
    NotSatisfiable,
    /// Absent, malformed or multi-range: serve the whole file
    Ignored,
}

/// Parse a `Range` header against a file of `file_size` bytes
///
/// Supported forms: `bytes=start-end`, `bytes=start-`, `bytes=-suffix`.
///
/// # Examples
/// ```
/// use servetool::http::range::{parse_range_header, ByteRange, RangeParseResult};
///
/// assert_eq!(
///     parse_range_header(Some("bytes=0-99"), 1000),
///     RangeParseResult::Satisfiable(ByteRange { start: 0, end: 99 })
/// );
/// assert_eq!(parse_range_header(None, 1000), RangeParseResult::Ignored);
/// ```
pub fn parse_range_header(range_header: Option<&str>, file_size: u64) -> RangeParseResult {
    let Some(spec) = range_header.and_then(|h| h.trim().strip_prefix("bytes=")) else {
        return RangeParseResult::Ignored;
    };

    if spec.contains(',') {
        return RangeParseResult::Ignored;
    }

    let Some((first, last)) = spec.split_once('-') else {
        return RangeParseResult::Ignored;
    };
    let (first, last) = (first.trim(), last.trim());

    if first.is_empty() {
        return suffix_range(last, file_size);
    }

    let Ok(start) = first.parse::<u64>() else {
        return RangeParseResult::Ignored;
    };
    let end = if last.is_empty() {
        None
    } else {
        match last.parse::<u64>() {
            Ok(e) => Some(e),
            Err(_) => return RangeParseResult::Ignored,
        }
    };

    if end.is_some_and(|e| e < start) {
        return RangeParseResult::Ignored;
    }
    if start >= file_size {
        return RangeParseResult::NotSatisfiable;
    }

    let last_byte = file_size - 1;
    RangeParseResult::Satisfiable(ByteRange {
        start,
        end: end.map_or(last_byte, |e| e.min(last_byte)),
    })
}

/// `-N`: the last N bytes
fn suffix_range(suffix: &str, file_size: u64) -> RangeParseResult {
    let Ok(suffix) = suffix.parse::<u64>() else {
        return RangeParseResult::Ignored;
    };

    if suffix == 0 || file_size == 0 {
        return RangeParseResult::NotSatisfiable;
    }

    RangeParseResult::Satisfiable(ByteRange {
        start: file_size.saturating_sub(suffix),
        end: file_size - 1,
    })
}

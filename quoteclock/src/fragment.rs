//! Quote text fragmentation
//!
//! Splits quote text into Normal/Bold runs around every case-insensitive
//! occurrence of the time display. The marker is always escaped, so text like
//! "3.15 p.m." or "(noon)" matches literally. Offsets come from matching the
//! original haystack, never a lowercased copy, so non-ASCII text whose
//! lowercase form changes byte length still splits at the right places.
//!
//! Most dataset lines are plain ASCII. Those are scanned byte by byte, which
//! gives the same ranges as the regex without compiling one per line.

use regex::RegexBuilder;

use crate::interface::TextFragment;

/// Byte range of one marker occurrence in the haystack
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct MatchRange {
    pub(crate) start: usize,
    pub(crate) end: usize,
}

/// Find all non-overlapping, case-insensitive occurrences of `marker`.
/// Returns an empty vec for an empty marker.
pub(crate) fn find_marker(haystack: &str, marker: &str) -> Vec<MatchRange> {
    if marker.is_empty() || haystack.is_empty() {
        return Vec::new();
    }
    if haystack.is_ascii() && marker.is_ascii() {
        return find_ascii(haystack.as_bytes(), marker.as_bytes());
    }
    find_unicode(haystack, marker)
}

/// Leftmost, non-overlapping scan. Only valid when both inputs are ASCII:
/// case folding then never crosses into multi-byte characters.
fn find_ascii(haystack: &[u8], marker: &[u8]) -> Vec<MatchRange> {
    let mut ranges = Vec::new();
    let mut start = 0;
    while start + marker.len() <= haystack.len() {
        let end = start + marker.len();
        if haystack[start..end].eq_ignore_ascii_case(marker) {
            ranges.push(MatchRange { start, end });
            start = end;
        } else {
            start += 1;
        }
    }
    ranges
}

fn find_unicode(haystack: &str, marker: &str) -> Vec<MatchRange> {
    let matcher = match RegexBuilder::new(&regex::escape(marker))
        .case_insensitive(true)
        .build()
    {
        Ok(matcher) => matcher,
        Err(e) => {
            tracing::debug!(marker, error = %e, "marker could not be compiled, leaving text plain");
            return Vec::new();
        }
    };

    matcher
        .find_iter(haystack)
        .map(|m| MatchRange { start: m.start(), end: m.end() })
        .collect()
}

/// Split `haystack` into ordered fragments around occurrences of `marker`.
///
/// Without an occurrence the result is a single `Normal(haystack)`, even for an
/// empty haystack. Matched text keeps the haystack's casing. No empty `Normal`
/// fragment is ever emitted around a match.
pub fn fragment(haystack: &str, marker: &str) -> Vec<TextFragment> {
    let ranges = find_marker(haystack, marker);
    if ranges.is_empty() {
        return vec![TextFragment::Normal(haystack.to_string())];
    }

    let mut fragments = Vec::with_capacity(ranges.len() * 2 + 1);
    let mut cursor = 0;
    for range in ranges {
        if range.start > cursor {
            fragments.push(TextFragment::Normal(haystack[cursor..range.start].to_string()));
        }
        fragments.push(TextFragment::Bold(haystack[range.start..range.end].to_string()));
        cursor = range.end;
    }
    if cursor < haystack.len() {
        fragments.push(TextFragment::Normal(haystack[cursor..].to_string()));
    }

    fragments
}

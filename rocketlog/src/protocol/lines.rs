//! Classification of the text lines the device sends during reformat.

use super::{FINISHED_LINE, PAGE_LINE_PREFIX, REFORMAT_PROMPT};

/// A line received during the reformat handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReformatLine<'a> {
    /// The confirmation prompt.
    Prompt,
    /// A page-write progress line (`"Writing page ..."`).
    Page,
    /// The `"Finished reformat"` sentinel.
    Finished,
    /// Anything else.
    Other(&'a str),
}

/// Classify a line that has already had trailing whitespace trimmed.
///
/// Matching is exact and case-sensitive. A page line only needs its first
/// 12 characters to be `"Writing page"`.
pub fn classify_line(line: &str) -> ReformatLine<'_> {
    if line == REFORMAT_PROMPT {
        ReformatLine::Prompt
    } else if line == FINISHED_LINE {
        ReformatLine::Finished
    } else if line.starts_with(PAGE_LINE_PREFIX) {
        ReformatLine::Page
    } else {
        ReformatLine::Other(line)
    }
}

//! Constants shared by the parsing and diffing modules.

/// Heading that opens the transitional provisions block of a statute.
pub const TRANSITIONAL_HEADING: &str = "Övergångsbestämmelser";

/// Maximum number of characters kept as a section excerpt.
pub const EXCERPT_MAX_CHARS: usize = 200;

/// Maximum number of characters of a unified diff stored on a change event.
pub const DIFF_SUMMARY_MAX_CHARS: usize = 50_000;

/// Marker appended to a truncated unified diff.
pub const TRUNCATION_MARKER: &str = "\n... [truncated]";

/// Context lines around each hunk of a unified diff.
pub const UNIFIED_DIFF_CONTEXT_LINES: usize = 3;

/// Swedish month names in calendar order.
///
/// Transitional provisions always spell the month out in lower case
/// ("den 1 juli 2014"); matching is still case-insensitive.
pub const SWEDISH_MONTHS: [(&str, u32); 12] = [
    ("januari", 1),
    ("februari", 2),
    ("mars", 3),
    ("april", 4),
    ("maj", 5),
    ("juni", 6),
    ("juli", 7),
    ("augusti", 8),
    ("september", 9),
    ("oktober", 10),
    ("november", 11),
    ("december", 12),
];

/// Look up a month number by its Swedish name.
///
/// # Examples
/// ```
/// use sfs_tracker_parser::config::swedish_month;
///
/// assert_eq!(swedish_month("juli"), Some(7));
/// assert_eq!(swedish_month("Januari"), Some(1));
/// assert_eq!(swedish_month("july"), None);
/// ```
#[must_use]
pub fn swedish_month(name: &str) -> Option<u32> {
    let name = name.to_lowercase();
    SWEDISH_MONTHS
        .iter()
        .find(|(month, _)| *month == name)
        .map(|(_, number)| *number)
}

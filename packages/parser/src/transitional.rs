//! Effective dates from the transitional provisions (Övergångsbestämmelser).
//!
//! The block lists one entry per amending law, headed by its bare number:
//!
//! ```text
//! Övergångsbestämmelser
//!
//! 2014:659
//! Denna lag träder i kraft den 1 juli 2014.
//!
//! 2025:732
//! 1. Denna lag träder i kraft den 1 januari 2026.
//! 2. Äldre föreskrifter gäller fortfarande för ...
//! ```
//!
//! Dates are only taken from an entry's own "träder i kraft den ..." sentence.
//! Entries that state no date, or a date in another form ("den dag
//! regeringen bestämmer"), are left out.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;

use crate::config::{swedish_month, TRANSITIONAL_HEADING};
use crate::types::SfsNumber;

/// The heading line that opens the block. "Övergångsbestämmelserna" in
/// running text does not count.
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static HEADING_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"(?mi)^[\t ]*{TRANSITIONAL_HEADING}\b")).expect("valid regex")
});

/// A line holding nothing but a bare SFS number.
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static ENTRY_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{4}:\d+$").expect("valid regex"));

#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static ENTRY_INTO_FORCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)träder\s+i\s+kraft\s+den\s+(\d{1,2})\s+(\p{L}+)\s+(\d{4})")
        .expect("valid regex")
});

/// Whether the first non-blank line of `text` is a bare entry number.
fn opens_with_entry(text: &str) -> bool {
    text.lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .is_some_and(|line| ENTRY_LINE.is_match(line))
}

/// Byte offset of the transitional provisions heading, if the text has one.
///
/// Some statutes use the heading inside a chapter, ahead of further
/// paragraphs. The block proper is the first heading whose next non-blank
/// line after the heading line is an entry number; without such a heading
/// the last one counts.
pub(crate) fn transitional_block_start(text: &str) -> Option<usize> {
    let mut last = None;
    for heading in HEADING_LINE.find_iter(text) {
        let after = text[heading.end()..]
            .split_once('\n')
            .map_or("", |(_, rest)| rest);
        if opens_with_entry(after) {
            return Some(heading.start());
        }
        last = Some(heading.start());
    }
    last
}

/// Parse "träder i kraft den <day> <month> <year>" into a calendar date.
///
/// # Examples
/// ```
/// use sfs_tracker_parser::transitional::parse_entry_into_force;
/// use chrono::NaiveDate;
///
/// assert_eq!(
///     parse_entry_into_force("Denna lag träder i kraft den 1 juli 2014."),
///     NaiveDate::from_ymd_opt(2014, 7, 1)
/// );
/// assert_eq!(parse_entry_into_force("Denna lag träder i kraft den dag regeringen bestämmer."), None);
/// ```
#[must_use]
pub fn parse_entry_into_force(text: &str) -> Option<NaiveDate> {
    let caps = ENTRY_INTO_FORCE.captures(text)?;
    let day: u32 = caps[1].parse().ok()?;
    let month = swedish_month(&caps[2])?;
    let year: i32 = caps[3].parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Effective dates per amending law, read from the transitional provisions.
///
/// Text without an "Övergångsbestämmelser" heading yields an empty map. Each
/// line consisting of a bare "YYYY:NNNN" opens an entry that runs until the
/// next such line; the entry's first into-force sentence gives its date.
#[must_use]
pub fn parse_transitional_provisions(text: &str) -> BTreeMap<SfsNumber, NaiveDate> {
    let Some(start) = transitional_block_start(text) else {
        return BTreeMap::new();
    };

    let mut entries: Vec<(SfsNumber, String)> = Vec::new();
    for line in text[start..].lines() {
        let trimmed = line.trim();
        if ENTRY_LINE.is_match(trimmed) {
            if let Ok(sfs) = trimmed.parse() {
                entries.push((sfs, String::new()));
                continue;
            }
        }
        if let Some((_, body)) = entries.last_mut() {
            body.push_str(line);
            body.push('\n');
        }
    }

    let mut dates = BTreeMap::new();
    for (sfs, body) in entries {
        match parse_entry_into_force(&body) {
            Some(date) => {
                dates.entry(sfs).or_insert(date);
            }
            None => {
                tracing::debug!(sfs = %sfs, "no effective date stated for amendment");
            }
        }
    }
    dates
}

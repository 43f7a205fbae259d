//! Text normalization for equality comparison and diff display.

use regex::Regex;
use std::sync::LazyLock;

#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static WHITESPACE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static HORIZONTAL_WHITESPACE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\t \u{A0}]+").expect("valid regex"));

/// A word hyphenated across a line break, e.g. "an-\nnan".
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static LINE_BREAK_HYPHEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([a-zåäö])-[\t ]*\r?\n[\t ]*([a-zåäö])").expect("valid regex")
});

#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static SECTION_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+\s*[a-z]?\s*§\s*").expect("valid regex"));

#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static CHAPTER_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+\s*kap\.\s*").expect("valid regex"));

/// Paragraph citation including an optional preceding period.
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static CITATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\.?\s*Lag\s*\(\d{4}:\d+\)").expect("valid regex"));

#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static SFS_MENTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"SFS\s*\d{4}:\d+").expect("valid regex"));

const SOFT_HYPHEN: char = '\u{AD}';

/// Collapse every whitespace run to a single space and trim.
///
/// # Examples
/// ```
/// use sfs_tracker_parser::normalize::normalize_whitespace;
///
/// assert_eq!(normalize_whitespace("  1 §\n\tText  "), "1 § Text");
/// ```
#[must_use]
pub fn normalize_whitespace(text: &str) -> String {
    WHITESPACE_RUN.replace_all(text, " ").trim().to_string()
}

/// Whether two texts differ in anything other than whitespace.
#[must_use]
pub fn has_substantive_change(old_text: &str, new_text: &str) -> bool {
    normalize_whitespace(old_text) != normalize_whitespace(new_text)
}

/// Remove soft hyphens (U+00AD) left over from typesetting.
#[must_use]
pub fn remove_soft_hyphens(text: &str) -> String {
    text.replace(SOFT_HYPHEN, "")
}

/// Join words that were hyphenated across a line break ("an-\nnan" → "annan").
///
/// Only lower-case letters on both sides are joined, so real compounds
/// such as "EU-\nrätten" keep their hyphen.
#[must_use]
pub fn clean_line_break_hyphens(text: &str) -> String {
    LINE_BREAK_HYPHEN.replace_all(text, "${1}${2}").into_owned()
}

fn fold_quotes(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '\u{201C}' | '\u{201D}' | '\u{201E}' | '\u{BB}' | '\u{AB}' => '"',
            '\u{2018}' | '\u{2019}' => '\'',
            other => other,
        })
        .collect()
}

/// Comparison key for section texts.
///
/// Strips everything that changes between consolidations without the
/// provision itself changing: section and chapter markers, paragraph
/// citations, SFS mentions, typographic quotes, hyphenation artifacts and
/// whitespace. Two sections are semantically equal when their keys match.
#[must_use]
pub fn normalize_for_comparison(text: &str) -> String {
    let text = remove_soft_hyphens(&text.replace("\r\n", "\n"));
    let text = clean_line_break_hyphens(&text);
    let text = SECTION_MARKER.replace_all(&text, "");
    let text = CHAPTER_MARKER.replace_all(&text, "");
    let text = text.replace('§', "");
    let text = CITATION.replace_all(&text, "");
    let text = SFS_MENTION.replace_all(&text, "");
    let text = fold_quotes(&normalize_whitespace(&text));
    text.trim_end_matches(|c: char| c == '.' || c.is_whitespace())
        .to_string()
}

/// Whether two section texts are equal after [`normalize_for_comparison`].
#[must_use]
pub fn texts_semantically_equal(text_a: &str, text_b: &str) -> bool {
    normalize_for_comparison(text_a) == normalize_for_comparison(text_b)
}

/// Display normalization for line diffs.
///
/// Keeps the line structure (one line per stycke) but removes paragraph
/// citations and hyphenation artifacts, collapses horizontal whitespace and
/// drops blank lines.
#[must_use]
pub fn normalize_for_diff(text: &str) -> String {
    let text = remove_soft_hyphens(&text.replace("\r\n", "\n"));
    let text = clean_line_break_hyphens(&text);
    let text = CITATION.replace_all(&text, "");
    let text = fold_quotes(&text);

    text.lines()
        .map(|line| HORIZONTAL_WHITESPACE_RUN.replace_all(line, " ").trim().to_string())
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

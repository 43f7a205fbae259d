//! Core data types for Swedish statutory text.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{ParserError, Result};

/// Accepted textual forms of an SFS number: "SFS 2020:100", "SFS2020:100", "2020:100".
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static SFS_NUMBER_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(?:SFS\s*)?(\d{4}):(\d+)$").expect("valid regex"));

/// An SFS number (Svensk författningssamling), e.g. `SFS 1977:1160`.
///
/// The canonical textual form is `SFS <year>:<number>`; this is the form
/// stored on amendment records and compared by [`crate::find_changed_sections`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SfsNumber {
    year: u16,
    number: u32,
}

impl SfsNumber {
    /// Create an SFS number from its parts.
    #[must_use]
    pub fn new(year: u16, number: u32) -> Self {
        Self { year, number }
    }

    /// Year of publication.
    #[must_use]
    pub fn year(&self) -> u16 {
        self.year
    }

    /// Running number within the year.
    #[must_use]
    pub fn number(&self) -> u32 {
        self.number
    }

    /// The bare `YYYY:NNNN` form, without the `SFS` prefix.
    #[must_use]
    pub fn bare(&self) -> String {
        format!("{}:{}", self.year, self.number)
    }

    /// Title used for an amending law, e.g. `Lag (2025:732)`.
    #[must_use]
    pub fn law_title(&self) -> String {
        format!("Lag ({})", self.bare())
    }
}

impl fmt::Display for SfsNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SFS {}:{}", self.year, self.number)
    }
}

impl FromStr for SfsNumber {
    type Err = ParserError;

    /// Parse any accepted form into the canonical number.
    ///
    /// # Examples
    /// ```
    /// use sfs_tracker_parser::SfsNumber;
    ///
    /// let sfs: SfsNumber = "SFS 2025:732".parse().unwrap();
    /// assert_eq!(sfs.to_string(), "SFS 2025:732");
    /// assert_eq!("2025:732".parse::<SfsNumber>().unwrap(), sfs);
    /// assert!("2025-732".parse::<SfsNumber>().is_err());
    /// ```
    fn from_str(s: &str) -> Result<Self> {
        let invalid = || ParserError::InvalidSfsNumber(s.to_string());
        let caps = SFS_NUMBER_PATTERN.captures(s.trim()).ok_or_else(invalid)?;
        let year = caps[1].parse().map_err(|_| invalid())?;
        let number = caps[2].parse().map_err(|_| invalid())?;
        Ok(Self { year, number })
    }
}

impl Serialize for SfsNumber {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for SfsNumber {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Normalize a section number to `<digits>` or `<digits> <letter>`.
///
/// Source texts write lettered sections as "1 a", "1a" or "1  a"; all of
/// them map to "1 a" so identifiers stay stable across re-parses.
#[must_use]
pub fn normalize_section_number(raw: &str) -> String {
    let raw = raw.trim();
    let digits_end = raw
        .char_indices()
        .find(|(_, c)| !c.is_ascii_digit())
        .map_or(raw.len(), |(i, _)| i);
    let (digits, rest) = raw.split_at(digits_end);
    let rest = rest.trim();
    if rest.is_empty() {
        digits.to_string()
    } else {
        format!("{digits} {rest}")
    }
}

/// Human-readable label for a section, e.g. `7 §` or `3 kap. 7 §`.
#[must_use]
pub fn section_label(chapter: Option<&str>, section: &str) -> String {
    match chapter {
        Some(chapter) => format!("{chapter} kap. {section} §"),
        None => format!("{section} §"),
    }
}

/// Identifies a paragraph within a statute.
///
/// Ordering follows document order in a consolidated text: chapter number
/// first (laws without chapters sort before chapter 1), then the section
/// number, then its letter suffix.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SectionKey {
    pub chapter: Option<String>,
    pub section: String,
}

impl SectionKey {
    #[must_use]
    pub fn new(chapter: Option<&str>, section: &str) -> Self {
        Self {
            chapter: chapter.map(str::to_string),
            section: normalize_section_number(section),
        }
    }

    #[must_use]
    pub fn label(&self) -> String {
        section_label(self.chapter.as_deref(), &self.section)
    }

    fn sort_key(&self) -> (u32, u32, &str) {
        let chapter = self.chapter.as_deref().map_or(0, leading_number);
        let section = leading_number(&self.section);
        let suffix = self
            .section
            .trim_start_matches(|c: char| c.is_ascii_digit())
            .trim();
        (chapter, section, suffix)
    }
}

impl Ord for SectionKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.sort_key()
            .cmp(&other.sort_key())
            .then_with(|| self.chapter.cmp(&other.chapter))
            .then_with(|| self.section.cmp(&other.section))
    }
}

impl PartialOrd for SectionKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

fn leading_number(s: &str) -> u32 {
    let digits: String = s.chars().take_while(char::is_ascii_digit).collect();
    digits.parse().unwrap_or(0)
}

/// A paragraph (§) as found in a consolidated statute text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedSection {
    /// Chapter number, `None` for laws without chapters.
    pub chapter: Option<String>,

    /// Section number, e.g. "7" or "7 a".
    pub section: String,

    /// Paragraph body, from after the § marker to the next marker.
    pub text: String,

    /// The trailing `Lag (YYYY:NNNN).` citation, if the paragraph has one.
    pub citation: Option<SfsNumber>,
}

impl ParsedSection {
    #[must_use]
    pub fn key(&self) -> SectionKey {
        SectionKey {
            chapter: self.chapter.clone(),
            section: self.section.clone(),
        }
    }

    #[must_use]
    pub fn label(&self) -> String {
        section_label(self.chapter.as_deref(), &self.section)
    }
}

/// A paragraph attributed to the law that last amended it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionAmendment {
    pub chapter: Option<String>,
    pub section: String,
    /// Leading part of the paragraph text, for context.
    pub excerpt: String,
    pub amending_sfs_number: SfsNumber,
}

impl SectionAmendment {
    #[must_use]
    pub fn label(&self) -> String {
        section_label(self.chapter.as_deref(), &self.section)
    }
}

/// Result of [`crate::extract_section_amendments`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedAmendments {
    pub amendments: Vec<SectionAmendment>,
    /// Every amending number, deduplicated, in order of first appearance.
    pub unique_sfs_numbers: Vec<SfsNumber>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_sfs_number_forms() {
        let expected = SfsNumber::new(2020, 100);
        assert_eq!("SFS 2020:100".parse::<SfsNumber>().unwrap(), expected);
        assert_eq!("SFS2020:100".parse::<SfsNumber>().unwrap(), expected);
        assert_eq!("sfs 2020:100".parse::<SfsNumber>().unwrap(), expected);
        assert_eq!(" 2020:100 ".parse::<SfsNumber>().unwrap(), expected);
    }

    #[test]
    fn test_parse_sfs_number_rejects_garbage() {
        assert!("".parse::<SfsNumber>().is_err());
        assert!("SFS 20:100".parse::<SfsNumber>().is_err());
        assert!("Lag (2020:100)".parse::<SfsNumber>().is_err());
        assert!("2020:".parse::<SfsNumber>().is_err());
    }

    #[test]
    fn test_sfs_number_display_and_parts() {
        let sfs = SfsNumber::new(1977, 1160);
        assert_eq!(sfs.to_string(), "SFS 1977:1160");
        assert_eq!(sfs.bare(), "1977:1160");
        assert_eq!(sfs.law_title(), "Lag (1977:1160)");
    }

    #[test]
    fn test_sfs_number_orders_chronologically() {
        let mut numbers = vec![
            SfsNumber::new(2021, 5),
            SfsNumber::new(2020, 1000),
            SfsNumber::new(2020, 99),
        ];
        numbers.sort();
        assert_eq!(
            numbers,
            vec![
                SfsNumber::new(2020, 99),
                SfsNumber::new(2020, 1000),
                SfsNumber::new(2021, 5),
            ]
        );
    }

    #[test]
    fn test_sfs_number_serde_uses_canonical_string() {
        let json = serde_json::to_string(&SfsNumber::new(2014, 659)).unwrap();
        assert_eq!(json, "\"SFS 2014:659\"");
        let back: SfsNumber = serde_json::from_str("\"2014:659\"").unwrap();
        assert_eq!(back, SfsNumber::new(2014, 659));
    }

    #[test]
    fn test_normalize_section_number() {
        assert_eq!(normalize_section_number("7"), "7");
        assert_eq!(normalize_section_number("7a"), "7 a");
        assert_eq!(normalize_section_number("7  a"), "7 a");
        assert_eq!(normalize_section_number(" 12 b "), "12 b");
    }

    #[test]
    fn test_section_label() {
        assert_eq!(section_label(None, "1"), "1 §");
        assert_eq!(section_label(Some("2"), "3 a"), "2 kap. 3 a §");
    }

    #[test]
    fn test_section_key_ordering() {
        let mut keys = vec![
            SectionKey::new(Some("2"), "1"),
            SectionKey::new(Some("1"), "10"),
            SectionKey::new(Some("1"), "2 a"),
            SectionKey::new(Some("1"), "2"),
            SectionKey::new(None, "3"),
        ];
        keys.sort();
        let labels: Vec<String> = keys.iter().map(SectionKey::label).collect();
        assert_eq!(
            labels,
            vec!["3 §", "1 kap. 2 §", "1 kap. 2 a §", "1 kap. 10 §", "2 kap. 1 §"]
        );
    }
}

//! Paragraph (§) and chapter structure of consolidated statute text.
//!
//! Consolidated SFS texts end every paragraph with a reference to the law
//! that last amended it:
//!
//! ```text
//! 3 kap. Arbetsmiljöns beskaffenhet
//!
//! 2 § Arbetsgivaren ska vidta alla åtgärder som behövs ... Lag (2002:585).
//!
//! 2 a § Arbetsgivaren ska systematiskt planera ... Lag (1994:579).
//! ```
//!
//! Scanning is strictly deterministic. A paragraph without a trailing
//! `Lag (YYYY:NNNN).` citation is reported without an amending law; the
//! amending law is never guessed.

use std::collections::{BTreeMap, HashSet};
use std::sync::LazyLock;

use regex::Regex;

use crate::config::EXCERPT_MAX_CHARS;
use crate::transitional::transitional_block_start;
use crate::types::{
    normalize_section_number, ParsedAmendments, ParsedSection, SectionAmendment, SfsNumber,
};

/// Chapter ("3 kap.") and paragraph ("7 §", "7 a §") markers.
///
/// A marker counts at the start of a line, or mid-line right after the
/// closing citation of the previous paragraph ("... Lag (2020:100). 2 § ...").
/// A chapter marker may carry a paragraph marker on the same line ("1 kap. 1 §").
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static STRUCTURE_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"(?m)(?:^[\t ]*|Lag[\t ]*\(\d{4}:\d+\)\.[\t ]+)(?P<marker>",
        r"(?P<chapter>\d+)[\t ]*kap\.(?:[\t ]*(?P<chapter_section>\d+(?:[\t ]*[a-z])?)[\t ]*§)?",
        r"|(?P<section>\d+(?:[\t ]*[a-z])?)[\t ]*§",
        r")"
    ))
    .expect("valid regex")
});

/// Paragraph-trailing citation of the amending law.
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static TRAILING_CITATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Lag\s*\((\d{4}:\d+)\)\.").expect("valid regex"));

/// Any `Lag (YYYY:NNNN)` citation, with or without the closing period.
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static LAW_CITATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Lag\s*\((\d{4}:\d+)\)").expect("valid regex"));

/// "t.o.m. SFS 2025:732" or "t.o.m. 2025:732" in a document subtitle.
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static UNDERTITEL_TOM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)t\.o\.m\.\s*((?:SFS\s*)?\d{4}:\d+)").expect("valid regex")
});

/// One structure marker found while scanning.
struct Marker {
    start: usize,
    end: usize,
    chapter: Option<String>,
    section: Option<String>,
}

fn scan_markers(region: &str) -> Vec<Marker> {
    STRUCTURE_MARKER
        .captures_iter(region)
        .filter_map(|caps| {
            let marker = caps.name("marker")?;
            let section = caps
                .name("chapter_section")
                .or_else(|| caps.name("section"))
                .map(|m| normalize_section_number(m.as_str()));
            Some(Marker {
                start: marker.start(),
                end: marker.end(),
                chapter: caps.name("chapter").map(|m| m.as_str().to_string()),
                section,
            })
        })
        .collect()
}

/// The part of the text that holds the provisions proper.
fn provisions_region(text: &str) -> &str {
    match transitional_block_start(text) {
        Some(start) => &text[..start],
        None => text,
    }
}

/// Find the citation that closes a paragraph body.
///
/// The last `Lag (YYYY:NNNN).` in the body counts when nothing sentence-like
/// follows it. A heading for the next paragraph ("Tillämpningsområde") may
/// follow; another sentence may not.
fn trailing_citation(body: &str) -> Option<SfsNumber> {
    let caps = TRAILING_CITATION.captures_iter(body).last()?;
    let whole = caps.get(0)?;
    let rest = body[whole.end()..].trim();
    if rest.contains('.') || rest.contains('§') {
        return None;
    }
    caps[1].parse().ok()
}

/// Split statute text into its paragraphs, in document order.
///
/// The running chapter is carried through the scan: it changes at each
/// "<N> kap." marker and applies to every paragraph until the next one.
/// Only text before the transitional provisions block is scanned.
#[must_use]
pub fn split_sections(text: &str) -> Vec<ParsedSection> {
    let region = provisions_region(text);
    let markers = scan_markers(region);

    let (_, sections) = markers.iter().enumerate().fold(
        (None::<String>, Vec::new()),
        |(chapter, mut sections), (i, marker)| {
            let chapter = marker.chapter.clone().or(chapter);
            if let Some(section) = &marker.section {
                let end = markers.get(i + 1).map_or(region.len(), |next| next.start);
                let body = region[marker.end..end].trim();
                sections.push(ParsedSection {
                    chapter: chapter.clone(),
                    section: section.clone(),
                    text: body.to_string(),
                    citation: trailing_citation(body),
                });
            }
            (chapter, sections)
        },
    );

    tracing::trace!(sections = sections.len(), "split statute text into sections");
    sections
}

fn excerpt(text: &str) -> String {
    text.chars().take(EXCERPT_MAX_CHARS).collect()
}

/// Extract every paragraph attributed to an amending law.
///
/// # Examples
/// ```
/// use sfs_tracker_parser::extract_section_amendments;
///
/// let parsed = extract_section_amendments(
///     "1 § First. Lag (2020:100).\n\n2 § Second. Lag (2021:200).",
/// );
/// assert_eq!(parsed.amendments.len(), 2);
/// let numbers: Vec<String> = parsed.unique_sfs_numbers.iter().map(|n| n.to_string()).collect();
/// assert_eq!(numbers, ["SFS 2020:100", "SFS 2021:200"]);
/// ```
#[must_use]
pub fn extract_section_amendments(text: &str) -> ParsedAmendments {
    let amendments: Vec<SectionAmendment> = split_sections(text)
        .into_iter()
        .filter_map(|section| {
            let amending_sfs_number = section.citation?;
            Some(SectionAmendment {
                excerpt: excerpt(&section.text),
                chapter: section.chapter,
                section: section.section,
                amending_sfs_number,
            })
        })
        .collect();

    let unique_sfs_numbers = dedup_in_order(amendments.iter().map(|a| a.amending_sfs_number));

    ParsedAmendments {
        amendments,
        unique_sfs_numbers,
    }
}

/// Labels of the sections last amended by `amendment_sfs`.
///
/// `amendment_sfs` must be the canonical "SFS YYYY:NNNN" form; a bare
/// "YYYY:NNNN" never matches.
#[must_use]
pub fn find_changed_sections(text: &str, amendment_sfs: &str) -> Vec<String> {
    extract_section_amendments(text)
        .amendments
        .iter()
        .filter(|a| a.amending_sfs_number.to_string() == amendment_sfs)
        .map(SectionAmendment::label)
        .collect()
}

/// Every `Lag (YYYY:NNNN)` citation in the text, deduplicated, in order of
/// first appearance.
///
/// Plain "SFS YYYY:NNNN" mentions are not citations and are ignored.
#[must_use]
pub fn extract_all_sfs_references(text: &str) -> Vec<SfsNumber> {
    dedup_in_order(
        LAW_CITATION
            .captures_iter(text)
            .filter_map(|caps| caps[1].parse().ok()),
    )
}

/// Map each amending law to the labels of the sections it last amended.
///
/// Iteration order is chronological by SFS number; labels keep document order.
#[must_use]
pub fn group_amendments_by_sfs(text: &str) -> BTreeMap<SfsNumber, Vec<String>> {
    let mut grouped: BTreeMap<SfsNumber, Vec<String>> = BTreeMap::new();
    for amendment in extract_section_amendments(text).amendments {
        grouped
            .entry(amendment.amending_sfs_number)
            .or_default()
            .push(amendment.label());
    }
    grouped
}

/// Latest amendment named in a document subtitle ("undertitel").
///
/// # Examples
/// ```
/// use sfs_tracker_parser::parse_undertitel;
///
/// assert_eq!(
///     parse_undertitel("t.o.m. SFS 2025:732").map(|n| n.to_string()),
///     Some("SFS 2025:732".to_string())
/// );
/// assert_eq!(parse_undertitel("Förordning (1998:123)"), None);
/// ```
#[must_use]
pub fn parse_undertitel(undertitel: &str) -> Option<SfsNumber> {
    let caps = UNDERTITEL_TOM.captures(undertitel)?;
    caps[1].parse().ok()
}

fn dedup_in_order(numbers: impl Iterator<Item = SfsNumber>) -> Vec<SfsNumber> {
    let mut seen = HashSet::new();
    numbers.filter(|n| seen.insert(*n)).collect()
}

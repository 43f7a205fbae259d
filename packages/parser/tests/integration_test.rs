//! End-to-end tests over two consolidations of the Arbetsmiljölag (1977:1160).
//!
//! `v1.txt` and `v2.txt` are shortened consolidated texts; v2 adds the
//! amendment SFS 2025:732, which rewrites 1 kap. 2 §, inserts 2 kap. 3 a §
//! and drops 2 kap. 2 §.

use std::fs;
use std::path::Path;

use chrono::NaiveDate;
use pretty_assertions::assert_eq;

use sfs_tracker_parser::config::{DIFF_SUMMARY_MAX_CHARS, UNIFIED_DIFF_CONTEXT_LINES};
use sfs_tracker_parser::{
    compare_texts, compute_diff, extract_all_sfs_references, extract_section_amendments,
    find_changed_sections, group_amendments_by_sfs, has_substantive_change,
    parse_transitional_provisions, split_sections, truncate_diff, unified_diff,
    SectionChangeType, SfsNumber,
};

/// Load fixture file content.
fn load_fixture(name: &str) -> String {
    let path = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join("arbetsmiljolag")
        .join(name);
    fs::read_to_string(&path).unwrap_or_else(|e| panic!("Failed to load {}: {}", path.display(), e))
}

fn sfs(s: &str) -> SfsNumber {
    s.parse().expect("valid SFS number")
}

#[test]
fn test_sections_of_first_version() {
    let text = load_fixture("v1.txt");
    let sections = split_sections(&text);

    let overview: Vec<(String, Option<SfsNumber>)> = sections
        .iter()
        .map(|s| (s.label(), s.citation))
        .collect();
    assert_eq!(
        overview,
        vec![
            ("1 kap. 1 §".to_string(), Some(sfs("1994:579"))),
            ("1 kap. 2 §".to_string(), Some(sfs("2003:365"))),
            ("2 kap. 1 §".to_string(), Some(sfs("2002:585"))),
            ("2 kap. 2 §".to_string(), None),
            ("2 kap. 3 §".to_string(), Some(sfs("2002:585"))),
        ]
    );
}

#[test]
fn test_amendments_of_second_version() {
    let text = load_fixture("v2.txt");
    let parsed = extract_section_amendments(&text);

    assert_eq!(parsed.amendments.len(), 5);
    assert_eq!(
        parsed.unique_sfs_numbers,
        vec![sfs("1994:579"), sfs("2025:732"), sfs("2002:585")]
    );
    assert_eq!(
        find_changed_sections(&text, "SFS 2025:732"),
        vec!["1 kap. 2 §", "2 kap. 3 a §"]
    );

    let grouped = group_amendments_by_sfs(&text);
    assert_eq!(
        grouped.keys().copied().collect::<Vec<_>>(),
        vec![sfs("1994:579"), sfs("2002:585"), sfs("2025:732")]
    );
    assert_eq!(grouped[&sfs("2002:585")], vec!["2 kap. 1 §", "2 kap. 3 §"]);
}

#[test]
fn test_transitional_provisions_are_not_sections() {
    let text = load_fixture("v2.txt");
    let sections = split_sections(&text);
    assert!(sections.iter().all(|s| !s.text.contains("träder i kraft")));
}

#[test]
fn test_effective_dates() {
    let text = load_fixture("v2.txt");
    let dates = parse_transitional_provisions(&text);

    assert_eq!(dates.len(), 4);
    assert_eq!(
        dates.get(&sfs("2025:732")),
        NaiveDate::from_ymd_opt(2026, 1, 1).as_ref()
    );
    assert_eq!(
        dates.get(&sfs("1994:579")),
        NaiveDate::from_ymd_opt(1994, 7, 1).as_ref()
    );
}

#[test]
fn test_compare_versions() {
    let old = load_fixture("v1.txt");
    let new = load_fixture("v2.txt");
    let diff = compare_texts(&old, &new);

    let changed: Vec<(String, SectionChangeType)> = diff
        .changed_sections()
        .into_iter()
        .map(|s| (s.label(), s.change_type))
        .collect();
    assert_eq!(
        changed,
        vec![
            ("1 kap. 2 §".to_string(), SectionChangeType::Modified),
            ("2 kap. 2 §".to_string(), SectionChangeType::Removed),
            ("2 kap. 3 a §".to_string(), SectionChangeType::Added),
        ]
    );

    assert_eq!(diff.summary.sections_unchanged, 3);
    assert_eq!(diff.summary.total_lines_added, 2);
    assert_eq!(diff.summary.total_lines_removed, 1);
    assert_eq!(diff.amendments_between, vec![sfs("2025:732")]);

    let modified = &diff.changed_sections()[0];
    assert_eq!(modified.lines_added, 1);
    assert_eq!(modified.lines_removed, 0);
    assert_eq!(modified.amendments_between, vec![sfs("2025:732")]);
}

#[test]
fn test_new_citations_between_versions() {
    let old = extract_all_sfs_references(&load_fixture("v1.txt"));
    let new = extract_all_sfs_references(&load_fixture("v2.txt"));
    let introduced: Vec<SfsNumber> = new.into_iter().filter(|n| !old.contains(n)).collect();
    assert_eq!(introduced, vec![sfs("2025:732")]);
}

#[test]
fn test_whole_document_diff() {
    let old = load_fixture("v1.txt");
    let new = load_fixture("v2.txt");

    assert!(has_substantive_change(&old, &new));

    let stats = compute_diff(&old, &new);
    assert!(stats.added > 0);
    assert!(stats.removed > 0);
    assert!(stats.summary.starts_with(&format!("+{} lines", stats.added)));

    let patch = unified_diff(&old, &new, "SFS 1977:1160 v1", "SFS 1977:1160 v2", UNIFIED_DIFF_CONTEXT_LINES);
    assert!(patch.starts_with("--- SFS 1977:1160 v1\n+++ SFS 1977:1160 v2\n"));
    assert!(patch.contains("+Lagen gäller även inhyrd arbetskraft. Lag (2025:732)."));
    assert!(patch.contains("-2 § Arbete skall planläggas"));
    assert_eq!(truncate_diff(&patch, DIFF_SUMMARY_MAX_CHARS), patch);
}

#[test]
fn test_reformatting_is_not_a_change() {
    let old = load_fixture("v1.txt");
    let reflowed = old.replace('\n', "\n\n").replace(". ", ".  ");
    assert!(!has_substantive_change(&old, &reflowed));
}

//! Per-section comparison of two versions of a statute.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use serde::{Deserialize, Serialize};

use crate::diff::{count_lines, diff_lines, DiffLine, DiffLineKind};
use crate::normalize::{normalize_for_diff, texts_semantically_equal};
use crate::sections::{extract_all_sfs_references, split_sections};
use crate::types::{section_label, ParsedSection, SectionKey, SfsNumber};

/// How a section differs between version A (older) and version B (newer).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SectionChangeType {
    Added,
    Removed,
    Modified,
    Unchanged,
}

/// Diff of a single section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionDiff {
    pub chapter: Option<String>,
    pub section: String,
    pub change_type: SectionChangeType,
    /// Text in version A.
    pub text_a: Option<String>,
    /// Text in version B.
    pub text_b: Option<String>,
    /// Line diff, only for modified sections whose text is available.
    pub line_diff: Vec<DiffLine>,
    pub lines_added: usize,
    pub lines_removed: usize,
    /// Amending laws cited by the section in B but not in A.
    pub amendments_between: Vec<SfsNumber>,
    /// The section is known to have changed but the text to show it is missing.
    pub text_unavailable: bool,
}

impl SectionDiff {
    fn empty(chapter: Option<&str>, section: &str, change_type: SectionChangeType) -> Self {
        Self {
            chapter: chapter.map(str::to_string),
            section: section.to_string(),
            change_type,
            text_a: None,
            text_b: None,
            line_diff: Vec::new(),
            lines_added: 0,
            lines_removed: 0,
            amendments_between: Vec::new(),
            text_unavailable: false,
        }
    }

    #[must_use]
    pub fn label(&self) -> String {
        section_label(self.chapter.as_deref(), &self.section)
    }
}

/// Counts per change type plus line totals.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffSummary {
    pub sections_added: usize,
    pub sections_removed: usize,
    pub sections_modified: usize,
    pub sections_unchanged: usize,
    pub total_lines_added: usize,
    pub total_lines_removed: usize,
}

/// Section-level diff between two full texts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionDiff {
    pub summary: DiffSummary,
    pub sections: Vec<SectionDiff>,
    /// Laws cited in B but nowhere in A, in order of first appearance in B.
    pub amendments_between: Vec<SfsNumber>,
}

impl VersionDiff {
    /// Sections that are not unchanged.
    #[must_use]
    pub fn changed_sections(&self) -> Vec<&SectionDiff> {
        self.sections
            .iter()
            .filter(|s| s.change_type != SectionChangeType::Unchanged)
            .collect()
    }
}

fn line_count(text: &str) -> usize {
    normalize_for_diff(text).lines().count()
}

/// Diff one section between two versions.
///
/// `None` means the section does not exist in that version. A section that
/// is known to have been amended but whose texts cannot tell the change
/// apart is reported as modified with `text_unavailable`, never as unchanged.
#[must_use]
pub fn compute_section_diff(
    old_text: Option<&str>,
    new_text: Option<&str>,
    chapter: Option<&str>,
    section: &str,
    amendments_between: Vec<SfsNumber>,
) -> SectionDiff {
    match (old_text, new_text) {
        (None, Some(new)) => SectionDiff {
            text_b: Some(new.to_string()),
            lines_added: line_count(new),
            amendments_between,
            ..SectionDiff::empty(chapter, section, SectionChangeType::Added)
        },
        (Some(old), None) => SectionDiff {
            text_a: Some(old.to_string()),
            lines_removed: line_count(old),
            amendments_between,
            ..SectionDiff::empty(chapter, section, SectionChangeType::Removed)
        },
        (None, None) => SectionDiff {
            amendments_between,
            text_unavailable: true,
            ..SectionDiff::empty(chapter, section, SectionChangeType::Modified)
        },
        (Some(old), Some(new)) if texts_semantically_equal(old, new) => {
            if amendments_between.is_empty() {
                SectionDiff::empty(chapter, section, SectionChangeType::Unchanged)
            } else {
                SectionDiff {
                    text_a: Some(old.to_string()),
                    text_b: Some(new.to_string()),
                    amendments_between,
                    text_unavailable: true,
                    ..SectionDiff::empty(chapter, section, SectionChangeType::Modified)
                }
            }
        }
        (Some(old), Some(new)) => {
            let line_diff = diff_lines(&normalize_for_diff(old), &normalize_for_diff(new));
            SectionDiff {
                text_a: Some(old.to_string()),
                text_b: Some(new.to_string()),
                lines_added: count_lines(&line_diff, DiffLineKind::Add),
                lines_removed: count_lines(&line_diff, DiffLineKind::Remove),
                line_diff,
                amendments_between,
                ..SectionDiff::empty(chapter, section, SectionChangeType::Modified)
            }
        }
    }
}

/// Reduce section diffs to counts per change type.
#[must_use]
pub fn summarize_changes(sections: &[SectionDiff]) -> DiffSummary {
    sections
        .iter()
        .fold(DiffSummary::default(), |mut summary, section| {
            match section.change_type {
                SectionChangeType::Added => summary.sections_added += 1,
                SectionChangeType::Removed => summary.sections_removed += 1,
                SectionChangeType::Modified => summary.sections_modified += 1,
                SectionChangeType::Unchanged => summary.sections_unchanged += 1,
            }
            summary.total_lines_added += section.lines_added;
            summary.total_lines_removed += section.lines_removed;
            summary
        })
}

fn index_sections(text: &str) -> BTreeMap<SectionKey, ParsedSection> {
    let mut index = BTreeMap::new();
    for section in split_sections(text) {
        let key = section.key();
        if index.contains_key(&key) {
            tracing::debug!(section = %key.label(), "duplicate section marker, keeping first");
            continue;
        }
        index.insert(key, section);
    }
    index
}

/// Compare two full texts section by section.
///
/// Sections are matched on (chapter, section) and returned in document
/// order.
#[must_use]
pub fn compare_texts(old_full_text: &str, new_full_text: &str) -> VersionDiff {
    let sections_a = index_sections(old_full_text);
    let sections_b = index_sections(new_full_text);
    let keys: BTreeSet<&SectionKey> = sections_a.keys().chain(sections_b.keys()).collect();

    let sections: Vec<SectionDiff> = keys
        .into_iter()
        .map(|key| {
            let a = sections_a.get(key);
            let b = sections_b.get(key);
            let amendments_between = match (a.and_then(|s| s.citation), b.and_then(|s| s.citation)) {
                (old, Some(new)) if old != Some(new) => vec![new],
                _ => Vec::new(),
            };
            compute_section_diff(
                a.map(|s| s.text.as_str()),
                b.map(|s| s.text.as_str()),
                key.chapter.as_deref(),
                &key.section,
                amendments_between,
            )
        })
        .collect();

    let cited_in_a: HashSet<SfsNumber> = extract_all_sfs_references(old_full_text)
        .into_iter()
        .collect();
    let amendments_between = extract_all_sfs_references(new_full_text)
        .into_iter()
        .filter(|sfs| !cited_in_a.contains(sfs))
        .collect();

    VersionDiff {
        summary: summarize_changes(&sections),
        sections,
        amendments_between,
    }
}

//! SFS Tracker Parser - Read Swedish consolidated statute text.
//!
//! This crate turns the plain text of a consolidated SFS statute into
//! structure the change-tracking pipeline can store and compare: paragraphs
//! (§) with their chapter, the amending law cited at the end of each
//! paragraph, effective dates from the transitional provisions and
//! section-level diffs between two versions.
//!
//! # Example
//!
//! ```
//! use sfs_tracker_parser::{extract_section_amendments, find_changed_sections};
//!
//! let text = "1 kap. Allmänt\n\n1 § Syfte. Lag (2020:100).\n\n2 § Definitioner.";
//!
//! let parsed = extract_section_amendments(text);
//! assert_eq!(parsed.amendments.len(), 1);
//! assert_eq!(find_changed_sections(text, "SFS 2020:100"), vec!["1 kap. 1 §"]);
//! ```
//!
//! # Architecture
//!
//! - [`config`]: Constants (excerpt length, diff limits, month names)
//! - [`types`]: SFS numbers, section keys and parsed sections
//! - [`error`]: Error types and Result alias
//! - [`normalize`]: Whitespace and semantic normalization
//! - [`sections`]: Paragraph splitting and amendment citations
//! - [`transitional`]: Effective dates from Övergångsbestämmelser
//! - [`diff`]: Line diffs and unified diff rendering
//! - [`version_diff`]: Section-by-section comparison of two versions

pub mod config;
pub mod diff;
pub mod error;
pub mod normalize;
pub mod sections;
pub mod transitional;
pub mod types;
pub mod version_diff;

// Re-export the scanning entry points
pub use sections::{
    extract_all_sfs_references, extract_section_amendments, find_changed_sections,
    group_amendments_by_sfs, parse_undertitel, split_sections,
};
pub use transitional::{parse_entry_into_force, parse_transitional_provisions};

// Re-export commonly used items
pub use diff::{compute_diff, truncate_diff, unified_diff, DiffLine, DiffLineKind, DiffStats};
pub use error::{ParserError, Result};
pub use normalize::{has_substantive_change, normalize_whitespace, texts_semantically_equal};
pub use types::{ParsedAmendments, ParsedSection, SectionAmendment, SectionKey, SfsNumber};
pub use version_diff::{
    compare_texts, compute_section_diff, summarize_changes, DiffSummary, SectionChangeType,
    SectionDiff, VersionDiff,
};

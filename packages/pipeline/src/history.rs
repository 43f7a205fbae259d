//! Point-in-time views over the version archive.
//!
//! Everything here is read-only and derived from stored versions and
//! amendment records: how one paragraph evolved, which amending laws took
//! effect when, and which archived version was in force on a given day.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use sqlx::PgConnection;
use uuid::Uuid;

use sfs_tracker_parser::{
    compute_section_diff, parse_transitional_provisions, split_sections, ParsedSection,
    SectionChangeType, SectionKey, SfsNumber, VersionDiff,
};

use crate::error::{PipelineError, Result};
use crate::models::DocumentVersion;
use crate::version_diff::diff_versions;

/// One state of a paragraph, as first seen in an archived version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SectionHistoryEntry {
    pub version_id: Uuid,
    pub version_number: i32,
    /// `Added` the first time the paragraph appears, `Removed` when it
    /// disappears, `Modified` otherwise.
    pub change_type: SectionChangeType,
    /// The paragraph's own citation, or the version's amending law when the
    /// paragraph was removed or carries no citation.
    pub amendment_sfs: Option<SfsNumber>,
    /// From the transitional provisions of the same version.
    pub effective_date: Option<NaiveDate>,
    /// Paragraph text in this state; `None` once removed.
    pub text: Option<String>,
    /// The citation changed but the wording did not.
    pub text_unavailable: bool,
    pub archived_at: DateTime<Utc>,
    /// This is the paragraph as it reads in the latest version.
    pub is_current: bool,
}

fn find_section(version: &DocumentVersion, key: &SectionKey) -> Option<ParsedSection> {
    split_sections(&version.full_text)
        .into_iter()
        .find(|s| s.key() == *key)
}

/// History of one paragraph across all archived versions, newest first.
///
/// A version only produces an entry when the paragraph changed against the
/// previous version that had readable text. Versions with blank text are
/// skipped. An unknown paragraph gives an empty history.
#[tracing::instrument(skip(executor))]
pub async fn get_section_history<'e, E>(
    executor: E,
    document_id: Uuid,
    chapter: Option<&str>,
    section: &str,
) -> Result<Vec<SectionHistoryEntry>>
where
    E: sqlx::PgExecutor<'e>,
{
    let versions = sqlx::query_as::<_, DocumentVersion>(
        r#"
        SELECT * FROM document_versions
        WHERE document_id = $1
        ORDER BY version_number ASC
        "#,
    )
    .bind(document_id)
    .fetch_all(executor)
    .await?;

    let key = SectionKey::new(chapter, section);
    let mut history = Vec::new();
    let mut previous: Option<ParsedSection> = None;

    for version in &versions {
        if version.full_text.trim().is_empty() {
            tracing::debug!(version_number = version.version_number, "blank version skipped");
            continue;
        }

        let current = find_section(version, &key);
        if previous.is_none() && current.is_none() {
            continue;
        }

        let old_citation = previous.as_ref().and_then(|s| s.citation);
        let new_citation = current.as_ref().and_then(|s| s.citation);
        let amendments_between = match new_citation {
            Some(new) if old_citation != Some(new) => vec![new],
            _ => Vec::new(),
        };

        let diff = compute_section_diff(
            previous.as_ref().map(|s| s.text.as_str()),
            current.as_ref().map(|s| s.text.as_str()),
            key.chapter.as_deref(),
            &key.section,
            amendments_between,
        );

        if diff.change_type != SectionChangeType::Unchanged {
            let amendment_sfs = new_citation.or_else(|| {
                version
                    .amendment_sfs
                    .as_deref()
                    .and_then(|raw| raw.parse().ok())
            });
            let effective_date = amendment_sfs.and_then(|sfs| {
                parse_transitional_provisions(&version.full_text)
                    .get(&sfs)
                    .copied()
            });

            history.push(SectionHistoryEntry {
                version_id: version.id,
                version_number: version.version_number,
                change_type: diff.change_type,
                amendment_sfs,
                effective_date,
                text: current.as_ref().map(|s| s.text.clone()),
                text_unavailable: diff.text_unavailable,
                archived_at: version.created_at,
                is_current: false,
            });
        }
        previous = current;
    }

    if previous.is_some() {
        if let Some(last) = history.last_mut() {
            last.is_current = true;
        }
    }

    history.reverse();
    Ok(history)
}

/// An amending law in a document's timeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct AmendmentTimelineEntry {
    pub amending_sfs_number: String,
    pub amending_law_title: String,
    pub effective_date: Option<NaiveDate>,
    pub affected_sections: Vec<String>,
    /// Version in which the amendment was first detected.
    pub detected_in_version: Option<i32>,
}

impl AmendmentTimelineEntry {
    pub fn section_count(&self) -> usize {
        self.affected_sections.len()
    }

    fn sfs(&self) -> Option<SfsNumber> {
        self.amending_sfs_number.parse().ok()
    }
}

/// Amending laws of a document, latest effective date first.
///
/// Undated amendments come last, newest SFS number first.
pub async fn get_amendment_timeline<'e, E>(
    executor: E,
    document_id: Uuid,
) -> Result<Vec<AmendmentTimelineEntry>>
where
    E: sqlx::PgExecutor<'e>,
{
    let mut entries = sqlx::query_as::<_, AmendmentTimelineEntry>(
        r#"
        SELECT a.amending_sfs_number,
               a.amending_law_title,
               a.effective_date,
               a.affected_sections,
               v.version_number AS detected_in_version
        FROM amendments a
        LEFT JOIN document_versions v ON v.id = a.detected_from_version_id
        WHERE a.base_document_id = $1
        "#,
    )
    .bind(document_id)
    .fetch_all(executor)
    .await?;

    // Descending, dated entries before undated ones
    entries.sort_by(|a, b| {
        (b.effective_date.is_some(), b.effective_date, b.sfs())
            .cmp(&(a.effective_date.is_some(), a.effective_date, a.sfs()))
    });
    Ok(entries)
}

/// An archived version together with the day it took effect.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct VersionAtDate {
    #[sqlx(flatten)]
    pub version: DocumentVersion,
    /// `None` for a first version with no known date, which counts as in
    /// force from the start.
    pub effective_from: Option<NaiveDate>,
}

/// The archived version in force on `date`.
///
/// A version takes effect on its amending law's effective date, else on
/// the day its source was published, else on the day it was archived. The
/// first version without any of these is in force from the start. Returns
/// `None` when no version had taken effect by `date`.
#[tracing::instrument(skip(executor))]
pub async fn get_version_at_date<'e, E>(
    executor: E,
    document_id: Uuid,
    date: NaiveDate,
) -> Result<Option<VersionAtDate>>
where
    E: sqlx::PgExecutor<'e>,
{
    let version = sqlx::query_as::<_, VersionAtDate>(
        r#"
        SELECT * FROM (
            SELECT v.*,
                   COALESCE(
                       a.effective_date,
                       (v.source_timestamp AT TIME ZONE 'UTC')::date,
                       CASE WHEN v.version_number > 1
                           THEN (v.created_at AT TIME ZONE 'UTC')::date
                       END
                   ) AS effective_from
            FROM document_versions v
            LEFT JOIN amendments a
                ON a.base_document_id = v.document_id
               AND a.amending_sfs_number = v.amendment_sfs
            WHERE v.document_id = $1
        ) dated
        WHERE effective_from IS NULL OR effective_from <= $2
        ORDER BY version_number DESC
        LIMIT 1
        "#,
    )
    .bind(document_id)
    .bind(date)
    .fetch_optional(executor)
    .await?;

    Ok(version)
}

async fn version_number_at(
    conn: &mut PgConnection,
    document_id: Uuid,
    date: NaiveDate,
) -> Result<i32> {
    let version = get_version_at_date(conn, document_id, date)
        .await?
        .ok_or(PipelineError::NoVersionAtDate { document_id, date })?;
    Ok(version.version.version_number)
}

/// Section-level diff between the versions in force on two dates.
///
/// Fails with [`PipelineError::NoVersionAtDate`] when either date precedes
/// every archived version.
pub async fn diff_versions_at_dates(
    conn: &mut PgConnection,
    document_id: Uuid,
    from: NaiveDate,
    to: NaiveDate,
) -> Result<VersionDiff> {
    let from_version = version_number_at(&mut *conn, document_id, from).await?;
    let to_version = version_number_at(&mut *conn, document_id, to).await?;
    diff_versions(conn, document_id, from_version, to_version).await
}

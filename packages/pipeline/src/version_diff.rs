//! Section-level diffs between stored versions.

use uuid::Uuid;

use sfs_tracker_parser::{compare_texts, VersionDiff};

use crate::error::{PipelineError, Result};
use crate::models::DocumentVersion;

fn pick(
    versions: &[DocumentVersion],
    document_id: Uuid,
    version_number: i32,
) -> Result<&DocumentVersion> {
    let version = versions
        .iter()
        .find(|v| v.version_number == version_number)
        .ok_or(PipelineError::VersionNotFound {
            document_id,
            version_number,
        })?;

    if version.full_text.trim().is_empty() {
        return Err(PipelineError::VersionTextUnavailable {
            document_id,
            version_number,
        });
    }
    Ok(version)
}

/// Section-level diff between two archived versions of a document.
///
/// The older of the two versions is always side A. A version whose text is
/// blank cannot be compared and is reported as
/// [`PipelineError::VersionTextUnavailable`] rather than as unchanged.
#[tracing::instrument(skip(executor))]
pub async fn diff_versions<'e, E>(
    executor: E,
    document_id: Uuid,
    from_version: i32,
    to_version: i32,
) -> Result<VersionDiff>
where
    E: sqlx::PgExecutor<'e>,
{
    let (older, newer) = if from_version <= to_version {
        (from_version, to_version)
    } else {
        (to_version, from_version)
    };

    let versions = sqlx::query_as::<_, DocumentVersion>(
        r#"
        SELECT * FROM document_versions
        WHERE document_id = $1 AND version_number = ANY($2)
        "#,
    )
    .bind(document_id)
    .bind(vec![older, newer])
    .fetch_all(executor)
    .await?;

    let version_a = pick(&versions, document_id, older)?;
    let version_b = pick(&versions, document_id, newer)?;

    let diff = compare_texts(&version_a.full_text, &version_b.full_text);
    tracing::debug!(
        added = diff.summary.sections_added,
        removed = diff.summary.sections_removed,
        modified = diff.summary.sections_modified,
        "versions compared"
    );
    Ok(diff)
}

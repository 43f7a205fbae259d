//! Immutable, gapless version history per document.
//!
//! Version numbers are assigned under the document row lock, starting at 1.
//! Versions are never updated after insert.

use chrono::{DateTime, Utc};
use sqlx::PgConnection;
use uuid::Uuid;

use sfs_tracker_parser::SfsNumber;

use crate::documents::lock_document;
use crate::error::{PipelineError, Result};
use crate::models::DocumentVersion;

/// A snapshot to archive as the next version of a document.
#[derive(Debug, Clone)]
pub struct ArchiveVersionRequest {
    pub document_id: Uuid,
    pub full_text: String,
    pub html_content: Option<String>,
    /// The amending law that produced this text, if known.
    pub amendment_sfs: Option<SfsNumber>,
    /// When the source published this text.
    pub source_timestamp: Option<DateTime<Utc>>,
}

impl ArchiveVersionRequest {
    pub fn new(document_id: Uuid, full_text: impl Into<String>) -> Self {
        Self {
            document_id,
            full_text: full_text.into(),
            html_content: None,
            amendment_sfs: None,
            source_timestamp: None,
        }
    }

    pub fn with_html_content(mut self, html_content: impl Into<String>) -> Self {
        self.html_content = Some(html_content.into());
        self
    }

    pub fn with_amendment(mut self, amendment_sfs: SfsNumber) -> Self {
        self.amendment_sfs = Some(amendment_sfs);
        self
    }

    pub fn with_source_timestamp(mut self, source_timestamp: DateTime<Utc>) -> Self {
        self.source_timestamp = Some(source_timestamp);
        self
    }
}

async fn insert_version(
    conn: &mut PgConnection,
    req: &ArchiveVersionRequest,
    version_number: i32,
) -> Result<DocumentVersion> {
    let version = sqlx::query_as::<_, DocumentVersion>(
        r#"
        INSERT INTO document_versions
            (id, document_id, version_number, full_text, html_content, amendment_sfs, source_timestamp)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(req.document_id)
    .bind(version_number)
    .bind(&req.full_text)
    .bind(&req.html_content)
    .bind(req.amendment_sfs.map(|sfs| sfs.to_string()))
    .bind(req.source_timestamp)
    .fetch_one(&mut *conn)
    .await?;

    Ok(version)
}

/// Archive the first version of a document.
///
/// Returns `None` without writing anything when the document already has a
/// version, so ingesting the same document twice is harmless.
#[tracing::instrument(skip(conn, req), fields(document_id = %req.document_id))]
pub async fn create_initial_version(
    conn: &mut PgConnection,
    req: &ArchiveVersionRequest,
) -> Result<Option<DocumentVersion>> {
    lock_document(&mut *conn, req.document_id).await?;

    if count_versions(&mut *conn, req.document_id).await? > 0 {
        tracing::debug!("document already has versions, skipping initial version");
        return Ok(None);
    }

    let version = insert_version(conn, req, 1).await?;
    tracing::info!(version_id = %version.id, "initial version archived");
    Ok(Some(version))
}

/// Archive a snapshot as the next version of a document.
///
/// The document row is locked before the next number is computed, so two
/// archivers on the same document serialize and numbers stay gapless. A
/// duplicate version number, deadlock or lock timeout surfaces as
/// [`PipelineError::VersionConflict`].
#[tracing::instrument(skip(conn, req), fields(document_id = %req.document_id))]
pub async fn archive_document_version(
    conn: &mut PgConnection,
    req: &ArchiveVersionRequest,
) -> Result<DocumentVersion> {
    lock_document(&mut *conn, req.document_id).await?;

    let next_version: i32 = sqlx::query_scalar(
        r#"
        SELECT COALESCE(MAX(version_number), 0) + 1
        FROM document_versions
        WHERE document_id = $1
        "#,
    )
    .bind(req.document_id)
    .fetch_one(&mut *conn)
    .await?;

    let version = insert_version(conn, req, next_version).await?;
    tracing::info!(
        version_id = %version.id,
        version_number = version.version_number,
        amendment = ?req.amendment_sfs.map(|sfs| sfs.to_string()),
        "version archived"
    );
    Ok(version)
}

/// All versions of a document, newest first.
pub async fn get_version_history<'e, E>(
    executor: E,
    document_id: Uuid,
) -> Result<Vec<DocumentVersion>>
where
    E: sqlx::PgExecutor<'e>,
{
    let versions = sqlx::query_as::<_, DocumentVersion>(
        r#"
        SELECT * FROM document_versions
        WHERE document_id = $1
        ORDER BY version_number DESC
        "#,
    )
    .bind(document_id)
    .fetch_all(executor)
    .await?;

    Ok(versions)
}

/// Get one version of a document by number.
pub async fn get_version<'e, E>(
    executor: E,
    document_id: Uuid,
    version_number: i32,
) -> Result<DocumentVersion>
where
    E: sqlx::PgExecutor<'e>,
{
    let version = sqlx::query_as::<_, DocumentVersion>(
        r#"SELECT * FROM document_versions WHERE document_id = $1 AND version_number = $2"#,
    )
    .bind(document_id)
    .bind(version_number)
    .fetch_optional(executor)
    .await?
    .ok_or(PipelineError::VersionNotFound {
        document_id,
        version_number,
    })?;

    Ok(version)
}

/// The newest version of a document, if it has any.
pub async fn latest_version<'e, E>(executor: E, document_id: Uuid) -> Result<Option<DocumentVersion>>
where
    E: sqlx::PgExecutor<'e>,
{
    let version = sqlx::query_as::<_, DocumentVersion>(
        r#"
        SELECT * FROM document_versions
        WHERE document_id = $1
        ORDER BY version_number DESC
        LIMIT 1
        "#,
    )
    .bind(document_id)
    .fetch_optional(executor)
    .await?;

    Ok(version)
}

/// Number of archived versions of a document.
pub async fn count_versions<'e, E>(executor: E, document_id: Uuid) -> Result<i64>
where
    E: sqlx::PgExecutor<'e>,
{
    let count: i64 =
        sqlx::query_scalar(r#"SELECT COUNT(*) FROM document_versions WHERE document_id = $1"#)
            .bind(document_id)
            .fetch_one(executor)
            .await?;

    Ok(count)
}

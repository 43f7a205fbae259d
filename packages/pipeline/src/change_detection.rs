//! Change events recorded against a document.
//!
//! Events are append-only. Each insert also refreshes the document's
//! last-change fields.

use chrono::{DateTime, Utc};
use sqlx::PgConnection;
use uuid::Uuid;

use sfs_tracker_parser::config::{DIFF_SUMMARY_MAX_CHARS, UNIFIED_DIFF_CONTEXT_LINES};
use sfs_tracker_parser::{compute_diff, find_changed_sections, truncate_diff, unified_diff, SfsNumber};

pub use sfs_tracker_parser::has_substantive_change;

use crate::documents;
use crate::error::Result;
use crate::models::{ChangeEvent, ChangeType, DocumentStatus};

/// Input for [`detect_changes`].
#[derive(Debug, Clone, Copy)]
pub struct DetectChangesParams<'a> {
    pub document_id: Uuid,
    pub old_full_text: &'a str,
    pub new_full_text: &'a str,
    /// The amending law behind the new text, if known.
    pub amendment_sfs: Option<SfsNumber>,
    pub previous_version_id: Option<Uuid>,
    pub new_version_id: Option<Uuid>,
}

struct NewChangeEvent {
    document_id: Uuid,
    change_type: ChangeType,
    amendment_sfs: Option<SfsNumber>,
    previous_version_id: Option<Uuid>,
    new_version_id: Option<Uuid>,
    changed_sections: Vec<String>,
    diff_summary: Option<String>,
}

impl NewChangeEvent {
    fn new(document_id: Uuid, change_type: ChangeType) -> Self {
        Self {
            document_id,
            change_type,
            amendment_sfs: None,
            previous_version_id: None,
            new_version_id: None,
            changed_sections: Vec::new(),
            diff_summary: None,
        }
    }
}

async fn insert_event(conn: &mut PgConnection, event: NewChangeEvent) -> Result<ChangeEvent> {
    let amendment_ref = event.amendment_sfs.map(|sfs| sfs.to_string());

    let inserted = sqlx::query_as::<_, ChangeEvent>(
        r#"
        INSERT INTO change_events
            (id, document_id, change_type, amendment_sfs, previous_version_id,
             new_version_id, changed_sections, diff_summary, detected_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, clock_timestamp())
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(event.document_id)
    .bind(event.change_type)
    .bind(&amendment_ref)
    .bind(event.previous_version_id)
    .bind(event.new_version_id)
    .bind(&event.changed_sections)
    .bind(&event.diff_summary)
    .fetch_one(&mut *conn)
    .await?;

    // Without an amending law the document's own number is the reference.
    sqlx::query(
        r#"
        UPDATE legal_documents
        SET last_change_type = $2,
            last_change_ref = COALESCE($3, document_number),
            last_change_at = $4,
            updated_at = now()
        WHERE id = $1
        "#,
    )
    .bind(inserted.document_id)
    .bind(inserted.change_type)
    .bind(&amendment_ref)
    .bind(inserted.detected_at)
    .execute(&mut *conn)
    .await?;

    Ok(inserted)
}

/// Record an amendment event when the text changed in substance.
///
/// Returns `None` and writes nothing when the texts differ only in
/// whitespace. Otherwise the event carries the sections attributed to the
/// amending law (when known) and a unified diff cut to
/// [`DIFF_SUMMARY_MAX_CHARS`].
#[tracing::instrument(
    skip(conn, params),
    fields(document_id = %params.document_id, amendment = ?params.amendment_sfs.map(|sfs| sfs.to_string()))
)]
pub async fn detect_changes(
    conn: &mut PgConnection,
    params: DetectChangesParams<'_>,
) -> Result<Option<ChangeEvent>> {
    if !has_substantive_change(params.old_full_text, params.new_full_text) {
        tracing::debug!("whitespace-only change, no event recorded");
        return Ok(None);
    }

    let changed_sections = params
        .amendment_sfs
        .map(|sfs| find_changed_sections(params.new_full_text, &sfs.to_string()))
        .unwrap_or_default();

    let patch = unified_diff(
        params.old_full_text,
        params.new_full_text,
        "previous",
        "current",
        UNIFIED_DIFF_CONTEXT_LINES,
    );
    let diff_summary = (!patch.is_empty()).then(|| truncate_diff(&patch, DIFF_SUMMARY_MAX_CHARS));

    let event = insert_event(
        conn,
        NewChangeEvent {
            amendment_sfs: params.amendment_sfs,
            previous_version_id: params.previous_version_id,
            new_version_id: params.new_version_id,
            changed_sections,
            diff_summary,
            ..NewChangeEvent::new(params.document_id, ChangeType::Amendment)
        },
    )
    .await?;

    let stats = compute_diff(params.old_full_text, params.new_full_text);
    tracing::info!(
        event_id = %event.id,
        changed_sections = event.changed_sections.len(),
        summary = %stats.summary,
        "amendment detected"
    );
    Ok(Some(event))
}

/// Record that a document was ingested for the first time.
#[tracing::instrument(skip(conn))]
pub async fn create_new_law_event(
    conn: &mut PgConnection,
    document_id: Uuid,
    version_id: Option<Uuid>,
) -> Result<ChangeEvent> {
    let event = insert_event(
        conn,
        NewChangeEvent {
            new_version_id: version_id,
            ..NewChangeEvent::new(document_id, ChangeType::NewLaw)
        },
    )
    .await?;

    tracing::info!(event_id = %event.id, "new law recorded");
    Ok(event)
}

/// Record a repeal and mark the document as repealed.
#[tracing::instrument(skip(conn, repealed_by), fields(repealed_by = ?repealed_by.map(|sfs| sfs.to_string())))]
pub async fn create_repeal_event(
    conn: &mut PgConnection,
    document_id: Uuid,
    repealed_by: Option<SfsNumber>,
) -> Result<ChangeEvent> {
    documents::lock_document(&mut *conn, document_id).await?;
    documents::set_status(&mut *conn, document_id, DocumentStatus::Repealed).await?;

    let event = insert_event(
        conn,
        NewChangeEvent {
            amendment_sfs: repealed_by,
            ..NewChangeEvent::new(document_id, ChangeType::Repeal)
        },
    )
    .await?;

    tracing::info!(event_id = %event.id, "repeal recorded");
    Ok(event)
}

/// Change events of a document, newest first.
pub async fn get_document_changes<'e, E>(
    executor: E,
    document_id: Uuid,
    limit: i64,
) -> Result<Vec<ChangeEvent>>
where
    E: sqlx::PgExecutor<'e>,
{
    let events = sqlx::query_as::<_, ChangeEvent>(
        r#"
        SELECT * FROM change_events
        WHERE document_id = $1
        ORDER BY detected_at DESC
        LIMIT $2
        "#,
    )
    .bind(document_id)
    .bind(limit)
    .fetch_all(executor)
    .await?;

    Ok(events)
}

/// Change events across all documents detected in `[from, to)`, newest first.
pub async fn get_changes_by_date_range<'e, E>(
    executor: E,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
) -> Result<Vec<ChangeEvent>>
where
    E: sqlx::PgExecutor<'e>,
{
    let events = sqlx::query_as::<_, ChangeEvent>(
        r#"
        SELECT * FROM change_events
        WHERE detected_at >= $1 AND detected_at < $2
        ORDER BY detected_at DESC
        "#,
    )
    .bind(from)
    .bind(to)
    .fetch_all(executor)
    .await?;

    Ok(events)
}

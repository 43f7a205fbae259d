//! Amendment records: one per (base document, amending law) pair.
//!
//! Records are derived from the consolidated text alone. Affected sections
//! come from paragraph citations and the effective date from the
//! transitional provisions; neither is guessed when the text is silent.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use sqlx::PgConnection;
use uuid::Uuid;

use sfs_tracker_parser::{
    extract_all_sfs_references, find_changed_sections, group_amendments_by_sfs,
    parse_transitional_provisions, SfsNumber,
};

use crate::error::{PipelineError, Result};
use crate::models::AmendmentRecord;

/// Input for [`create_amendment_from_change`].
#[derive(Debug, Clone, Copy)]
pub struct CreateAmendmentParams<'a> {
    pub base_document_id: Uuid,
    /// Amending law in any accepted form ("SFS 2025:732", "2025:732").
    pub amending_sfs_number: &'a str,
    /// Full text of the base document that carries the amendment.
    pub full_text: &'a str,
    pub detected_from_version_id: Option<Uuid>,
}

async fn amendment_exists(
    conn: &mut PgConnection,
    base_document_id: Uuid,
    sfs: SfsNumber,
) -> Result<bool> {
    let exists: bool = sqlx::query_scalar(
        r#"
        SELECT EXISTS (
            SELECT 1 FROM amendments
            WHERE base_document_id = $1 AND amending_sfs_number = $2
        )
        "#,
    )
    .bind(base_document_id)
    .bind(sfs.to_string())
    .fetch_one(&mut *conn)
    .await?;

    Ok(exists)
}

async fn insert_amendment(
    conn: &mut PgConnection,
    base_document_id: Uuid,
    sfs: SfsNumber,
    affected_sections: &[String],
    effective_date: Option<NaiveDate>,
    detected_from_version_id: Option<Uuid>,
) -> Result<Option<AmendmentRecord>> {
    // A concurrent writer may have inserted the same pair since the existence check.
    let record = sqlx::query_as::<_, AmendmentRecord>(
        r#"
        INSERT INTO amendments
            (id, base_document_id, amending_sfs_number, amending_law_title,
             affected_sections, effective_date, detected_from_version_id)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        ON CONFLICT (base_document_id, amending_sfs_number) DO NOTHING
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(base_document_id)
    .bind(sfs.to_string())
    .bind(sfs.law_title())
    .bind(affected_sections)
    .bind(effective_date)
    .bind(detected_from_version_id)
    .fetch_optional(&mut *conn)
    .await?;

    match &record {
        Some(r) => tracing::info!(
            amendment_id = %r.id,
            sfs = %sfs,
            sections = r.affected_sections.len(),
            effective_date = ?r.effective_date,
            "amendment recorded"
        ),
        None => tracing::debug!(sfs = %sfs, "amendment inserted concurrently, skipping"),
    }
    Ok(record)
}

/// Build the amendment record for one amending law.
///
/// Returns `None` when the document already has a record for this law.
/// Affected sections are the paragraphs whose trailing citation names the
/// law; the effective date comes from the transitional provisions and is
/// left empty when they state none.
#[tracing::instrument(skip(conn, params), fields(document_id = %params.base_document_id, sfs = %params.amending_sfs_number))]
pub async fn create_amendment_from_change(
    conn: &mut PgConnection,
    params: CreateAmendmentParams<'_>,
) -> Result<Option<AmendmentRecord>> {
    let sfs: SfsNumber = params
        .amending_sfs_number
        .parse()
        .map_err(|e: sfs_tracker_parser::ParserError| PipelineError::InvalidInput(e.to_string()))?;

    if amendment_exists(&mut *conn, params.base_document_id, sfs).await? {
        tracing::debug!("amendment already recorded");
        return Ok(None);
    }

    let affected_sections = find_changed_sections(params.full_text, &sfs.to_string());
    let effective_date = parse_transitional_provisions(params.full_text)
        .get(&sfs)
        .copied();

    insert_amendment(
        conn,
        params.base_document_id,
        sfs,
        &affected_sections,
        effective_date,
        params.detected_from_version_id,
    )
    .await
}

/// Record every amending law cited in a document's text.
///
/// Used to backfill a document's history when it is first ingested. Laws
/// that already have a record are skipped; only new records are returned,
/// in order of first citation.
#[tracing::instrument(skip(conn, full_text))]
pub async fn extract_all_amendments(
    conn: &mut PgConnection,
    base_document_id: Uuid,
    full_text: &str,
    detected_from_version_id: Option<Uuid>,
) -> Result<Vec<AmendmentRecord>> {
    let sections_by_sfs: BTreeMap<SfsNumber, Vec<String>> = group_amendments_by_sfs(full_text);
    let effective_dates = parse_transitional_provisions(full_text);

    let mut created = Vec::new();
    for sfs in extract_all_sfs_references(full_text) {
        if amendment_exists(&mut *conn, base_document_id, sfs).await? {
            continue;
        }
        let affected_sections = sections_by_sfs.get(&sfs).map(Vec::as_slice).unwrap_or(&[]);
        let record = insert_amendment(
            &mut *conn,
            base_document_id,
            sfs,
            affected_sections,
            effective_dates.get(&sfs).copied(),
            detected_from_version_id,
        )
        .await?;
        created.extend(record);
    }

    tracing::info!(created = created.len(), "amendment backfill finished");
    Ok(created)
}

/// Number of amendment records for a document.
pub async fn count_amendments<'e, E>(executor: E, base_document_id: Uuid) -> Result<i64>
where
    E: sqlx::PgExecutor<'e>,
{
    let count: i64 =
        sqlx::query_scalar(r#"SELECT COUNT(*) FROM amendments WHERE base_document_id = $1"#)
            .bind(base_document_id)
            .fetch_one(executor)
            .await?;

    Ok(count)
}

/// Amendment records of a document, latest effective date first, undated last.
pub async fn get_amendments<'e, E>(
    executor: E,
    base_document_id: Uuid,
) -> Result<Vec<AmendmentRecord>>
where
    E: sqlx::PgExecutor<'e>,
{
    let records = sqlx::query_as::<_, AmendmentRecord>(
        r#"
        SELECT * FROM amendments
        WHERE base_document_id = $1
        ORDER BY effective_date DESC NULLS LAST, created_at DESC
        "#,
    )
    .bind(base_document_id)
    .fetch_all(executor)
    .await?;

    Ok(records)
}

/// Point an amendment record at the version it was detected in.
pub async fn link_amendment_to_version<'e, E>(
    executor: E,
    amendment_id: Uuid,
    version_id: Uuid,
) -> Result<AmendmentRecord>
where
    E: sqlx::PgExecutor<'e>,
{
    let record = sqlx::query_as::<_, AmendmentRecord>(
        r#"
        UPDATE amendments SET detected_from_version_id = $2
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(amendment_id)
    .bind(version_id)
    .fetch_optional(executor)
    .await?
    .ok_or(PipelineError::AmendmentNotFound(amendment_id))?;

    Ok(record)
}

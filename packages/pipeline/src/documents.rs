//! Tracked legal documents.

use uuid::Uuid;

use sfs_tracker_parser::SfsNumber;

use crate::error::{PipelineError, Result};
use crate::models::{DocumentStatus, LegalDocument};

/// Register a document, or update its title and slug if the number is known.
///
/// The document number is stored in canonical "SFS YYYY:NNNN" form.
#[tracing::instrument(skip(executor, title, slug))]
pub async fn upsert_document<'e, E>(
    executor: E,
    document_number: &str,
    title: &str,
    slug: &str,
) -> Result<LegalDocument>
where
    E: sqlx::PgExecutor<'e>,
{
    let number: SfsNumber = document_number.parse()?;

    let document = sqlx::query_as::<_, LegalDocument>(
        r#"
        INSERT INTO legal_documents (id, document_number, title, slug)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (document_number) DO UPDATE
            SET title = EXCLUDED.title, slug = EXCLUDED.slug, updated_at = now()
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(number.to_string())
    .bind(title)
    .bind(slug)
    .fetch_one(executor)
    .await?;

    tracing::info!(document_id = %document.id, "document registered");
    Ok(document)
}

/// Get a document by ID.
pub async fn get_document<'e, E>(executor: E, document_id: Uuid) -> Result<LegalDocument>
where
    E: sqlx::PgExecutor<'e>,
{
    let document =
        sqlx::query_as::<_, LegalDocument>(r#"SELECT * FROM legal_documents WHERE id = $1"#)
            .bind(document_id)
            .fetch_optional(executor)
            .await?
            .ok_or_else(|| PipelineError::DocumentNotFound(document_id.to_string()))?;

    Ok(document)
}

/// Get a document by its SFS number, in any accepted form.
pub async fn get_document_by_number<'e, E>(
    executor: E,
    document_number: &str,
) -> Result<LegalDocument>
where
    E: sqlx::PgExecutor<'e>,
{
    let number: SfsNumber = document_number.parse()?;

    let document = sqlx::query_as::<_, LegalDocument>(
        r#"SELECT * FROM legal_documents WHERE document_number = $1"#,
    )
    .bind(number.to_string())
    .fetch_optional(executor)
    .await?
    .ok_or_else(|| PipelineError::DocumentNotFound(number.to_string()))?;

    Ok(document)
}

/// Lock the document row for the rest of the transaction.
///
/// Every write to a document's versions, events and amendments happens
/// under this lock, so same-document syncs run one after the other.
#[tracing::instrument(skip(executor))]
pub async fn lock_document<'e, E>(executor: E, document_id: Uuid) -> Result<LegalDocument>
where
    E: sqlx::PgExecutor<'e>,
{
    let document = sqlx::query_as::<_, LegalDocument>(
        r#"SELECT * FROM legal_documents WHERE id = $1 FOR UPDATE"#,
    )
    .bind(document_id)
    .fetch_optional(executor)
    .await?
    .ok_or_else(|| PipelineError::DocumentNotFound(document_id.to_string()))?;

    Ok(document)
}

/// Replace the document's current text.
pub async fn update_document_text<'e, E>(
    executor: E,
    document_id: Uuid,
    full_text: &str,
    html_content: Option<&str>,
) -> Result<LegalDocument>
where
    E: sqlx::PgExecutor<'e>,
{
    let document = sqlx::query_as::<_, LegalDocument>(
        r#"
        UPDATE legal_documents
        SET full_text = $2, html_content = COALESCE($3, html_content), updated_at = now()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(document_id)
    .bind(full_text)
    .bind(html_content)
    .fetch_optional(executor)
    .await?
    .ok_or_else(|| PipelineError::DocumentNotFound(document_id.to_string()))?;

    Ok(document)
}

/// Update the status of a document.
pub async fn set_status<'e, E>(
    executor: E,
    document_id: Uuid,
    status: DocumentStatus,
) -> Result<LegalDocument>
where
    E: sqlx::PgExecutor<'e>,
{
    let document = sqlx::query_as::<_, LegalDocument>(
        r#"
        UPDATE legal_documents SET status = $2, updated_at = now()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(document_id)
    .bind(status)
    .fetch_optional(executor)
    .await?
    .ok_or_else(|| PipelineError::DocumentNotFound(document_id.to_string()))?;

    tracing::info!(document_id = %document.id, status = %status, "document status updated");
    Ok(document)
}

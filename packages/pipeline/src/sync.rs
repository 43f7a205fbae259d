//! Per-document sync: archive, detect and record amendments in one transaction.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use sfs_tracker_parser::{parse_undertitel, ParserError, SfsNumber};

use crate::amendments::{self, CreateAmendmentParams};
use crate::change_detection::{self, has_substantive_change, DetectChangesParams};
use crate::config::SyncConfig;
use crate::db;
use crate::documents;
use crate::error::{PipelineError, Result};
use crate::models::{AmendmentRecord, ChangeEvent, DocumentVersion};
use crate::version_archive::{self, ArchiveVersionRequest};

/// A fetched snapshot of a document.
#[derive(Debug, Clone)]
pub struct SyncInput {
    pub document_id: Uuid,
    pub full_text: String,
    pub html_content: Option<String>,
    pub source_timestamp: Option<DateTime<Utc>>,
    /// The amending law behind this text, if the source names it.
    pub amendment_sfs: Option<String>,
    /// Document subtitle, e.g. "t.o.m. SFS 2025:732". Used when
    /// `amendment_sfs` is not given.
    pub undertitel: Option<String>,
}

impl SyncInput {
    pub fn new(document_id: Uuid, full_text: impl Into<String>) -> Self {
        Self {
            document_id,
            full_text: full_text.into(),
            html_content: None,
            source_timestamp: None,
            amendment_sfs: None,
            undertitel: None,
        }
    }

    pub fn with_html_content(mut self, html_content: impl Into<String>) -> Self {
        self.html_content = Some(html_content.into());
        self
    }

    pub fn with_source_timestamp(mut self, source_timestamp: DateTime<Utc>) -> Self {
        self.source_timestamp = Some(source_timestamp);
        self
    }

    pub fn with_amendment(mut self, amendment_sfs: impl Into<String>) -> Self {
        self.amendment_sfs = Some(amendment_sfs.into());
        self
    }

    pub fn with_undertitel(mut self, undertitel: impl Into<String>) -> Self {
        self.undertitel = Some(undertitel.into());
        self
    }

    /// The amending law: the explicit number first, then the subtitle.
    pub fn resolve_amendment(&self) -> Result<Option<SfsNumber>> {
        if let Some(raw) = self.amendment_sfs.as_deref() {
            let sfs = raw
                .parse()
                .map_err(|e: ParserError| PipelineError::InvalidInput(e.to_string()))?;
            return Ok(Some(sfs));
        }
        Ok(self.undertitel.as_deref().and_then(parse_undertitel))
    }
}

/// What a sync did.
#[derive(Debug, Clone)]
pub enum SyncOutcome {
    /// First ingest: version 1, a NEW_LAW event and the backfilled amendments.
    Created {
        version: DocumentVersion,
        event: ChangeEvent,
        amendments: Vec<AmendmentRecord>,
    },
    /// A new version was archived.
    Updated {
        version: DocumentVersion,
        event: Option<ChangeEvent>,
        amendment: Option<AmendmentRecord>,
    },
    /// Whitespace-only difference; nothing was written.
    Unchanged,
}

/// Sync one snapshot of a document.
///
/// Everything happens in one transaction that holds the document row lock,
/// so concurrent syncs of the same document run one after the other and
/// any failure leaves no partial state. Lock waits and statements are bounded
/// by `config`; hitting a bound surfaces as a retryable error.
#[tracing::instrument(skip(pool, config, input), fields(document_id = %input.document_id))]
pub async fn sync_document(
    pool: &PgPool,
    config: &SyncConfig,
    input: SyncInput,
) -> Result<SyncOutcome> {
    let amendment = input.resolve_amendment()?;

    let mut tx = pool.begin().await?;
    db::set_transaction_timeouts(&mut tx, config).await?;

    let document = documents::lock_document(&mut *tx, input.document_id).await?;

    let mut request = ArchiveVersionRequest::new(document.id, input.full_text.as_str());
    request.html_content = input.html_content.clone();
    request.amendment_sfs = amendment;
    request.source_timestamp = input.source_timestamp;

    let latest = version_archive::latest_version(&mut *tx, document.id).await?;
    let outcome = match latest {
        None => {
            let Some(version) = version_archive::create_initial_version(&mut tx, &request).await?
            else {
                return Ok(SyncOutcome::Unchanged);
            };
            let event =
                change_detection::create_new_law_event(&mut tx, document.id, Some(version.id))
                    .await?;
            let mut amendments = amendments::extract_all_amendments(
                &mut tx,
                document.id,
                &input.full_text,
                Some(version.id),
            )
            .await?;
            // The named amendment may not be cited anywhere in the text.
            if let Some(sfs) = amendment {
                let record = amendments::create_amendment_from_change(
                    &mut tx,
                    CreateAmendmentParams {
                        base_document_id: document.id,
                        amending_sfs_number: &sfs.to_string(),
                        full_text: &input.full_text,
                        detected_from_version_id: Some(version.id),
                    },
                )
                .await?;
                amendments.extend(record);
            }

            SyncOutcome::Created {
                version,
                event,
                amendments,
            }
        }
        Some(previous) => {
            if !has_substantive_change(&previous.full_text, &input.full_text) {
                tx.rollback().await?;
                tracing::debug!(
                    document_number = %document.document_number,
                    "no substantive change"
                );
                return Ok(SyncOutcome::Unchanged);
            }

            let version = version_archive::archive_document_version(&mut tx, &request).await?;
            let event = change_detection::detect_changes(
                &mut tx,
                DetectChangesParams {
                    document_id: document.id,
                    old_full_text: &previous.full_text,
                    new_full_text: &input.full_text,
                    amendment_sfs: amendment,
                    previous_version_id: Some(previous.id),
                    new_version_id: Some(version.id),
                },
            )
            .await?;

            let amendment = match amendment {
                Some(sfs) => {
                    amendments::create_amendment_from_change(
                        &mut tx,
                        CreateAmendmentParams {
                            base_document_id: document.id,
                            amending_sfs_number: &sfs.to_string(),
                            full_text: &input.full_text,
                            detected_from_version_id: Some(version.id),
                        },
                    )
                    .await?
                }
                None => None,
            };

            SyncOutcome::Updated {
                version,
                event,
                amendment,
            }
        }
    };

    documents::update_document_text(
        &mut *tx,
        document.id,
        &input.full_text,
        input.html_content.as_deref(),
    )
    .await?;
    tx.commit().await?;

    tracing::info!(document_number = %document.document_number, "document synced");
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_amendment_prefers_explicit_number() {
        let input = SyncInput::new(Uuid::nil(), "text")
            .with_amendment("2025:732")
            .with_undertitel("t.o.m. SFS 2024:1");
        assert_eq!(
            input.resolve_amendment().unwrap(),
            Some(SfsNumber::new(2025, 732))
        );
    }

    #[test]
    fn test_resolve_amendment_from_undertitel() {
        let input = SyncInput::new(Uuid::nil(), "text").with_undertitel("t.o.m. SFS 2024:1");
        assert_eq!(
            input.resolve_amendment().unwrap(),
            Some(SfsNumber::new(2024, 1))
        );
    }

    #[test]
    fn test_resolve_amendment_none() {
        let input = SyncInput::new(Uuid::nil(), "text").with_undertitel("Lag (1977:1160)");
        assert_eq!(input.resolve_amendment().unwrap(), None);
    }

    #[test]
    fn test_resolve_amendment_rejects_garbage() {
        let input = SyncInput::new(Uuid::nil(), "text").with_amendment("2025-732");
        assert!(matches!(
            input.resolve_amendment(),
            Err(PipelineError::InvalidInput(_))
        ));
    }
}

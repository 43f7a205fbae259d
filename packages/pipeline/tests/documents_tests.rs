mod common;

use pretty_assertions::assert_eq;

use sfs_tracker_pipeline::documents;
use sfs_tracker_pipeline::error::PipelineError;
use sfs_tracker_pipeline::models::DocumentStatus;

#[tokio::test]
async fn test_upsert_document_normalizes_number() {
    let db = common::TestDb::new().await;

    let document = documents::upsert_document(&db.pool, "1977:1160", "Arbetsmiljölag", "aml")
        .await
        .unwrap();

    assert_eq!(document.document_number, "SFS 1977:1160");
    assert_eq!(document.title, "Arbetsmiljölag");
    assert_eq!(document.status, DocumentStatus::Active);
    assert_eq!(document.full_text, "");
    assert!(document.last_change_type.is_none());
}

#[tokio::test]
async fn test_upsert_document_updates_existing() {
    let db = common::TestDb::new().await;

    let first = db.register_law().await;
    let second = documents::upsert_document(
        &db.pool,
        "SFS 1977:1160",
        "Arbetsmiljölag (1977:1160), ändrad",
        "arbetsmiljolag",
    )
    .await
    .unwrap();

    assert_eq!(second.id, first.id);
    assert_eq!(second.title, "Arbetsmiljölag (1977:1160), ändrad");
}

#[tokio::test]
async fn test_upsert_document_rejects_invalid_number() {
    let db = common::TestDb::new().await;

    let result = documents::upsert_document(&db.pool, "1977-1160", "x", "x").await;
    assert!(matches!(result, Err(PipelineError::Parser(_))));
}

#[tokio::test]
async fn test_get_document_by_number_accepts_any_form() {
    let db = common::TestDb::new().await;
    let document = db.register_law().await;

    let by_bare = documents::get_document_by_number(&db.pool, "1977:1160")
        .await
        .unwrap();
    let by_prefixed = documents::get_document_by_number(&db.pool, "SFS1977:1160")
        .await
        .unwrap();

    assert_eq!(by_bare.id, document.id);
    assert_eq!(by_prefixed.id, document.id);
}

#[tokio::test]
async fn test_get_document_not_found() {
    let db = common::TestDb::new().await;

    let result = documents::get_document_by_number(&db.pool, "SFS 2099:1").await;
    assert!(matches!(result, Err(PipelineError::DocumentNotFound(_))));

    let result = documents::get_document(&db.pool, uuid::Uuid::new_v4()).await;
    assert!(matches!(result, Err(PipelineError::DocumentNotFound(_))));
}

#[tokio::test]
async fn test_update_text_and_status() {
    let db = common::TestDb::new().await;
    let document = db.register_law().await;

    let updated =
        documents::update_document_text(&db.pool, document.id, common::LAW_V1, Some("<p>v1</p>"))
            .await
            .unwrap();
    assert_eq!(updated.full_text, common::LAW_V1);
    assert_eq!(updated.html_content.as_deref(), Some("<p>v1</p>"));

    // Missing HTML keeps the stored rendering
    let updated = documents::update_document_text(&db.pool, document.id, common::LAW_V2, None)
        .await
        .unwrap();
    assert_eq!(updated.full_text, common::LAW_V2);
    assert_eq!(updated.html_content.as_deref(), Some("<p>v1</p>"));

    let archived = documents::set_status(&db.pool, document.id, DocumentStatus::Archived)
        .await
        .unwrap();
    assert_eq!(archived.status, DocumentStatus::Archived);
}

mod common;

use pretty_assertions::assert_eq;

use sfs_tracker_parser::SfsNumber;
use sfs_tracker_pipeline::error::PipelineError;
use sfs_tracker_pipeline::version_archive::{self, ArchiveVersionRequest};

#[tokio::test]
async fn test_create_initial_version_is_idempotent() {
    let db = common::TestDb::new().await;
    let document = db.register_law().await;
    let mut conn = db.pool.acquire().await.unwrap();

    let request = ArchiveVersionRequest::new(document.id, common::LAW_V1);
    let first = version_archive::create_initial_version(&mut conn, &request)
        .await
        .unwrap()
        .expect("first call creates version 1");
    assert_eq!(first.version_number, 1);
    assert_eq!(first.full_text, common::LAW_V1);

    let second = version_archive::create_initial_version(&mut conn, &request)
        .await
        .unwrap();
    assert!(second.is_none());
    assert_eq!(
        version_archive::count_versions(&db.pool, document.id)
            .await
            .unwrap(),
        1
    );
}

#[tokio::test]
async fn test_archive_numbers_are_gapless() {
    let db = common::TestDb::new().await;
    let document = db.register_law().await;
    let mut conn = db.pool.acquire().await.unwrap();

    for text in ["v1", "v2", "v3"] {
        version_archive::archive_document_version(
            &mut conn,
            &ArchiveVersionRequest::new(document.id, text),
        )
        .await
        .unwrap();
    }

    let history = version_archive::get_version_history(&db.pool, document.id)
        .await
        .unwrap();
    let numbers: Vec<i32> = history.iter().map(|v| v.version_number).collect();
    assert_eq!(numbers, vec![3, 2, 1]);
    assert_eq!(history[0].full_text, "v3");

    let latest = version_archive::latest_version(&db.pool, document.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(latest.version_number, 3);

    let second = version_archive::get_version(&db.pool, document.id, 2)
        .await
        .unwrap();
    assert_eq!(second.full_text, "v2");
}

#[tokio::test]
async fn test_archive_stores_metadata() {
    let db = common::TestDb::new().await;
    let document = db.register_law().await;
    let mut conn = db.pool.acquire().await.unwrap();

    let timestamp = chrono::DateTime::parse_from_rfc3339("2025-06-01T08:00:00Z")
        .unwrap()
        .with_timezone(&chrono::Utc);
    let request = ArchiveVersionRequest::new(document.id, common::LAW_V2)
        .with_html_content("<p>v2</p>")
        .with_amendment(SfsNumber::new(2025, 732))
        .with_source_timestamp(timestamp);

    let version = version_archive::archive_document_version(&mut conn, &request)
        .await
        .unwrap();
    assert_eq!(version.amendment_sfs.as_deref(), Some("SFS 2025:732"));
    assert_eq!(version.html_content.as_deref(), Some("<p>v2</p>"));
    assert_eq!(version.source_timestamp, Some(timestamp));
}

#[tokio::test]
async fn test_missing_version_and_document() {
    let db = common::TestDb::new().await;
    let document = db.register_law().await;

    let result = version_archive::get_version(&db.pool, document.id, 1).await;
    assert!(matches!(
        result,
        Err(PipelineError::VersionNotFound {
            version_number: 1,
            ..
        })
    ));
    assert!(version_archive::latest_version(&db.pool, document.id)
        .await
        .unwrap()
        .is_none());

    let mut conn = db.pool.acquire().await.unwrap();
    let result = version_archive::archive_document_version(
        &mut conn,
        &ArchiveVersionRequest::new(uuid::Uuid::new_v4(), "text"),
    )
    .await;
    assert!(matches!(result, Err(PipelineError::DocumentNotFound(_))));
}

#[tokio::test]
async fn test_concurrent_archivers_serialize() {
    let db = common::TestDb::new().await;
    let document = db.register_law().await;

    let mut handles = Vec::new();
    for i in 0..5 {
        let pool = db.pool.clone();
        let document_id = document.id;
        handles.push(tokio::spawn(async move {
            let mut tx = pool.begin().await.unwrap();
            let version = version_archive::archive_document_version(
                &mut tx,
                &ArchiveVersionRequest::new(document_id, format!("text {i}")),
            )
            .await
            .unwrap();
            tx.commit().await.unwrap();
            version.version_number
        }));
    }

    let mut numbers = Vec::new();
    for handle in handles {
        numbers.push(handle.await.unwrap());
    }
    numbers.sort();
    assert_eq!(numbers, vec![1, 2, 3, 4, 5]);
}

#[tokio::test]
async fn test_duplicate_version_number_is_conflict() {
    let db = common::TestDb::new().await;
    let document = db.register_law().await;
    let mut conn = db.pool.acquire().await.unwrap();

    version_archive::archive_document_version(
        &mut conn,
        &ArchiveVersionRequest::new(document.id, "v1"),
    )
    .await
    .unwrap();

    // Bypass the archiver to hit the unique key directly
    let result = sqlx::query(
        "INSERT INTO document_versions (id, document_id, version_number, full_text) VALUES ($1, $2, 1, 'dup')",
    )
    .bind(uuid::Uuid::new_v4())
    .bind(document.id)
    .execute(&db.pool)
    .await
    .map_err(PipelineError::from);

    let err = result.unwrap_err();
    assert!(matches!(err, PipelineError::VersionConflict(_)));
    assert!(err.is_retryable());
}

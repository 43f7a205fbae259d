mod common;

use chrono::{Duration, Utc};
use pretty_assertions::assert_eq;

use sfs_tracker_parser::config::{DIFF_SUMMARY_MAX_CHARS, TRUNCATION_MARKER};
use sfs_tracker_parser::SfsNumber;
use sfs_tracker_pipeline::change_detection::{self, DetectChangesParams};
use sfs_tracker_pipeline::documents;
use sfs_tracker_pipeline::models::{ChangeType, DocumentStatus};

fn params<'a>(document_id: uuid::Uuid, old: &'a str, new: &'a str) -> DetectChangesParams<'a> {
    DetectChangesParams {
        document_id,
        old_full_text: old,
        new_full_text: new,
        amendment_sfs: None,
        previous_version_id: None,
        new_version_id: None,
    }
}

#[tokio::test]
async fn test_whitespace_only_change_records_nothing() {
    let db = common::TestDb::new().await;
    let document = db.register_law().await;
    let mut conn = db.pool.acquire().await.unwrap();

    let reflowed = common::LAW_V1.replace(". ", ".   ").replace('\n', "\n\n");
    let event = change_detection::detect_changes(
        &mut conn,
        params(document.id, common::LAW_V1, &reflowed),
    )
    .await
    .unwrap();

    assert!(event.is_none());
    let events = change_detection::get_document_changes(&db.pool, document.id, 10)
        .await
        .unwrap();
    assert!(events.is_empty());
}

#[tokio::test]
async fn test_amendment_event_with_known_amendment() {
    let db = common::TestDb::new().await;
    let document = db.register_law().await;
    let mut conn = db.pool.acquire().await.unwrap();

    let event = change_detection::detect_changes(
        &mut conn,
        DetectChangesParams {
            amendment_sfs: Some(SfsNumber::new(2025, 732)),
            ..params(document.id, common::LAW_V1, common::LAW_V2)
        },
    )
    .await
    .unwrap()
    .expect("substantive change is recorded");

    assert_eq!(event.change_type, ChangeType::Amendment);
    assert_eq!(event.amendment_sfs.as_deref(), Some("SFS 2025:732"));
    assert_eq!(event.changed_sections, vec!["1 kap. 2 §", "2 kap. 3 §"]);

    let diff = event.diff_summary.expect("diff is stored");
    assert!(diff.starts_with("--- previous\n+++ current\n"));
    assert!(diff.contains("+Lagen gäller även inhyrd arbetskraft. Lag (2025:732)."));

    let document = documents::get_document(&db.pool, document.id).await.unwrap();
    assert_eq!(document.last_change_type, Some(ChangeType::Amendment));
    assert_eq!(document.last_change_ref.as_deref(), Some("SFS 2025:732"));
    assert_eq!(document.last_change_at, Some(event.detected_at));
}

#[tokio::test]
async fn test_amendment_event_without_known_amendment() {
    let db = common::TestDb::new().await;
    let document = db.register_law().await;
    let mut conn = db.pool.acquire().await.unwrap();

    let event = change_detection::detect_changes(
        &mut conn,
        params(document.id, common::LAW_V1, common::LAW_V2),
    )
    .await
    .unwrap()
    .unwrap();

    assert!(event.changed_sections.is_empty());
    assert!(event.amendment_sfs.is_none());

    let document = documents::get_document(&db.pool, document.id).await.unwrap();
    assert_eq!(document.last_change_ref.as_deref(), Some("SFS 1977:1160"));
}

#[tokio::test]
async fn test_large_diff_is_truncated() {
    let db = common::TestDb::new().await;
    let document = db.register_law().await;
    let mut conn = db.pool.acquire().await.unwrap();

    let new_text: String = (0..5_000)
        .map(|i| format!("{i} § Paragraf nummer {i} med ny lydelse.\n"))
        .collect();
    let event = change_detection::detect_changes(&mut conn, params(document.id, "", &new_text))
        .await
        .unwrap()
        .unwrap();

    let diff = event.diff_summary.unwrap();
    assert!(diff.ends_with(TRUNCATION_MARKER));
    assert_eq!(
        diff.chars().count(),
        DIFF_SUMMARY_MAX_CHARS + TRUNCATION_MARKER.chars().count()
    );
}

#[tokio::test]
async fn test_new_law_event() {
    let db = common::TestDb::new().await;
    let document = db.register_law().await;
    let mut conn = db.pool.acquire().await.unwrap();

    let event = change_detection::create_new_law_event(&mut conn, document.id, None)
        .await
        .unwrap();
    assert_eq!(event.change_type, ChangeType::NewLaw);
    assert!(event.changed_sections.is_empty());

    let document = documents::get_document(&db.pool, document.id).await.unwrap();
    assert_eq!(document.last_change_type, Some(ChangeType::NewLaw));
    assert_eq!(document.last_change_ref.as_deref(), Some("SFS 1977:1160"));
}

#[tokio::test]
async fn test_repeal_event_marks_document_repealed() {
    let db = common::TestDb::new().await;
    let document = db.register_law().await;
    let mut conn = db.pool.acquire().await.unwrap();

    let event =
        change_detection::create_repeal_event(&mut conn, document.id, Some(SfsNumber::new(2030, 1)))
            .await
            .unwrap();
    assert_eq!(event.change_type, ChangeType::Repeal);
    assert_eq!(event.amendment_sfs.as_deref(), Some("SFS 2030:1"));

    let document = documents::get_document(&db.pool, document.id).await.unwrap();
    assert_eq!(document.status, DocumentStatus::Repealed);
    assert_eq!(document.last_change_type, Some(ChangeType::Repeal));
}

#[tokio::test]
async fn test_document_changes_newest_first_with_limit() {
    let db = common::TestDb::new().await;
    let document = db.register_law().await;
    let mut conn = db.pool.acquire().await.unwrap();

    change_detection::create_new_law_event(&mut conn, document.id, None)
        .await
        .unwrap();
    change_detection::detect_changes(&mut conn, params(document.id, common::LAW_V1, common::LAW_V2))
        .await
        .unwrap();
    change_detection::create_repeal_event(&mut conn, document.id, None)
        .await
        .unwrap();

    let events = change_detection::get_document_changes(&db.pool, document.id, 10)
        .await
        .unwrap();
    let types: Vec<ChangeType> = events.iter().map(|e| e.change_type).collect();
    assert_eq!(
        types,
        vec![ChangeType::Repeal, ChangeType::Amendment, ChangeType::NewLaw]
    );

    let limited = change_detection::get_document_changes(&db.pool, document.id, 1)
        .await
        .unwrap();
    assert_eq!(limited.len(), 1);
    assert_eq!(limited[0].change_type, ChangeType::Repeal);
}

#[tokio::test]
async fn test_changes_by_date_range() {
    let db = common::TestDb::new().await;
    let document = db.register_law().await;
    let mut conn = db.pool.acquire().await.unwrap();

    let event = change_detection::create_new_law_event(&mut conn, document.id, None)
        .await
        .unwrap();

    let around = change_detection::get_changes_by_date_range(
        &db.pool,
        event.detected_at - Duration::minutes(1),
        event.detected_at + Duration::minutes(1),
    )
    .await
    .unwrap();
    assert_eq!(around.len(), 1);
    assert_eq!(around[0].id, event.id);

    let before = change_detection::get_changes_by_date_range(
        &db.pool,
        Utc::now() - Duration::days(30),
        event.detected_at,
    )
    .await
    .unwrap();
    assert!(before.is_empty());
}

//! Integration tests for document claims.
//!
//! Tests:
//! - A fresh claim blocks a second run until it goes stale
//! - Claiming discards events an earlier run left un-imported

use chrono::{Duration, Utc};
use uuid::Uuid;

use almanac_db::db::enums::DocumentStatus;
use almanac_service::extraction::LineExtraction;
use almanac_service::materialize::materialize;
use almanac_service::store::{DocumentRepository, ExtractedEventRepository};

use super::helpers::*;

fn staged(document_id: Uuid, line_number: usize, title: &str) -> almanac_db::model::extracted_event::NewExtractedEvent {
    materialize(
        document_id,
        &LineExtraction {
            line_number,
            event: title.to_string(),
            normalized_date: Some("2025-11-05".to_string()),
            ..LineExtraction::default()
        },
    )
    .expect("materialized")
}

/// ## Summary
/// A claim younger than the staleness window refuses a second run; once the
/// window has passed the document can be claimed again.
#[test_log::test(tokio::test)]
async fn claim_honours_staleness_window() {
    let Some(db) = TestDb::new().await else { return };
    let document = db.seed_document(Uuid::now_v7()).await;
    let window = Duration::minutes(10);

    let started = Utc::now();
    let first = db
        .store
        .claim_document(document.id, started, started - window)
        .await
        .expect("claim")
        .expect("first claim succeeds");
    assert_eq!(first.status, DocumentStatus::Processing);
    assert_eq!(first.progress, 0);

    let soon = started + Duration::minutes(1);
    assert!(
        db.store
            .claim_document(document.id, soon, soon - window)
            .await
            .expect("claim")
            .is_none(),
        "a fresh claim must block a second run"
    );

    let later = started + Duration::minutes(11);
    let retaken = db
        .store
        .claim_document(document.id, later, later - window)
        .await
        .expect("claim")
        .expect("stale claim is taken over");
    assert!(retaken.processing_started_at > first.processing_started_at);
}

/// ## Summary
/// Claiming drops staged events that were never imported and keeps those that were.
#[test_log::test(tokio::test)]
async fn claim_discards_unimported_events() {
    let Some(db) = TestDb::new().await else { return };
    let document = db.seed_document(Uuid::now_v7()).await;

    let kept = staged(document.id, 1, "Quiz 1");
    let dropped = staged(document.id, 2, "Midterm");
    db.store
        .insert_extracted(&[kept.clone(), dropped.clone()])
        .await
        .expect("insert");
    db.store
        .commit_import(kept.id, &[])
        .await
        .expect("import")
        .expect("first import");

    let now = Utc::now();
    db.store
        .claim_document(document.id, now, now - Duration::minutes(10))
        .await
        .expect("claim")
        .expect("claimed");

    let remaining: Vec<Uuid> = db
        .store
        .list_extracted(document.id, false)
        .await
        .expect("list")
        .iter()
        .map(|e| e.id)
        .collect();
    assert_eq!(remaining, vec![kept.id]);
    assert!(db.store.find_extracted(dropped.id).await.expect("find").is_none());
}

/// ## Summary
/// A refused claim leaves the running pass's staged events alone.
#[test_log::test(tokio::test)]
async fn refused_claim_keeps_events() {
    let Some(db) = TestDb::new().await else { return };
    let document = db.seed_document(Uuid::now_v7()).await;

    let now = Utc::now();
    db.store
        .claim_document(document.id, now, now - Duration::minutes(10))
        .await
        .expect("claim")
        .expect("claimed");
    db.store
        .insert_extracted(&[staged(document.id, 1, "Quiz 1"), staged(document.id, 2, "Quiz 2")])
        .await
        .expect("insert");

    assert!(
        db.store
            .claim_document(document.id, now, now - Duration::minutes(10))
            .await
            .expect("claim")
            .is_none()
    );
    assert_eq!(db.store.list_extracted(document.id, true).await.expect("list").len(), 2);
}

//! Integration tests for candidate promotion.

use chrono::NaiveTime;
use uuid::Uuid;

use almanac_db::db::enums::CandidateStatus;
use almanac_db::model::candidate::NewRecurringCandidate;
use almanac_service::candidates::CandidateService;
use almanac_service::error::ServiceError;
use almanac_service::store::CandidateRepository;

use super::helpers::*;

async fn seed_candidate(db: &TestDb, owner_id: Uuid) -> Uuid {
    let inserted = db
        .store
        .insert_candidates(&[NewRecurringCandidate {
            id: Uuid::now_v7(),
            owner_id,
            cluster_key: "chem lab|TU|14:00".to_string(),
            source_event_ids: vec![Uuid::now_v7(), Uuid::now_v7(), Uuid::now_v7()],
            pattern: "Weekly on Tuesday".to_string(),
            confidence: 0.9,
            title: "Chem lab".to_string(),
            normalized_title: "chem lab".to_string(),
            start_time: NaiveTime::from_hms_opt(14, 0, 0),
            end_time: NaiveTime::from_hms_opt(15, 30, 0),
            location: Some("Room 101".to_string()),
            suggested_rrule: "FREQ=WEEKLY;BYDAY=TU".to_string(),
            occurrence_dates: vec![date(2025, 11, 4), date(2025, 11, 11), date(2025, 11, 18)],
            status: CandidateStatus::Pending,
        }])
        .await
        .expect("seed candidate");
    inserted[0].id
}

/// ## Summary
/// Two promotions racing on one candidate create exactly one series and
/// both answer with it.
#[test_log::test(tokio::test(flavor = "multi_thread", worker_threads = 2))]
async fn concurrent_promotions_create_one_series() {
    let Some(db) = TestDb::new().await else { return };
    let owner_id = Uuid::now_v7();
    let candidate_id = seed_candidate(&db, owner_id).await;
    let service = CandidateService::new(db.store.clone(), db.store.clone());

    let (left, right) = tokio::join!(service.promote(candidate_id), service.promote(candidate_id));
    let left = left.expect("left promotion");
    let right = right.expect("right promotion");

    assert_eq!(left.series.id, right.series.id);
    assert_eq!(
        [left.created, right.created].iter().filter(|created| **created).count(),
        1
    );
    assert_eq!(left.series.source_cluster_key.as_deref(), Some("chem lab|TU|14:00"));

    let accepted = db
        .store
        .list_candidates(owner_id, CandidateStatus::Accepted)
        .await
        .expect("list");
    assert_eq!(accepted.len(), 1);
    assert!(
        db.store
            .list_candidates(owner_id, CandidateStatus::Pending)
            .await
            .expect("list")
            .is_empty()
    );
}

#[test_log::test(tokio::test)]
async fn rejected_candidate_cannot_be_promoted() {
    let Some(db) = TestDb::new().await else { return };
    let candidate_id = seed_candidate(&db, Uuid::now_v7()).await;
    let service = CandidateService::new(db.store.clone(), db.store.clone());

    service.reject(candidate_id).await.expect("reject");
    assert!(matches!(
        service.promote(candidate_id).await,
        Err(ServiceError::Conflict(_))
    ));
}

//! Integration tests for committing imports.

use uuid::Uuid;

use almanac_db::db::enums::CalendarSource;
use almanac_service::extraction::LineExtraction;
use almanac_service::materialize::materialize;
use almanac_service::store::ExtractedEventRepository;

use super::helpers::*;

/// ## Summary
/// A failing insert rolls back the imported flag; a clean commit lands every
/// row once and a repeat commit changes nothing.
#[test_log::test(tokio::test)]
async fn commit_import_is_all_or_nothing() {
    let Some(db) = TestDb::new().await else { return };
    let owner_id = Uuid::now_v7();
    let document = db.seed_document(owner_id).await;

    let event = materialize(
        document.id,
        &LineExtraction {
            line_number: 3,
            event: "Soccer practice".to_string(),
            normalized_date: Some("2025-11-03".to_string()),
            ..LineExtraction::default()
        },
    )
    .expect("materialized");
    db.store.insert_extracted(&[event.clone()]).await.expect("insert");

    let row = |day| calendar_event_from(owner_id, event.id, date(2025, 11, day));
    let first = row(3);
    let mut clash = row(10);
    clash.id = first.id;

    assert!(db.store.commit_import(event.id, &[first, clash]).await.is_err());
    let after_failure = db.store.find_extracted(event.id).await.expect("find").expect("exists");
    assert!(!after_failure.is_imported, "failed insert must roll back the flag");
    assert!(db.store.imported_events(event.id).await.expect("list").is_empty());

    let ids = db
        .store
        .commit_import(event.id, &[row(3), row(10)])
        .await
        .expect("import")
        .expect("first commit");
    assert_eq!(ids.len(), 2);

    assert!(
        db.store
            .commit_import(event.id, &[row(17)])
            .await
            .expect("import")
            .is_none()
    );

    let imported = db.store.imported_events(event.id).await.expect("list");
    let dates: Vec<_> = imported.iter().map(|e| e.event_date).collect();
    assert_eq!(dates, vec![date(2025, 11, 3), date(2025, 11, 10)]);
    assert!(imported.iter().all(|e| e.source == CalendarSource::Extracted));
}

fn calendar_event_from(
    owner_id: Uuid,
    source_id: Uuid,
    day: chrono::NaiveDate,
) -> almanac_db::model::calendar_event::NewCalendarEvent {
    almanac_db::model::calendar_event::NewCalendarEvent {
        source: CalendarSource::Extracted,
        source_id: Some(source_id),
        ..calendar_row(owner_id, day)
    }
}

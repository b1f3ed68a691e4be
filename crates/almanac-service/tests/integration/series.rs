//! Integration tests for series exclusions and overrides.
//!
//! Tests:
//! - Excluding a date records it once and removes its instance
//! - Override upserts null out cleared instance fields
//! - Cancelling overrides remove the instance

use chrono::NaiveTime;
use uuid::Uuid;

use almanac_db::model::calendar_event::InstanceChanges;
use almanac_db::model::series::NewEventOverride;
use almanac_service::store::SeriesRepository;

use super::helpers::*;

fn override_row(series_id: Uuid, occurrence_date: chrono::NaiveDate) -> NewEventOverride {
    NewEventOverride {
        id: Uuid::now_v7(),
        series_id,
        occurrence_date,
        title: None,
        description: None,
        start_time: None,
        end_time: None,
        location: None,
        is_cancelled: false,
        is_completed: false,
    }
}

#[test_log::test(tokio::test)]
async fn exclude_occurrence_removes_instance_once() {
    let Some(db) = TestDb::new().await else { return };
    let dates = [date(2025, 11, 4), date(2025, 11, 11), date(2025, 11, 18)];
    let series = db.seed_series(Uuid::now_v7(), &dates).await;

    assert!(db.store.exclude_occurrence(series.id, dates[1]).await.expect("exclude"));
    assert!(db.store.exclude_occurrence(series.id, dates[1]).await.expect("exclude again"));

    let stored = db.store.find_series(series.id).await.expect("find").expect("exists");
    assert_eq!(stored.excluded_dates, vec![dates[1]]);
    assert_eq!(
        db.store.instance_dates(series.id).await.expect("dates"),
        vec![dates[0], dates[2]]
    );

    assert!(!db.store.exclude_occurrence(Uuid::now_v7(), dates[0]).await.expect("exclude"));
}

/// ## Summary
/// A `None` in the instance changes clears the column rather than leaving
/// the previous value in place.
#[test_log::test(tokio::test)]
async fn override_clears_fields_set_to_none() {
    let Some(db) = TestDb::new().await else { return };
    let dates = [date(2025, 11, 4), date(2025, 11, 11)];
    let series = db.seed_series(Uuid::now_v7(), &dates).await;
    assert_eq!(db.instances(series.id).await[0].location.as_deref(), Some("Room 101"));

    let moved = NewEventOverride {
        title: Some("Chem lab (online)".to_string()),
        start_time: NaiveTime::from_hms_opt(16, 0, 0),
        ..override_row(series.id, dates[0])
    };
    let changes = InstanceChanges {
        title: "Chem lab (online)".to_string(),
        description: None,
        start_time: NaiveTime::from_hms_opt(16, 0, 0),
        end_time: None,
        location: None,
        is_completed: false,
    };
    db.store
        .upsert_override(&moved, Some(&changes))
        .await
        .expect("override");

    let instances = db.instances(series.id).await;
    assert_eq!(instances[0].title, "Chem lab (online)");
    assert_eq!(instances[0].location, None);
    assert_eq!(instances[0].end_time, None);
    assert_eq!(instances[0].start_time, NaiveTime::from_hms_opt(16, 0, 0));
    assert_eq!(instances[1].location.as_deref(), Some("Room 101"));

    let retitled = NewEventOverride {
        title: Some("Chem lab (room TBD)".to_string()),
        ..override_row(series.id, dates[0])
    };
    let saved = db
        .store
        .upsert_override(&retitled, None)
        .await
        .expect("second override");
    assert_eq!(saved.title.as_deref(), Some("Chem lab (room TBD)"));

    let overrides = db.store.overrides_for_series(series.id).await.expect("overrides");
    assert_eq!(overrides.len(), 1, "one override per occurrence date");
    assert_eq!(overrides[0].start_time, None);
}

#[test_log::test(tokio::test)]
async fn cancelling_override_deletes_instance() {
    let Some(db) = TestDb::new().await else { return };
    let dates = [date(2025, 11, 4), date(2025, 11, 11)];
    let series = db.seed_series(Uuid::now_v7(), &dates).await;

    let cancelled = NewEventOverride {
        is_cancelled: true,
        ..override_row(series.id, dates[1])
    };
    let saved = db
        .store
        .upsert_override(&cancelled, None)
        .await
        .expect("override");
    assert!(saved.is_cancelled);
    assert_eq!(db.store.instance_dates(series.id).await.expect("dates"), vec![dates[0]]);
}
